//! Testing utilities for syntax trees
//!
//! Two tools are shipped with the library so that unit tests, integration tests and
//! downstream grammars all test the same way:
//!
//! 1. **[factories]** - small fixture grammars with known behavior.
//! 2. **[assert_tree](fn@assert_tree)** - a fluent API for verifying tree shape and content.
//!
//! ## Fluent tree assertions
//!
//! Walking a tree by hand means matching on [TreeNode](crate::transmuter::parsing::TreeNode)
//! at every level. With `assert_tree` a whole hierarchy is checked at once:
//!
//! ```rust-example
//! use crate::transmuter::testing::assert_tree;
//!
//! assert_tree(&tree)
//!     .rule("Sum")
//!     .child_count(3)
//!     .child(0, |child| {
//!         child.assert_branch()
//!             .rule("Term")
//!             .child(0, |leaf| leaf.assert_leaf().tag("Number").text("1"));
//!     })
//!     .child(1, |child| {
//!         child.assert_leaf().tag("Plus");
//!     });
//! ```
//!
//! Failures name the path to the offending node (`children[0].children[1]`) and summarise
//! what was found instead.

mod testing_assertions;
mod testing_factories;

pub use testing_assertions::{assert_tree, BranchAssertion, LeafAssertion, NodeAssertion};

// Public submodule path: crate::transmuter::testing::factories
pub mod factories {
    pub use super::testing_factories::*;
}
