//! Parsing
//!
//!     Grammars are written in a small rule algebra ([rule]) and bundled with their lexicon
//!     in a [grammar::Grammar]. A [runtime::ParseRun] evaluates rules as functions from path
//!     sets to path sets, memoising every `(checkpoint, rule)` derivation; the
//!     [driver::Parser] picks the derivation that consumes the whole input and turns it into
//!     a [tree::SyntaxTree].
//!
//!     Typical use:
//!
//!         let parser = Parser::new(&grammar);
//!         let tree = parser.parse(input, conditions)?;

pub mod arena;
pub mod driver;
pub mod grammar;
pub mod paths;
pub mod rule;
pub mod runtime;
pub mod tree;

pub use arena::{MemoEntry, MemoTable, NodeArena, NodeId, NonTerminal};
pub use driver::{ParseOutcome, Parser};
pub use grammar::{Grammar, GrammarBuilder, RuleDef, RuleId, StartRule};
pub use paths::PathSet;
pub use rule::{Features, Naming, Rule};
pub use runtime::{Failure, ParseRun, ParseStats};
pub use tree::{Branch, Leaf, SyntaxTree, TreeNode};
