//! Bundled grammars
//!
//!     Ready-made grammars built on the engine. They double as end-to-end exercises of the
//!     lexer, the rule algebra and the runtime.

pub mod aether;

pub use aether::{default_grammar, grammar, lexical, lexicon, syntactic};
