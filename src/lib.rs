//! # transmuter
//!
//! Lexing and parsing engine for generated language front-ends.
//!
//! The engine is made of three cooperating layers:
//!
//!     Lexing:
//!         A character-level automaton classifies input into tagged tokens under a set of
//!         active conditions, with longest-match and keyword-over-identifier retraction. See
//!         [lexing](transmuter::lexing).
//!
//!     Rule algebra:
//!         Grammars are trees of combinators (sequence, optional, repeat, alternation,
//!         terminal and non-terminal references, feature switches). See
//!         [rule](transmuter::parsing::rule).
//!
//!     Parsing runtime:
//!         Every combinator maps a set of lexer checkpoints to the set of checkpoints where
//!         it could end. Each (checkpoint, rule) pair is evaluated once and memoised, and the
//!         only disambiguation happens at the top: some derivation must consume the whole
//!         input. See [runtime](transmuter::parsing::runtime) and
//!         [driver](transmuter::parsing::driver).
//!
//! For test helpers and fixture grammars, see the [testing module](transmuter::testing).

pub mod transmuter;

pub use transmuter::error::{GrammarError, LexicalError, ParseError, TransmuterError};
pub use transmuter::parsing::{Grammar, Parser, SyntaxTree};
