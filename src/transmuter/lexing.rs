//! Lexing
//!
//!     Characters are turned into tokens by a condition-gated automaton ([automaton]) whose
//!     states and tags are declared in a [tag::Lexicon]. The [lexer::Lexer] drives the
//!     automaton with longest-match semantics and exposes the checkpoint/restore pair the
//!     parser backtracks with.

pub mod automaton;
pub mod lexer;
pub mod tag;
pub mod token;

pub use automaton::{Automaton, CharClass, StateId, StateSet, Step, Transition, ACCEPT};
pub use lexer::{Checkpoint, Lexer};
pub use tag::{Lexicon, LexiconBuilder, TagId, TagSet, TerminalTag};
pub use token::Token;
