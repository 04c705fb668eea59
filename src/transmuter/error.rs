//! Error types for lexing, grammar construction and parsing
//!
//!     Messages keep the `<file>:<line>:<column>: <Kind> Error: <description>` layout so that
//!     editors and build tools can jump to the reported location. The engine itself never
//!     prints; reporting is up to the caller.

use crate::transmuter::range::Position;
use thiserror::Error;

/// Errors raised by the lexer while scanning a token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexicalError {
    /// The input ended before a visible token could be recognised.
    #[error("{filename}:{position}: Lexical Error: Unexpected end of input.")]
    EndOfInput { filename: String, position: Position },
    /// The automaton ran out of live states without ever accepting.
    #[error("{filename}:{position}: Lexical Error: Could not match any token.")]
    NoToken { filename: String, position: Position },
}

impl LexicalError {
    pub fn position(&self) -> Position {
        match self {
            LexicalError::EndOfInput { position, .. } | LexicalError::NoToken { position, .. } => {
                *position
            }
        }
    }

    pub fn is_end_of_input(&self) -> bool {
        matches!(self, LexicalError::EndOfInput { .. })
    }
}

/// Errors reported by the top-level driver. Each corresponds to one failed parse run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No derivation of the rule survived.
    #[error("{filename}:{position}: Syntax Error: In {rule}: Could not find a parsing path.")]
    NoPath {
        filename: String,
        rule: String,
        position: Position,
    },
    /// The start rule matched, but no derivation spans the whole input.
    #[error("{filename}:{position}: Syntax Error: In {rule}: Expected end of input.")]
    Incomplete {
        filename: String,
        rule: String,
        position: Position,
    },
    #[error("<conditions>:0:0: Syntax Error: Could not match any starting symbol from given conditions.")]
    NoStart,
    #[error("<conditions>:0:0: Syntax Error: Matched multiple starting symbols from given conditions ({}).", .rules.join(", "))]
    MultipleStart { rules: Vec<String> },
    /// Rule instantiations nested deeper than the configured limit.
    #[error("{filename}:{position}: Syntax Error: In {rule}: Exceeded the maximum rule nesting depth of {limit}.")]
    DepthLimit {
        filename: String,
        rule: String,
        position: Position,
        limit: usize,
    },
}

impl ParseError {
    /// Name of the rule the error is reported against, if any.
    pub fn rule(&self) -> Option<&str> {
        match self {
            ParseError::NoPath { rule, .. }
            | ParseError::Incomplete { rule, .. }
            | ParseError::DepthLimit { rule, .. } => Some(rule),
            ParseError::NoStart | ParseError::MultipleStart { .. } => None,
        }
    }
}

/// Errors raised while assembling a lexicon or a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("Rule `{0}` is referenced but never defined")]
    UndefinedRule(String),
    #[error("Rule `{0}` is defined more than once")]
    DuplicateRule(String),
    #[error("Rule id {0} does not belong to this grammar")]
    UnknownRule(usize),
    #[error("Tag `{0}` is declared more than once")]
    DuplicateTag(String),
    #[error("Tag `{0}` is not declared in the lexicon")]
    UndefinedTag(String),
    #[error("Tag id {0} does not belong to this lexicon")]
    UnknownTag(usize),
    #[error("Tag `{0}` uses the accept marker as a start state")]
    AcceptAsStart(String),
    #[error("Grammar declares no start rule")]
    NoStartRules,
}

/// Umbrella error for applications that drive the whole toolchain.
#[derive(Debug, Error)]
pub enum TransmuterError {
    #[error(transparent)]
    Lexical(#[from] LexicalError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    Format(#[from] crate::transmuter::formats::FormatError),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_error_format() {
        let error = LexicalError::EndOfInput {
            filename: "input.aether".to_string(),
            position: Position::new(10, 2, 4),
        };
        assert_eq!(
            error.to_string(),
            "input.aether:2:4: Lexical Error: Unexpected end of input."
        );
        assert!(error.is_end_of_input());
    }

    #[test]
    fn test_no_path_format() {
        let error = ParseError::NoPath {
            filename: "<stdin>".to_string(),
            rule: "Root".to_string(),
            position: Position::START,
        };
        assert_eq!(
            error.to_string(),
            "<stdin>:1:1: Syntax Error: In Root: Could not find a parsing path."
        );
        assert_eq!(error.rule(), Some("Root"));
    }

    #[test]
    fn test_incomplete_format() {
        let error = ParseError::Incomplete {
            filename: "<stdin>".to_string(),
            rule: "Root".to_string(),
            position: Position::new(1, 1, 2),
        };
        assert_eq!(
            error.to_string(),
            "<stdin>:1:2: Syntax Error: In Root: Expected end of input."
        );
    }

    #[test]
    fn test_start_selection_format() {
        assert_eq!(
            ParseError::NoStart.to_string(),
            "<conditions>:0:0: Syntax Error: Could not match any starting symbol from given conditions."
        );
        let multiple = ParseError::MultipleStart {
            rules: vec!["Lexicon".to_string(), "Grammar".to_string()],
        };
        assert!(multiple.to_string().ends_with("(Lexicon, Grammar)."));
        assert_eq!(multiple.rule(), None);
    }
}
