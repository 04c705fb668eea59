//! Longest-match lexer driving the automaton
//!
//!     The lexer is positioned at a [Checkpoint]. [Lexer::next_token] feeds the automaton one
//!     character at a time from there, remembering the last position at which the accept
//!     marker was active together with the tags satisfied at that point. When the active set
//!     dies (or input ends) it commits to that last accept, so the longest match wins.
//!
//!     Matches whose tags are all ignorable are skipped and the scan restarts right after them,
//!     so the grammar never sees whitespace or comments. The remaining ignorable tags are
//!     stripped from the token's tag set.
//!
//!     Scans are cached by start index: the parser restores checkpoints constantly and the
//!     token starting at a given index never changes within one lexer.

use crate::transmuter::common::Conditions;
use crate::transmuter::error::LexicalError;
use crate::transmuter::lexing::automaton::{StateSet, ACCEPT};
use crate::transmuter::lexing::tag::{Lexicon, TagSet};
use crate::transmuter::lexing::token::Token;
use crate::transmuter::range::{Position, Span};
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

/// Default name used in diagnostics when no filename is given.
pub const DEFAULT_FILENAME: &str = "<stdin>";

/// An opaque, copyable lexer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Checkpoint(Position);

impl Checkpoint {
    pub const START: Checkpoint = Checkpoint(Position::START);

    pub fn position(self) -> Position {
        self.0
    }

    pub fn index(self) -> usize {
        self.0.index
    }
}

impl From<Position> for Checkpoint {
    fn from(position: Position) -> Self {
        Self(position)
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of running the automaton from one start position.
#[derive(Debug)]
struct Scan {
    /// Tags and end position of the last accept seen.
    accepted: Option<(TagSet, Position)>,
    /// Input ran out while states were still alive.
    exhausted: bool,
}

pub struct Lexer<'l> {
    lexicon: &'l Lexicon,
    chars: Vec<char>,
    filename: String,
    conditions: Conditions,
    starts: StateSet,
    ignored: TagSet,
    position: Position,
    cache: HashMap<usize, Result<Token, LexicalError>>,
}

impl<'l> Lexer<'l> {
    pub fn new(lexicon: &'l Lexicon, input: &str, conditions: Conditions) -> Self {
        let starts = lexicon.start_states(&conditions);
        let ignored = lexicon.ignored();
        Self {
            lexicon,
            chars: input.chars().collect(),
            filename: DEFAULT_FILENAME.to_string(),
            conditions,
            starts,
            ignored,
            position: Position::START,
            cache: HashMap::new(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn lexicon(&self) -> &'l Lexicon {
        self.lexicon
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    /// Number of characters in the input.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.position)
    }

    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.position = checkpoint.0;
    }

    /// The raw text covered by `span`.
    pub fn text(&self, span: Span) -> String {
        let end = span.end.index.min(self.chars.len());
        let start = span.start.index.min(end);
        self.chars[start..end].iter().collect()
    }

    /// Scan the next visible token and move past it. On error the position is unchanged.
    pub fn next_token(&mut self) -> Result<Token, LexicalError> {
        let start = self.position;
        let result = match self.cache.get(&start.index) {
            Some(cached) => cached.clone(),
            None => {
                let scanned = self.tokenize(start);
                self.cache.insert(start.index, scanned.clone());
                scanned
            }
        };
        if let Ok(token) = &result {
            trace!(at = %start, text = %token.text, "token");
            self.position = token.span.end;
        }
        result
    }

    /// Whether only ignorable input remains after `checkpoint`.
    pub fn at_end(&self, checkpoint: Checkpoint) -> bool {
        self.skip_ignorable(checkpoint).index() >= self.chars.len()
    }

    /// The checkpoint after any ignorable matches starting at `checkpoint`.
    pub fn skip_ignorable(&self, checkpoint: Checkpoint) -> Checkpoint {
        let mut at = checkpoint.0;
        loop {
            match self.scan(at).accepted {
                Some((tags, end)) if tags.is_subset(&self.ignored) => at = end,
                _ => return Checkpoint(at),
            }
        }
    }

    /// All visible tokens from the current position to the end of input.
    pub fn tokens(&mut self) -> Result<Vec<Token>, LexicalError> {
        let mut tokens = Vec::new();
        loop {
            match self.next_token() {
                Ok(token) => tokens.push(token),
                Err(error) if error.is_end_of_input() && self.at_end(self.checkpoint()) => {
                    return Ok(tokens)
                }
                Err(error) => return Err(error),
            }
        }
    }

    fn tokenize(&self, from: Position) -> Result<Token, LexicalError> {
        let mut start = from;
        loop {
            let scan = self.scan(start);
            match scan.accepted {
                Some((tags, end)) => {
                    let visible: TagSet = tags.difference(&self.ignored).copied().collect();
                    if visible.is_empty() {
                        start = end;
                        continue;
                    }
                    let span = Span::new(start, end);
                    return Ok(Token::new(visible, span, self.text(span)));
                }
                None if scan.exhausted || start.index >= self.chars.len() => {
                    return Err(LexicalError::EndOfInput {
                        filename: self.filename.clone(),
                        position: self.end_position(start),
                    })
                }
                None => {
                    return Err(LexicalError::NoToken {
                        filename: self.filename.clone(),
                        position: start,
                    })
                }
            }
        }
    }

    fn scan(&self, start: Position) -> Scan {
        let automaton = self.lexicon.automaton();
        let mut states = self.starts.clone();
        let mut position = start;
        let mut accepted = None;

        while !states.is_empty() {
            let Some(ch) = self.chars.get(position.index).copied() else {
                return Scan {
                    accepted,
                    exhausted: true,
                };
            };
            let step = automaton.step(ch, &states);
            position = position.advance(ch);
            states = step.next;
            if states.remove(&ACCEPT) {
                accepted = Some((step.tags, position));
            }
        }

        Scan {
            accepted,
            exhausted: false,
        }
    }

    fn end_position(&self, from: Position) -> Position {
        self.chars
            .get(from.index..)
            .unwrap_or_default()
            .iter()
            .fold(from, |at, ch| at.advance(*ch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transmuter::common::{conditions, ConditionExpr};
    use crate::transmuter::lexing::automaton::CharClass;
    use crate::transmuter::lexing::tag::TagId;

    struct Fixture {
        lexicon: Lexicon,
        ident: TagId,
        start: TagId,
        plus: TagId,
        slash: TagId,
    }

    fn fixture() -> Fixture {
        let mut builder = Lexicon::builder();
        let space = builder.word(
            "Whitespace",
            CharClass::one_of(" \t\n"),
            CharClass::one_of(" \t\n"),
            ConditionExpr::Always,
        );
        builder.ignore(space);
        let ident = builder.word(
            "Identifier",
            CharClass::word_start(),
            CharClass::word_continue(),
            ConditionExpr::Always,
        );
        let start = builder.keyword("Start", "start", ConditionExpr::Always, &[ident]);
        let plus = builder.literal("Plus", "+", ConditionExpr::Always);
        builder.literal("PlusPlus", "++", ConditionExpr::Always);
        let slash = builder.literal("Solidus", "/", ConditionExpr::active("syntactic"));
        Fixture {
            lexicon: builder.build().unwrap(),
            ident,
            start,
            plus,
            slash,
        }
    }

    #[test]
    fn test_keyword_overrides_identifier() {
        let fx = fixture();
        let mut lexer = Lexer::new(&fx.lexicon, "start", Conditions::new());
        let token = lexer.next_token().unwrap();

        assert_eq!(token.tags, TagSet::from([fx.start]));
        assert_eq!(token.text, "start");
    }

    #[test]
    fn test_longest_match_beats_keyword_prefix() {
        let fx = fixture();
        let mut lexer = Lexer::new(&fx.lexicon, "starts", Conditions::new());
        let token = lexer.next_token().unwrap();

        assert_eq!(token.tags, TagSet::from([fx.ident]));
        assert_eq!(token.text, "starts");
    }

    #[test]
    fn test_longest_literal_wins() {
        let fx = fixture();
        let mut lexer = Lexer::new(&fx.lexicon, "++ +", Conditions::new());
        let first = lexer.next_token().unwrap();
        let second = lexer.next_token().unwrap();

        assert_eq!(first.text, "++");
        assert_eq!(second.tags, TagSet::from([fx.plus]));
    }

    #[test]
    fn test_ignorable_tokens_are_skipped() {
        let fx = fixture();
        let mut lexer = Lexer::new(&fx.lexicon, "  a\n  b", Conditions::new());
        let first = lexer.next_token().unwrap();
        let second = lexer.next_token().unwrap();

        assert_eq!(first.text, "a");
        assert_eq!(first.span.start, Position::new(2, 1, 3));
        assert_eq!(second.text, "b");
        assert_eq!(second.span.start, Position::new(6, 2, 3));
    }

    #[test]
    fn test_end_of_input_after_trailing_whitespace() {
        let fx = fixture();
        let mut lexer = Lexer::new(&fx.lexicon, "a  ", Conditions::new());
        lexer.next_token().unwrap();
        let error = lexer.next_token().unwrap_err();

        assert!(error.is_end_of_input());
        assert_eq!(error.position(), Position::new(3, 1, 4));
        assert!(lexer.at_end(lexer.checkpoint()));
    }

    #[test]
    fn test_no_token_on_unknown_character() {
        let fx = fixture();
        let mut lexer = Lexer::new(&fx.lexicon, "a ?", Conditions::new());
        lexer.next_token().unwrap();
        let before = lexer.checkpoint();
        let error = lexer.next_token().unwrap_err();

        assert!(matches!(error, LexicalError::NoToken { .. }));
        assert_eq!(error.position(), Position::new(2, 1, 3));
        assert_eq!(lexer.checkpoint(), before);
    }

    #[test]
    fn test_checkpoint_restore_rescans_identically() {
        let fx = fixture();
        let mut lexer = Lexer::new(&fx.lexicon, "a b c", Conditions::new());
        lexer.next_token().unwrap();
        let mark = lexer.checkpoint();
        let first = lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        lexer.restore(mark);
        let again = lexer.next_token().unwrap();

        assert_eq!(first, again);
    }

    #[test]
    fn test_conditions_gate_tags() {
        let fx = fixture();
        let mut lexical = Lexer::new(&fx.lexicon, "/", conditions(["lexical"]));
        let mut syntactic = Lexer::new(&fx.lexicon, "/", conditions(["syntactic"]));

        assert!(lexical.next_token().is_err());
        assert_eq!(
            syntactic.next_token().unwrap().tags,
            TagSet::from([fx.slash])
        );
    }

    #[test]
    fn test_tokens_collects_everything() {
        let fx = fixture();
        let mut lexer = Lexer::new(&fx.lexicon, " start x ++ ", Conditions::new());
        let texts: Vec<String> = lexer
            .tokens()
            .unwrap()
            .into_iter()
            .map(|token| token.text)
            .collect();

        assert_eq!(texts, vec!["start", "x", "++"]);
    }

    #[test]
    fn test_empty_input_is_end_of_input() {
        let fx = fixture();
        let mut lexer = Lexer::new(&fx.lexicon, "", Conditions::new());

        assert!(lexer.next_token().unwrap_err().is_end_of_input());
        assert!(lexer.tokens().unwrap().is_empty());
    }
}
