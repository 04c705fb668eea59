//! Tokens produced by the lexer

use crate::transmuter::lexing::tag::{TagId, TagSet};
use crate::transmuter::range::Span;
use serde::Serialize;

/// One recognised match: the visible tags it satisfies, where it lies, and its raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub tags: TagSet,
    pub span: Span,
    pub text: String,
}

impl Token {
    pub fn new(tags: TagSet, span: Span, text: impl Into<String>) -> Self {
        Self {
            tags,
            span,
            text: text.into(),
        }
    }

    pub fn has_tag(&self, tag: TagId) -> bool {
        self.tags.contains(&tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transmuter::range::Position;

    #[test]
    fn test_token_tag_membership() {
        let token = Token::new(
            TagSet::from([TagId::from_raw(0), TagId::from_raw(2)]),
            Span::new(Position::START, Position::new(3, 1, 4)),
            "abc",
        );

        assert!(token.has_tag(TagId::from_raw(2)));
        assert!(!token.has_tag(TagId::from_raw(1)));
        assert_eq!(token.span.len(), token.text.chars().count());
    }
}
