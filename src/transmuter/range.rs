//! Position and span tracking for source locations
//!
//! ## Types
//!
//! - [`Position`] - A character index together with its line:column
//! - [`Span`] - A start/end pair of positions
//!
//! ## Key Design
//!
//! - **Character indices**: input is addressed by `char`, not by byte, so spans can be used
//!   to slice the lexer's character buffer directly
//! - **1-based lines and columns**: matches the `file:line:column` convention of error messages
//! - **Incremental**: positions are advanced one character at a time by the lexer; there is
//!   no separate offset-to-line lookup

use serde::Serialize;
use std::fmt;

/// A position in the input: character index plus line and column (both 1-based).
///
/// Ordering is by index, which is consistent with line/column ordering for positions
/// produced by [`Position::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub index: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// The position before the first character.
    pub const START: Position = Position {
        index: 0,
        line: 1,
        column: 1,
    };

    pub fn new(index: usize, line: usize, column: usize) -> Self {
        Self {
            index,
            line,
            column,
        }
    }

    /// The position right after `ch`, which must be the character at `self`.
    pub fn advance(self, ch: char) -> Self {
        if ch == '\n' {
            Self::new(self.index + 1, self.line + 1, 1)
        } else {
            Self::new(self.index + 1, self.line, self.column + 1)
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

/// A half-open stretch of input between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// An empty span located at `at`.
    pub fn empty(at: Position) -> Self {
        Self::new(at, at)
    }

    /// Number of characters covered.
    pub fn len(&self) -> usize {
        self.end.index.saturating_sub(self.start.index)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if a position falls inside this span (end excluded).
    pub fn contains(&self, pos: Position) -> bool {
        self.start.index <= pos.index && pos.index < self.end.index
    }

    /// Smallest span covering both.
    pub fn cover(&self, other: &Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
