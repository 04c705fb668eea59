//! Path sets
//!
//!     A path is a lexer checkpoint reached by matching some rule fragment. A path set holds
//!     every endpoint found so far; only the endpoint matters, so two derivations ending at
//!     the same checkpoint collapse into one path.

use crate::transmuter::lexing::lexer::Checkpoint;
use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathSet(BTreeSet<Checkpoint>);

impl PathSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(path: Checkpoint) -> Self {
        Self(BTreeSet::from([path]))
    }

    pub fn insert(&mut self, path: Checkpoint) -> bool {
        self.0.insert(path)
    }

    /// Add every path of `other`.
    pub fn absorb(&mut self, other: PathSet) {
        self.0.extend(other.0);
    }

    pub fn union(&self, other: &PathSet) -> PathSet {
        Self(self.0.union(&other.0).copied().collect())
    }

    /// Paths of `self` missing from `other`.
    pub fn difference(&self, other: &PathSet) -> PathSet {
        Self(self.0.difference(&other.0).copied().collect())
    }

    pub fn contains(&self, path: Checkpoint) -> bool {
        self.0.contains(&path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<Checkpoint> {
        self.0.first().copied()
    }

    /// The furthest path.
    pub fn last(&self) -> Option<Checkpoint> {
        self.0.last().copied()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Checkpoint> + '_ {
        self.0.iter().copied()
    }

    /// Character indices of the paths, in order.
    pub fn indices(&self) -> Vec<usize> {
        self.iter().map(Checkpoint::index).collect()
    }
}

impl FromIterator<Checkpoint> for PathSet {
    fn from_iter<I: IntoIterator<Item = Checkpoint>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PathSet {
    type Item = Checkpoint;
    type IntoIter = btree_set::IntoIter<Checkpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for PathSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, path) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", path)?;
        }
        write!(f, "}}")
    }
}
