//! Parse nodes and the memo table
//!
//!     Every successfully derived rule instance becomes a [NonTerminal] stored in a
//!     [NodeArena] owned by the parse run. Parents and children refer to each other by
//!     [NodeId], so the back-link to the parent is a plain index and no reference cycles
//!     exist.
//!
//!     The [MemoTable] maps `(checkpoint, rule)` to the outcome of deriving that rule there.
//!     Entries are only ever added or resolved from `InProgress`; a resolved entry is never
//!     revisited during the run.

use crate::transmuter::lexing::lexer::Checkpoint;
use crate::transmuter::parsing::grammar::RuleId;
use crate::transmuter::parsing::paths::PathSet;
use crate::transmuter::parsing::runtime::Failure;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A derived rule instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonTerminal {
    pub rule: RuleId,
    pub start: Checkpoint,
    /// Every checkpoint at which this instance can end. Never empty.
    pub output: PathSet,
    /// Back-link for diagnostics. `None` for the root and for instances whose parent failed.
    pub parent: Option<NodeId>,
    /// Instances first derived while evaluating this one's rule.
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<NonTerminal>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `node` and point its children back at it.
    pub fn alloc(&mut self, node: NonTerminal) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in &node.children {
            if let Some(entry) = self.nodes.get_mut(child.index()) {
                entry.parent = Some(id);
            }
        }
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&NonTerminal> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NonTerminal> {
        self.nodes.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NonTerminal)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index as u32), node))
    }

    /// Walk the parent links from `id` up to its root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.get(id).and_then(|node| node.parent);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.get(parent).and_then(|node| node.parent);
        }
        chain
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoEntry {
    /// Derivation has started but not finished.
    InProgress,
    Succeeded(NodeId),
    Failed(Failure),
}

#[derive(Debug, Clone, Default)]
pub struct MemoTable {
    entries: HashMap<(Checkpoint, RuleId), MemoEntry>,
}

impl MemoTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, at: Checkpoint, rule: RuleId) -> Option<&MemoEntry> {
        self.entries.get(&(at, rule))
    }

    pub fn insert(&mut self, at: Checkpoint, rule: RuleId, entry: MemoEntry) {
        self.entries.insert((at, rule), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| matches!(entry, MemoEntry::Succeeded(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| matches!(entry, MemoEntry::Failed(_)))
            .count()
    }
}
