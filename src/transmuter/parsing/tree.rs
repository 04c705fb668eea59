//! Syntax trees and derivation extraction
//!
//!     Path sets only record where a rule can end, not how. Once the driver has picked the
//!     winning path, [Extractor] rebuilds one concrete derivation from the root's start to
//!     that path by replaying the rule bodies against the memo table and the lexer.
//!
//!     Combinators do not create nodes: a [Branch] lists, in order, the tokens and the
//!     sub-branches its rule matched. Where a derivation is ambiguous the extractor prefers,
//!     in order, longer sub-matches, earlier alternatives, and taking optional or repeated
//!     parts over skipping them.

use crate::transmuter::lexing::lexer::Checkpoint;
use crate::transmuter::lexing::token::Token;
use crate::transmuter::parsing::grammar::RuleId;
use crate::transmuter::parsing::paths::PathSet;
use crate::transmuter::parsing::rule::Rule;
use crate::transmuter::parsing::runtime::{Failure, ParseRun};
use crate::transmuter::range::Span;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// A matched token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leaf {
    pub tags: Vec<String>,
    pub text: String,
    pub span: Span,
}

impl Leaf {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|name| name == tag)
    }
}

/// A derived rule instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub rule: String,
    pub span: Span,
    pub children: Vec<TreeNode>,
}

impl Branch {
    pub fn branches(&self) -> impl Iterator<Item = &Branch> {
        self.children.iter().filter_map(TreeNode::as_branch)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Leaf> {
        self.children.iter().filter_map(TreeNode::as_leaf)
    }

    /// Every token under this branch, in input order.
    pub fn tokens(&self) -> Vec<&Leaf> {
        let mut out = Vec::new();
        collect_leaves(self, &mut out);
        out
    }

    /// The token texts joined by single spaces.
    pub fn text(&self) -> String {
        self.tokens()
            .iter()
            .map(|leaf| leaf.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Every branch below this one (itself included) instantiating `rule`.
    pub fn find_all<'a>(&'a self, rule: &str) -> Vec<&'a Branch> {
        let mut out = Vec::new();
        collect_branches(self, rule, &mut out);
        out
    }
}

fn collect_leaves<'a>(branch: &'a Branch, out: &mut Vec<&'a Leaf>) {
    for child in &branch.children {
        match child {
            TreeNode::Leaf(leaf) => out.push(leaf),
            TreeNode::Branch(inner) => collect_leaves(inner, out),
        }
    }
}

fn collect_branches<'a>(branch: &'a Branch, rule: &str, out: &mut Vec<&'a Branch>) {
    if branch.rule == rule {
        out.push(branch);
    }
    for inner in branch.branches() {
        collect_branches(inner, rule, out);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Branch(Branch),
    Leaf(Leaf),
}

impl TreeNode {
    pub fn as_branch(&self) -> Option<&Branch> {
        match self {
            TreeNode::Branch(branch) => Some(branch),
            TreeNode::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            TreeNode::Leaf(leaf) => Some(leaf),
            TreeNode::Branch(_) => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TreeNode::Branch(branch) => branch.span,
            TreeNode::Leaf(leaf) => leaf.span,
        }
    }
}

/// The result of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxTree {
    pub root: Branch,
}

impl SyntaxTree {
    pub fn new(root: Branch) -> Self {
        Self { root }
    }

    pub fn rule(&self) -> &str {
        &self.root.rule
    }

    pub fn span(&self) -> Span {
        self.root.span
    }

    pub fn children(&self) -> &[TreeNode] {
        &self.root.children
    }
}

type Key = (RuleId, Checkpoint, Checkpoint);

/// Rebuilds one derivation of a rule between two checkpoints.
pub struct Extractor<'r, 'g> {
    run: &'r mut ParseRun<'g>,
    active: HashSet<Key>,
    built: HashMap<Key, Branch>,
}

impl<'r, 'g> Extractor<'r, 'g> {
    pub fn new(run: &'r mut ParseRun<'g>) -> Self {
        Self {
            run,
            active: HashSet::new(),
            built: HashMap::new(),
        }
    }

    /// A derivation of `rule` spanning exactly `start..end`, if there is one.
    pub fn branch(
        &mut self,
        rule: RuleId,
        start: Checkpoint,
        end: Checkpoint,
    ) -> Result<Option<Branch>, Failure> {
        let key = (rule, start, end);
        if let Some(branch) = self.built.get(&key) {
            return Ok(Some(branch.clone()));
        }
        // Re-entering the same rule over the same stretch cannot lead to a finite tree.
        if !self.active.insert(key) {
            return Ok(None);
        }

        // Branch nesting follows rule nesting, so it shares the derivation bound.
        if self.active.len() > self.run.max_depth() {
            self.active.remove(&key);
            return Err(Failure::DepthLimit { rule, at: start });
        }

        let grammar = self.run.grammar();
        let derived = match grammar.rule(rule) {
            Some(def) => self.item(&def.body, start, end),
            None => Ok(None),
        };
        self.active.remove(&key);

        let Some(children) = derived? else {
            return Ok(None);
        };
        let branch = Branch {
            rule: grammar.name(rule).to_string(),
            span: Span::new(start.position(), end.position()),
            children,
        };
        self.built.insert(key, branch.clone());
        Ok(Some(branch))
    }

    // Match a single rule fragment spanning exactly `start..end`.
    fn item(
        &mut self,
        rule: &'g Rule,
        start: Checkpoint,
        end: Checkpoint,
    ) -> Result<Option<Vec<TreeNode>>, Failure> {
        if start > end {
            return Ok(None);
        }
        match rule {
            Rule::Terminal(tag) => {
                let Some(token) = self.token_at(start) else {
                    return Ok(None);
                };
                if !token.has_tag(*tag) || Checkpoint::from(token.span.end) != end {
                    return Ok(None);
                }
                Ok(Some(vec![TreeNode::Leaf(self.leaf(token))]))
            }
            Rule::NonTerminal(id) => {
                let node = match self.run.derive(*id, start) {
                    Ok(node) => node,
                    Err(failure) if failure.is_absorbable() => return Ok(None),
                    Err(failure) => return Err(failure),
                };
                if !self.run.output(node).contains(end) {
                    return Ok(None);
                }
                Ok(self
                    .branch(*id, start, end)?
                    .map(|branch| vec![TreeNode::Branch(branch)]))
            }
            Rule::Sequence(items) => self.sequence(items, start, end),
            Rule::Optional(body) => {
                if let Some(found) = self.item(body, start, end)? {
                    return Ok(Some(found));
                }
                Ok((start == end).then(Vec::new))
            }
            Rule::Repeat(body) => self.repeat(body, start, end),
            Rule::Alternation(alternatives) => {
                for alternative in alternatives {
                    if let Some(found) = self.item(alternative, start, end)? {
                        return Ok(Some(found));
                    }
                }
                Ok(None)
            }
            Rule::Switch { feature, body } => {
                if self.run.grammar().is_enabled(feature) {
                    self.item(body, start, end)
                } else {
                    Ok((start == end).then(Vec::new))
                }
            }
        }
    }

    // Items are chosen left to right. Each one takes its furthest end from which the rest
    // of the sequence can still reach `end`.
    fn sequence(
        &mut self,
        items: &'g [Rule],
        start: Checkpoint,
        end: Checkpoint,
    ) -> Result<Option<Vec<TreeNode>>, Failure> {
        let mut layers = vec![PathSet::single(start)];
        for item in items {
            let Some(reached) = layers.last() else {
                return Ok(None);
            };
            let next = self.reach(item, reached.clone(), end)?;
            if next.is_empty() {
                return Ok(None);
            }
            layers.push(next);
        }

        // viable[i] holds the paths before item i from which `end` is still reachable.
        let mut viable = vec![PathSet::new(); items.len() + 1];
        viable[items.len()] = PathSet::single(end);
        for (i, item) in items.iter().enumerate().rev() {
            let mut keep = PathSet::new();
            for path in layers[i].iter() {
                let ends = self.reach(item, PathSet::single(path), end)?;
                if ends.iter().any(|mid| viable[i + 1].contains(mid)) {
                    keep.insert(path);
                }
            }
            viable[i] = keep;
        }
        if !viable[0].contains(start) {
            return Ok(None);
        }

        let mut children = Vec::new();
        let mut at = start;
        for (i, item) in items.iter().enumerate() {
            let ends = self.reach(item, PathSet::single(at), end)?;
            let mut taken = None;
            for mid in ends.iter().rev().filter(|mid| viable[i + 1].contains(*mid)) {
                if let Some(nodes) = self.item(item, at, mid)? {
                    taken = Some((mid, nodes));
                    break;
                }
            }
            let Some((mid, nodes)) = taken else {
                return Ok(None);
            };
            children.extend(nodes);
            at = mid;
        }
        Ok(Some(children))
    }

    // Iterations are walked forward in a loop, so long lists do not deepen the stack. Only
    // iterations that consume input are taken.
    fn repeat(
        &mut self,
        body: &'g Rule,
        start: Checkpoint,
        end: Checkpoint,
    ) -> Result<Option<Vec<TreeNode>>, Failure> {
        if start == end {
            return Ok(Some(Vec::new()));
        }

        let mut steps: BTreeMap<Checkpoint, Vec<Checkpoint>> = BTreeMap::new();
        let mut pending = vec![start];
        while let Some(path) = pending.pop() {
            if steps.contains_key(&path) {
                continue;
            }
            let next: Vec<Checkpoint> = self
                .reach(body, PathSet::single(path), end)?
                .iter()
                .filter(|mid| *mid > path)
                .collect();
            pending.extend(next.iter().copied());
            steps.insert(path, next);
        }

        // Every step moves forward, so walking backwards settles each successor first.
        let mut viable = BTreeSet::new();
        for (path, next) in steps.iter().rev() {
            if *path == end || next.iter().any(|mid| viable.contains(mid)) {
                viable.insert(*path);
            }
        }
        if !viable.contains(&start) {
            return Ok(None);
        }

        let mut children = Vec::new();
        let mut at = start;
        while at != end {
            let candidates: Vec<Checkpoint> = steps
                .get(&at)
                .map(|next| {
                    next.iter()
                        .rev()
                        .filter(|mid| viable.contains(*mid))
                        .copied()
                        .collect()
                })
                .unwrap_or_default();
            let mut taken = None;
            for mid in candidates {
                if let Some(nodes) = self.item(body, at, mid)? {
                    taken = Some((mid, nodes));
                    break;
                }
            }
            let Some((mid, nodes)) = taken else {
                return Ok(None);
            };
            children.extend(nodes);
            at = mid;
        }
        Ok(Some(children))
    }

    // Ends of `rule` from `paths` that do not pass `limit`. A plain no-path is just empty.
    fn reach(
        &mut self,
        rule: &Rule,
        paths: PathSet,
        limit: Checkpoint,
    ) -> Result<PathSet, Failure> {
        match self.run.evaluate(rule, &paths) {
            Ok(ends) => Ok(ends.into_iter().filter(|mid| *mid <= limit).collect()),
            Err(failure) if failure.is_absorbable() => Ok(PathSet::new()),
            Err(failure) => Err(failure),
        }
    }

    fn token_at(&mut self, at: Checkpoint) -> Option<Token> {
        let lexer = self.run.lexer_mut();
        lexer.restore(at);
        lexer.next_token().ok()
    }

    fn leaf(&self, token: Token) -> Leaf {
        Leaf {
            tags: self.run.grammar().lexicon().names(&token.tags),
            text: token.text,
            span: token.span,
        }
    }
}
