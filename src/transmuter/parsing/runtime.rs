//! Path-set parsing runtime
//!
//!     A [ParseRun] evaluates rules against a lexer. Every rule maps an input path set to an
//!     output path set:
//!
//!         Terminal(t)      keep the end of the next token from each path when it carries `t`
//!         NonTerminal(r)   union of the outputs of `r` derived at each path (memoised)
//!         Sequence         thread the set through the items, left to right
//!         Optional(x)      input plus the output of `x`, or just the input if `x` fails
//!         Repeat(x)        input plus the outputs of repeated `x`, never fails
//!         Alternation      union over all alternatives, fails only if all fail
//!         Switch(f, x)     `x` when feature `f` is enabled, identity otherwise
//!
//!     No combinator commits to a derivation; all surviving paths are carried upwards and the
//!     driver picks the one that consumes the whole input.
//!
//! Memoisation
//!
//!     Each `(checkpoint, rule)` pair is derived at most once per run. An `InProgress` marker is
//!     stored before the rule body is evaluated, so a rule that reaches itself at the same
//!     checkpoint (left recursion) fails on the inner reference instead of looping.
//!
//!     A derived instance is only stored in the arena when it succeeds. Failures are memoised
//!     with the failure that caused them so repeated references report the same cause.

use crate::transmuter::lexing::lexer::{Checkpoint, Lexer};
use crate::transmuter::lexing::tag::TagId;
use crate::transmuter::parsing::arena::{MemoEntry, MemoTable, NodeArena, NodeId, NonTerminal};
use crate::transmuter::parsing::grammar::{Grammar, RuleId};
use crate::transmuter::parsing::paths::PathSet;
use crate::transmuter::parsing::rule::Rule;
use crate::transmuter::range::Position;
use serde::Serialize;
use tracing::{trace, warn};

/// Default bound on nested rule derivations.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Why a rule fragment produced no paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// No derivation survived. `rule` is the rule being derived when it happened.
    NoPath {
        rule: Option<RuleId>,
        at: Checkpoint,
    },
    /// Rule derivations nested deeper than the run allows.
    DepthLimit { rule: RuleId, at: Checkpoint },
}

impl Failure {
    /// Whether Optional, Repeat, Alternation and NonTerminal may swallow this failure.
    pub fn is_absorbable(&self) -> bool {
        matches!(self, Failure::NoPath { .. })
    }

    pub fn at(&self) -> Checkpoint {
        match self {
            Failure::NoPath { at, .. } | Failure::DepthLimit { at, .. } => *at,
        }
    }
}

/// Counters collected over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Rule bodies evaluated, one per distinct `(checkpoint, rule)` pair.
    pub evaluations: usize,
    /// References answered from the memo table.
    pub memo_hits: usize,
    /// References that found their own derivation still in progress.
    pub left_recursion_hits: usize,
    /// Deepest nesting of rule derivations.
    pub max_depth: usize,
}

#[derive(Debug)]
struct Frame {
    rule: RuleId,
    children: Vec<NodeId>,
}

pub struct ParseRun<'g> {
    grammar: &'g Grammar,
    lexer: Lexer<'g>,
    memo: MemoTable,
    arena: NodeArena,
    frames: Vec<Frame>,
    stats: ParseStats,
    max_depth: usize,
    furthest: Option<Position>,
}

impl<'g> ParseRun<'g> {
    pub fn new(grammar: &'g Grammar, lexer: Lexer<'g>) -> Self {
        Self {
            grammar,
            lexer,
            memo: MemoTable::new(),
            arena: NodeArena::new(),
            frames: Vec::new(),
            stats: ParseStats::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            furthest: None,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn lexer(&self) -> &Lexer<'g> {
        &self.lexer
    }

    pub fn lexer_mut(&mut self) -> &mut Lexer<'g> {
        &mut self.lexer
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut NodeArena {
        &mut self.arena
    }

    pub fn memo(&self) -> &MemoTable {
        &self.memo
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The furthest position at which an expected token was not found.
    pub fn furthest_failure(&self) -> Option<Position> {
        self.furthest
    }

    pub fn node(&self, id: NodeId) -> Option<&NonTerminal> {
        self.arena.get(id)
    }

    /// Output paths of a derived instance.
    pub fn output(&self, id: NodeId) -> PathSet {
        self.arena
            .get(id)
            .map(|node| node.output.clone())
            .unwrap_or_default()
    }

    pub fn into_parts(self) -> (NodeArena, ParseStats, Lexer<'g>) {
        (self.arena, self.stats, self.lexer)
    }

    /// Apply `rule` to every path in `input`.
    pub fn evaluate(&mut self, rule: &Rule, input: &PathSet) -> Result<PathSet, Failure> {
        match rule {
            Rule::Terminal(tag) => self.terminal(*tag, input),
            Rule::NonTerminal(id) => self.nonterminal(*id, input),
            Rule::Sequence(items) => {
                let mut paths = input.clone();
                for item in items {
                    paths = self.evaluate(item, &paths)?;
                }
                Ok(paths)
            }
            Rule::Optional(body) => match self.evaluate(body, input) {
                Ok(output) => Ok(input.union(&output)),
                Err(failure) if failure.is_absorbable() => Ok(input.clone()),
                Err(failure) => Err(failure),
            },
            Rule::Repeat(body) => self.repeat(body, input),
            Rule::Alternation(alternatives) => self.alternation(alternatives, input),
            Rule::Switch { feature, body } => {
                if self.grammar.is_enabled(feature) {
                    self.evaluate(body, input)
                } else {
                    Ok(input.clone())
                }
            }
        }
    }

    /// Derive `rule` at `at`, reusing the memoised outcome when there is one.
    pub fn derive(&mut self, rule: RuleId, at: Checkpoint) -> Result<NodeId, Failure> {
        match self.memo.get(at, rule) {
            Some(MemoEntry::Succeeded(node)) => {
                self.stats.memo_hits += 1;
                trace!(rule = self.grammar.name(rule), %at, "memo hit");
                return Ok(*node);
            }
            Some(MemoEntry::Failed(failure)) => {
                self.stats.memo_hits += 1;
                trace!(rule = self.grammar.name(rule), %at, "memo hit (failed)");
                return Err(failure.clone());
            }
            Some(MemoEntry::InProgress) => {
                self.stats.left_recursion_hits += 1;
                warn!(
                    rule = self.grammar.name(rule),
                    %at,
                    "left-recursive reference, failing this branch"
                );
                return Err(Failure::NoPath {
                    rule: Some(rule),
                    at,
                });
            }
            None => {}
        }

        if self.frames.len() >= self.max_depth {
            return Err(Failure::DepthLimit { rule, at });
        }

        let grammar = self.grammar;
        let Some(def) = grammar.rule(rule) else {
            return Err(Failure::NoPath {
                rule: Some(rule),
                at,
            });
        };

        trace!(rule = def.name.as_str(), %at, "deriving");
        self.memo.insert(at, rule, MemoEntry::InProgress);
        self.frames.push(Frame {
            rule,
            children: Vec::new(),
        });
        self.stats.evaluations += 1;
        self.stats.max_depth = self.stats.max_depth.max(self.frames.len());

        let result = self.evaluate(&def.body, &PathSet::single(at));
        let children = self
            .frames
            .pop()
            .map(|frame| frame.children)
            .unwrap_or_default();

        match result {
            Ok(output) => {
                let node = self.arena.alloc(NonTerminal {
                    rule,
                    start: at,
                    output,
                    parent: None,
                    children,
                });
                self.memo.insert(at, rule, MemoEntry::Succeeded(node));
                if let Some(parent) = self.frames.last_mut() {
                    parent.children.push(node);
                }
                Ok(node)
            }
            Err(failure) => {
                self.memo.insert(at, rule, MemoEntry::Failed(failure.clone()));
                Err(failure)
            }
        }
    }

    fn terminal(&mut self, tag: TagId, input: &PathSet) -> Result<PathSet, Failure> {
        let mut output = PathSet::new();
        for path in input.iter() {
            self.lexer.restore(path);
            match self.lexer.next_token() {
                Ok(token) if token.has_tag(tag) => {
                    output.insert(self.lexer.checkpoint());
                }
                Ok(token) => {
                    trace!(
                        expected = self.grammar.lexicon().name(tag),
                        found = token.text.as_str(),
                        "terminal mismatch"
                    );
                    self.note_failure(token.span.start);
                }
                Err(error) => self.note_failure(error.position()),
            }
        }
        if output.is_empty() {
            return Err(self.no_path(input));
        }
        Ok(output)
    }

    fn nonterminal(&mut self, rule: RuleId, input: &PathSet) -> Result<PathSet, Failure> {
        let mut output = PathSet::new();
        let mut cause = None;
        for path in input.iter() {
            match self.derive(rule, path) {
                Ok(node) => output.absorb(self.output(node)),
                Err(failure) if failure.is_absorbable() => cause = Some(failure),
                Err(failure) => return Err(failure),
            }
        }
        if output.is_empty() {
            return Err(cause.unwrap_or_else(|| self.no_path(input)));
        }
        Ok(output)
    }

    // Only paths new to the result are fed back, so nullable bodies terminate.
    fn repeat(&mut self, body: &Rule, input: &PathSet) -> Result<PathSet, Failure> {
        let mut result = input.clone();
        let mut frontier = input.clone();
        loop {
            match self.evaluate(body, &frontier) {
                Ok(output) => {
                    let fresh = output.difference(&result);
                    if fresh.is_empty() {
                        break;
                    }
                    for path in fresh.iter() {
                        result.insert(path);
                    }
                    frontier = fresh;
                }
                Err(failure) if failure.is_absorbable() => break,
                Err(failure) => return Err(failure),
            }
        }
        Ok(result)
    }

    fn alternation(&mut self, alternatives: &[Rule], input: &PathSet) -> Result<PathSet, Failure> {
        let mut output = PathSet::new();
        let mut cause = None;
        for alternative in alternatives {
            match self.evaluate(alternative, input) {
                Ok(paths) => output.absorb(paths),
                Err(failure) if failure.is_absorbable() => cause = Some(failure),
                Err(failure) => return Err(failure),
            }
        }
        if output.is_empty() {
            return Err(cause.unwrap_or_else(|| self.no_path(input)));
        }
        Ok(output)
    }

    fn no_path(&self, input: &PathSet) -> Failure {
        Failure::NoPath {
            rule: self.frames.last().map(|frame| frame.rule),
            at: input.first().unwrap_or(Checkpoint::START),
        }
    }

    fn note_failure(&mut self, position: Position) {
        if self.furthest.map_or(true, |furthest| position > furthest) {
            self.furthest = Some(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transmuter::common::{ConditionExpr, Conditions};
    use crate::transmuter::lexing::tag::Lexicon;
    use crate::transmuter::parsing::grammar::GrammarBuilder;

    fn grammar(define: impl FnOnce(&mut GrammarBuilder) -> RuleId) -> Grammar {
        let mut lexicon = Lexicon::builder();
        let space = lexicon.literal("Space", " ", ConditionExpr::Always);
        lexicon.ignore(space);
        lexicon.literal("a", "a", ConditionExpr::Always);
        lexicon.literal("b", "b", ConditionExpr::Always);
        lexicon.literal("c", "c", ConditionExpr::Always);
        let mut builder = Grammar::builder(lexicon.build().unwrap());
        let root = define(&mut builder);
        builder.start(root, ConditionExpr::Always);
        builder.build().unwrap()
    }

    fn parse_run<'g>(grammar: &'g Grammar, input: &str) -> ParseRun<'g> {
        ParseRun::new(grammar, Lexer::new(grammar.lexicon(), input, Conditions::new()))
    }

    fn t(grammar: &Grammar, name: &str) -> Rule {
        Rule::Terminal(grammar.lexicon().find(name).unwrap())
    }

    fn start() -> PathSet {
        PathSet::single(Checkpoint::START)
    }

    #[test]
    fn test_terminal_skips_ignorable_and_advances() {
        let g = grammar(|b| b.rule("Root", Rule::empty()));
        let mut run = parse_run(&g, "  a");
        let output = run.evaluate(&t(&g, "a"), &start()).unwrap();

        assert_eq!(output.indices(), vec![3]);
    }

    #[test]
    fn test_terminal_mismatch_fails_and_records_furthest() {
        let g = grammar(|b| b.rule("Root", Rule::empty()));
        let mut run = parse_run(&g, " b");
        let failure = run.evaluate(&t(&g, "a"), &start()).unwrap_err();

        assert!(failure.is_absorbable());
        assert_eq!(run.furthest_failure(), Some(Position::new(1, 1, 2)));
    }

    #[test]
    fn test_optional_keeps_input_on_failure() {
        let g = grammar(|b| b.rule("Root", Rule::empty()));
        let mut run = parse_run(&g, "ab");
        let rule = Rule::optional(Rule::seq([t(&g, "a"), t(&g, "c")]));
        let output = run.evaluate(&rule, &start()).unwrap();

        assert_eq!(output, start());
    }

    #[test]
    fn test_repeat_accumulates_every_iteration() {
        let g = grammar(|b| b.rule("Root", Rule::empty()));
        let mut run = parse_run(&g, "aaab");
        let output = run.evaluate(&Rule::repeat(t(&g, "a")), &start()).unwrap();

        assert_eq!(output.indices(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_repeat_of_nullable_body_terminates() {
        let g = grammar(|b| b.rule("Root", Rule::empty()));
        let mut run = parse_run(&g, "aa");
        let rule = Rule::Repeat(Box::new(Rule::optional(t(&g, "a"))));
        let output = run.evaluate(&rule, &start()).unwrap();

        assert_eq!(output.indices(), vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_alternation_fails() {
        let g = grammar(|b| b.rule("Root", Rule::empty()));
        let mut run = parse_run(&g, "a");
        assert!(run.evaluate(&Rule::alt([]), &start()).is_err());
    }

    #[test]
    fn test_switch_follows_grammar_features() {
        let g = grammar(|b| {
            b.enable("on");
            b.rule("Root", Rule::empty())
        });
        let mut run = parse_run(&g, "a");
        let on = Rule::switch("on", t(&g, "a"));
        let off = Rule::switch("off", t(&g, "a"));

        assert_eq!(run.evaluate(&on, &start()).unwrap().indices(), vec![1]);
        assert_eq!(run.evaluate(&off, &start()).unwrap(), start());
    }

    #[test]
    fn test_derive_builds_children_and_memoises() {
        let mut lexicon = Lexicon::builder();
        lexicon.literal("a", "a", ConditionExpr::Always);
        let lexicon = lexicon.build().unwrap();
        let a = Rule::Terminal(lexicon.find("a").unwrap());
        let mut builder = Grammar::builder(lexicon);
        let item = builder.rule("Item", a);
        let root = builder.rule(
            "Root",
            Rule::seq([Rule::nonterminal(item), Rule::nonterminal(item)]),
        );
        builder.start(root, ConditionExpr::Always);
        let g = builder.build().unwrap();

        let mut run = parse_run(&g, "aa");
        let node = run.derive(root, Checkpoint::START).unwrap();
        let again = run.derive(root, Checkpoint::START).unwrap();
        let root_node = run.node(node).unwrap();

        assert_eq!(node, again);
        assert_eq!(root_node.output.indices(), vec![2]);
        assert_eq!(root_node.children.len(), 2);
        assert_eq!(run.stats().evaluations, 3);
        assert_eq!(run.stats().memo_hits, 1);
        for child in &root_node.children {
            assert_eq!(run.node(*child).unwrap().parent, Some(node));
        }
    }

    #[test]
    fn test_left_recursion_fails_the_inner_reference() {
        let g = grammar(|b| {
            let expr = b.declare("Expr");
            let a = b.terminal("a").unwrap();
            let body = Rule::alt([Rule::seq([Rule::nonterminal(expr), a.clone()]), a]);
            b.define(expr, body);
            expr
        });
        let expr = g.find("Expr").unwrap();
        let mut run = parse_run(&g, "aa");
        let node = run.derive(expr, Checkpoint::START).unwrap();

        assert_eq!(run.output(node).indices(), vec![1]);
        assert_eq!(run.stats().left_recursion_hits, 1);
    }

    #[test]
    fn test_depth_limit_is_not_absorbed() {
        let g = grammar(|b| {
            let nest = b.declare("Nest");
            let a = b.terminal("a").unwrap();
            b.define(
                nest,
                Rule::optional(Rule::seq([a, Rule::nonterminal(nest)])),
            );
            nest
        });
        let nest = g.find("Nest").unwrap();
        let mut run = parse_run(&g, "aaaaaa").with_max_depth(3);
        let failure = run.derive(nest, Checkpoint::START).unwrap_err();

        assert!(matches!(failure, Failure::DepthLimit { .. }));
        assert!(!failure.is_absorbable());
    }
}
