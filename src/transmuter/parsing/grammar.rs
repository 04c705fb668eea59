//! Grammars: named rules over a lexicon
//!
//!     A [Grammar] owns its [Lexicon], a table of named rule definitions and a list of start
//!     rules, each gated by a condition expression. It is immutable once built and shared by
//!     every parse run.
//!
//!     Rules are referenced by [RuleId], so definitions can be mutually recursive: declare the
//!     names first with [GrammarBuilder::declare], then [GrammarBuilder::define] the bodies.

use crate::transmuter::common::{ConditionExpr, Conditions};
use crate::transmuter::error::{GrammarError, ParseError};
use crate::transmuter::lexing::tag::{Lexicon, TagId};
use crate::transmuter::parsing::rule::{Features, Naming, Notation, Rule};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write;
use tracing::debug;

/// Identifier of a rule inside its grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RuleId(u32);

impl RuleId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDef {
    pub name: String,
    pub body: Rule,
}

/// A rule the driver may start from, when `when` holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRule {
    pub rule: RuleId,
    pub when: ConditionExpr,
}

#[derive(Debug, Clone)]
pub struct Grammar {
    lexicon: Lexicon,
    rules: Vec<RuleDef>,
    starts: Vec<StartRule>,
    features: Features,
}

impl Grammar {
    pub fn builder(lexicon: Lexicon) -> GrammarBuilder {
        GrammarBuilder::new(lexicon)
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn rules(&self) -> &[RuleDef] {
        &self.rules
    }

    pub fn rule(&self, id: RuleId) -> Option<&RuleDef> {
        self.rules.get(id.index())
    }

    pub fn find(&self, name: &str) -> Option<RuleId> {
        self.rules
            .iter()
            .position(|def| def.name == name)
            .map(|index| RuleId(index as u32))
    }

    /// Name of a rule, or `"?"` for ids from another grammar.
    pub fn name(&self, id: RuleId) -> &str {
        self.rule(id).map_or("?", |def| def.name.as_str())
    }

    pub fn starts(&self) -> &[StartRule] {
        &self.starts
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    pub fn is_enabled(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    /// The single start rule whose gate holds under `conditions`.
    pub fn select_start(&self, conditions: &Conditions) -> Result<RuleId, ParseError> {
        let matching: Vec<RuleId> = self
            .starts
            .iter()
            .filter(|start| start.when.holds(conditions))
            .map(|start| start.rule)
            .collect();
        match matching.as_slice() {
            [] => Err(ParseError::NoStart),
            [only] => {
                debug!(rule = self.name(*only), "selected start rule");
                Ok(*only)
            }
            many => Err(ParseError::MultipleStart {
                rules: many.iter().map(|id| self.name(*id).to_string()).collect(),
            }),
        }
    }

    pub fn notation<'a>(&'a self, rule: &'a Rule) -> Notation<'a, Grammar> {
        rule.notation(self)
    }

    /// The whole grammar as `Name: body;` lines.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for def in &self.rules {
            let _ = writeln!(out, "{}: {};", def.name, self.notation(&def.body));
        }
        out
    }
}

impl Naming for Grammar {
    fn tag_name(&self, tag: TagId) -> &str {
        self.lexicon.name(tag)
    }

    fn rule_name(&self, rule: RuleId) -> &str {
        self.name(rule)
    }
}

#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    lexicon: Lexicon,
    names: Vec<String>,
    bodies: Vec<Option<Rule>>,
    index: HashMap<String, RuleId>,
    starts: Vec<StartRule>,
    features: Features,
    errors: Vec<GrammarError>,
}

impl GrammarBuilder {
    pub fn new(lexicon: Lexicon) -> Self {
        Self {
            lexicon,
            names: Vec::new(),
            bodies: Vec::new(),
            index: HashMap::new(),
            starts: Vec::new(),
            features: Features::new(),
            errors: Vec::new(),
        }
    }

    /// Reserve an id for `name`. Declaring a name twice returns the same id.
    pub fn declare(&mut self, name: impl Into<String>) -> RuleId {
        let name = name.into();
        if let Some(id) = self.index.get(&name) {
            return *id;
        }
        let id = RuleId(self.names.len() as u32);
        self.index.insert(name.clone(), id);
        self.names.push(name);
        self.bodies.push(None);
        id
    }

    pub fn define(&mut self, id: RuleId, body: Rule) -> &mut Self {
        match self.bodies.get_mut(id.index()) {
            Some(slot) if slot.is_none() => *slot = Some(body),
            Some(_) => self
                .errors
                .push(GrammarError::DuplicateRule(self.names[id.index()].clone())),
            None => self.errors.push(GrammarError::UnknownRule(id.index())),
        }
        self
    }

    /// Declare and define in one step.
    pub fn rule(&mut self, name: impl Into<String>, body: Rule) -> RuleId {
        let id = self.declare(name);
        self.define(id, body);
        id
    }

    pub fn start(&mut self, rule: RuleId, when: ConditionExpr) -> &mut Self {
        self.starts.push(StartRule { rule, when });
        self
    }

    pub fn enable(&mut self, feature: impl Into<String>) -> &mut Self {
        self.features.insert(feature.into());
        self
    }

    pub fn enable_all<I, S>(&mut self, features: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features.extend(features.into_iter().map(Into::into));
        self
    }

    /// A terminal reference to the lexicon tag called `name`.
    pub fn terminal(&self, name: &str) -> Result<Rule, GrammarError> {
        self.lexicon
            .find(name)
            .map(Rule::Terminal)
            .ok_or_else(|| GrammarError::UndefinedTag(name.to_string()))
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }
        if self.starts.is_empty() {
            return Err(GrammarError::NoStartRules);
        }

        let rule_count = self.names.len();
        let tag_count = self.lexicon.tags().len();
        if let Some(start) = self.starts.iter().find(|s| s.rule.index() >= rule_count) {
            return Err(GrammarError::UnknownRule(start.rule.index()));
        }

        let mut rules = Vec::with_capacity(rule_count);
        for (name, body) in self.names.into_iter().zip(self.bodies) {
            let Some(body) = body else {
                return Err(GrammarError::UndefinedRule(name));
            };
            check_references(&body, rule_count, tag_count)?;
            rules.push(RuleDef {
                name,
                body: body.normalize(&self.features),
            });
        }

        Ok(Grammar {
            lexicon: self.lexicon,
            rules,
            starts: self.starts,
            features: self.features,
        })
    }
}

fn check_references(body: &Rule, rule_count: usize, tag_count: usize) -> Result<(), GrammarError> {
    let mut bad = None;
    body.walk(&mut |rule| match rule {
        Rule::NonTerminal(id) if id.index() >= rule_count => {
            bad.get_or_insert(GrammarError::UnknownRule(id.index()));
        }
        Rule::Terminal(tag) if tag.index() >= tag_count => {
            bad.get_or_insert(GrammarError::UnknownTag(tag.index()));
        }
        _ => {}
    });
    bad.map_or(Ok(()), Err)
}
