//! Rule algebra
//!
//!     Grammar structure is a closed sum type. Every variant maps an input path set to an
//!     output path set (see the runtime for the evaluation semantics); the variant set is
//!     fixed so evaluation and rendering can match exhaustively.
//!
//!     Rules are normalised once when a grammar is built: feature switches are resolved,
//!     nested sequences and alternations are flattened, empty items dropped and single-item
//!     groups unwrapped. Normalisation never changes the set of paths a rule produces.
//!
//!     Notation:
//!
//!         a b          sequence
//!         [x]          optional
//!         {x}          zero or more
//!         (a | b)      alternation
//!         @feature(x)  switch

use crate::transmuter::lexing::tag::TagId;
use crate::transmuter::parsing::grammar::RuleId;
use std::collections::BTreeSet;
use std::fmt;

/// Enabled feature flags of a grammar build.
pub type Features = BTreeSet<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Sequence(Vec<Rule>),
    Optional(Box<Rule>),
    Repeat(Box<Rule>),
    Alternation(Vec<Rule>),
    Terminal(TagId),
    NonTerminal(RuleId),
    Switch { feature: String, body: Box<Rule> },
}

impl Rule {
    /// The rule matching nothing, which always succeeds without consuming.
    pub fn empty() -> Self {
        Rule::Sequence(Vec::new())
    }

    pub fn seq<I: IntoIterator<Item = Rule>>(items: I) -> Self {
        Rule::Sequence(items.into_iter().collect())
    }

    pub fn alt<I: IntoIterator<Item = Rule>>(alternatives: I) -> Self {
        Rule::Alternation(alternatives.into_iter().collect())
    }

    pub fn optional(body: Rule) -> Self {
        Rule::Optional(Box::new(body))
    }

    pub fn repeat(body: Rule) -> Self {
        Rule::Repeat(Box::new(body))
    }

    pub fn terminal(tag: TagId) -> Self {
        Rule::Terminal(tag)
    }

    pub fn nonterminal(rule: RuleId) -> Self {
        Rule::NonTerminal(rule)
    }

    pub fn switch(feature: impl Into<String>, body: Rule) -> Self {
        Rule::Switch {
            feature: feature.into(),
            body: Box::new(body),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Rule::Sequence(items) if items.is_empty())
    }

    /// Visit this rule and every nested rule, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Rule)) {
        visit(self);
        match self {
            Rule::Sequence(items) | Rule::Alternation(items) => {
                for item in items {
                    item.walk(visit);
                }
            }
            Rule::Optional(body) | Rule::Repeat(body) | Rule::Switch { body, .. } => {
                body.walk(visit)
            }
            Rule::Terminal(_) | Rule::NonTerminal(_) => {}
        }
    }

    /// Simplify the rule for a build with `features` enabled.
    pub fn normalize(self, features: &Features) -> Rule {
        match self {
            Rule::Switch { feature, body } => {
                if features.contains(&feature) {
                    body.normalize(features)
                } else {
                    Rule::empty()
                }
            }
            Rule::Sequence(items) => {
                let mut flat = Vec::with_capacity(items.len());
                for item in items {
                    match item.normalize(features) {
                        Rule::Sequence(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                unwrap_single(flat, Rule::Sequence)
            }
            Rule::Alternation(alternatives) => {
                let mut flat = Vec::with_capacity(alternatives.len());
                for alternative in alternatives {
                    match alternative.normalize(features) {
                        Rule::Alternation(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                // An empty alternation must keep failing, so only singletons unwrap.
                if flat.len() == 1 {
                    unwrap_single(flat, Rule::Alternation)
                } else {
                    Rule::Alternation(flat)
                }
            }
            Rule::Optional(body) => match body.normalize(features) {
                body if body.is_empty() => body,
                body @ (Rule::Optional(_) | Rule::Repeat(_)) => body,
                body => Rule::optional(body),
            },
            Rule::Repeat(body) => match body.normalize(features) {
                body if body.is_empty() => body,
                Rule::Optional(inner) => Rule::Repeat(inner),
                body @ Rule::Repeat(_) => body,
                body => Rule::repeat(body),
            },
            leaf @ (Rule::Terminal(_) | Rule::NonTerminal(_)) => leaf,
        }
    }

    /// Render in grammar notation using `names` for tags and rules.
    pub fn notation<'a, N: Naming + ?Sized>(&'a self, names: &'a N) -> Notation<'a, N> {
        Notation { rule: self, names }
    }
}

fn unwrap_single(mut items: Vec<Rule>, wrap: fn(Vec<Rule>) -> Rule) -> Rule {
    if items.len() == 1 {
        if let Some(only) = items.pop() {
            return only;
        }
    }
    wrap(items)
}

/// Name lookup used when rendering rules.
pub trait Naming {
    fn tag_name(&self, tag: TagId) -> &str;
    fn rule_name(&self, rule: RuleId) -> &str;
}

pub struct Notation<'a, N: ?Sized> {
    rule: &'a Rule,
    names: &'a N,
}

impl<'a, N: Naming + ?Sized> Notation<'a, N> {
    fn nested(&self, rule: &'a Rule) -> Notation<'a, N> {
        Notation {
            rule,
            names: self.names,
        }
    }

    fn joined(&self, f: &mut fmt::Formatter<'_>, items: &'a [Rule], sep: &str) -> fmt::Result {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                f.write_str(sep)?;
            }
            write!(f, "{}", self.nested(item))?;
        }
        Ok(())
    }
}

impl<N: Naming + ?Sized> fmt::Display for Notation<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule {
            Rule::Sequence(items) if items.is_empty() => f.write_str("()"),
            Rule::Sequence(items) => self.joined(f, items, " "),
            Rule::Alternation(alternatives) => {
                f.write_str("(")?;
                self.joined(f, alternatives, " | ")?;
                f.write_str(")")
            }
            Rule::Optional(body) => write!(f, "[{}]", self.nested(body)),
            Rule::Repeat(body) => write!(f, "{{{}}}", self.nested(body)),
            Rule::Switch { feature, body } => write!(f, "@{}({})", feature, self.nested(body)),
            Rule::Terminal(tag) => f.write_str(self.names.tag_name(*tag)),
            Rule::NonTerminal(rule) => f.write_str(self.names.rule_name(*rule)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Naming for Plain {
        fn tag_name(&self, tag: TagId) -> &str {
            ["a", "b", "c"].get(tag.index()).copied().unwrap_or("?")
        }

        fn rule_name(&self, rule: RuleId) -> &str {
            ["Root", "Item"].get(rule.index()).copied().unwrap_or("?")
        }
    }

    fn t(raw: u32) -> Rule {
        Rule::terminal(TagId::from_raw(raw))
    }

    fn none() -> Features {
        Features::new()
    }

    #[test]
    fn test_nested_sequences_flatten() {
        let rule = Rule::seq([t(0), Rule::seq([t(1), Rule::empty()]), t(2)]);
        assert_eq!(rule.normalize(&none()), Rule::seq([t(0), t(1), t(2)]));
    }

    #[test]
    fn test_singletons_unwrap() {
        assert_eq!(Rule::seq([t(0)]).normalize(&none()), t(0));
        assert_eq!(Rule::alt([t(1)]).normalize(&none()), t(1));
    }

    #[test]
    fn test_empty_alternation_is_kept() {
        assert_eq!(Rule::alt([]).normalize(&none()), Rule::alt([]));
    }

    #[test]
    fn test_nested_alternations_flatten() {
        let rule = Rule::alt([t(0), Rule::alt([t(1), t(2)])]);
        assert_eq!(rule.normalize(&none()), Rule::alt([t(0), t(1), t(2)]));
    }

    #[test]
    fn test_optional_and_repeat_collapse() {
        assert_eq!(
            Rule::optional(Rule::optional(t(0))).normalize(&none()),
            Rule::optional(t(0))
        );
        assert_eq!(
            Rule::repeat(Rule::repeat(t(0))).normalize(&none()),
            Rule::repeat(t(0))
        );
        assert_eq!(
            Rule::repeat(Rule::optional(t(0))).normalize(&none()),
            Rule::repeat(t(0))
        );
        assert!(Rule::optional(Rule::empty()).normalize(&none()).is_empty());
    }

    #[test]
    fn test_switch_resolution() {
        let rule = Rule::seq([t(0), Rule::switch("extra", t(1))]);
        let enabled = Features::from(["extra".to_string()]);

        assert_eq!(rule.clone().normalize(&none()), t(0));
        assert_eq!(rule.normalize(&enabled), Rule::seq([t(0), t(1)]));
    }

    #[test]
    fn test_notation() {
        let rule = Rule::seq([
            t(0),
            Rule::optional(t(1)),
            Rule::repeat(Rule::alt([Rule::nonterminal(RuleId::from_raw(1)), t(2)])),
            Rule::switch("extra", t(2)),
        ]);
        assert_eq!(
            rule.notation(&Plain).to_string(),
            "a [b] {(Item | c)} @extra(c)"
        );
        assert_eq!(Rule::empty().notation(&Plain).to_string(), "()");
    }

    #[test]
    fn test_walk_visits_every_node() {
        let rule = Rule::seq([t(0), Rule::optional(Rule::alt([t(1), t(2)]))]);
        let mut count = 0;
        rule.walk(&mut |_| count += 1);
        assert_eq!(count, 6);
    }
}
