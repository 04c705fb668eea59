//! Conditions and condition expressions
//!
//!     A condition is a mode flag. The set of active conditions is fixed when a lexer is
//!     created and decides which automaton start states, which tags and which start rules
//!     are reachable. This is how one automaton serves several sub-languages that give the
//!     same characters different meanings (for instance a `lexical` and a `syntactic`
//!     section of a grammar description).
//!
//!     Gates are written as [ConditionExpr] values and evaluated against the active set.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// An opaque mode flag, identified by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Condition(String);

impl Condition {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Condition {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// The set of simultaneously active conditions.
pub type Conditions = BTreeSet<Condition>;

/// Build a condition set from names.
pub fn conditions<I, S>(names: I) -> Conditions
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Condition::new).collect()
}

/// A boolean expression over the active conditions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConditionExpr {
    /// Holds under any condition set.
    #[default]
    Always,
    /// Holds when the condition is active.
    Active(Condition),
    Not(Box<ConditionExpr>),
    /// Holds when every operand holds (and for no operands).
    All(Vec<ConditionExpr>),
    /// Holds when at least one operand holds.
    Any(Vec<ConditionExpr>),
}

impl ConditionExpr {
    pub fn active(name: impl Into<String>) -> Self {
        ConditionExpr::Active(Condition::new(name))
    }

    pub fn inactive(name: impl Into<String>) -> Self {
        ConditionExpr::Active(Condition::new(name)).negate()
    }

    pub fn negate(self) -> Self {
        match self {
            ConditionExpr::Not(inner) => *inner,
            other => ConditionExpr::Not(Box::new(other)),
        }
    }

    pub fn holds(&self, active: &Conditions) -> bool {
        match self {
            ConditionExpr::Always => true,
            ConditionExpr::Active(condition) => active.contains(condition),
            ConditionExpr::Not(inner) => !inner.holds(active),
            ConditionExpr::All(operands) => operands.iter().all(|op| op.holds(active)),
            ConditionExpr::Any(operands) => operands.iter().any(|op| op.holds(active)),
        }
    }
}

impl fmt::Display for ConditionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionExpr::Always => write!(f, "*"),
            ConditionExpr::Active(condition) => write!(f, "{}", condition),
            ConditionExpr::Not(inner) => write!(f, "!{}", inner),
            ConditionExpr::All(operands) => write_joined(f, operands, " && "),
            ConditionExpr::Any(operands) => write_joined(f, operands, " || "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, operands: &[ConditionExpr], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, op) in operands.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", op)?;
    }
    write!(f, ")")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_and_negation() {
        let active = conditions(["lexical"]);

        assert!(ConditionExpr::active("lexical").holds(&active));
        assert!(!ConditionExpr::active("syntactic").holds(&active));
        assert!(ConditionExpr::inactive("syntactic").holds(&active));
        assert!(ConditionExpr::Always.holds(&Conditions::new()));
    }

    #[test]
    fn test_double_negation_collapses() {
        let expr = ConditionExpr::active("a").negate().negate();
        assert_eq!(expr, ConditionExpr::active("a"));
    }

    #[test]
    fn test_all_and_any() {
        let active = conditions(["a", "b"]);
        let both = ConditionExpr::All(vec![ConditionExpr::active("a"), ConditionExpr::active("b")]);
        let either = ConditionExpr::Any(vec![ConditionExpr::active("c"), ConditionExpr::active("b")]);
        let neither = ConditionExpr::Any(vec![ConditionExpr::active("c"), ConditionExpr::active("d")]);

        assert!(both.holds(&active));
        assert!(either.holds(&active));
        assert!(!neither.holds(&active));
        assert!(ConditionExpr::All(vec![]).holds(&Conditions::new()));
        assert!(!ConditionExpr::Any(vec![]).holds(&active));
    }

    #[test]
    fn test_display() {
        let expr = ConditionExpr::Any(vec![
            ConditionExpr::active("a"),
            ConditionExpr::All(vec![ConditionExpr::active("b"), ConditionExpr::inactive("c")]),
        ]);
        assert_eq!(format!("{}", expr), "(a || (b && !c))");
    }
}
