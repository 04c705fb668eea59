//! Character-level automaton
//!
//!     The automaton is a pure transition function: given one character and the set of active
//!     states, it returns the tags satisfied by that transition and the next set of active
//!     states. All memory of how the scan got here lives in the caller-held state set.
//!
//!     Several start states may be active at once, so overlapping tag classes (an identifier
//!     class and a keyword class, say) advance in lockstep. A transition can also retract
//!     tags. Retractions are applied after every insertion for the character, which is what
//!     lets a reserved word win over the generic class reached by the same transition.
//!
//!     State [ACCEPT] is a sentinel: it has no outgoing transitions and its presence in the
//!     next-state set means "the match ending here is acceptable".

use crate::transmuter::lexing::tag::{TagId, TagSet};
use std::collections::{BTreeSet, HashMap};

/// Automaton state identifier.
pub type StateId = u32;

/// The accept marker.
pub const ACCEPT: StateId = 0;

/// A set of active states.
pub type StateSet = BTreeSet<StateId>;

/// A predicate over characters, labelling a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharClass {
    Char(char),
    /// Inclusive range.
    Range(char, char),
    OneOf(Vec<char>),
    Any,
    Not(Box<CharClass>),
    Union(Vec<CharClass>),
}

impl CharClass {
    pub fn range(low: char, high: char) -> Self {
        CharClass::Range(low, high)
    }

    pub fn one_of(chars: &str) -> Self {
        CharClass::OneOf(chars.chars().collect())
    }

    pub fn union<I: IntoIterator<Item = CharClass>>(classes: I) -> Self {
        CharClass::Union(classes.into_iter().collect())
    }

    pub fn negate(self) -> Self {
        CharClass::Not(Box::new(self))
    }

    /// ASCII letters and underscore.
    pub fn word_start() -> Self {
        CharClass::union([
            CharClass::range('A', 'Z'),
            CharClass::Char('_'),
            CharClass::range('a', 'z'),
        ])
    }

    /// ASCII letters, digits and underscore.
    pub fn word_continue() -> Self {
        CharClass::union([CharClass::range('0', '9'), CharClass::word_start()])
    }

    pub fn matches(&self, ch: char) -> bool {
        match self {
            CharClass::Char(c) => *c == ch,
            CharClass::Range(low, high) => (*low..=*high).contains(&ch),
            CharClass::OneOf(chars) => chars.contains(&ch),
            CharClass::Any => true,
            CharClass::Not(inner) => !inner.matches(ch),
            CharClass::Union(classes) => classes.iter().any(|class| class.matches(ch)),
        }
    }
}

impl From<char> for CharClass {
    fn from(ch: char) -> Self {
        CharClass::Char(ch)
    }
}

/// One labelled edge of the automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: StateId,
    pub class: CharClass,
    pub to: Vec<StateId>,
    pub asserts: Vec<TagId>,
    pub retracts: Vec<TagId>,
}

impl Transition {
    pub fn new(from: StateId, class: impl Into<CharClass>) -> Self {
        Self {
            from,
            class: class.into(),
            to: Vec::new(),
            asserts: Vec::new(),
            retracts: Vec::new(),
        }
    }

    pub fn to<I: IntoIterator<Item = StateId>>(mut self, states: I) -> Self {
        self.to.extend(states);
        self
    }

    /// Mark the target as accepting.
    pub fn accept(mut self) -> Self {
        self.to.push(ACCEPT);
        self
    }

    pub fn asserting<I: IntoIterator<Item = TagId>>(mut self, tags: I) -> Self {
        self.asserts.extend(tags);
        self
    }

    pub fn retracting<I: IntoIterator<Item = TagId>>(mut self, tags: I) -> Self {
        self.retracts.extend(tags);
        self
    }
}

/// Result of feeding one character.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Step {
    /// Tags satisfied by this transition, retractions applied.
    pub tags: TagSet,
    /// Active states after the character, possibly including [ACCEPT].
    pub next: StateSet,
}

/// The transition table, indexed by source state.
#[derive(Debug, Clone, Default)]
pub struct Automaton {
    transitions: Vec<Transition>,
    outgoing: HashMap<StateId, Vec<usize>>,
}

impl Automaton {
    pub fn new(transitions: Vec<Transition>) -> Self {
        let mut outgoing: HashMap<StateId, Vec<usize>> = HashMap::new();
        for (index, transition) in transitions.iter().enumerate() {
            outgoing.entry(transition.from).or_default().push(index);
        }
        Self {
            transitions,
            outgoing,
        }
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Feed `ch` to every active state.
    pub fn step(&self, ch: char, active: &StateSet) -> Step {
        let mut step = Step::default();
        let mut retracted = TagSet::new();

        for state in active.iter().filter(|state| **state != ACCEPT) {
            let Some(edges) = self.outgoing.get(state) else {
                continue;
            };
            for transition in edges.iter().map(|index| &self.transitions[*index]) {
                if transition.class.matches(ch) {
                    step.tags.extend(transition.asserts.iter().copied());
                    retracted.extend(transition.retracts.iter().copied());
                    step.next.extend(transition.to.iter().copied());
                }
            }
        }

        for tag in &retracted {
            step.tags.remove(tag);
        }
        step
    }
}
