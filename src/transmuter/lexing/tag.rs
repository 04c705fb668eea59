//! Terminal tags and the lexicon that owns them
//!
//!     A tag is a lexical category. Each tag owns groups of automaton start states, every group
//!     guarded by a [ConditionExpr]; a tag whose groups are all closed under the active
//!     conditions is unreachable. Ignorable tags (whitespace, comments) are recognised like any
//!     other but never reach the grammar.
//!
//!     The [Lexicon] bundles the tags with the shared [Automaton]. It is assembled with a
//!     [LexiconBuilder], which hands out fresh state ids and offers shortcuts for the usual
//!     shapes (fixed literals, keywords overriding a generic class, identifier-like words).

use crate::transmuter::common::{ConditionExpr, Conditions};
use crate::transmuter::error::GrammarError;
use crate::transmuter::lexing::automaton::{Automaton, CharClass, StateId, StateSet, Transition, ACCEPT};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Identifier of a tag inside its lexicon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TagId(u32);

impl TagId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A set of tags satisfied by one match.
pub type TagSet = BTreeSet<TagId>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct StartGroup {
    when: ConditionExpr,
    states: Vec<StateId>,
}

/// A lexical category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalTag {
    id: TagId,
    name: String,
    starts: Vec<StartGroup>,
    ignore: bool,
}

impl TerminalTag {
    pub fn id(&self) -> TagId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore
    }

    /// Start states opened by this tag under `conditions`.
    pub fn start_states(&self, conditions: &Conditions) -> StateSet {
        self.starts
            .iter()
            .filter(|group| group.when.holds(conditions))
            .flat_map(|group| group.states.iter().copied())
            .collect()
    }
}

/// Tags plus the automaton that recognises them.
#[derive(Debug, Clone)]
pub struct Lexicon {
    tags: Vec<TerminalTag>,
    automaton: Automaton,
}

impl Lexicon {
    pub fn builder() -> LexiconBuilder {
        LexiconBuilder::new()
    }

    pub fn tags(&self) -> &[TerminalTag] {
        &self.tags
    }

    pub fn tag(&self, id: TagId) -> Option<&TerminalTag> {
        self.tags.get(id.index())
    }

    pub fn find(&self, name: &str) -> Option<TagId> {
        self.tags.iter().find(|tag| tag.name == name).map(|tag| tag.id)
    }

    /// Name of a tag, or `"?"` for ids from another lexicon.
    pub fn name(&self, id: TagId) -> &str {
        self.tag(id).map_or("?", TerminalTag::name)
    }

    pub fn names(&self, tags: &TagSet) -> Vec<String> {
        tags.iter().map(|id| self.name(*id).to_string()).collect()
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// Union of the start states of every tag reachable under `conditions`.
    pub fn start_states(&self, conditions: &Conditions) -> StateSet {
        self.tags
            .iter()
            .flat_map(|tag| tag.start_states(conditions))
            .collect()
    }

    pub fn ignored(&self) -> TagSet {
        self.tags
            .iter()
            .filter(|tag| tag.ignore)
            .map(|tag| tag.id)
            .collect()
    }
}

/// Incremental construction of a [Lexicon].
#[derive(Debug, Clone)]
pub struct LexiconBuilder {
    tags: Vec<TerminalTag>,
    transitions: Vec<Transition>,
    next_state: StateId,
    errors: Vec<GrammarError>,
}

impl Default for LexiconBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconBuilder {
    pub fn new() -> Self {
        Self {
            tags: Vec::new(),
            transitions: Vec::new(),
            next_state: ACCEPT + 1,
            errors: Vec::new(),
        }
    }

    /// Declare a new tag with no start states yet.
    pub fn tag(&mut self, name: impl Into<String>) -> TagId {
        let id = TagId(self.tags.len() as u32);
        self.tags.push(TerminalTag {
            id,
            name: name.into(),
            starts: Vec::new(),
            ignore: false,
        });
        id
    }

    pub fn ignore(&mut self, tag: TagId) -> &mut Self {
        match self.tags.get_mut(tag.index()) {
            Some(entry) => entry.ignore = true,
            None => self.errors.push(GrammarError::UnknownTag(tag.index())),
        }
        self
    }

    /// Allocate a fresh automaton state.
    pub fn state(&mut self) -> StateId {
        let state = self.next_state;
        self.next_state += 1;
        state
    }

    /// Open `states` for `tag` whenever `when` holds.
    pub fn start<I>(&mut self, tag: TagId, when: ConditionExpr, states: I) -> &mut Self
    where
        I: IntoIterator<Item = StateId>,
    {
        let states: Vec<StateId> = states.into_iter().collect();
        match self.tags.get_mut(tag.index()) {
            Some(entry) if states.contains(&ACCEPT) => self
                .errors
                .push(GrammarError::AcceptAsStart(entry.name.clone())),
            Some(entry) => entry.starts.push(StartGroup { when, states }),
            None => self.errors.push(GrammarError::UnknownTag(tag.index())),
        }
        self
    }

    pub fn transition(&mut self, transition: Transition) -> &mut Self {
        self.transitions.push(transition);
        self
    }

    /// A tag matching exactly `text`.
    pub fn literal(&mut self, name: impl Into<String>, text: &str, when: ConditionExpr) -> TagId {
        let tag = self.tag(name);
        self.chain(tag, text, when, &[]);
        tag
    }

    /// A tag matching exactly `text` that retracts `overrides` on its final character.
    pub fn keyword(
        &mut self,
        name: impl Into<String>,
        text: &str,
        when: ConditionExpr,
        overrides: &[TagId],
    ) -> TagId {
        let tag = self.tag(name);
        self.chain(tag, text, when, overrides);
        tag
    }

    /// A tag matching one `first` character followed by any number of `rest` characters.
    pub fn word(
        &mut self,
        name: impl Into<String>,
        first: CharClass,
        rest: CharClass,
        when: ConditionExpr,
    ) -> TagId {
        let tag = self.tag(name);
        let head = self.state();
        let tail = self.state();
        self.start(tag, when, [head]);
        self.transition(
            Transition::new(head, first)
                .to([tail])
                .accept()
                .asserting([tag]),
        );
        self.transition(
            Transition::new(tail, rest)
                .to([tail])
                .accept()
                .asserting([tag]),
        );
        tag
    }

    fn chain(&mut self, tag: TagId, text: &str, when: ConditionExpr, overrides: &[TagId]) {
        let chars: Vec<char> = text.chars().collect();
        let Some((last, init)) = chars.split_last() else {
            return;
        };
        let head = self.state();
        self.start(tag, when, [head]);

        let mut current = head;
        for ch in init {
            let next = self.state();
            self.transition(Transition::new(current, *ch).to([next]));
            current = next;
        }
        self.transition(
            Transition::new(current, *last)
                .accept()
                .asserting([tag])
                .retracting(overrides.iter().copied()),
        );
    }

    pub fn build(self) -> Result<Lexicon, GrammarError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }

        let mut seen = HashSet::new();
        for tag in &self.tags {
            if !seen.insert(tag.name.as_str()) {
                return Err(GrammarError::DuplicateTag(tag.name.clone()));
            }
        }

        let known = self.tags.len();
        for transition in &self.transitions {
            if let Some(bad) = transition
                .asserts
                .iter()
                .chain(transition.retracts.iter())
                .find(|tag| tag.index() >= known)
            {
                return Err(GrammarError::UnknownTag(bad.index()));
            }
        }

        Ok(Lexicon {
            tags: self.tags,
            automaton: Automaton::new(self.transitions),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transmuter::common::conditions;

    #[test]
    fn test_literal_creates_state_chain() {
        let mut builder = Lexicon::builder();
        let arrow = builder.literal("Arrow", "->", ConditionExpr::Always);
        let lexicon = builder.build().unwrap();

        let starts = lexicon.start_states(&Conditions::new());
        assert_eq!(starts.len(), 1);

        let automaton = lexicon.automaton();
        let first = automaton.step('-', &starts);
        assert!(first.tags.is_empty());
        let second = automaton.step('>', &first.next);
        assert_eq!(second.tags, TagSet::from([arrow]));
        assert!(second.next.contains(&ACCEPT));
    }

    #[test]
    fn test_condition_gating_hides_start_states() {
        let mut builder = Lexicon::builder();
        let slash = builder.literal("Solidus", "/", ConditionExpr::active("syntactic"));
        let lexicon = builder.build().unwrap();

        assert!(lexicon.start_states(&conditions(["lexical"])).is_empty());
        assert!(!lexicon.start_states(&conditions(["syntactic"])).is_empty());
        assert_eq!(lexicon.find("Solidus"), Some(slash));
    }

    #[test]
    fn test_ignored_tags() {
        let mut builder = Lexicon::builder();
        let space = builder.literal("Space", " ", ConditionExpr::Always);
        builder.ignore(space);
        builder.literal("Dot", ".", ConditionExpr::Always);
        let lexicon = builder.build().unwrap();

        assert_eq!(lexicon.ignored(), TagSet::from([space]));
        assert!(lexicon.tag(space).unwrap().is_ignored());
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let mut builder = Lexicon::builder();
        builder.literal("Dot", ".", ConditionExpr::Always);
        builder.literal("Dot", "..", ConditionExpr::Always);

        assert_eq!(
            builder.build().unwrap_err(),
            GrammarError::DuplicateTag("Dot".to_string())
        );
    }

    #[test]
    fn test_accept_marker_rejected_as_start() {
        let mut builder = Lexicon::builder();
        let tag = builder.tag("Broken");
        builder.start(tag, ConditionExpr::Always, [ACCEPT]);

        assert_eq!(
            builder.build().unwrap_err(),
            GrammarError::AcceptAsStart("Broken".to_string())
        );
    }

    #[test]
    fn test_unknown_tag_in_transition_rejected() {
        let mut builder = Lexicon::builder();
        let state = builder.state();
        builder.transition(
            Transition::new(state, 'x')
                .accept()
                .asserting([TagId::from_raw(7)]),
        );

        assert_eq!(builder.build().unwrap_err(), GrammarError::UnknownTag(7));
    }
}
