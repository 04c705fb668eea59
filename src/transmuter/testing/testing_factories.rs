//! Fixture grammars for tests
//!
//! Each factory returns a small, fully built grammar (or lexicon) whose behavior is easy to
//! reason about by hand:
//!
//! - [optional_grammar]: `Root: A [B];` over the letters `a`, `b`, `c` and ignorable spaces
//! - [choice_grammar]: `Root: (A | A A);`, ambiguous until the whole input is considered
//! - [sum_grammar]: `Sum: Term {Plus Term}; Term: (Number | Identifier | "(" Sum ")");`
//! - [keyword_lexicon]: identifiers, a `start` keyword and a `/` only seen under `syntactic`

use crate::transmuter::common::ConditionExpr;
use crate::transmuter::error::GrammarError;
use crate::transmuter::lexing::automaton::CharClass;
use crate::transmuter::lexing::tag::{Lexicon, LexiconBuilder};
use crate::transmuter::parsing::grammar::Grammar;
use crate::transmuter::parsing::rule::Rule;

fn letters() -> LexiconBuilder {
    let mut lexicon = Lexicon::builder();
    let space = lexicon.literal("Space", " ", ConditionExpr::Always);
    lexicon.ignore(space);
    lexicon.literal("A", "a", ConditionExpr::Always);
    lexicon.literal("B", "b", ConditionExpr::Always);
    lexicon.literal("C", "c", ConditionExpr::Always);
    lexicon
}

pub fn optional_grammar() -> Result<Grammar, GrammarError> {
    let mut builder = Grammar::builder(letters().build()?);
    let a = builder.terminal("A")?;
    let b = builder.terminal("B")?;
    let root = builder.rule("Root", Rule::seq([a, Rule::optional(b)]));
    builder.start(root, ConditionExpr::Always);
    builder.build()
}

pub fn choice_grammar() -> Result<Grammar, GrammarError> {
    let mut builder = Grammar::builder(letters().build()?);
    let a = builder.terminal("A")?;
    let root = builder.rule(
        "Root",
        Rule::alt([a.clone(), Rule::seq([a.clone(), a])]),
    );
    builder.start(root, ConditionExpr::Always);
    builder.build()
}

pub fn sum_grammar() -> Result<Grammar, GrammarError> {
    let mut lexicon = Lexicon::builder();
    let blank = CharClass::one_of(" \t\n");
    let whitespace = lexicon.word("Whitespace", blank.clone(), blank, ConditionExpr::Always);
    lexicon.ignore(whitespace);
    let digits = CharClass::range('0', '9');
    lexicon.word("Number", digits.clone(), digits, ConditionExpr::Always);
    lexicon.word(
        "Identifier",
        CharClass::word_start(),
        CharClass::word_continue(),
        ConditionExpr::Always,
    );
    lexicon.literal("Plus", "+", ConditionExpr::Always);
    lexicon.literal("LeftParenthesis", "(", ConditionExpr::Always);
    lexicon.literal("RightParenthesis", ")", ConditionExpr::Always);

    let mut builder = Grammar::builder(lexicon.build()?);
    let number = builder.terminal("Number")?;
    let identifier = builder.terminal("Identifier")?;
    let plus = builder.terminal("Plus")?;
    let open = builder.terminal("LeftParenthesis")?;
    let close = builder.terminal("RightParenthesis")?;

    let sum = builder.declare("Sum");
    let term = builder.declare("Term");
    builder.define(
        sum,
        Rule::seq([
            Rule::nonterminal(term),
            Rule::repeat(Rule::seq([plus, Rule::nonterminal(term)])),
        ]),
    );
    builder.define(
        term,
        Rule::alt([
            number,
            identifier,
            Rule::seq([open, Rule::nonterminal(sum), close]),
        ]),
    );
    builder.start(sum, ConditionExpr::Always);
    builder.build()
}

pub fn keyword_lexicon() -> Result<Lexicon, GrammarError> {
    let mut builder = Lexicon::builder();
    let blank = CharClass::one_of(" \t\n");
    let whitespace = builder.word("Whitespace", blank.clone(), blank, ConditionExpr::Always);
    builder.ignore(whitespace);
    let identifier = builder.word(
        "Identifier",
        CharClass::word_start(),
        CharClass::word_continue(),
        ConditionExpr::Always,
    );
    builder.keyword("Start", "start", ConditionExpr::Always, &[identifier]);
    builder.literal("Solidus", "/", ConditionExpr::active("syntactic"));
    builder.build()
}
