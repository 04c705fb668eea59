//! Aether, a grammar-description language
//!
//!     An aether file is a list of productions. One automaton serves two sub-languages,
//!     selected by the active conditions:
//!
//!         lexical     productions describe tokens with regular-expression atoms:
//!                         Digits (ignore): [0-9]+ \. ? ;
//!         syntactic   productions describe rules with optional and iteration brackets:
//!                         Root (start): Item {Item} [Tail];
//!
//!     Both share the production header (name, condition, specifiers), conditions such as
//!     `@lexical && !debug || x`, grouping with parentheses and selection with `|`. Tokens that
//!     only make sense in one sub-language are gated by condition, so the other sub-language's
//!     constructs simply have no tokens to match.
//!
//!     The `precedences` feature adds a `> A, B` clause to the header.

use crate::transmuter::common::{conditions, ConditionExpr, Conditions};
use crate::transmuter::error::GrammarError;
use crate::transmuter::lexing::automaton::{CharClass, Transition};
use crate::transmuter::lexing::tag::{Lexicon, LexiconBuilder, TagId};
use crate::transmuter::parsing::grammar::Grammar;
use crate::transmuter::parsing::rule::{Features, Rule};
use once_cell::sync::Lazy;

pub const LEXICAL: &str = "lexical";
pub const SYNTACTIC: &str = "syntactic";
pub const PRECEDENCES: &str = "precedences";

// Characters that never stand for themselves in a lexical production.
const SPECIAL: &str = " $()*+.;?[\\^{|";

static DEFAULT: Lazy<Result<Grammar, GrammarError>> = Lazy::new(|| grammar(&Features::new()));

pub fn lexical() -> Conditions {
    conditions([LEXICAL])
}

pub fn syntactic() -> Conditions {
    conditions([SYNTACTIC])
}

/// The grammar built without optional features, shared process-wide.
pub fn default_grammar() -> Result<&'static Grammar, GrammarError> {
    DEFAULT.as_ref().map_err(Clone::clone)
}

pub fn lexicon() -> Result<Lexicon, GrammarError> {
    build_lexicon().map(|(lexicon, _)| lexicon)
}

struct Tags {
    identifier: TagId,
    colon: TagId,
    semicolon: TagId,
    commercial_at: TagId,
    left_parenthesis: TagId,
    right_parenthesis: TagId,
    greater_than: TagId,
    vertical_line: TagId,
    solidus: TagId,
    double_vertical_line: TagId,
    comma: TagId,
    double_ampersand: TagId,
    ignore: TagId,
    optional: TagId,
    start: TagId,
    asterisk: TagId,
    plus_sign: TagId,
    question_mark: TagId,
    expression_range: TagId,
    left_curly: TagId,
    left_curly_solidus: TagId,
    right_curly: TagId,
    ord_char: TagId,
    quoted_char: TagId,
    full_stop: TagId,
    bracket_expression: TagId,
    exclamation_mark: TagId,
    left_square: TagId,
    left_square_solidus: TagId,
    right_square: TagId,
}

fn control() -> CharClass {
    CharClass::union([CharClass::range('\0', '\x1f'), CharClass::Char('\x7f')])
}

fn digit() -> CharClass {
    CharClass::range('0', '9')
}

fn build_lexicon() -> Result<(Lexicon, Tags), GrammarError> {
    let always = ConditionExpr::Always;
    let lexical = ConditionExpr::active(LEXICAL);
    let syntactic = ConditionExpr::active(SYNTACTIC);
    let mut b = Lexicon::builder();

    let blank = CharClass::one_of(" \t\r\n");
    let whitespace = b.word("Whitespace", blank.clone(), blank, always.clone());
    b.ignore(whitespace);

    let identifier = b.word(
        "Identifier",
        CharClass::word_start(),
        CharClass::word_continue(),
        always.clone(),
    );
    let colon = b.literal("Colon", ":", always.clone());
    let semicolon = b.literal("Semicolon", ";", always.clone());
    let commercial_at = b.literal("CommercialAt", "@", always.clone());
    let left_parenthesis = b.literal("LeftParenthesis", "(", always.clone());
    let right_parenthesis = b.literal("RightParenthesis", ")", always.clone());
    let greater_than = b.literal("GreaterThanSign", ">", lexical.clone());
    let vertical_line = b.literal("VerticalLine", "|", always.clone());
    let solidus = b.literal("Solidus", "/", syntactic.clone());
    let double_vertical_line = b.literal("DoubleVerticalLine", "||", always.clone());
    let comma = b.literal("Comma", ",", always.clone());
    let double_ampersand = b.literal("DoubleAmpersand", "&&", always.clone());
    let ignore = b.keyword("Ignore", "ignore", lexical.clone(), &[identifier]);
    let optional = b.keyword("Optional", "optional", lexical.clone(), &[identifier]);
    let start = b.keyword("Start", "start", syntactic.clone(), &[identifier]);
    let asterisk = b.literal("Asterisk", "*", lexical.clone());
    let plus_sign = b.literal("PlusSign", "+", lexical.clone());
    let question_mark = b.literal("QuestionMark", "?", lexical.clone());
    let expression_range = expression_range(&mut b, lexical.clone());
    let left_curly = b.literal("LeftCurlyBracket", "{", syntactic.clone());
    let left_curly_solidus = b.literal("LeftCurlyBracketSolidus", "{/", syntactic.clone());
    let right_curly = b.literal("RightCurlyBracket", "}", syntactic.clone());

    // Any single visible character without a special meaning. Punctuation such as `:` or
    // `!` also matches its own tag, so the token carries both.
    let ord_char = b.tag("OrdChar");
    let ord_state = b.state();
    b.start(ord_char, lexical.clone(), [ord_state]);
    b.transition(
        Transition::new(
            ord_state,
            CharClass::union([control(), CharClass::one_of(SPECIAL)]).negate(),
        )
        .accept()
        .asserting([ord_char]),
    );

    let quoted_char = b.tag("QuotedChar");
    let escape = b.state();
    let escaped = b.state();
    b.start(quoted_char, lexical.clone(), [escape]);
    b.transition(Transition::new(escape, '\\').to([escaped]));
    b.transition(
        Transition::new(escaped, control().negate())
            .accept()
            .asserting([quoted_char]),
    );

    let full_stop = b.literal("FullStop", ".", lexical.clone());
    let bracket_expression = bracket_expression(&mut b, lexical);
    let exclamation_mark = b.literal("ExclamationMark", "!", always);
    let left_square = b.literal("LeftSquareBracket", "[", syntactic.clone());
    let left_square_solidus = b.literal("LeftSquareBracketSolidus", "[/", syntactic.clone());
    let right_square = b.literal("RightSquareBracket", "]", syntactic);

    let lexicon = b.build()?;
    Ok((
        lexicon,
        Tags {
            identifier,
            colon,
            semicolon,
            commercial_at,
            left_parenthesis,
            right_parenthesis,
            greater_than,
            vertical_line,
            solidus,
            double_vertical_line,
            comma,
            double_ampersand,
            ignore,
            optional,
            start,
            asterisk,
            plus_sign,
            question_mark,
            expression_range,
            left_curly,
            left_curly_solidus,
            right_curly,
            ord_char,
            quoted_char,
            full_stop,
            bracket_expression,
            exclamation_mark,
            left_square,
            left_square_solidus,
            right_square,
        },
    ))
}

// `{n}`, `{n,}` or `{n,m}`
fn expression_range(b: &mut LexiconBuilder, when: ConditionExpr) -> TagId {
    let tag = b.tag("ExpressionRange");
    let open = b.state();
    let first = b.state();
    let low = b.state();
    let comma = b.state();
    let high = b.state();
    b.start(tag, when, [open]);
    b.transition(Transition::new(open, '{').to([first]));
    b.transition(Transition::new(first, digit()).to([low]));
    b.transition(Transition::new(low, digit()).to([low]));
    b.transition(Transition::new(low, ',').to([comma]));
    b.transition(Transition::new(comma, digit()).to([high]));
    b.transition(Transition::new(high, digit()).to([high]));
    for from in [low, comma, high] {
        b.transition(Transition::new(from, '}').accept().asserting([tag]));
    }
    tag
}

// `[...]` or `[^...]`, a `]` right after the opening bracket is a member.
fn bracket_expression(b: &mut LexiconBuilder, when: ConditionExpr) -> TagId {
    let tag = b.tag("BracketExpression");
    let open = b.state();
    let negated = b.state();
    let first = b.state();
    let members = b.state();
    b.start(tag, when, [open]);
    b.transition(Transition::new(open, '[').to([negated, first]));
    b.transition(Transition::new(negated, '^').to([first]));
    b.transition(Transition::new(first, CharClass::Any).to([members]));
    b.transition(Transition::new(members, CharClass::Char(']').negate()).to([members]));
    b.transition(Transition::new(members, ']').accept().asserting([tag]));
    tag
}

/// Build the aether grammar with `features` enabled.
pub fn grammar(features: &Features) -> Result<Grammar, GrammarError> {
    let (lexicon, tags) = build_lexicon()?;
    let mut b = Grammar::builder(lexicon);
    let t = Rule::terminal;
    let nt = Rule::nonterminal;

    let grammar = b.declare("Grammar");
    let production = b.declare("Production");
    let header = b.declare("ProductionHeader");
    let body = b.declare("ProductionBody");
    let condition = b.declare("Condition");
    let specifiers = b.declare("ProductionSpecifiers");
    let precedences = b.declare("ProductionPrecedences");
    let selection = b.declare("SelectionExpression");
    let disjunction = b.declare("DisjunctionCondition");
    let specifier_list = b.declare("ProductionSpecifierList");
    let precedence_list = b.declare("ProductionPrecedenceList");
    let sequence = b.declare("SequenceExpression");
    let conjunction = b.declare("ConjunctionCondition");
    let specifier = b.declare("ProductionSpecifier");
    let precedence = b.declare("ProductionPrecedence");
    let iteration = b.declare("IterationExpression");
    let primary = b.declare("PrimaryExpression");
    let negation = b.declare("NegationCondition");
    let optional = b.declare("OptionalExpression");
    let primitive = b.declare("PrimitiveCondition");

    // A list of `item` separated by `separator`.
    let list = |item: Rule, separator: Rule| {
        Rule::seq([item.clone(), Rule::repeat(Rule::seq([separator, item]))])
    };

    b.define(grammar, Rule::seq([nt(production), Rule::repeat(nt(production))]));
    b.define(production, Rule::seq([nt(header), nt(body)]));
    b.define(
        header,
        Rule::seq([
            t(tags.identifier),
            Rule::optional(nt(condition)),
            Rule::optional(nt(specifiers)),
            Rule::switch(PRECEDENCES, Rule::optional(nt(precedences))),
            t(tags.colon),
        ]),
    );
    b.define(body, Rule::seq([nt(selection), t(tags.semicolon)]));
    b.define(condition, Rule::seq([t(tags.commercial_at), nt(disjunction)]));
    b.define(
        specifiers,
        Rule::seq([
            t(tags.left_parenthesis),
            nt(specifier_list),
            t(tags.right_parenthesis),
        ]),
    );
    b.define(
        precedences,
        Rule::seq([t(tags.greater_than), nt(precedence_list)]),
    );
    b.define(
        selection,
        list(
            nt(sequence),
            Rule::alt([t(tags.vertical_line), t(tags.solidus)]),
        ),
    );
    b.define(
        disjunction,
        list(nt(conjunction), t(tags.double_vertical_line)),
    );
    b.define(specifier_list, list(nt(specifier), t(tags.comma)));
    b.define(precedence_list, list(nt(precedence), t(tags.comma)));
    b.define(
        sequence,
        Rule::seq([nt(iteration), Rule::repeat(nt(iteration))]),
    );
    b.define(
        conjunction,
        list(nt(negation), t(tags.double_ampersand)),
    );
    b.define(
        specifier,
        Rule::alt([
            t(tags.identifier),
            Rule::seq([
                Rule::alt([t(tags.ignore), t(tags.optional), t(tags.start)]),
                Rule::optional(nt(condition)),
            ]),
        ]),
    );
    b.define(precedence, t(tags.identifier));
    b.define(
        iteration,
        Rule::alt([
            Rule::seq([
                nt(primary),
                Rule::optional(Rule::alt([
                    t(tags.asterisk),
                    t(tags.plus_sign),
                    t(tags.question_mark),
                    t(tags.expression_range),
                ])),
            ]),
            Rule::seq([
                Rule::alt([t(tags.left_curly), t(tags.left_curly_solidus)]),
                nt(selection),
                t(tags.right_curly),
            ]),
        ]),
    );
    b.define(
        primary,
        Rule::alt([
            Rule::seq([t(tags.identifier), Rule::optional(nt(condition))]),
            t(tags.ord_char),
            t(tags.quoted_char),
            t(tags.full_stop),
            t(tags.bracket_expression),
            Rule::seq([
                t(tags.left_parenthesis),
                nt(selection),
                t(tags.right_parenthesis),
                Rule::optional(nt(condition)),
            ]),
            Rule::seq([nt(optional), Rule::optional(nt(condition))]),
        ]),
    );
    b.define(
        negation,
        Rule::seq([Rule::repeat(t(tags.exclamation_mark)), nt(primitive)]),
    );
    b.define(
        optional,
        Rule::seq([
            Rule::alt([t(tags.left_square), t(tags.left_square_solidus)]),
            nt(selection),
            t(tags.right_square),
        ]),
    );
    b.define(
        primitive,
        Rule::alt([
            t(tags.identifier),
            Rule::seq([
                t(tags.left_parenthesis),
                nt(disjunction),
                t(tags.right_parenthesis),
            ]),
        ]),
    );

    b.start(grammar, ConditionExpr::Always);
    b.enable_all(features.iter().cloned());
    b.build()
}
