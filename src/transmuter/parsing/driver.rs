//! Top-level parse driver
//!
//!     The driver picks the start rule allowed by the lexer's conditions, derives it at the
//!     start of the input and then selects, among the root's output paths, the one that
//!     consumes the entire input. That selection is the only point where ambiguity is
//!     resolved. The root's output set is narrowed to the winning path and one derivation
//!     ending there is extracted as a [SyntaxTree].
//!
//!     Internal failures never escape raw: they are mapped to [ParseError] values carrying the
//!     offending rule's name and a source position.

use crate::transmuter::common::Conditions;
use crate::transmuter::config::ParserConfig;
use crate::transmuter::error::ParseError;
use crate::transmuter::lexing::lexer::{Checkpoint, Lexer};
use crate::transmuter::parsing::arena::{NodeArena, NodeId};
use crate::transmuter::parsing::grammar::{Grammar, RuleId};
use crate::transmuter::parsing::paths::PathSet;
use crate::transmuter::parsing::runtime::{Failure, ParseRun, ParseStats};
use crate::transmuter::parsing::tree::{Extractor, SyntaxTree};
use tracing::debug;

/// Everything a successful parse produced.
#[derive(Debug)]
pub struct ParseOutcome {
    pub tree: SyntaxTree,
    /// The root instance in `nodes`; its output is narrowed to the winning path.
    pub root: NodeId,
    pub nodes: NodeArena,
    pub stats: ParseStats,
}

pub struct Parser<'g> {
    grammar: &'g Grammar,
    config: ParserConfig,
}

impl<'g> Parser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            config: ParserConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// Parse `input` under `conditions` and return the tree.
    pub fn parse(&self, input: &str, conditions: Conditions) -> Result<SyntaxTree, ParseError> {
        self.run(Lexer::new(self.grammar.lexicon(), input, conditions))
            .map(|outcome| outcome.tree)
    }

    /// Like [Parser::parse], reporting errors against `filename`.
    pub fn parse_named(
        &self,
        filename: &str,
        input: &str,
        conditions: Conditions,
    ) -> Result<SyntaxTree, ParseError> {
        let lexer = Lexer::new(self.grammar.lexicon(), input, conditions).with_filename(filename);
        self.run(lexer).map(|outcome| outcome.tree)
    }

    /// Parse whatever `lexer` is positioned on, keeping the node arena and statistics.
    pub fn run(&self, lexer: Lexer<'g>) -> Result<ParseOutcome, ParseError> {
        let start_rule = self.grammar.select_start(lexer.conditions())?;
        let start = lexer.checkpoint();
        let mut run = ParseRun::new(self.grammar, lexer).with_max_depth(self.config.max_depth);

        let root = match run.derive(start_rule, start) {
            Ok(root) => root,
            Err(failure) => return Err(self.report(&run, start_rule, failure)),
        };

        let outputs = run.output(root);
        let winner = self.select(&run, &outputs);
        debug!(
            rule = self.grammar.name(start_rule),
            outputs = %outputs,
            winner = ?winner.map(|path| path.index()),
            "full-consumption selection"
        );
        let Some(winner) = winner else {
            let furthest = outputs.last().unwrap_or(start);
            return Err(ParseError::Incomplete {
                filename: run.lexer().filename().to_string(),
                rule: self.grammar.name(start_rule).to_string(),
                position: run.lexer().skip_ignorable(furthest).position(),
            });
        };

        if let Some(node) = run.arena_mut().get_mut(root) {
            node.output = PathSet::single(winner);
        }

        let extracted = Extractor::new(&mut run).branch(start_rule, start, winner);
        let branch = match extracted {
            Ok(Some(branch)) => branch,
            Ok(None) => {
                return Err(self.report(
                    &run,
                    start_rule,
                    Failure::NoPath {
                        rule: Some(start_rule),
                        at: start,
                    },
                ))
            }
            Err(failure) => return Err(self.report(&run, start_rule, failure)),
        };

        let (nodes, stats, _) = run.into_parts();
        Ok(ParseOutcome {
            tree: SyntaxTree::new(branch),
            root,
            nodes,
            stats,
        })
    }

    fn select(&self, run: &ParseRun<'g>, outputs: &PathSet) -> Option<Checkpoint> {
        let lexer = run.lexer();
        let mut complete = outputs.iter().filter(|path| {
            if self.config.trailing_ignorable {
                lexer.at_end(*path)
            } else {
                path.index() == lexer.len()
            }
        });
        complete.next_back()
    }

    fn report(&self, run: &ParseRun<'g>, start_rule: RuleId, failure: Failure) -> ParseError {
        let filename = run.lexer().filename().to_string();
        match failure {
            Failure::NoPath { rule, at } => {
                let position = run
                    .furthest_failure()
                    .map_or(at.position(), |furthest| furthest.max(at.position()));
                ParseError::NoPath {
                    filename,
                    rule: self.grammar.name(rule.unwrap_or(start_rule)).to_string(),
                    position,
                }
            }
            Failure::DepthLimit { rule, at } => ParseError::DepthLimit {
                filename,
                rule: self.grammar.name(rule).to_string(),
                position: at.position(),
                limit: run.max_depth(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transmuter::common::ConditionExpr;
    use crate::transmuter::lexing::tag::Lexicon;
    use crate::transmuter::parsing::rule::Rule;
    use crate::transmuter::range::Position;

    // Root := "a" ["b"]
    fn grammar() -> Grammar {
        let mut lexicon = Lexicon::builder();
        let space = lexicon.literal("Space", " ", ConditionExpr::Always);
        lexicon.ignore(space);
        lexicon.literal("A", "a", ConditionExpr::Always);
        lexicon.literal("B", "b", ConditionExpr::Always);
        lexicon.literal("C", "c", ConditionExpr::Always);
        let mut builder = Grammar::builder(lexicon.build().unwrap());
        let a = builder.terminal("A").unwrap();
        let b = builder.terminal("B").unwrap();
        let root = builder.rule("Root", Rule::seq([a, Rule::optional(b)]));
        builder.start(root, ConditionExpr::Always);
        builder.build().unwrap()
    }

    #[test]
    fn test_trailing_ignorable_counts_as_consumed() {
        let g = grammar();
        let tree = Parser::new(&g).parse("a b  ", Conditions::new()).unwrap();
        assert_eq!(tree.children().len(), 2);
    }

    #[test]
    fn test_trailing_ignorable_rejected_when_disabled() {
        let g = grammar();
        let parser = Parser::new(&g).with_config(ParserConfig {
            trailing_ignorable: false,
            ..ParserConfig::default()
        });
        let error = parser.parse("a ", Conditions::new()).unwrap_err();
        assert!(matches!(error, ParseError::Incomplete { .. }));
    }

    #[test]
    fn test_no_path_reports_furthest_position() {
        let g = grammar();
        let error = Parser::new(&g)
            .parse_named("demo.txt", "  c", Conditions::new())
            .unwrap_err();

        assert_eq!(
            error,
            ParseError::NoPath {
                filename: "demo.txt".to_string(),
                rule: "Root".to_string(),
                position: Position::new(2, 1, 3),
            }
        );
    }

    #[test]
    fn test_incomplete_reports_start_of_garbage() {
        let g = grammar();
        let error = Parser::new(&g).parse("a  c", Conditions::new()).unwrap_err();

        assert_eq!(error.rule(), Some("Root"));
        assert_eq!(
            error.to_string(),
            "<stdin>:1:4: Syntax Error: In Root: Expected end of input."
        );
    }

    #[test]
    fn test_outcome_exposes_nodes_and_stats() {
        let g = grammar();
        let lexer = Lexer::new(g.lexicon(), "ab", Conditions::new());
        let outcome = Parser::new(&g).run(lexer).unwrap();
        let root = outcome.nodes.get(outcome.root).unwrap();

        assert_eq!(root.output.indices(), vec![2]);
        assert_eq!(outcome.stats.evaluations, 1);
        assert_eq!(outcome.tree.rule(), "Root");
    }
}
