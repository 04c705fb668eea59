//! Property-based tests for the lexer
//!
//! These tests ensure that scanning is deterministic, that backtracking through checkpoints
//! never changes what is scanned, and that ignorable input is skipped without losing any
//! visible character.

use proptest::prelude::*;
use transmuter::transmuter::common::Conditions;
use transmuter::transmuter::lexing::{Checkpoint, Lexer, Lexicon};
use transmuter::transmuter::testing::factories::sum_grammar;

fn sum_lexicon() -> Lexicon {
    sum_grammar().unwrap().lexicon().clone()
}

/// Inputs made only of characters the sum lexicon knows
fn sum_source() -> impl Strategy<Value = String> {
    "[a-z0-9+() \n]{0,40}"
}

proptest! {
    #[test]
    fn prop_tokens_cover_visible_input(source in sum_source()) {
        let lexicon = sum_lexicon();
        let mut lexer = Lexer::new(&lexicon, &source, Conditions::new());
        let tokens = lexer.tokens().unwrap();

        let joined: String = tokens.iter().map(|token| token.text.as_str()).collect();
        let visible: String = source.chars().filter(|ch| !ch.is_whitespace()).collect();
        prop_assert_eq!(joined, visible);
    }

    #[test]
    fn prop_restore_rescans_identically(source in sum_source(), skip in 0usize..6) {
        let lexicon = sum_lexicon();
        let mut lexer = Lexer::new(&lexicon, &source, Conditions::new());
        for _ in 0..skip {
            if lexer.next_token().is_err() {
                break;
            }
        }

        let checkpoint = lexer.checkpoint();
        let first = lexer.next_token();
        let after_first = lexer.checkpoint();
        lexer.restore(checkpoint);
        let second = lexer.next_token();

        prop_assert_eq!(first, second);
        prop_assert_eq!(after_first, lexer.checkpoint());
    }

    #[test]
    fn prop_words_are_single_tokens(words in prop::collection::vec("[a-z][a-z0-9]{0,8}", 1..6)) {
        let lexicon = sum_lexicon();
        let source = words.join(" ");
        let mut lexer = Lexer::new(&lexicon, &source, Conditions::new());
        let texts: Vec<String> = lexer
            .tokens()
            .unwrap()
            .into_iter()
            .map(|token| token.text)
            .collect();

        prop_assert_eq!(texts, words);
    }

    #[test]
    fn prop_checkpoints_only_move_forward(source in sum_source()) {
        let lexicon = sum_lexicon();
        let mut lexer = Lexer::new(&lexicon, &source, Conditions::new());
        let mut previous = Checkpoint::START;
        while lexer.next_token().is_ok() {
            let current = lexer.checkpoint();
            prop_assert!(current > previous);
            previous = current;
        }
        prop_assert!(lexer.at_end(previous));
    }
}
