// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the talk lexer.
//!
//! 1. **Lexer never panics**: arbitrary string input always produces tokens
//! 2. **Tokens are source slices**: each token's text appears in the source
//!    at the token's position
//! 3. **Positions are ordered**: token positions strictly increase
//! 4. **Lexer is deterministic**: same input, same tokens
//! 5. **Valid fragments produce no errors**

use proptest::prelude::*;

use super::lexer::{lex, lex_significant};
use super::token::TokenKind;

// ============================================================================
// Generators
// ============================================================================

/// Fragments that must lex without `ERROR` tokens.
const VALID_FRAGMENTS: &[&str] = &[
    "42",
    "3.14",
    "'hello'",
    "\"line\\n\"",
    "'''triple'''",
    "count:0",
    "at:",
    ":=",
    "Core::Logger",
    "[ :x | x + 1 ]",
    "items arrayAt: 1 put: 2",
    "@ self increment",
    "#(1 2)",
    "# comment",
    "$HOME",
    "$(date +%s)",
    "$((1 + 2))",
    "2>&1",
    "./run.sh",
    "a && b || c",
    "x >= 1",
    "[[ -f x ]]",
];

fn valid_fragment() -> impl Strategy<Value = String> {
    prop::sample::select(VALID_FRAGMENTS).prop_map(std::string::ToString::to_string)
}

fn valid_line() -> impl Strategy<Value = String> {
    prop::collection::vec(valid_fragment(), 1..6).prop_map(|parts| parts.join(" "))
}

/// Default is 512 cases; override via `PROPTEST_CASES` env var for nightly runs.
fn proptest_config() -> ProptestConfig {
    let default = ProptestConfig::default();
    ProptestConfig {
        cases: default.cases.max(512),
        ..default
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    /// Property 1: lexer never panics on arbitrary input.
    #[test]
    fn lexer_never_panics(input in "\\PC{0,500}") {
        let _tokens = lex(&input);
    }

    /// Property 2: every token text is the source slice at its position.
    #[test]
    fn tokens_are_source_slices(input in "\\PC{0,300}") {
        for token in lex(&input) {
            prop_assert!(!token.text().is_empty(), "empty token {:?}", token);
            let offset = token.position().byte_offset_in(&input);
            prop_assert!(offset.is_some(), "position {} outside {:?}", token.position(), input);
            let offset = offset.unwrap_or_default();
            prop_assert!(
                input[offset..].starts_with(token.text()),
                "token {:?} not found at {} in {:?}",
                token,
                offset,
                input,
            );
        }
    }

    /// Property 3: positions strictly increase.
    #[test]
    fn positions_strictly_increase(input in "\\PC{0,300}") {
        let tokens = lex(&input);
        for window in tokens.windows(2) {
            prop_assert!(
                window[0].position() < window[1].position(),
                "{:?} then {:?} in {:?}",
                window[0],
                window[1],
                input,
            );
        }
    }

    /// Property 4: lexing is deterministic.
    #[test]
    fn lexer_deterministic(input in "\\PC{0,200}") {
        prop_assert_eq!(lex(&input), lex(&input));
    }

    /// Property 5: valid fragments never produce `ERROR` tokens.
    #[test]
    fn valid_fragments_lex_cleanly(input in valid_line()) {
        for token in lex_significant(&input) {
            prop_assert_ne!(token.kind(), TokenKind::Error, "in {:?}", input);
        }
    }
}
