// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the talk parsers.
//!
//! 1. **Declaration parser never panics** on arbitrary or near-valid input
//! 2. **Keyword selectors** end in `_` with one `_` per keyword
//! 3. **Body parser never panics** and always answers `Ok` or `Unsupported`
//! 4. **Diagnostic positions** point inside the source

use proptest::prelude::*;

use super::{parse_method_body, parse_source};
use crate::source_analysis::lex;

// ============================================================================
// Generators
// ============================================================================

/// Near-valid class fragments.
const CLASS_FRAGMENTS: &[&str] = &[
    "Counter subclass: Object",
    "Logger trait",
    "package: Core",
    "import: Core::Logger",
    "  instanceVars: count:0 name:'x' items:'[]'",
    "  classInstanceVars: total:0",
    "  include: Logger",
    "  requires: 'lib/util.talk'",
    "  method: increment [ count := count + 1 ]",
    "  method: at: i put: v [ items arrayAt: i put: v ]",
    "  classMethod: reset [ total := 0 ]",
    "  rawMethod: shell [ echo hi ]",
    "  alias: bump for: increment",
    "  before: increment do: [ count := count ]",
    "  category: 'accessing'",
    "  method: broken [",
    "]]",
    "[[",
];

/// Near-valid body fragments.
const BODY_FRAGMENTS: &[&str] = &[
    "x := 1",
    "^ x + 2 * 3",
    "| a b |",
    "a > b ifTrue: [ ^ 1 ] ifFalse: [ ^ 2 ]",
    "[ i < 3 ] whileTrue: [ i := i + 1 ]",
    "items do: [ :each | total := total + each ]",
    "^ items collect: [ :x | x , 'a' ]",
    "x ifNil: [ ^ 0 ] ifNotNil: [ :v | ^ v ]",
    "@ self at: 1 put: 2",
    "@ String trim: name",
    "data objectAt: 'k' put: 3",
    "echo $HOME",
    "(((",
    "]",
    "@",
];

fn fragment(pool: &'static [&'static str]) -> impl Strategy<Value = String> {
    prop::sample::select(pool).prop_map(std::string::ToString::to_string)
}

fn near_valid(pool: &'static [&'static str]) -> impl Strategy<Value = String> {
    prop::collection::vec(fragment(pool), 1..8).prop_map(|parts| parts.join("\n"))
}

fn keyword_part() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,8}".prop_map(|name| format!("{name}:"))
}

/// Default is 256 cases; override via `PROPTEST_CASES` env var for nightly runs.
fn proptest_config() -> ProptestConfig {
    let default = ProptestConfig::default();
    ProptestConfig {
        cases: default.cases.max(256),
        ..default
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    /// Property 1: arbitrary input always yields a tree.
    #[test]
    fn parse_source_never_panics(input in "\\PC{0,400}") {
        let _class = parse_source(&input);
    }

    /// Property 1b: near-valid input always yields a tree.
    #[test]
    fn parse_source_near_valid_never_panics(input in near_valid(CLASS_FRAGMENTS)) {
        let _class = parse_source(&input);
    }

    /// Property 2: the selector rule for keyword methods.
    #[test]
    fn keyword_method_selector_rule(keywords in prop::collection::vec(keyword_part(), 1..5)) {
        let header: Vec<String> = keywords
            .iter()
            .enumerate()
            .map(|(i, k)| format!("{k} arg{i}"))
            .collect();
        let source = format!("Foo subclass: Object\n  method: {} [ ]\n", header.join(" "));
        let class = parse_source(&source);
        prop_assert!(class.errors.is_empty(), "errors: {:?}", class.errors);
        prop_assert_eq!(class.methods.len(), 1);

        let method = &class.methods[0];
        prop_assert!(method.selector.ends_with('_'));
        prop_assert_eq!(method.selector.matches('_').count(), keywords.len());
        prop_assert_eq!(method.arity(), keywords.len());
    }

    /// Property 3: the body parser answers without panicking.
    #[test]
    fn parse_method_body_never_panics(input in "\\PC{0,300}") {
        let _result = parse_method_body(&lex(&input));
    }

    /// Property 3b: near-valid bodies.
    #[test]
    fn parse_method_body_near_valid_never_panics(input in near_valid(BODY_FRAGMENTS)) {
        let _result = parse_method_body(&lex(&input));
    }

    /// Property 4: error positions fall on a real line.
    #[test]
    fn error_positions_within_source(input in near_valid(CLASS_FRAGMENTS)) {
        let class = parse_source(&input);
        let lines = u32::try_from(input.lines().count().max(1)).unwrap_or(u32::MAX);
        for error in &class.errors {
            prop_assert!(
                error.position.line() >= 1 && error.position.line() <= lines,
                "error {:?} outside {} lines of {:?}",
                error,
                lines,
                input,
            );
        }
    }
}
