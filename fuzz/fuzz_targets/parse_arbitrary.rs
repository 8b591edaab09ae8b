// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for front-end crash safety.
//!
//! Arbitrary text goes through the lexer, the declaration parser, and the
//! body parser for every method found. None of them may panic: bad input
//! ends up as `TokenKind::Error` tokens, `ParseError`s, or `Unsupported`.
//!
//! Seed the corpus in `fuzz/corpus/parse_arbitrary/` with `.talk` class
//! files.

#![no_main]

use libfuzzer_sys::fuzz_target;
use talkc_core::source_analysis::{lex, parse_method_body, parse_source};

fuzz_target!(|data: &[u8]| {
    // Source files are text; invalid UTF-8 is rejected before lexing.
    if let Ok(source) = std::str::from_utf8(data) {
        let _ = lex(source);

        let class = parse_source(source);
        for method in &class.methods {
            let _ = parse_method_body(&method.body);
        }
        for advice in &class.advice {
            let _ = parse_method_body(&advice.body);
        }
    }
});
