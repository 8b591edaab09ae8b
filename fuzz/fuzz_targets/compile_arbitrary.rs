// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for the Go generator.
//!
//! Whatever the parser accepts must either generate Go or fail with a
//! `CodeGenError`. Internal errors point at a pre-pass/emission mismatch.

#![no_main]

use libfuzzer_sys::fuzz_target;
use talkc_core::codegen::go::{CodeGenError, CodegenOptions, EmitMode, generate};
use talkc_core::source_analysis::parse_source;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        let class = parse_source(source);
        if let Err(CodeGenError::Internal(message)) =
            generate(&class, &CodegenOptions::new(EmitMode::Binary))
        {
            panic!("internal codegen error: {message}");
        }
    }
});
