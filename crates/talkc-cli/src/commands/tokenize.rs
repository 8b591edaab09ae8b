// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `talkc tokenize`: the token stream as JSON.

use camino::Utf8Path;
use miette::{IntoDiagnostic, Result};
use talkc_core::source_analysis::lex;
use tracing::debug;

use super::read_input;

pub fn run(path: Option<&Utf8Path>) -> Result<()> {
    let (_, source) = read_input(path)?;
    let tokens = lex(&source);
    debug!(count = tokens.len(), "tokenized");
    let json = serde_json::to_string_pretty(&tokens).into_diagnostic()?;
    println!("{json}");
    Ok(())
}
