// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! CLI command implementations.

use std::io::Read;

use camino::Utf8Path;
use miette::{IntoDiagnostic, Result, WrapErr};
use talkc_core::codegen::go::CompileReport;

pub mod build;
pub mod compile;
pub mod parse;
pub mod tokenize;

/// Reads a source file, or stdin when no path is given.
///
/// Returns the name used in diagnostics along with the text.
pub(crate) fn read_input(path: Option<&Utf8Path>) -> Result<(String, String)> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to read '{path}'"))?;
            Ok((path.to_string(), text))
        }
        None => Ok(("<stdin>".to_string(), read_stdin()?)),
    }
}

pub(crate) fn read_stdin() -> Result<String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .into_diagnostic()
        .wrap_err("Failed to read stdin")?;
    Ok(text)
}

/// Writes the skip list and warnings to stderr.
pub(crate) fn print_report(report: &CompileReport) {
    for skip in &report.skipped {
        eprintln!("skipped {}: {}", skip.selector, skip.reason);
    }
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
}
