// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `talkc parse`: the declaration tree as JSON.
//!
//! The tree is printed even when it carries errors, so a front end can show
//! everything that was recovered. Errors also go to stderr and make the
//! command fail.

use camino::Utf8Path;
use miette::{IntoDiagnostic, Result};
use talkc_core::source_analysis::parse_source;

use super::read_input;
use crate::diagnostic::report_parse_errors;

pub fn run(path: Option<&Utf8Path>) -> Result<()> {
    let (name, source) = read_input(path)?;
    let class = parse_source(&source);
    println!("{}", class.to_json().into_diagnostic()?);

    if !class.errors.is_empty() {
        report_parse_errors(&class.errors, &name, &source);
        miette::bail!("{} declaration error(s) in '{name}'", class.errors.len());
    }
    for warning in &class.warnings {
        eprintln!("warning: {} (line {})", warning.message, warning.position.line());
    }
    Ok(())
}
