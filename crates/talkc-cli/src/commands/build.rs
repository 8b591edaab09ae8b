// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `talkc build`: source file to Go in one step.
//!
//! The source text and its SHA-256 are embedded so the generated program
//! can answer `--source` and `--hash`.

use camino::Utf8Path;
use miette::{IntoDiagnostic, Result, WrapErr};
use sha2::{Digest, Sha256};
use talkc_core::codegen::go::{CodegenOptions, EmitMode, generate};
use talkc_core::source_analysis::parse_source;
use tracing::{debug, info};

use super::{print_report, read_input};
use crate::diagnostic::report_parse_errors;

/// Hex SHA-256 of the source text.
pub(crate) fn source_hash(source: &str) -> String {
    format!("{:x}", Sha256::digest(source.as_bytes()))
}

pub fn run(path: &Utf8Path, output: Option<&Utf8Path>, mode: EmitMode, strict: bool) -> Result<()> {
    let (name, source) = read_input(Some(path))?;
    let class = parse_source(&source);
    if !class.errors.is_empty() {
        report_parse_errors(&class.errors, &name, &source);
        miette::bail!("{} declaration error(s) in '{name}'", class.errors.len());
    }

    let hash = source_hash(&source);
    debug!(%hash, "hashed source");
    let options = CodegenOptions::new(mode)
        .with_strict(strict)
        .with_source(&source)
        .with_source_hash(&hash);
    let unit = generate(&class, &options)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to compile '{name}'"))?;
    print_report(&unit.report);

    match output {
        Some(out) => {
            std::fs::write(out, &unit.source)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write '{out}'"))?;
            info!(output = %out, "{}", unit.summary());
        }
        None => print!("{}", unit.source),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_lowercase_hex_sha256() {
        assert_eq!(
            source_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(source_hash("x").len(), 64);
    }
}
