// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `talkc compile`: declaration JSON on stdin, Go on stdout.

use camino::Utf8PathBuf;
use miette::{IntoDiagnostic, Result, WrapErr};
use talkc_core::ast::ClassDecl;
use talkc_core::codegen::go::{CodegenOptions, EmitMode, generate};
use tracing::info;

use super::{print_report, read_stdin};

/// Flags of the `compile` subcommand.
#[derive(Debug)]
pub struct CompileArgs {
    pub mode: EmitMode,
    pub strict: bool,
    pub dry_run: bool,
    pub source: Option<Utf8PathBuf>,
    pub hash: Option<String>,
}

pub fn run(args: &CompileArgs) -> Result<()> {
    let json = read_stdin()?;
    let class = ClassDecl::from_json(&json).into_diagnostic()?;

    let mut options = CodegenOptions::new(args.mode).with_strict(args.strict);
    if let Some(path) = &args.source {
        let text = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read '{path}'"))?;
        options = options.with_source(&text);
    }
    if let Some(hash) = &args.hash {
        options = options.with_source_hash(hash);
    }

    let unit = generate(&class, &options).into_diagnostic()?;
    print_report(&unit.report);
    if args.dry_run {
        println!("{}", unit.summary());
    } else {
        print!("{}", unit.source);
    }
    info!(class = %class.name, "{}", unit.summary());
    Ok(())
}
