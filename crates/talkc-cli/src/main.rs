// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! talk compiler command-line interface.
//!
//! This is the main entry point for the `talkc` command.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use miette::Result;
use talkc_core::codegen::go::EmitMode;

mod commands;
mod diagnostic;

/// talkc: compiles talk classes to Go
#[derive(Debug, Parser)]
#[command(name = "talkc")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the token stream of a source file as JSON
    Tokenize {
        /// Source file (reads stdin when absent)
        file: Option<Utf8PathBuf>,
    },

    /// Print the declaration tree of a source file as JSON
    Parse {
        /// Source file (reads stdin when absent)
        file: Option<Utf8PathBuf>,
    },

    /// Generate Go from a declaration tree read on stdin
    Compile {
        /// Program shape: `binary` or `plugin`
        #[arg(long, default_value = "binary")]
        mode: EmitMode,

        /// Fail when any method falls back to the interpreter
        #[arg(long)]
        strict: bool,

        /// Print a size summary instead of the Go source
        #[arg(long)]
        dry_run: bool,

        /// Source file to embed for `--source`
        #[arg(long)]
        source: Option<Utf8PathBuf>,

        /// Source hash to embed for `--hash`
        #[arg(long)]
        hash: Option<String>,
    },

    /// Parse a source file and generate Go in one step
    Build {
        /// Source file
        file: Utf8PathBuf,

        /// Output file (stdout when absent)
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,

        /// Program shape: `binary` or `plugin`
        #[arg(long, default_value = "binary")]
        mode: EmitMode,

        /// Fail when any method falls back to the interpreter
        #[arg(long)]
        strict: bool,
    },
}

/// Initialize logging to stderr.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let directive = if verbose { "talkc=debug" } else { "talkc=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    // Install miette's fancy error handler
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(false)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Tokenize { file } => commands::tokenize::run(file.as_deref()),
        Command::Parse { file } => commands::parse::run(file.as_deref()),
        Command::Compile {
            mode,
            strict,
            dry_run,
            source,
            hash,
        } => commands::compile::run(&commands::compile::CompileArgs {
            mode,
            strict,
            dry_run,
            source,
            hash,
        }),
        Command::Build {
            file,
            output,
            mode,
            strict,
        } => commands::build::run(&file, output.as_deref(), mode, strict),
    };

    // Exit with appropriate code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    }
}
