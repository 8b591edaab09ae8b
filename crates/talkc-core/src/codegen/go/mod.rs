// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Go code generation for talk classes.
//!
//! A parsed [`ClassDecl`] becomes one Go source file. Methods inside the
//! compilable subset are compiled to native Go; every other method is left
//! to the interpreter, and the generated dispatch answers exit code `200`
//! for its selector so the caller falls back.
//!
//! # Architecture
//!
//! Generation runs in two phases:
//!
//! 1. **Pre-pass** ([`analysis`]): decides for every method whether it
//!    compiles, computes its `has_return` / `has_error` flags, and attaches
//!    advice. The result is an immutable `SkipSet`.
//! 2. **Emission**: walks the compiled methods and produces a
//!    [`Document`](document::Document) tree, which is rendered once.
//!
//! # Example
//!
//! talk source:
//! ```text
//! Counter subclass: Object
//!   instanceVars: value:0
//!   method: increment [ value := value + 1 ]
//! ```
//!
//! Generated Go (abridged):
//! ```go
//! type Counter struct {
//!     ID    string `json:"-"`
//!     Class string `json:"class"`
//!     Value string `json:"value"`
//! }
//!
//! func (c *Counter) Increment() {
//!     c.Value = strconv.Itoa((_toInt(c.Value) + 1))
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`analysis`] - pre-pass: skip set, flags, advice, aliases
//! - [`expressions`] - identifiers, literals, operators, sends, class primitives
//! - [`collections`] - array and object suffix operations, push flattening
//! - [`control_flow`] - statements, conditionals, loops, iteration
//! - [`method_codegen`] - method functions and primitive bodies
//! - [`dispatch_codegen`] - per-struct selector dispatch
//! - [`entry_points`] - file layout, structs, persistence, entry points
//! - [`runtime`] - the embedded Go helper library

mod analysis;
mod collections;
mod control_flow;
mod dispatch_codegen;
pub mod document;
mod entry_points;
mod expressions;
mod method_codegen;
pub mod primitive_bindings;
pub mod reserved;
pub mod runtime;
pub mod selector_mangler;
pub mod value_type;
mod variable_context;


use ecow::EcoString;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::ast::{ClassDecl, MethodKind, Statement};
use analysis::SkipSet;
use document::{Document, INDENT, braced, line, lines, nest};
use primitive_bindings::PrimitiveBindingTable;
use value_type::GoExpr;
use variable_context::VariableContext;

/// Errors that can occur during code generation.
#[derive(Debug, Error)]
pub enum CodeGenError {
    /// The declaration cannot be compiled at all.
    #[error("cannot compile class: {0}")]
    InvalidClass(String),

    /// Strict mode and at least one method falls back.
    #[error(
        "{} method(s) would fall back to the interpreter: {}",
        .skipped.len(),
        describe_skips(.skipped)
    )]
    StrictFallback {
        /// Each skipped method with its reason.
        skipped: Vec<SkipReason>,
    },

    /// Internal code generation error.
    #[error("code generation error: {0}")]
    Internal(String),
}

/// Result type for code generation operations.
pub type Result<T> = std::result::Result<T, CodeGenError>;

/// The two shapes of generated program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EmitMode {
    /// A standalone program backed by SQLite.
    #[default]
    Binary,
    /// A cgo shared library exporting `GetClassName` and `Dispatch`.
    Plugin,
}

impl std::str::FromStr for EmitMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "binary" => Ok(Self::Binary),
            "plugin" => Ok(Self::Plugin),
            other => Err(format!("unknown mode `{other}` (expected binary or plugin)")),
        }
    }
}

/// Options for Go code generation.
#[derive(Debug, Clone)]
pub struct CodegenOptions {
    mode: EmitMode,
    /// Fail instead of falling back.
    strict: bool,
    /// Source text embedded for `--source`.
    source_text: Option<String>,
    /// Hash embedded for `--hash`.
    source_hash: Option<String>,
    /// Interpreter used when `TALK_INTERPRETER` is unset.
    interpreter: String,
    /// Replaces the built-in primitive registry.
    bindings: Option<PrimitiveBindingTable>,
}

impl CodegenOptions {
    /// Creates default options for the given mode.
    pub fn new(mode: EmitMode) -> Self {
        Self {
            mode,
            strict: false,
            source_text: None,
            source_hash: None,
            interpreter: "talk".to_string(),
            bindings: None,
        }
    }

    /// Makes any fallback a [`CodeGenError::StrictFallback`].
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Embeds the class source text.
    #[must_use]
    pub fn with_source(mut self, source: &str) -> Self {
        self.source_text = Some(source.to_string());
        self
    }

    /// Embeds the source hash.
    #[must_use]
    pub fn with_source_hash(mut self, hash: &str) -> Self {
        self.source_hash = Some(hash.to_string());
        self
    }

    /// Sets the default interpreter command.
    #[must_use]
    pub fn with_interpreter(mut self, interpreter: &str) -> Self {
        self.interpreter = interpreter.to_string();
        self
    }

    /// Sets the primitive binding table.
    #[must_use]
    pub fn with_bindings(mut self, bindings: PrimitiveBindingTable) -> Self {
        self.bindings = Some(bindings);
        self
    }

    pub fn mode(&self) -> EmitMode {
        self.mode
    }
}

/// Why a method was left to the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipReason {
    pub selector: EcoString,
    pub reason: EcoString,
}

/// What happened to each method of the class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    /// Selectors with native code, aliases included.
    pub compiled: Vec<EcoString>,
    pub skipped: Vec<SkipReason>,
    pub warnings: Vec<EcoString>,
}

/// Generated Go source plus the compile report.
#[derive(Debug, Clone)]
pub struct GeneratedUnit {
    pub source: String,
    pub report: CompileReport,
}

impl GeneratedUnit {
    /// One-line summary used by `--dry-run`.
    pub fn summary(&self) -> String {
        format!(
            "{} bytes ({} methods compiled, {} skipped)",
            self.source.len(),
            self.report.compiled.len(),
            self.report.skipped.len()
        )
    }
}

/// Generates Go source for a class.
///
/// # Errors
///
/// Returns [`CodeGenError::InvalidClass`] when the declaration carries fatal
/// parse errors, and [`CodeGenError::StrictFallback`] in strict mode when
/// any method falls back.
#[instrument(skip_all, fields(class = %class.name, mode = ?options.mode))]
pub fn generate(class: &ClassDecl, options: &CodegenOptions) -> Result<GeneratedUnit> {
    if let Some(error) = class.errors.first() {
        return Err(CodeGenError::InvalidClass(format!(
            "{} (line {})",
            error.message,
            error.position.line()
        )));
    }
    if class.name.is_empty() {
        return Err(CodeGenError::InvalidClass("the class has no name".to_string()));
    }

    let registry = options
        .bindings
        .as_ref()
        .unwrap_or_else(|| PrimitiveBindingTable::builtin());
    let skip_set = analysis::analyse(class, registry);

    if options.strict && !skip_set.skipped.is_empty() {
        return Err(CodeGenError::StrictFallback {
            skipped: skip_set.skipped.clone(),
        });
    }

    let report = CompileReport {
        compiled: skip_set.compiled_selectors(),
        skipped: skip_set.skipped.clone(),
        warnings: skip_set.warnings.clone(),
    };

    let mut generator = GoGenerator::new(class, options, skip_set);
    let source = generator.generate_file()?.to_pretty_string();
    debug!(
        bytes = source.len(),
        compiled = report.compiled.len(),
        skipped = report.skipped.len(),
        "generated Go source"
    );
    Ok(GeneratedUnit { source, report })
}

fn describe_skips(skipped: &[SkipReason]) -> String {
    skipped
        .iter()
        .map(|s| format!("{} ({})", s.selector, s.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Documents in generated code own their text.
type Doc = Document<'static>;

/// State of the method being emitted.
#[derive(Debug, Default)]
struct MethodState {
    kind: MethodKind,
    has_error: bool,
    has_return: bool,
    /// After advice, emitted before each return.
    after: Vec<Statement>,
}

/// Go code generator for one class.
pub(super) struct GoGenerator<'a> {
    class: &'a ClassDecl,
    options: &'a CodegenOptions,
    skip_set: SkipSet,
    ctx: VariableContext,
    method: MethodState,
    /// Statements that must run before the expression being compiled.
    prelude: Vec<Doc>,
}

impl<'a> GoGenerator<'a> {
    fn new(class: &'a ClassDecl, options: &'a CodegenOptions, skip_set: SkipSet) -> Self {
        Self {
            class,
            options,
            skip_set,
            ctx: VariableContext::new(),
            method: MethodState::default(),
            prelude: Vec::new(),
        }
    }

    /// The Go struct name for a side.
    fn struct_name(&self, kind: MethodKind) -> String {
        match kind {
            MethodKind::Instance => self.class.name.to_string(),
            MethodKind::Class => format!("{}ClassSide", self.class.name),
        }
    }

    /// The Go method receiver for a side.
    fn receiver_for(kind: MethodKind) -> &'static str {
        match kind {
            MethodKind::Instance => "c",
            MethodKind::Class => "cs",
        }
    }

    fn receiver(&self) -> &'static str {
        Self::receiver_for(self.method.kind)
    }

    /// How `self` is named when handed to the interpreter.
    fn self_id(&self) -> &'static str {
        match self.method.kind {
            MethodKind::Instance => "c.ID",
            MethodKind::Class => "_className",
        }
    }

    /// Runs `f` with an empty prelude and returns what it hoisted.
    fn with_prelude<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<(Vec<Doc>, T)> {
        let saved = std::mem::take(&mut self.prelude);
        let result = f(self);
        let hoisted = std::mem::replace(&mut self.prelude, saved);
        Ok((hoisted, result?))
    }

    /// `if err != nil { return "", err }`
    fn error_check(&self) -> Result<Doc> {
        if !self.method.has_error {
            return Err(CodeGenError::Internal(
                "fallible call in a method without an error result".to_string(),
            ));
        }
        Ok(braced(
            Document::Str("if err != nil"),
            vec![Document::Str("return \"\", err")],
        ))
    }

    /// Hoists a `(string, error)` call into the prelude and returns its value.
    fn hoist_fallible(&mut self, call: String) -> Result<GoExpr> {
        let check = self.error_check()?;
        let temp = self.ctx.fresh_temp("t");
        self.prelude
            .push(Document::String(format!("{temp}, err := {call}")));
        self.prelude.push(check);
        Ok(GoExpr::text(temp))
    }

    /// A bare `{ ... }` scope.
    fn scope_block(body: Vec<Doc>) -> Doc {
        crate::docvec![
            "{",
            nest(INDENT, crate::docvec![line(), lines(body)]),
            line(),
            "}"
        ]
    }
}

impl SkipSet {
    /// Dispatchable selectors: compiled methods then aliases.
    fn compiled_selectors(&self) -> Vec<EcoString> {
        self.methods
            .iter()
            .map(|m| m.selector.clone())
            .chain(self.aliases.iter().map(|a| a.new_name.clone()))
            .collect()
    }
}
