// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! talk compiler core.
//!
//! This crate contains the compiler pipeline:
//! - Lexical analysis (tokenization)
//! - Declaration and method body parsing
//! - Go code generation, standalone program or plugin
//!
//! Methods outside the compilable subset are not errors: they are reported
//! as skipped and the generated program hands them back to the interpreter.

pub mod ast;
pub mod codegen;
pub mod source_analysis;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::ast::{ClassDecl, Expression, MethodDecl, Statement};
    pub use crate::codegen::go::{CodegenOptions, EmitMode, GeneratedUnit, generate};
    pub use crate::source_analysis::{Position, Token, TokenKind, lex, parse_source};
}
