// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Declaration errors rendered with miette.
//!
//! A [`ParseError`] carries a 1-based line and column; the span starts at
//! that byte and covers the offending token when there is one.

// Suppress unused_assignments for struct fields used by derive macros
#![allow(unused_assignments)]

use miette::{Diagnostic, SourceSpan};
use talkc_core::ast::ParseError;

/// A declaration error with source context.
#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("{message}")]
#[diagnostic(code(talkc::parse))]
pub struct CompileDiagnostic {
    /// Human-readable error message
    pub message: String,
    #[source_code]
    pub src: miette::NamedSource<String>,
    #[label("{label}")]
    pub span: SourceSpan,
    /// What the parser was doing
    pub label: String,
}

impl CompileDiagnostic {
    /// Builds a diagnostic from a declaration error.
    pub fn from_parse_error(error: &ParseError, source_path: &str, source: &str) -> Self {
        let offset = error
            .position
            .byte_offset_in(source)
            .unwrap_or(source.len());
        let len = error
            .token
            .as_ref()
            .map_or(0, |token| token.text().len())
            .min(source.len() - offset);
        let label = if error.context.is_empty() {
            "error here".to_string()
        } else {
            format!("while parsing {}", error.context)
        };

        Self {
            message: error.message.to_string(),
            src: miette::NamedSource::new(source_path, source.to_string()),
            span: (offset, len).into(),
            label,
        }
    }
}

/// Prints every declaration error to stderr.
pub fn report_parse_errors(errors: &[ParseError], source_path: &str, source: &str) {
    for error in errors {
        let diagnostic = CompileDiagnostic::from_parse_error(error, source_path, source);
        eprintln!("{:?}", miette::Report::new(diagnostic));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talkc_core::source_analysis::parse_source;

    fn first_error(source: &str) -> ParseError {
        let class = parse_source(source);
        class.errors.into_iter().next().expect("a parse error")
    }

    #[test]
    fn span_points_at_offending_token() {
        let source = "A subclass: Object\n  method: 42 [ ^ 1 ]\n  method: good [ ]\n";
        let error = first_error(source);
        let diag = CompileDiagnostic::from_parse_error(&error, "a.talk", source);

        assert_eq!(diag.message, error.message.as_str());
        let offset = error.position.byte_offset_in(source).unwrap_or(source.len());
        assert_eq!(diag.span.offset(), offset);
        assert!(diag.span.offset() + diag.span.len() <= source.len());
        assert!(diag.label.starts_with("while parsing") || diag.label == "error here");
    }

    #[test]
    fn missing_header_is_reported() {
        let source = "  method: foo [ ^ 1 ]\n";
        let error = first_error(source);
        let diag = CompileDiagnostic::from_parse_error(&error, "x.talk", source);
        assert!(!diag.message.is_empty());
        assert!(diag.span.offset() <= source.len());
    }
}
