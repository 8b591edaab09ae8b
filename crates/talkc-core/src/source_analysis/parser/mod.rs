// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parsers for talk source code.
//!
//! Parsing happens in two independent stages:
//!
//! 1. The **declaration parser** ([`parse_class`]) walks the whole token
//!    stream of one class and builds a [`ClassDecl`]. Method and advice
//!    bodies are collected as raw token spans without interpretation.
//! 2. The **body parser** ([`parse_method_body`]) runs once per method over
//!    its token span and builds a statement tree, or reports why the body
//!    is outside the compilable subset.
//!
//! # Design Philosophy
//!
//! - **Error recovery is mandatory**: [`parse_class`] always returns a tree
//! - **Multiple errors**: every malformed declaration is recorded, then the
//!   parser synchronizes on the next body-level keyword
//! - **Local failures**: a body the compiler cannot handle only affects
//!   its own method
//!
//! # Usage
//!
//! ```
//! use talkc_core::source_analysis::parse_source;
//!
//! let class = parse_source("Counter subclass: Object\n  instanceVars: value:0\n  method: increment [ value := value + 1 ]\n");
//!
//! assert!(class.errors.is_empty());
//! assert_eq!(class.name, "Counter");
//! assert_eq!(class.methods[0].selector, "increment");
//! ```

mod declarations;
mod expressions;

#[cfg(test)]
mod property_tests;

pub use expressions::{Unsupported, parse_method_body};

use ecow::EcoString;
use tracing::{debug, instrument};

use crate::ast::{ClassDecl, ParseError, ParseErrorKind, ParseWarning, ParseWarningKind};
use crate::source_analysis::{Position, Token, TokenKind, lex};

/// Keywords that start a declaration inside a class body. They are also the
/// synchronization points for error recovery.
pub(crate) const BODY_KEYWORDS: &[&str] = &[
    "category:",
    "instanceVars:",
    "classInstanceVars:",
    "include:",
    "requires:",
    "method:",
    "classMethod:",
    "rawMethod:",
    "rawClassMethod:",
    "alias:",
    "before:",
    "after:",
];

/// Parses a token stream into a class declaration.
///
/// Never fails: problems are recorded in [`ClassDecl::errors`] and
/// [`ClassDecl::warnings`], and the tree may be partial.
#[must_use]
#[instrument(skip_all, fields(tokens = tokens.len()))]
pub fn parse_class(tokens: Vec<Token>) -> ClassDecl {
    let mut parser = Parser::new(tokens);
    let class = parser.parse_class_decl();
    debug!(
        class = %class.name,
        methods = class.methods.len(),
        errors = class.errors.len(),
        warnings = class.warnings.len(),
        "parsed class declaration"
    );
    class
}

/// Tokenizes and parses source text.
#[must_use]
pub fn parse_source(source: &str) -> ClassDecl {
    parse_class(lex(source))
}

/// Describes a token for error messages: ``identifier `foo` ``.
pub(super) fn describe(token: &Token) -> String {
    match token.kind() {
        TokenKind::Newline => "end of line".to_string(),
        kind => format!(
            "{} `{}`",
            kind.name().to_ascii_lowercase().replace('_', " "),
            token.text()
        ),
    }
}

/// The declaration parser state.
pub(super) struct Parser {
    /// The tokens being parsed, trivia included.
    tokens: Vec<Token>,
    /// Current token index.
    current: usize,
    /// Accumulated errors.
    errors: Vec<ParseError>,
    /// Accumulated warnings.
    warnings: Vec<ParseWarning>,
}

impl Parser {
    /// Creates a new parser for the given tokens.
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    /// Returns the current token, or `None` at end of input.
    pub(super) fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    /// Returns the current token kind.
    pub(super) fn current_kind(&self) -> Option<TokenKind> {
        self.current_token().map(Token::kind)
    }

    /// Peeks `offset` tokens past the current one, trivia included.
    pub(super) fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.current + offset)
    }

    /// Checks if we're at the end of input.
    pub(super) fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    /// Advances to the next token and returns the consumed one.
    pub(super) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.current).cloned();
        if token.is_some() {
            self.current += 1;
        }
        token
    }

    /// Checks if the current token has the given kind.
    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == Some(kind)
    }

    /// Checks if the current token is the given keyword.
    pub(super) fn check_keyword(&self, keyword: &str) -> bool {
        self.current_token().is_some_and(|t| t.is_keyword(keyword))
    }

    /// Consumes the current token if it has the given kind.
    pub(super) fn match_token(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) { self.advance() } else { None }
    }

    /// Skips `NEWLINE` and `COMMENT` tokens.
    pub(super) fn skip_trivia(&mut self) {
        while self.current_kind().is_some_and(TokenKind::is_trivia) {
            self.current += 1;
        }
    }

    /// Skips comments but stops at a newline.
    pub(super) fn skip_comments(&mut self) {
        while self.check(TokenKind::Comment) {
            self.current += 1;
        }
    }

    /// Returns true at a newline or end of input (comments skipped).
    pub(super) fn at_line_end(&mut self) -> bool {
        self.skip_comments();
        self.is_at_end() || self.check(TokenKind::Newline)
    }

    /// Returns true if the current token starts a body-level declaration.
    pub(super) fn at_body_keyword(&self) -> bool {
        self.current_token()
            .and_then(Token::keyword_parts)
            .is_some_and(|(name, _)| BODY_KEYWORDS.contains(&name))
    }

    /// Position of the current token, or of the last token at end of input.
    pub(super) fn current_position(&self) -> Position {
        self.current_token()
            .or_else(|| self.tokens.last())
            .map_or(Position::START, Token::position)
    }

    // ========================================================================
    // Error Handling & Recovery
    // ========================================================================

    /// Records an error at the current token.
    pub(super) fn error(
        &mut self,
        kind: ParseErrorKind,
        message: impl Into<EcoString>,
        context: impl Into<EcoString>,
    ) {
        let token = self.current_token().cloned();
        self.error_at(kind, message, context, token);
    }

    /// Records an error at a specific token.
    pub(super) fn error_at(
        &mut self,
        kind: ParseErrorKind,
        message: impl Into<EcoString>,
        context: impl Into<EcoString>,
        token: Option<Token>,
    ) {
        let position = token
            .as_ref()
            .map_or_else(|| self.current_position(), Token::position);
        let error = ParseError {
            kind,
            message: message.into(),
            token,
            context: context.into(),
            position,
        };
        debug!(kind = ?error.kind, at = %error.position, message = %error.message, "parse error");
        self.errors.push(error);
    }

    /// Records a warning.
    pub(super) fn warning(
        &mut self,
        kind: ParseWarningKind,
        message: impl Into<EcoString>,
        position: Position,
    ) {
        self.warnings.push(ParseWarning {
            kind,
            message: message.into(),
            position,
        });
    }

    /// Synchronizes to the next body-level keyword (or end of input).
    ///
    /// Always consumes at least one token so recovery makes progress.
    pub(super) fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() && !self.at_body_keyword() {
            self.advance();
        }
    }

    /// Moves the collected diagnostics out of the parser.
    pub(super) fn take_diagnostics(&mut self) -> (Vec<ParseWarning>, Vec<ParseError>) {
        (
            std::mem::take(&mut self.warnings),
            std::mem::take(&mut self.errors),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser(source: &str) -> Parser {
        Parser::new(lex(source))
    }

    #[test]
    fn skip_trivia_stops_at_significant_token() {
        let mut p = parser("\n# note\n  foo");
        p.skip_trivia();
        assert!(p.current_token().unwrap().is_identifier("foo"));
    }

    #[test]
    fn at_line_end_skips_comments_only() {
        let mut p = parser("# trailing\nfoo");
        assert!(p.at_line_end());
        assert!(p.check(TokenKind::Newline));
    }

    #[test]
    fn synchronize_stops_at_body_keyword() {
        let mut p = parser("junk more junk\n  method: foo [ ]");
        p.synchronize();
        assert!(p.check_keyword("method:"));
    }

    #[test]
    fn synchronize_always_advances() {
        let mut p = parser("method: x\nmethod: y");
        p.synchronize();
        assert!(p.check_keyword("method:"));
        assert_eq!(p.current, 3);
    }

    #[test]
    fn error_at_end_uses_last_position() {
        let mut p = parser("a\nb");
        while p.advance().is_some() {}
        p.error(ParseErrorKind::UnexpectedToken, "boom", "test");
        let (_, errors) = p.take_diagnostics();
        assert_eq!(errors[0].position, Position::new(2, 1));
        assert!(errors[0].token.is_none());
    }
}
