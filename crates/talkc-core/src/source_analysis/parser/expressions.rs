// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Method body parsing.
//!
//! Turns the raw token span of one method into a statement tree. Each body
//! is parsed independently; a construct outside the compilable subset makes
//! the whole method [`Unsupported`], which the code generator turns into an
//! interpreter fallback.
//!
//! # Precedence
//!
//! | Level | Operators |
//! |-------|-----------|
//! | 1 (loosest) | `>` `<` `>=` `<=` `==` `!=` `=` |
//! | 2 | `,` |
//! | 3 | `+` `-` |
//! | 4 | `*` `/` |
//! | 5 | primary with collection suffixes |
//!
//! Statement forms (`ifTrue:`, `whileTrue:`, `ifNil:`, `do:`, ...) attach
//! after a complete expression.
//!
//! # Example
//!
//! ```
//! use talkc_core::ast::{BinaryOp, Expression, Statement};
//! use talkc_core::source_analysis::{lex, parse_method_body};
//!
//! let body = parse_method_body(&lex("value := value + 1")).unwrap();
//! assert!(matches!(
//!     &body[0],
//!     Statement::Assign { value: Expression::Binary { op: BinaryOp::Add, .. }, .. }
//! ));
//! ```

use ecow::EcoString;

use super::describe;
use crate::ast::{
    BinaryOp, Block, ClassPrimitiveOp, CollectionOp, Expression, IterationKind, Statement,
    keyword_selector,
};
use crate::source_analysis::{Position, Token, TokenKind};

/// Maximum nesting depth of expressions and blocks.
///
/// Deeper input is reported as unsupported instead of overflowing the stack.
const MAX_NESTING_DEPTH: usize = 64;

/// Keywords that end a keyword message send and start a statement form.
const STATEMENT_KEYWORDS: &[&str] = &[
    "ifTrue:",
    "ifFalse:",
    "whileTrue:",
    "ifNil:",
    "ifNotNil:",
    "do:",
    "collect:",
    "select:",
];

/// Why a method body cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason} (line {line})")]
pub struct Unsupported {
    /// Human-readable reason, used verbatim in the skip report.
    pub reason: EcoString,
    /// Source line of the offending construct.
    pub line: u32,
}

type PResult<T> = Result<T, Unsupported>;

/// Parses a method body into statements.
///
/// # Errors
///
/// Returns [`Unsupported`] when the body uses anything outside the
/// compilable subset: shell constructs, unknown statement keywords,
/// iteration blocks with the wrong parameter count, and so on.
pub fn parse_method_body(tokens: &[Token]) -> Result<Vec<Statement>, Unsupported> {
    let mut parser = BodyParser::new(tokens);
    parser.parse_statements(false)
}

/// Parser state for one method body.
struct BodyParser {
    /// Significant tokens plus newlines; `]]` already split in two.
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
    /// Line reported when input ends unexpectedly.
    last_line: u32,
}

impl BodyParser {
    fn new(tokens: &[Token]) -> Self {
        let mut prepared = Vec::with_capacity(tokens.len());
        for token in tokens {
            match token.kind() {
                TokenKind::Comment => {}
                TokenKind::DRBracket => {
                    let at = token.position();
                    prepared.push(Token::new(TokenKind::RBracket, "]", at));
                    prepared.push(Token::new(
                        TokenKind::RBracket,
                        "]",
                        Position::new(at.line(), at.column() + 1),
                    ));
                }
                _ => prepared.push(token.clone()),
            }
        }
        let last_line = prepared.last().map_or(1, Token::line);
        Self {
            tokens: prepared,
            current: 0,
            depth: 0,
            last_line,
        }
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn current_kind(&self) -> Option<TokenKind> {
        self.current().map(Token::kind)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.current + 1).map(Token::kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.current).cloned();
        if token.is_some() {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == Some(kind)
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        self.current().is_some_and(|t| t.is_keyword(keyword))
    }

    /// The keyword name of the current token, if it is a keyword.
    fn current_keyword(&self) -> Option<EcoString> {
        self.current()
            .and_then(Token::keyword_parts)
            .map(|(name, _)| EcoString::from(name))
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.current += 1;
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.current_kind(), Some(TokenKind::Newline | TokenKind::Dot)) {
            self.current += 1;
        }
    }

    /// If `keyword` follows after optional newlines, consumes the newlines
    /// and returns true. Otherwise leaves the position unchanged.
    fn continues_with(&mut self, keyword: &str) -> bool {
        let mut probe = self.current;
        while self
            .tokens
            .get(probe)
            .is_some_and(|t| t.kind() == TokenKind::Newline)
        {
            probe += 1;
        }
        if self.tokens.get(probe).is_some_and(|t| t.is_keyword(keyword)) {
            self.current = probe;
            true
        } else {
            false
        }
    }

    // ========================================================================
    // Failures
    // ========================================================================

    fn line(&self) -> u32 {
        self.current().map_or(self.last_line, Token::line)
    }

    fn unsupported(&self, reason: impl Into<EcoString>) -> Unsupported {
        Unsupported {
            reason: reason.into(),
            line: self.line(),
        }
    }

    /// Explains why the current token cannot appear here.
    fn unexpected(&self, context: &str) -> Unsupported {
        let Some(token) = self.current() else {
            return self.unsupported(format!("unexpected end of body {context}"));
        };
        let reason = match token.kind() {
            kind if kind.is_shell() => format!("uses shell construct {}", describe(token)),
            TokenKind::DLBracket => "uses shell test `[[`".to_string(),
            TokenKind::Error => format!("unrecognized character `{}`", token.text()),
            TokenKind::Keyword => format!(
                "unsupported keyword `{}` {context}; message sends need `@ receiver`",
                token.text()
            ),
            _ => format!("unexpected {} {context}", describe(token)),
        };
        self.unsupported(reason)
    }

    fn enter(&mut self) -> PResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self.unsupported("expression nesting is too deep"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Parses statements up to end of input, or up to the `]` that closes
    /// the enclosing block when `in_block` is set.
    fn parse_statements(&mut self, in_block: bool) -> PResult<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            match self.current_kind() {
                None if in_block => return Err(self.unsupported("unterminated block")),
                None => break,
                Some(TokenKind::RBracket) if in_block => break,
                _ => {}
            }

            statements.push(self.parse_statement()?);

            match self.current_kind() {
                None | Some(TokenKind::Newline | TokenKind::Dot) => {}
                Some(TokenKind::RBracket) if in_block => {}
                _ => return Err(self.unexpected("after a statement")),
            }
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> PResult<Statement> {
        match self.current_kind() {
            Some(TokenKind::Pipe) => self.parse_locals(),
            Some(TokenKind::Or) => {
                self.advance();
                Ok(Statement::Locals(Vec::new()))
            }
            Some(TokenKind::Caret) => {
                self.advance();
                let value = self.parse_expression()?;
                let value = self.parse_iteration_tail(value)?;
                Ok(Statement::Return(value))
            }
            Some(TokenKind::Identifier) if self.peek_kind() == Some(TokenKind::Assign) => {
                let target = self.advance().map(|t| EcoString::from(t.text()));
                self.advance();
                let value = self.parse_expression()?;
                let value = self.parse_iteration_tail(value)?;
                Ok(Statement::Assign {
                    target: target.unwrap_or_default(),
                    value,
                })
            }
            _ => {
                let expr = self.parse_expression()?;
                self.parse_statement_tail(expr)
            }
        }
    }

    /// `| a b c |`
    fn parse_locals(&mut self) -> PResult<Statement> {
        self.advance();
        let mut names = Vec::new();
        while let Some(token) = self.current() {
            match token.kind() {
                TokenKind::Identifier => {
                    names.push(EcoString::from(token.text()));
                    self.advance();
                }
                TokenKind::Pipe => {
                    self.advance();
                    return Ok(Statement::Locals(names));
                }
                _ => return Err(self.unexpected("in a local variable declaration")),
            }
        }
        Err(self.unsupported("unterminated local variable declaration"))
    }

    /// Recognizes the statement forms that follow a complete expression.
    fn parse_statement_tail(&mut self, expr: Expression) -> PResult<Statement> {
        let Some(keyword) = self.current_keyword() else {
            return Ok(Statement::Expr(expr));
        };

        match keyword.as_str() {
            "ifTrue:" => {
                self.advance();
                let then_branch = self.parse_branch("ifTrue:")?;
                let else_branch = if self.continues_with("ifFalse:") {
                    self.advance();
                    Some(self.parse_branch("ifFalse:")?)
                } else {
                    None
                };
                Ok(Statement::If {
                    condition: expr,
                    then_branch: Some(then_branch),
                    else_branch,
                })
            }
            "ifFalse:" => {
                self.advance();
                let else_branch = self.parse_branch("ifFalse:")?;
                let then_branch = if self.continues_with("ifTrue:") {
                    self.advance();
                    Some(self.parse_branch("ifTrue:")?)
                } else {
                    None
                };
                Ok(Statement::If {
                    condition: expr,
                    then_branch,
                    else_branch: Some(else_branch),
                })
            }
            "whileTrue:" => self.parse_while(expr),
            "ifNil:" | "ifNotNil:" => self.parse_nil_guard(expr),
            "do:" | "collect:" | "select:" => {
                Ok(Statement::Expr(self.parse_iteration_tail(expr)?))
            }
            _ => Err(self.unexpected("after an expression")),
        }
    }

    /// `[cond] whileTrue: [body]`
    fn parse_while(&mut self, receiver: Expression) -> PResult<Statement> {
        let Expression::Block(condition_block) = receiver else {
            return Err(self.unsupported("`whileTrue:` needs a block receiver"));
        };
        if !condition_block.params.is_empty() {
            return Err(self.unsupported("`whileTrue:` condition block cannot take parameters"));
        }
        let mut condition_body = condition_block.body;
        let condition = match (condition_body.pop(), condition_body.is_empty()) {
            (Some(Statement::Expr(condition)), true) => condition,
            _ => {
                return Err(
                    self.unsupported("`whileTrue:` condition block must hold a single expression")
                );
            }
        };
        self.advance();
        let body = self.parse_branch("whileTrue:")?;
        Ok(Statement::While { condition, body })
    }

    /// `x ifNil: [..]`, `x ifNotNil: [:v | ..]`, in either order, each at
    /// most once.
    fn parse_nil_guard(&mut self, subject: Expression) -> PResult<Statement> {
        let mut if_nil = None;
        let mut if_not_nil = None;
        let mut binding = None;

        loop {
            if if_nil.is_none() && self.check_keyword("ifNil:") {
                self.advance();
                if_nil = Some(self.parse_branch("ifNil:")?);
            } else if if_not_nil.is_none() && self.check_keyword("ifNotNil:") {
                self.advance();
                let block = self.parse_block_argument("ifNotNil:")?;
                if block.params.len() > 1 {
                    return Err(self.unsupported(format!(
                        "`ifNotNil:` block takes at most one parameter, found {}",
                        block.params.len()
                    )));
                }
                binding = block.params.into_iter().next();
                if_not_nil = Some(block.body);
            } else {
                break;
            }

            let next = if if_nil.is_none() { "ifNil:" } else { "ifNotNil:" };
            if (if_nil.is_some() && if_not_nil.is_some()) || !self.continues_with(next) {
                break;
            }
        }

        Ok(Statement::NilGuard {
            subject,
            if_nil,
            if_not_nil,
            binding,
        })
    }

    /// Parses a parameterless branch block and returns its statements.
    fn parse_branch(&mut self, keyword: &str) -> PResult<Vec<Statement>> {
        let block = self.parse_block_argument(keyword)?;
        if !block.params.is_empty() {
            return Err(self.unsupported(format!("`{keyword}` block cannot take parameters")));
        }
        Ok(block.body)
    }

    /// Parses the block literal that must follow a statement keyword.
    fn parse_block_argument(&mut self, keyword: &str) -> PResult<Block> {
        self.skip_newlines();
        if !self.check(TokenKind::LBracket) {
            return Err(self.unsupported(format!("`{keyword}` expects a block literal")));
        }
        self.parse_block()
    }

    /// Wraps `receiver` in an iteration if `do:`, `collect:` or `select:`
    /// follows.
    fn parse_iteration_tail(&mut self, receiver: Expression) -> PResult<Expression> {
        let Some(kind) = self
            .current_keyword()
            .and_then(|k| IterationKind::from_keyword(&k))
        else {
            return Ok(receiver);
        };
        let keyword = kind.keyword();
        self.advance();
        self.skip_newlines();

        match self.current_kind() {
            Some(TokenKind::LBracket) => {
                let block = self.parse_block()?;
                if block.params.len() != 1 {
                    return Err(self.unsupported(format!(
                        "`{keyword}` block must take exactly one parameter, found {}",
                        block.params.len()
                    )));
                }
                if kind != IterationKind::Do
                    && !matches!(block.body.last(), Some(Statement::Expr(_)))
                {
                    return Err(self.unsupported(format!(
                        "`{keyword}` block must end with an expression"
                    )));
                }
                Ok(Expression::Iteration {
                    kind,
                    receiver: Box::new(receiver),
                    block,
                })
            }
            Some(TokenKind::Identifier) => {
                let block_var = self
                    .advance()
                    .map(|t| EcoString::from(t.text()))
                    .unwrap_or_default();
                Ok(Expression::DynamicIteration {
                    kind,
                    receiver: Box::new(receiver),
                    block_var,
                })
            }
            _ => Err(self.unsupported(format!(
                "`{keyword}` expects a block literal or a block variable"
            ))),
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn parse_expression(&mut self) -> PResult<Expression> {
        self.enter()?;
        let expr = self.parse_comparison();
        self.leave();
        expr
    }

    fn parse_comparison(&mut self) -> PResult<Expression> {
        let mut left = self.parse_concat()?;
        while let Some(op) = self.current_kind().and_then(comparison_op) {
            self.advance();
            let right = self.parse_concat()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_concat(&mut self) -> PResult<Expression> {
        let mut left = self.parse_additive()?;
        while self.check(TokenKind::Comma) {
            self.advance();
            let right = self.parse_additive()?;
            left = binary(BinaryOp::Concat, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> PResult<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> PResult<Expression> {
        let mut left = self.parse_postfix()?;
        loop {
            let op = match self.current_kind() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_postfix()?;
            left = binary(op, left, right);
        }
    }

    fn parse_postfix(&mut self) -> PResult<Expression> {
        let primary = self.parse_primary()?;
        self.parse_collection_suffixes(primary)
    }

    fn parse_primary(&mut self) -> PResult<Expression> {
        let Some(token) = self.current().cloned() else {
            return Err(self.unsupported("expected an expression, found end of body"));
        };

        match token.kind() {
            TokenKind::Number => {
                self.advance();
                Ok(Expression::Number(token.text().into()))
            }
            TokenKind::Minus if self.peek_kind() == Some(TokenKind::Number) => {
                self.advance();
                let digits = self.advance().map(|t| t.text().to_string()).unwrap_or_default();
                Ok(Expression::Number(format!("-{digits}").into()))
            }
            TokenKind::DString if token.text().contains('$') => Err(self.unsupported(format!(
                "double-quoted string {} uses shell interpolation",
                token.text()
            ))),
            kind if kind.is_string() => {
                self.advance();
                Ok(Expression::String(token.string_content().unwrap_or_default()))
            }
            TokenKind::Identifier => {
                self.advance();
                if self.check(TokenKind::NamespaceSep) && self.peek_kind() == Some(TokenKind::Identifier) {
                    self.advance();
                    let name = self.advance().map(|t| EcoString::from(t.text())).unwrap_or_default();
                    return Ok(Expression::Qualified {
                        package: token.text().into(),
                        name,
                    });
                }
                Ok(Expression::Identifier(token.text().into()))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                if !self.check(TokenKind::RParen) {
                    return Err(self.unexpected("where `)` was expected"));
                }
                self.advance();
                Ok(inner)
            }
            TokenKind::LBracket => Ok(Expression::Block(self.parse_block()?)),
            TokenKind::At => self.parse_send(),
            _ => Err(self.unexpected("in an expression")),
        }
    }

    /// `[ :a :b | statements ]`
    fn parse_block(&mut self) -> PResult<Block> {
        self.enter()?;
        self.advance(); // `[`
        let mut params = Vec::new();
        while let Some(token) = self.current() {
            if token.kind() != TokenKind::BlockParam {
                break;
            }
            params.push(EcoString::from(token.text().trim_start_matches(':')));
            self.advance();
        }
        if !params.is_empty() {
            if self.check(TokenKind::Pipe) {
                self.advance();
            } else if !self.check(TokenKind::RBracket) {
                return Err(self.unexpected("after block parameters; expected `|`"));
            }
        }

        let body = self.parse_statements(true)?;
        self.advance(); // `]`
        self.leave();
        Ok(Block { params, body })
    }

    /// `@ receiver selector` or `@ receiver k1: a1 k2: a2`.
    fn parse_send(&mut self) -> PResult<Expression> {
        self.enter()?;
        self.advance(); // `@`
        let receiver = self.parse_primary()?;
        if matches!(receiver, Expression::Block(_)) {
            return Err(self.unsupported("a block literal cannot be the receiver of `@`"));
        }

        let (selector, args) = match self.current_kind() {
            Some(TokenKind::Identifier) => {
                let name = self.advance().map(|t| EcoString::from(t.text())).unwrap_or_default();
                (name, Vec::new())
            }
            Some(TokenKind::Keyword) => self.parse_keyword_message()?,
            _ => return Err(self.unexpected("where a message selector was expected")),
        };

        self.leave();
        if let Expression::Identifier(class) = &receiver {
            if let Some(op) = ClassPrimitiveOp::lookup(class, &selector) {
                return Ok(Expression::ClassPrimitive { op, args });
            }
        }
        let is_self = receiver.is_self();
        Ok(Expression::Send {
            receiver: Box::new(receiver),
            selector,
            args,
            is_self,
        })
    }

    /// Parses `k1: a1 k2: a2 ...` up to a statement keyword.
    fn parse_keyword_message(&mut self) -> PResult<(EcoString, Vec<Expression>)> {
        let mut parts: Vec<EcoString> = Vec::new();
        let mut args = Vec::new();
        while let Some(token) = self.current().cloned() {
            let Some((name, embedded)) = token.keyword_parts() else {
                break;
            };
            if !parts.is_empty() && STATEMENT_KEYWORDS.contains(&name) {
                break;
            }
            self.advance();
            let arg = match embedded {
                Some(digits) => Expression::Number(digits.into()),
                None => self.parse_concat()?,
            };
            parts.push(name.into());
            args.push(arg);
        }
        Ok((keyword_selector(parts.iter().map(EcoString::as_str)), args))
    }

    /// Folds a run of collection operations into nested nodes.
    ///
    /// `arrayAt:`/`objectAt:` immediately followed by `put:` becomes a single
    /// two-argument at-put node.
    fn parse_collection_suffixes(&mut self, mut receiver: Expression) -> PResult<Expression> {
        loop {
            let Some(token) = self.current().cloned() else {
                return Ok(receiver);
            };

            if token.kind() == TokenKind::Identifier {
                let Some(op) = CollectionOp::from_unary(token.text()) else {
                    return Ok(receiver);
                };
                self.advance();
                receiver = collection(receiver, op, Vec::new());
                continue;
            }

            let Some((name, embedded)) = token.keyword_parts() else {
                return Ok(receiver);
            };
            let Some(op) = CollectionOp::from_keyword(name) else {
                return Ok(receiver);
            };
            self.advance();
            let arg = self.parse_keyword_arg(embedded)?;

            match op.with_put() {
                Some(fused) if self.check_keyword("put:") => {
                    let put = self.advance();
                    let embedded = put
                        .as_ref()
                        .and_then(Token::keyword_parts)
                        .and_then(|(_, value)| value);
                    let value = self.parse_keyword_arg(embedded)?;
                    receiver = collection(receiver, fused, vec![arg, value]);
                }
                _ => receiver = collection(receiver, op, vec![arg]),
            }
        }
    }

    /// A collection keyword argument: the fused digits, or a bare primary.
    fn parse_keyword_arg(&mut self, embedded: Option<&str>) -> PResult<Expression> {
        match embedded {
            Some(digits) => Ok(Expression::Number(digits.into())),
            None => self.parse_primary(),
        }
    }
}

fn comparison_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Ge => BinaryOp::Ge,
        TokenKind::Le => BinaryOp::Le,
        TokenKind::Eq | TokenKind::Equals => BinaryOp::Eq,
        TokenKind::Ne => BinaryOp::Ne,
        _ => return None,
    })
}

fn binary(op: BinaryOp, left: Expression, right: Expression) -> Expression {
    Expression::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn collection(receiver: Expression, op: CollectionOp, args: Vec<Expression>) -> Expression {
    Expression::Collection {
        receiver: Box::new(receiver),
        op,
        args,
    }
}
