// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Statement and control flow code generation.
//!
//! Each statement first emits whatever its expressions hoisted into the
//! prelude, then itself:
//!
//! ```go
//! _t1, err := _sendMessage(c.ID, "total")
//! if err != nil {
//!     return "", err
//! }
//! c.Sum = _t1
//! ```
//!
//! A `whileTrue:` condition is compiled inside the loop so it is evaluated
//! again on every iteration, hoisted calls included.

use ecow::EcoString;

use super::document::{Document, braced};
use super::reserved::local_name;
use super::value_type::{GoExpr, ValueType};
use super::{CodeGenError, Doc, GoGenerator, Result};
use crate::ast::{Block, Expression, IterationKind, Statement};
use crate::docvec;

impl GoGenerator<'_> {
    /// Compiles a statement list.
    pub(super) fn statements(&mut self, statements: &[Statement]) -> Result<Vec<Doc>> {
        let mut docs = Vec::new();
        for statement in statements {
            docs.extend(self.statement(statement)?);
        }
        Ok(docs)
    }

    /// Compiles statements in a nested Go block.
    fn nested_statements(&mut self, statements: &[Statement]) -> Result<Vec<Doc>> {
        self.ctx.push_scope();
        let docs = self.statements(statements);
        self.ctx.pop_scope();
        docs
    }

    /// Compiles one statement, preceded by its hoisted prelude.
    fn statement(&mut self, statement: &Statement) -> Result<Vec<Doc>> {
        let (mut docs, body) = self.with_prelude(|g| g.statement_body(statement))?;
        docs.extend(body);
        Ok(docs)
    }

    fn statement_body(&mut self, statement: &Statement) -> Result<Vec<Doc>> {
        match statement {
            // Locals are hoisted to the top of the method.
            Statement::Locals(_) => Ok(Vec::new()),
            Statement::Assign { target, value } => {
                let value = self.expression(value)?;
                let (lhs, ty) = self.assign_target(target)?;
                Ok(vec![docvec![format!("{lhs} = {}", value.coerce(ty))]])
            }
            Statement::Return(value) => {
                let value = self.expression(value)?;
                self.return_value(&value.as_text())
            }
            Statement::Expr(value) => {
                let value = self.expression(value)?;
                if value.is_empty_text() {
                    Ok(Vec::new())
                } else {
                    Ok(vec![docvec![format!("_ = {}", value.code)]])
                }
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => self.conditional(condition, then_branch.as_deref(), else_branch.as_deref()),
            Statement::While { condition, body } => self.while_loop(condition, body),
            Statement::NilGuard {
                subject,
                if_nil,
                if_not_nil,
                binding,
            } => self.nil_guard(
                subject,
                if_nil.as_deref(),
                if_not_nil.as_deref(),
                binding.as_ref(),
            ),
        }
    }

    /// `return v`, running after advice first when there is any.
    pub(super) fn return_value(&mut self, text: &str) -> Result<Vec<Doc>> {
        let suffix = if self.method.has_error { ", nil" } else { "" };
        if self.method.after.is_empty() {
            return Ok(vec![docvec![format!("return {text}{suffix}")]]);
        }
        let temp = self.ctx.fresh_temp("r");
        let after = self.method.after.clone();
        let advice = self.advice_block(&after)?;
        Ok(vec![
            docvec![format!("{temp} := {text}")],
            advice,
            docvec![format!("return {temp}{suffix}")],
        ])
    }

    /// Advice runs in its own Go scope. A return inside advice does not run
    /// the after advice again.
    pub(super) fn advice_block(&mut self, statements: &[Statement]) -> Result<Doc> {
        let after = std::mem::take(&mut self.method.after);
        let body = self.nested_statements(statements);
        self.method.after = after;
        Ok(Self::scope_block(body?))
    }

    fn conditional(
        &mut self,
        condition: &Expression,
        then_branch: Option<&[Statement]>,
        else_branch: Option<&[Statement]>,
    ) -> Result<Vec<Doc>> {
        let condition = self.expression(condition)?.as_bool();
        let doc = match (then_branch, else_branch) {
            (Some(then_branch), Some(else_branch)) => {
                let then_docs = self.nested_statements(then_branch)?;
                let else_docs = self.nested_statements(else_branch)?;
                docvec![
                    braced(docvec![format!("if {condition}")], then_docs),
                    braced(Document::Str(" else"), else_docs),
                ]
            }
            (Some(then_branch), None) => {
                let then_docs = self.nested_statements(then_branch)?;
                braced(docvec![format!("if {condition}")], then_docs)
            }
            (None, Some(else_branch)) => {
                let else_docs = self.nested_statements(else_branch)?;
                braced(docvec![format!("if !({condition})")], else_docs)
            }
            (None, None) => docvec![format!("_ = {condition}")],
        };
        Ok(vec![doc])
    }

    fn while_loop(&mut self, condition: &Expression, body: &[Statement]) -> Result<Vec<Doc>> {
        let (mut loop_body, condition) = self.with_prelude(|g| g.expression(condition))?;
        loop_body.push(braced(
            docvec![format!("if !({})", condition.as_bool())],
            vec![Document::Str("break")],
        ));
        loop_body.extend(self.nested_statements(body)?);
        Ok(vec![braced(Document::Str("for"), loop_body)])
    }

    fn nil_guard(
        &mut self,
        subject: &Expression,
        if_nil: Option<&[Statement]>,
        if_not_nil: Option<&[Statement]>,
        binding: Option<&EcoString>,
    ) -> Result<Vec<Doc>> {
        let subject = self.expression(subject)?.as_text();
        let temp = self.ctx.fresh_temp("n");
        let mut docs = vec![docvec![format!("{temp} := {subject}")]];

        let not_nil_docs = match if_not_nil {
            Some(statements) => {
                self.ctx.push_scope();
                let mut body = Vec::new();
                if let Some(name) = binding {
                    let go_name = local_name(name);
                    self.ctx.bind(name, go_name.clone(), ValueType::Text);
                    body.push(docvec![format!("{go_name} := {temp}")]);
                    body.push(docvec![format!("_ = {go_name}")]);
                }
                let rest = self.statements(statements);
                self.ctx.pop_scope();
                body.extend(rest?);
                Some(body)
            }
            None => None,
        };
        let nil_docs = if_nil.map(|s| self.nested_statements(s)).transpose()?;

        docs.push(match (nil_docs, not_nil_docs) {
            (Some(nil_docs), Some(not_nil_docs)) => docvec![
                braced(docvec![format!("if _isNil({temp})")], nil_docs),
                braced(Document::Str(" else"), not_nil_docs),
            ],
            (Some(nil_docs), None) => braced(docvec![format!("if _isNil({temp})")], nil_docs),
            (None, Some(not_nil_docs)) => {
                braced(docvec![format!("if !_isNil({temp})")], not_nil_docs)
            }
            (None, None) => docvec![format!("_ = {temp}")],
        });
        Ok(docs)
    }

    /// `do:` / `collect:` / `select:` over a literal block, hoisted as a
    /// `for ... range` loop. Collect and select yield a new array.
    pub(super) fn iteration(
        &mut self,
        kind: IterationKind,
        receiver: &Expression,
        block: &Block,
    ) -> Result<GoExpr> {
        let base = self.expression(receiver)?.as_json();
        let param = block.params.first().ok_or_else(|| {
            CodeGenError::Internal(format!("{} block without a parameter", kind.keyword()))
        })?;
        let item = self.ctx.fresh_temp("v");
        let acc = (kind != IterationKind::Do).then(|| self.ctx.fresh_temp("c"));

        self.ctx.push_scope();
        let body = self.iteration_body(kind, param, &item, acc.as_deref(), &block.body);
        self.ctx.pop_scope();
        let body = body?;

        if let Some(acc) = &acc {
            self.prelude
                .push(docvec![format!("{acc} := make([]interface{{}}, 0)")]);
        }
        self.prelude.push(braced(
            docvec![format!("for _, {item} := range _toArray({base})")],
            body,
        ));
        Ok(acc.map_or_else(GoExpr::empty, GoExpr::json))
    }

    fn iteration_body(
        &mut self,
        kind: IterationKind,
        param: &str,
        item: &str,
        acc: Option<&str>,
        statements: &[Statement],
    ) -> Result<Vec<Doc>> {
        let go_param = local_name(param);
        self.ctx.bind(param, go_param.clone(), ValueType::Text);
        let mut body = vec![
            docvec![format!("{go_param} := _jsonText({item})")],
            docvec![format!("_ = {go_param}")],
        ];

        let Some(acc) = acc else {
            body.extend(self.statements(statements)?);
            return Ok(body);
        };
        let Some((Statement::Expr(last), init)) = statements.split_last() else {
            return Err(CodeGenError::Internal(format!(
                "{} block must end with an expression",
                kind.keyword()
            )));
        };
        body.extend(self.statements(init)?);
        let (prelude, value) = self.with_prelude(|g| g.expression(last))?;
        body.extend(prelude);
        body.push(match kind {
            IterationKind::Select => braced(
                docvec![format!("if {}", value.as_bool())],
                vec![docvec![format!("{acc} = append({acc}, {item})")]],
            ),
            IterationKind::Collect | IterationKind::Do => {
                docvec![format!("{acc} = append({acc}, {})", value.as_element())]
            }
        });
        Ok(body)
    }

    /// Iteration with the block held in a variable: every element goes
    /// through the interpreter.
    pub(super) fn dynamic_iteration(
        &mut self,
        kind: IterationKind,
        receiver: &Expression,
        block_var: &str,
    ) -> Result<GoExpr> {
        let base = self.expression(receiver)?.as_json();
        let block = self.identifier(block_var)?.as_text();
        let check = self.error_check()?;
        let item = self.ctx.fresh_temp("v");
        let result = self.ctx.fresh_temp("r");
        let acc = (kind != IterationKind::Do).then(|| self.ctx.fresh_temp("c"));

        let mut body = vec![
            docvec![format!(
                "{result}, err := _invokeBlock({block}, _jsonText({item}))"
            )],
            check,
        ];
        body.push(match (kind, &acc) {
            (IterationKind::Collect, Some(acc)) => {
                docvec![format!("{acc} = append({acc}, _toValue({result}))")]
            }
            (IterationKind::Select, Some(acc)) => braced(
                docvec![format!("if _truthy({result})")],
                vec![docvec![format!("{acc} = append({acc}, {item})")]],
            ),
            _ => docvec![format!("_ = {result}")],
        });

        if let Some(acc) = &acc {
            self.prelude
                .push(docvec![format!("{acc} := make([]interface{{}}, 0)")]);
        }
        self.prelude.push(braced(
            docvec![format!("for _, {item} := range _toArray({base})")],
            body,
        ));
        Ok(acc.map_or_else(GoExpr::empty, GoExpr::json))
    }
}
