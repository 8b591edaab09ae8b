// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expression code generation.
//!
//! Every expression compiles to a [`GoExpr`]. Anything that cannot be a Go
//! expression (a fallible call, a loop, a call whose result is unused) is
//! pushed onto the generator's prelude and represented by a temporary.

use ecow::EcoString;

use super::selector_mangler::go_quote;
use super::value_type::{GoExpr, ValueType};
use super::{CodeGenError, GoGenerator, Result};
use crate::ast::{BinaryOp, ClassPrimitiveOp, Expression};
use crate::docvec;

impl GoGenerator<'_> {
    /// Compiles an expression.
    pub(super) fn expression(&mut self, expression: &Expression) -> Result<GoExpr> {
        match expression {
            Expression::Identifier(name) => self.identifier(name),
            Expression::Qualified { package, name } => {
                Ok(GoExpr::text(go_quote(&format!("{package}::{name}"))))
            }
            Expression::Number(text) => Ok(Self::number(text)),
            Expression::String(content) => Ok(GoExpr::text(go_quote(content))),
            Expression::Binary { op, left, right } => self.binary(*op, left, right),
            Expression::Block(_) => Err(CodeGenError::Internal(
                "block literal reached emission as a value".to_string(),
            )),
            Expression::Iteration {
                kind,
                receiver,
                block,
            } => self.iteration(*kind, receiver, block),
            Expression::DynamicIteration {
                kind,
                receiver,
                block_var,
            } => self.dynamic_iteration(*kind, receiver, block_var),
            Expression::Send {
                receiver,
                selector,
                args,
                is_self,
            } => self.send(receiver, selector, args, *is_self),
            Expression::Collection { receiver, op, args } => self.collection(receiver, *op, args),
            Expression::ClassPrimitive { op, args } => self.class_primitive(*op, args),
        }
    }

    /// Resolves an identifier: pseudo-variables, bound locals, instance
    /// variables, then class names.
    pub(super) fn identifier(&self, name: &str) -> Result<GoExpr> {
        match name {
            "self" => return Ok(GoExpr::text(self.self_id())),
            "true" | "false" => return Ok(GoExpr::bool(name)),
            "nil" => return Ok(GoExpr::empty()),
            _ => {}
        }
        if let Some(binding) = self.ctx.lookup(name) {
            return Ok(GoExpr::new(binding.go_name.clone(), binding.ty));
        }
        if let Some(field) = self.skip_set.layout.field(self.method.kind, name) {
            return Ok(GoExpr::new(
                format!("{}.{}", self.receiver(), field.go_name),
                field.storage.into(),
            ));
        }
        if name.chars().next().is_some_and(char::is_uppercase) {
            return Ok(GoExpr::text(go_quote(name)));
        }
        Err(CodeGenError::Internal(format!(
            "unresolved identifier `{name}`"
        )))
    }

    /// The Go lvalue and its type for an assignment target.
    pub(super) fn assign_target(&self, target: &str) -> Result<(String, ValueType)> {
        if let Some(binding) = self.ctx.lookup(target) {
            return Ok((binding.go_name.clone(), binding.ty));
        }
        if let Some(field) = self.skip_set.layout.field(self.method.kind, target) {
            return Ok((
                format!("{}.{}", self.receiver(), field.go_name),
                field.storage.into(),
            ));
        }
        Err(CodeGenError::Internal(format!(
            "unresolved assignment target `{target}`"
        )))
    }

    /// Integers become `int`; decimals and out-of-range literals stay text.
    fn number(text: &str) -> GoExpr {
        match text.parse::<i64>() {
            Ok(n) if n < 0 => GoExpr::int(format!("({n})")),
            Ok(n) => GoExpr::int(n.to_string()),
            Err(_) => GoExpr::text(go_quote(text)),
        }
    }

    fn binary(&mut self, op: BinaryOp, left: &Expression, right: &Expression) -> Result<GoExpr> {
        let left = self.expression(left)?;
        let right = self.expression(right)?;
        Ok(match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => GoExpr::int(format!(
                "({} {} {})",
                left.as_int(),
                op.go_operator(),
                right.as_int()
            )),
            BinaryOp::Div => GoExpr::int(format!("_div({}, {})", left.as_int(), right.as_int())),
            BinaryOp::Concat => GoExpr::text(format!("{} + {}", left.as_text(), right.as_text())),
            BinaryOp::Gt | BinaryOp::Lt | BinaryOp::Ge | BinaryOp::Le => GoExpr::bool(format!(
                "({} {} {})",
                left.as_int(),
                op.go_operator(),
                right.as_int()
            )),
            BinaryOp::Eq | BinaryOp::Ne => {
                let (l, r) = if left.ty == ValueType::Int || right.ty == ValueType::Int {
                    (left.as_int(), right.as_int())
                } else if left.ty == ValueType::Bool && right.ty == ValueType::Bool {
                    (left.code, right.code)
                } else {
                    (left.as_text(), right.as_text())
                };
                GoExpr::bool(format!("({l} {} {r})", op.go_operator()))
            }
        })
    }

    /// A message send: a direct call for a compiled self-send, otherwise a
    /// call into the interpreter.
    fn send(
        &mut self,
        receiver: &Expression,
        selector: &EcoString,
        args: &[Expression],
        is_self: bool,
    ) -> Result<GoExpr> {
        let target = if is_self {
            self.skip_set
                .resolve(self.method.kind, selector)
                .filter(|plan| plan.arity() == args.len())
                .map(|plan| (plan.go_name.clone(), plan.has_error, plan.has_return))
        } else {
            None
        };

        if let Some((go_name, has_error, has_return)) = target {
            let args = self.text_args(args)?;
            let call = format!("{}.{go_name}({})", self.receiver(), args.join(", "));
            if has_error {
                return self.hoist_fallible(call);
            }
            if has_return {
                return Ok(GoExpr::text(call));
            }
            self.prelude.push(docvec![call]);
            return Ok(GoExpr::empty());
        }

        let mut call_args = vec![self.expression(receiver)?.as_text(), go_quote(selector)];
        call_args.extend(self.text_args(args)?);
        self.hoist_fallible(format!("_sendMessage({})", call_args.join(", ")))
    }

    fn text_args(&mut self, args: &[Expression]) -> Result<Vec<String>> {
        args.iter()
            .map(|arg| self.expression(arg).map(|value| value.as_text()))
            .collect()
    }

    /// `@ String ...` and `@ File ...` rewritten to Go.
    fn class_primitive(&mut self, op: ClassPrimitiveOp, args: &[Expression]) -> Result<GoExpr> {
        let args = self.text_args(args)?;
        let arg = |i: usize| {
            args.get(i).cloned().ok_or_else(|| {
                CodeGenError::Internal(format!("{op:?} is missing argument {}", i + 1))
            })
        };
        Ok(match op {
            ClassPrimitiveOp::StringIsEmpty => GoExpr::bool(format!("({} == \"\")", arg(0)?)),
            ClassPrimitiveOp::StringNotEmpty => GoExpr::bool(format!("({} != \"\")", arg(0)?)),
            ClassPrimitiveOp::StringLength => GoExpr::int(format!("len([]rune({}))", arg(0)?)),
            ClassPrimitiveOp::StringTrim => GoExpr::text(format!("strings.TrimSpace({})", arg(0)?)),
            ClassPrimitiveOp::StringToUpper => GoExpr::text(format!("strings.ToUpper({})", arg(0)?)),
            ClassPrimitiveOp::StringToLower => GoExpr::text(format!("strings.ToLower({})", arg(0)?)),
            ClassPrimitiveOp::StringContains => {
                GoExpr::bool(format!("strings.Contains({}, {})", arg(0)?, arg(1)?))
            }
            ClassPrimitiveOp::StringStartsWith => {
                GoExpr::bool(format!("strings.HasPrefix({}, {})", arg(0)?, arg(1)?))
            }
            ClassPrimitiveOp::StringEndsWith => {
                GoExpr::bool(format!("strings.HasSuffix({}, {})", arg(0)?, arg(1)?))
            }
            // replace: old with: new in: subject
            ClassPrimitiveOp::StringReplace => GoExpr::text(format!(
                "strings.ReplaceAll({}, {}, {})",
                arg(2)?,
                arg(0)?,
                arg(1)?
            )),
            ClassPrimitiveOp::FileExists => GoExpr::bool(format!("_fileExists({})", arg(0)?)),
            ClassPrimitiveOp::FileIsFile => GoExpr::bool(format!("_isFile({})", arg(0)?)),
            ClassPrimitiveOp::FileIsDirectory => GoExpr::bool(format!("_isDir({})", arg(0)?)),
            ClassPrimitiveOp::FileBasename => GoExpr::text(format!("_basename({})", arg(0)?)),
            ClassPrimitiveOp::FileDirname => GoExpr::text(format!("_dirname({})", arg(0)?)),
            ClassPrimitiveOp::FileRead => {
                return self.hoist_fallible(format!("_fileRead({})", arg(0)?));
            }
            // write: data to: path
            ClassPrimitiveOp::FileWrite => {
                return self.hoist_fallible(format!("_fileWrite({}, {})", arg(1)?, arg(0)?));
            }
            ClassPrimitiveOp::FileAppend => {
                return self.hoist_fallible(format!("_fileAppend({}, {})", arg(1)?, arg(0)?));
            }
            ClassPrimitiveOp::FileDelete => {
                return self.hoist_fallible(format!("_fileDelete({})", arg(0)?));
            }
        })
    }
}
