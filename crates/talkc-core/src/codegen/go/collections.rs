// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Array and object suffix operations.
//!
//! All operations are copying: `arrayPush:`, `arrayAt:put:` and friends
//! return a new value and never mutate their receiver. A Json-typed base
//! stays `interface{}` through a whole chain; a Text base is parsed once.
//!
//! Nested pushes on the same base are flattened, so
//! `(items arrayPush: a) arrayPush: b` becomes `_arrayPush(c.Items, a, b)`.

use super::value_type::GoExpr;
use super::{CodeGenError, GoGenerator, Result};
use crate::ast::{CollectionOp, Expression};

impl GoGenerator<'_> {
    pub(super) fn collection(
        &mut self,
        receiver: &Expression,
        op: CollectionOp,
        args: &[Expression],
    ) -> Result<GoExpr> {
        if op == CollectionOp::ArrayPush {
            return self.array_push(receiver, args);
        }

        let base = self.expression(receiver)?.as_json();
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.expression(arg)?);
        }
        let arg = |i: usize| {
            values.get(i).ok_or_else(|| {
                CodeGenError::Internal(format!("{op:?} is missing argument {}", i + 1))
            })
        };

        Ok(match op {
            CollectionOp::ArrayLength => GoExpr::int(format!("len(_toArray({base}))")),
            CollectionOp::ArrayFirst => GoExpr::json(format!("_arrayFirst({base})")),
            CollectionOp::ArrayLast => GoExpr::json(format!("_arrayLast({base})")),
            CollectionOp::ArrayIsEmpty => GoExpr::bool(format!("(len(_toArray({base})) == 0)")),
            CollectionOp::ArrayNotEmpty => GoExpr::bool(format!("(len(_toArray({base})) > 0)")),
            CollectionOp::ObjectKeys => GoExpr::json(format!("_objectKeys({base})")),
            CollectionOp::ObjectValues => GoExpr::json(format!("_objectValues({base})")),
            CollectionOp::ObjectLength => GoExpr::int(format!("len(_toObject({base}))")),
            CollectionOp::ObjectIsEmpty => GoExpr::bool(format!("(len(_toObject({base})) == 0)")),
            CollectionOp::ArrayAt => {
                GoExpr::json(format!("_arrayAt({base}, {})", arg(0)?.as_int()))
            }
            CollectionOp::ArrayAtPut => GoExpr::json(format!(
                "_arrayAtPut({base}, {}, {})",
                arg(0)?.as_int(),
                arg(1)?.as_element()
            )),
            CollectionOp::ArrayRemoveAt => {
                GoExpr::json(format!("_arrayRemoveAt({base}, {})", arg(0)?.as_int()))
            }
            CollectionOp::ObjectAt => {
                GoExpr::json(format!("_objectAt({base}, {})", arg(0)?.as_text()))
            }
            CollectionOp::ObjectAtPut => GoExpr::json(format!(
                "_objectAtPut({base}, {}, {})",
                arg(0)?.as_text(),
                arg(1)?.as_element()
            )),
            CollectionOp::ObjectRemoveKey => {
                GoExpr::json(format!("_objectRemoveKey({base}, {})", arg(0)?.as_text()))
            }
            CollectionOp::ObjectHasKey => {
                GoExpr::bool(format!("_objectHasKey({base}, {})", arg(0)?.as_text()))
            }
            CollectionOp::ArrayPush => {
                return Err(CodeGenError::Internal("push reached the generic path".to_string()));
            }
        })
    }

    /// Emits one `_arrayPush` for a run of nested pushes.
    fn array_push(&mut self, receiver: &Expression, args: &[Expression]) -> Result<GoExpr> {
        // Walk down to the innermost base, collecting pushed values
        // outermost first.
        let mut runs: Vec<&[Expression]> = vec![args];
        let mut base = receiver;
        while let Expression::Collection {
            receiver: inner,
            op: CollectionOp::ArrayPush,
            args: inner_args,
        } = base
        {
            runs.push(inner_args.as_slice());
            base = inner.as_ref();
        }

        let base = self.expression(base)?.as_json();
        let mut items = vec![base];
        for run in runs.into_iter().rev() {
            for arg in run {
                items.push(self.expression(arg)?.as_element());
            }
        }
        Ok(GoExpr::json(format!("_arrayPush({})", items.join(", "))))
    }
}
