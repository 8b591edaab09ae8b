// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Method function generation.
//!
//! A compiled method becomes a Go method on the instance struct or on the
//! class-side struct. Parameters and locals are `string`. Locals are all
//! declared at the top, whether they came from a `| a b |` declaration
//! anywhere in the body or from a bare assignment.

use super::analysis::{MethodPlan, PlanBody};
use super::document::braced;
use super::primitive_bindings::PrimitiveBinding;
use super::value_type::{GoExpr, ValueType};
use super::{Doc, GoGenerator, MethodState, Result};
use crate::docvec;

impl GoGenerator<'_> {
    /// Emits one compiled method.
    pub(super) fn method(&mut self, plan: &MethodPlan) -> Result<Doc> {
        self.ctx.reset();
        self.prelude.clear();
        self.method = MethodState {
            kind: plan.kind,
            has_error: plan.has_error,
            has_return: plan.has_return,
            after: plan.after.clone(),
        };

        let mut params = Vec::with_capacity(plan.params.len());
        for (name, go_name) in &plan.params {
            self.ctx.bind(name, go_name.clone(), ValueType::Text);
            params.push(format!("{go_name} string"));
        }
        let header = format!(
            "func ({} *{}) {}({}){}",
            self.receiver(),
            self.struct_name(plan.kind),
            plan.go_name,
            params.join(", "),
            plan.go_results()
        );

        let mut body = Vec::new();
        for (name, go_name) in &plan.locals {
            self.ctx.bind(name, go_name.clone(), ValueType::Text);
            body.push(docvec![format!("var {go_name} string")]);
            body.push(docvec![format!("_ = {go_name}")]);
        }
        if !plan.before.is_empty() {
            body.push(self.advice_block(&plan.before)?);
        }

        match &plan.body {
            PlanBody::Primitive(binding) => body.extend(self.primitive_body(plan, binding)?),
            PlanBody::Statements(statements) => {
                body.extend(self.statements(statements)?);
                if !plan.after.is_empty() {
                    body.push(self.advice_block(&plan.after)?);
                }
                if plan.has_error {
                    body.push(docvec!["return \"\", nil"]);
                } else if plan.has_return {
                    body.push(docvec!["return \"\""]);
                }
            }
        }

        Ok(braced(docvec![header], body))
    }

    /// The expanded registry template, returned directly or through the
    /// after advice.
    fn primitive_body(&mut self, plan: &MethodPlan, binding: &PrimitiveBinding) -> Result<Vec<Doc>> {
        let args: Vec<String> = plan.params.iter().map(|(_, go)| go.clone()).collect();
        let receiver = self.receiver();
        let layout = &self.skip_set.layout;
        let call = binding.expand(&args, |name| {
            layout.field(plan.kind, name).map(|field| {
                GoExpr::new(format!("{receiver}.{}", field.go_name), field.storage.into()).as_text()
            })
        });

        if plan.after.is_empty() {
            return Ok(vec![docvec![format!("return {call}")]]);
        }
        let value = self.hoist_fallible(call)?;
        let mut docs = std::mem::take(&mut self.prelude);
        docs.extend(self.return_value(&value.code)?);
        Ok(docs)
    }
}
