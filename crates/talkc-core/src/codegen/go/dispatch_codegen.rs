// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Selector dispatch.
//!
//! Each struct gets a `dispatch` method mapping a selector and string
//! arguments to a compiled method:
//!
//! ```go
//! func (c *Counter) dispatch(selector string, args []string) (string, bool, error) {
//!     switch selector {
//!     case "increment":
//!         if len(args) != 0 {
//!             return "", true, _arityError(selector, 0, len(args))
//!         }
//!         c.Increment()
//!         return "", true, nil
//!     }
//!     return "", false, nil
//! }
//! ```
//!
//! `false` means "not handled": the selector is skipped or unknown and the
//! caller answers exit code 200. `responds` answers the same question before
//! any state is loaded, so an unknown selector is 200 even for an instance
//! that does not exist.

use super::analysis::MethodPlan;
use super::document::{Document, INDENT, braced, line, lines, nest};
use super::selector_mangler::go_quote;
use super::{Doc, GoGenerator};
use crate::ast::MethodKind;
use crate::docvec;

impl GoGenerator<'_> {
    /// The `dispatch` method of one struct.
    pub(super) fn dispatch(&self, kind: MethodKind) -> Doc {
        let mut cases: Vec<Doc> = self
            .skip_set
            .methods_for(kind)
            .map(|plan| Self::dispatch_case(&plan.selector, plan))
            .collect();
        for alias in self.skip_set.aliases_for(kind) {
            if let Some(plan) = self.skip_set.resolve(kind, &alias.existing) {
                cases.push(Self::dispatch_case(&alias.new_name, plan));
            }
        }

        let switch = if cases.is_empty() {
            docvec!["switch selector {", line(), "}"]
        } else {
            docvec!["switch selector {", line(), lines(cases), line(), "}"]
        };
        braced(
            docvec![format!(
                "func ({} *{}) dispatch(selector string, args []string) (string, bool, error)",
                Self::receiver_for(kind),
                self.struct_name(kind)
            )],
            vec![switch, Document::Str("return \"\", false, nil")],
        )
    }

    /// The `responds` method of one struct: whether `dispatch` handles a
    /// selector.
    pub(super) fn responds(&self, kind: MethodKind) -> Doc {
        let mut selectors: Vec<String> = self
            .skip_set
            .methods_for(kind)
            .map(|plan| go_quote(&plan.selector))
            .collect();
        for alias in self.skip_set.aliases_for(kind) {
            if self.skip_set.resolve(kind, &alias.existing).is_some() {
                selectors.push(go_quote(&alias.new_name));
            }
        }

        let header = docvec![format!(
            "func ({} *{}) responds(selector string) bool",
            Self::receiver_for(kind),
            self.struct_name(kind)
        )];
        if selectors.is_empty() {
            return braced(header, vec![Document::Str("return false")]);
        }
        braced(
            header,
            vec![
                docvec![
                    "switch selector {",
                    line(),
                    format!("case {}:", selectors.join(", ")),
                    nest(INDENT, docvec![line(), "return true"]),
                    line(),
                    "}",
                ],
                Document::Str("return false"),
            ],
        )
    }

    fn dispatch_case(selector: &str, plan: &MethodPlan) -> Doc {
        let arity = plan.arity();
        let args = (0..arity)
            .map(|i| format!("args[{i}]"))
            .collect::<Vec<_>>()
            .join(", ");
        let call = format!(
            "{}.{}({args})",
            Self::receiver_for(plan.kind),
            plan.go_name
        );

        let mut body = vec![braced(
            docvec![format!("if len(args) != {arity}")],
            vec![docvec![format!(
                "return \"\", true, _arityError(selector, {arity}, len(args))"
            )]],
        )];
        if plan.has_error {
            body.push(docvec![format!("result, err := {call}")]);
            body.push(docvec!["return result, true, err"]);
        } else if plan.has_return {
            body.push(docvec![format!("return {call}, true, nil")]);
        } else {
            body.push(docvec![call]);
            body.push(docvec!["return \"\", true, nil"]);
        }

        docvec![
            format!("case {}:", go_quote(selector)),
            nest(INDENT, docvec![line(), lines(body)]),
        ]
    }
}
