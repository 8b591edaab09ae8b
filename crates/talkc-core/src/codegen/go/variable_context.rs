// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Variable binding and scope management.
//!
//! [`VariableContext`] tracks which Go name and [`ValueType`] a source
//! identifier maps to while a method body is emitted, and hands out fresh
//! temporaries.
//!
//! # Scope Stack
//!
//! ```text
//! Scope 0 (outermost): method parameters and hoisted locals
//! Scope 1: block parameters / nil-guard binding
//! Scope 2 (innermost): nested block parameters
//! ```
//!
//! Inner scopes shadow outer scopes. Instance variables are not bound here;
//! they are resolved against the class layout after the scopes miss.

use std::collections::HashMap;

use super::value_type::ValueType;

/// A bound source identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Binding {
    pub go_name: String,
    pub ty: ValueType,
}

/// Variable binding and scope management for one method.
#[derive(Debug)]
pub(super) struct VariableContext {
    /// Counter for generating unique temporaries.
    temp_counter: usize,
    scopes: Vec<HashMap<String, Binding>>,
}

impl VariableContext {
    /// Creates a context with an empty method scope.
    pub(super) fn new() -> Self {
        Self {
            temp_counter: 0,
            scopes: vec![HashMap::new()],
        }
    }

    pub(super) fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pops the current scope. The method scope cannot be popped.
    pub(super) fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Looks up an identifier, innermost scope first.
    pub(super) fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Binds an identifier in the current scope.
    pub(super) fn bind(&mut self, name: &str, go_name: impl Into<String>, ty: ValueType) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(
                name.to_string(),
                Binding {
                    go_name: go_name.into(),
                    ty,
                },
            );
        }
    }

    /// Returns a fresh temporary such as `_t3`.
    ///
    /// Temporaries start with `_`, which no source local keeps after
    /// renaming, so they never collide with user names.
    pub(super) fn fresh_temp(&mut self, prefix: &str) -> String {
        self.temp_counter += 1;
        format!("_{prefix}{}", self.temp_counter)
    }

    /// Clears all state before the next method.
    pub(super) fn reset(&mut self) {
        self.temp_counter = 0;
        self.scopes.clear();
        self.scopes.push(HashMap::new());
    }
}
