// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Static value classification of generated Go expressions.
//!
//! Every expression the generator produces carries a [`ValueType`]. Moving a
//! value between types always goes through a runtime helper, so the
//! conversion rules live in one place:
//!
//! | from \ to | Text | Int | Bool | Json |
//! |-----------|------|-----|------|------|
//! | Text | - | `_toInt` | `_truthy` | `_parseJSON` |
//! | Int | `strconv.Itoa` | - | `!= 0` | `_parseJSON(strconv.Itoa(..))` |
//! | Bool | `_boolText` | `_boolInt` | - | `_parseJSON(_boolText(..))` |
//! | Json | `_jsonText` | `_toInt(_jsonText(..))` | `_truthy(_jsonText(..))` | - |
//!
//! Elements stored into arrays and objects use [`GoExpr::as_element`], which
//! keeps numbers and booleans typed and only lifts text that holds an array
//! or object.

use crate::ast::StorageKind;

/// The static type of a generated Go expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `string`
    Text,
    /// `int`
    Int,
    /// `bool`
    Bool,
    /// `interface{}` holding decoded JSON.
    Json,
}

impl From<StorageKind> for ValueType {
    fn from(storage: StorageKind) -> Self {
        match storage {
            StorageKind::Text => Self::Text,
            StorageKind::Json => Self::Json,
        }
    }
}

impl ValueType {
    /// The Go type spelling.
    #[must_use]
    pub const fn go_type(self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Json => "interface{}",
        }
    }
}

/// A Go expression with its static type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoExpr {
    pub code: String,
    pub ty: ValueType,
}

impl GoExpr {
    pub fn new(code: impl Into<String>, ty: ValueType) -> Self {
        Self {
            code: code.into(),
            ty,
        }
    }

    pub fn text(code: impl Into<String>) -> Self {
        Self::new(code, ValueType::Text)
    }

    pub fn int(code: impl Into<String>) -> Self {
        Self::new(code, ValueType::Int)
    }

    pub fn bool(code: impl Into<String>) -> Self {
        Self::new(code, ValueType::Bool)
    }

    pub fn json(code: impl Into<String>) -> Self {
        Self::new(code, ValueType::Json)
    }

    /// The empty text value, also used for `nil`.
    pub fn empty() -> Self {
        Self::text("\"\"")
    }

    /// Returns true for the literal empty string.
    #[must_use]
    pub fn is_empty_text(&self) -> bool {
        self.ty == ValueType::Text && self.code == "\"\""
    }

    /// Converts to `string`.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self.ty {
            ValueType::Text => self.code.clone(),
            ValueType::Int => format!("strconv.Itoa({})", self.code),
            ValueType::Bool => format!("_boolText({})", self.code),
            ValueType::Json => format!("_jsonText({})", self.code),
        }
    }

    /// Converts to `int`, leniently: unparseable text is `0`.
    #[must_use]
    pub fn as_int(&self) -> String {
        match self.ty {
            ValueType::Int => self.code.clone(),
            ValueType::Bool => format!("_boolInt({})", self.code),
            ValueType::Text | ValueType::Json => format!("_toInt({})", self.as_text()),
        }
    }

    /// Converts to `bool`.
    #[must_use]
    pub fn as_bool(&self) -> String {
        match self.ty {
            ValueType::Bool => self.code.clone(),
            ValueType::Int => format!("({} != 0)", self.code),
            ValueType::Text | ValueType::Json => format!("_truthy({})", self.as_text()),
        }
    }

    /// Converts to `interface{}` holding decoded JSON.
    #[must_use]
    pub fn as_json(&self) -> String {
        match self.ty {
            ValueType::Json => self.code.clone(),
            _ => format!("_parseJSON({})", self.as_text()),
        }
    }

    /// Converts to a value stored inside an array or object.
    #[must_use]
    pub fn as_element(&self) -> String {
        match self.ty {
            ValueType::Json | ValueType::Int | ValueType::Bool => self.code.clone(),
            ValueType::Text => format!("_toValue({})", self.code),
        }
    }

    /// Converts to the given type.
    #[must_use]
    pub fn coerce(&self, ty: ValueType) -> String {
        match ty {
            ValueType::Text => self.as_text(),
            ValueType::Int => self.as_int(),
            ValueType::Bool => self.as_bool(),
            ValueType::Json => self.as_json(),
        }
    }
}
