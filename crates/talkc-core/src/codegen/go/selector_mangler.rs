// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Name mangling for Go code generation.
//!
//! Maps selectors, variable names and literal text to valid Go spellings:
//!
//! - selectors become exported method names (`at_put_` → `At_put_`)
//! - instance variables become exported struct fields (`value` → `Value`)
//! - text becomes Go string literals
//!
//! ```
//! use talkc_core::codegen::go::selector_mangler::{field_name, go_quote, method_base_name};
//!
//! assert_eq!(method_base_name("at_put_"), "At_put_");
//! assert_eq!(field_name("items"), "Items");
//! assert_eq!(go_quote("say \"hi\""), r#""say \"hi\"""#);
//! ```

/// Fields every generated struct carries.
pub const BUILTIN_FIELDS: &[&str] = &["ID", "Class"];

/// Prefix for methods whose name collides with a field.
pub const METHOD_PREFIX: &str = "Method";

/// Prefix for variables whose field name collides with a builtin field.
pub const FIELD_PREFIX: &str = "Var";

/// Upper-cases the first character, leaving the rest verbatim.
#[must_use]
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The Go method name for a selector before collision handling.
#[must_use]
pub fn method_base_name(selector: &str) -> String {
    if selector.starts_with('_') {
        format!("X{selector}")
    } else {
        capitalize(selector)
    }
}

/// The Go field name for an instance variable.
///
/// Names starting with `_` get an `X` prefix so the field stays exported;
/// names that would shadow a builtin field get the `Var` prefix.
#[must_use]
pub fn field_name(var: &str) -> String {
    let base = method_base_name(var);
    if BUILTIN_FIELDS.contains(&base.as_str()) {
        format!("{FIELD_PREFIX}{base}")
    } else {
        base
    }
}

/// The Go method name for a selector given the field names of its struct.
#[must_use]
pub fn method_name(selector: &str, fields: &[String]) -> String {
    let base = method_base_name(selector);
    if fields.iter().any(|f| *f == base) || BUILTIN_FIELDS.contains(&base.as_str()) {
        format!("{METHOD_PREFIX}{base}")
    } else {
        base
    }
}

/// Quotes text as an interpreted Go string literal.
#[must_use]
pub fn go_quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Quotes text as a Go raw string literal, splicing backquotes in as
/// interpreted literals.
///
/// ```
/// use talkc_core::codegen::go::selector_mangler::go_raw_quote;
///
/// assert_eq!(go_raw_quote("a`b"), "`a` + \"`\" + `b`");
/// ```
#[must_use]
pub fn go_raw_quote(text: &str) -> String {
    let parts: Vec<String> = text.split('`').map(|part| format!("`{part}`")).collect();
    parts.join(" + \"`\" + ")
}
