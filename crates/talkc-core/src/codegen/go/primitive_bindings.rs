// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Primitive binding table for the well-known system classes.
//!
//! A method whose `(class, side, selector)` appears here is never compiled
//! from its source body: the generator emits the hand-written Go template
//! instead. The table is authoritative and process-wide.
//!
//! # Templates
//!
//! Each template is a Go expression of type `(string, error)`. Placeholders:
//!
//! - `{0}`, `{1}`, ... the method's arguments as text
//! - `{ivar:name}` an instance variable of the receiver as text

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::ast::MethodKind;

/// One registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveBinding {
    pub class: &'static str,
    pub kind: MethodKind,
    pub selector: &'static str,
    pub arity: usize,
    /// Instance variable the template reads, if any.
    pub requires_ivar: Option<&'static str>,
    pub template: &'static str,
}

/// Key for looking up a binding: (`class`, side, `selector`).
type BindingKey = (String, MethodKind, String);

/// The registry.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveBindingTable {
    bindings: HashMap<BindingKey, PrimitiveBinding>,
}

const fn instance(
    class: &'static str,
    selector: &'static str,
    arity: usize,
    template: &'static str,
) -> PrimitiveBinding {
    PrimitiveBinding {
        class,
        kind: MethodKind::Instance,
        selector,
        arity,
        requires_ivar: Some("path"),
        template,
    }
}

const fn class_side(
    class: &'static str,
    selector: &'static str,
    arity: usize,
    template: &'static str,
) -> PrimitiveBinding {
    PrimitiveBinding {
        class,
        kind: MethodKind::Class,
        selector,
        arity,
        requires_ivar: None,
        template,
    }
}

const BUILTIN: &[PrimitiveBinding] = &[
    // File, instance side
    instance("File", "read", 0, "_fileRead({ivar:path})"),
    instance("File", "write_", 1, "_fileWrite({ivar:path}, {0})"),
    instance("File", "append_", 1, "_fileAppend({ivar:path}, {0})"),
    instance("File", "exists", 0, "_boolResult(_fileExists({ivar:path}))"),
    instance("File", "delete", 0, "_fileDelete({ivar:path})"),
    instance("File", "lines", 0, "_fileLines({ivar:path})"),
    // File, class side
    class_side("File", "exists_", 1, "_boolResult(_fileExists({0}))"),
    class_side("File", "read_", 1, "_fileRead({0})"),
    // Env
    class_side("Env", "get_", 1, "_ok(os.Getenv({0}))"),
    class_side("Env", "set_to_", 2, "_envSet({0}, {1})"),
    class_side("Env", "has_", 1, "_boolResult(_envHas({0}))"),
    class_side("Env", "unset_", 1, "_envUnset({0})"),
    // String
    class_side("String", "length_", 1, "_ok(strconv.Itoa(len([]rune({0}))))"),
    class_side("String", "toUpper_", 1, "_ok(strings.ToUpper({0}))"),
    class_side("String", "toLower_", 1, "_ok(strings.ToLower({0}))"),
    class_side("String", "trim_", 1, "_ok(strings.TrimSpace({0}))"),
    class_side("String", "split_by_", 2, "_stringSplit({0}, {1})"),
    // Console
    class_side("Console", "print_", 1, "_consolePrint({0}, false)"),
    class_side("Console", "printLine_", 1, "_consolePrint({0}, true)"),
    class_side("Console", "readLine", 0, "_consoleReadLine()"),
    class_side("Console", "error_", 1, "_consoleError({0})"),
];

static BUILTIN_TABLE: LazyLock<PrimitiveBindingTable> = LazyLock::new(|| {
    let mut table = PrimitiveBindingTable::new();
    for binding in BUILTIN {
        table.add(binding.clone());
    }
    table
});

impl PrimitiveBindingTable {
    /// Creates an empty binding table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// The built-in registry.
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN_TABLE
    }

    /// Adds or replaces a binding.
    pub fn add(&mut self, binding: PrimitiveBinding) {
        self.bindings.insert(
            (binding.class.to_string(), binding.kind, binding.selector.to_string()),
            binding,
        );
    }

    /// Looks up a binding.
    #[must_use]
    pub fn lookup(&self, class: &str, kind: MethodKind, selector: &str) -> Option<&PrimitiveBinding> {
        self.bindings
            .get(&(class.to_string(), kind, selector.to_string()))
    }

    /// Returns the number of bindings in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if the table has no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl PrimitiveBinding {
    /// Expands the template.
    ///
    /// `args` are the Go spellings of the arguments, `ivar` maps an
    /// instance variable name to its Go text expression.
    #[must_use]
    pub fn expand(&self, args: &[String], ivar: impl Fn(&str) -> Option<String>) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                out.push_str(&rest[open..]);
                return out;
            };
            let placeholder = &after[..close];
            let replacement = if let Some(name) = placeholder.strip_prefix("ivar:") {
                ivar(name)
            } else {
                placeholder
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| args.get(i).cloned())
            };
            match replacement {
                Some(text) => {
                    out.push_str(&text);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup() {
        let table = PrimitiveBindingTable::builtin();
        assert!(!table.is_empty());
        assert_eq!(table.len(), BUILTIN.len());

        let read = table.lookup("File", MethodKind::Instance, "read").unwrap();
        assert_eq!(read.arity, 0);
        assert_eq!(read.requires_ivar, Some("path"));

        assert!(table.lookup("File", MethodKind::Class, "read").is_none());
        assert!(table.lookup("Env", MethodKind::Class, "set_to_").is_some());
        assert!(table.lookup("Counter", MethodKind::Instance, "read").is_none());
    }

    #[test]
    fn arities_match_selectors() {
        for binding in BUILTIN {
            assert_eq!(
                binding.arity,
                binding.selector.matches('_').count(),
                "{} {}",
                binding.class,
                binding.selector
            );
        }
    }

    #[test]
    fn expand_arguments_and_ivars() {
        let table = PrimitiveBindingTable::builtin();
        let write = table.lookup("File", MethodKind::Instance, "write_").unwrap();
        let code = write.expand(&["data".to_string()], |name| {
            (name == "path").then(|| "c.Path".to_string())
        });
        assert_eq!(code, "_fileWrite(c.Path, data)");

        let set = table.lookup("Env", MethodKind::Class, "set_to_").unwrap();
        assert_eq!(
            set.expand(&["k".to_string(), "v".to_string()], |_| None),
            "_envSet(k, v)"
        );
    }

    #[test]
    fn expand_keeps_go_braces() {
        let binding = class_side("X", "y_", 1, "_f([]string{{0}})");
        assert_eq!(binding.expand(&["a".to_string()], |_| None), "_f([]string{a})");
    }

    #[test]
    fn custom_table() {
        let mut table = PrimitiveBindingTable::new();
        assert!(table.is_empty());
        table.add(class_side("Clock", "now", 0, "_ok(\"0\")"));
        assert!(table.lookup("Clock", MethodKind::Class, "now").is_some());
    }
}
