// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Reserved-name tables.
//!
//! Two process-wide immutable sets:
//!
//! - names a generated Go identifier must not take (Go keywords,
//!   predeclared identifiers, imported package names and the generator's own
//!   variables), which source locals avoid with a `_` suffix
//! - identifiers that only the interpreter understands, which make a method
//!   fall back

use std::collections::HashSet;
use std::sync::LazyLock;

/// Go keywords and predeclared identifiers.
const GO_RESERVED: &[&str] = &[
    // keywords
    "break", "case", "chan", "const", "continue", "default", "defer", "else",
    "fallthrough", "for", "func", "go", "goto", "if", "import", "interface",
    "map", "package", "range", "return", "select", "struct", "switch", "type",
    "var",
    // predeclared
    "any", "append", "bool", "byte", "cap", "clear", "close", "complex",
    "copy", "delete", "error", "float64", "iota", "int", "len", "make", "max",
    "min", "new", "panic", "print", "println", "real", "recover", "rune",
    "string",
];

/// Package names imported by generated code.
const PACKAGE_NAMES: &[&str] = &[
    "bufio", "json", "fmt", "os", "exec", "filepath", "strconv", "strings",
    "sql", "sqlite", "C",
];

/// Variables the generator itself declares inside methods.
const GENERATOR_NAMES: &[&str] = &["c", "cs", "err", "args", "selector", "result", "main"];

static RESERVED_LOCALS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    GO_RESERVED
        .iter()
        .chain(PACKAGE_NAMES)
        .chain(GENERATOR_NAMES)
        .copied()
        .collect()
});

/// Identifiers with interpreter-only semantics (non-local control transfer,
/// exception machinery, reflective access to the running context).
static INTERPRETER_ONLY: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "_throw",
        "_catch",
        "_ensure",
        "_ifCurtailed",
        "_signal",
        "_resume",
        "_retry",
        "_return",
        "_super",
        "_sender",
        "_context",
        "thisContext",
    ]
    .into_iter()
    .collect()
});

/// Returns true if `name` cannot be used verbatim as a Go local.
#[must_use]
pub fn is_reserved_local(name: &str) -> bool {
    name.starts_with('_') || RESERVED_LOCALS.contains(name)
}

/// Maps a source local or parameter name to its Go name.
///
/// ```
/// use talkc_core::codegen::go::reserved::local_name;
///
/// assert_eq!(local_name("count"), "count");
/// assert_eq!(local_name("type"), "type_");
/// assert_eq!(local_name("err"), "err_");
/// ```
#[must_use]
pub fn local_name(name: &str) -> String {
    if is_reserved_local(name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Returns true for identifiers only the interpreter can execute.
#[must_use]
pub fn is_interpreter_only(name: &str) -> bool {
    INTERPRETER_ONLY.contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_keywords_are_renamed() {
        for name in ["func", "range", "map", "string", "len"] {
            assert_eq!(local_name(name), format!("{name}_"));
        }
    }

    #[test]
    fn generator_names_are_renamed() {
        for name in ["c", "cs", "err", "args", "selector"] {
            assert!(is_reserved_local(name), "{name}");
        }
    }

    #[test]
    fn package_names_are_renamed() {
        assert_eq!(local_name("strings"), "strings_");
        assert_eq!(local_name("os"), "os_");
    }

    #[test]
    fn underscore_names_never_clash_with_temporaries() {
        assert_eq!(local_name("_t1"), "_t1_");
    }

    #[test]
    fn ordinary_names_are_kept() {
        assert_eq!(local_name("total"), "total");
        assert_eq!(local_name("items"), "items");
    }

    #[test]
    fn interpreter_only_identifiers() {
        assert!(is_interpreter_only("_throw"));
        assert!(is_interpreter_only("thisContext"));
        assert!(!is_interpreter_only("throw"));
    }
}
