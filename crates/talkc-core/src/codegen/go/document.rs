// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Wadler-Lindig document tree for Go code generation.
//!
//! Codegen functions return `Document` values instead of writing to a string
//! buffer with manual indentation tracking. The tree is rendered in a final
//! pass. Go output is indented with tabs, one per nesting level, and
//! indentation is written lazily so empty lines carry no trailing
//! whitespace.
//!
//! # Example
//!
//! ```
//! use talkc_core::codegen::go::document::{INDENT, line, nest};
//! use talkc_core::docvec;
//!
//! let doc = docvec![
//!     "func main() {",
//!     nest(INDENT, docvec![line(), "run()"]),
//!     line(),
//!     "}",
//! ];
//! assert_eq!(doc.to_pretty_string(), "func main() {\n\trun()\n}");
//! ```

/// Nesting step used throughout Go generation: one tab.
pub const INDENT: isize = 1;

/// A pretty-printable document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document<'a> {
    /// A borrowed string literal.
    Str(&'a str),
    /// An owned string.
    String(String),
    /// A newline followed by current indentation.
    Line,
    /// Increase indentation for nested content.
    Nest(isize, Box<Document<'a>>),
    /// A sequence of documents.
    Vec(Vec<Document<'a>>),
    /// Empty document.
    Nil,
}

/// Coerce a value into a `Document`.
pub trait Documentable<'a> {
    fn to_doc(self) -> Document<'a>;
}

impl<'a> Documentable<'a> for &'a str {
    fn to_doc(self) -> Document<'a> {
        Document::Str(self)
    }
}

impl<'a> Documentable<'a> for String {
    fn to_doc(self) -> Document<'a> {
        Document::String(self)
    }
}

impl<'a> Documentable<'a> for Document<'a> {
    fn to_doc(self) -> Document<'a> {
        self
    }
}

impl<'a> Documentable<'a> for Vec<Document<'a>> {
    fn to_doc(self) -> Document<'a> {
        Document::Vec(self)
    }
}

impl<'a> Documentable<'a> for usize {
    fn to_doc(self) -> Document<'a> {
        Document::String(self.to_string())
    }
}

/// Join multiple documents together in a vector.
///
/// Each element is converted to a `Document` via the `Documentable` trait.
/// No separator is inserted.
///
/// ```
/// use talkc_core::docvec;
///
/// let doc = docvec!["hello", " ", "world"];
/// assert_eq!(doc.to_pretty_string(), "hello world");
/// ```
#[macro_export]
macro_rules! docvec {
    () => {
        $crate::codegen::go::document::Document::Vec(Vec::new())
    };

    ($first:expr $(,)?) => {
        $crate::codegen::go::document::Document::Vec(
            vec![$crate::codegen::go::document::Documentable::to_doc($first)]
        )
    };

    ($first:expr, $($rest:expr),+ $(,)?) => {
        match $crate::codegen::go::document::Documentable::to_doc($first) {
            $crate::codegen::go::document::Document::Vec(mut vec) => {
                $(
                    vec.push($crate::codegen::go::document::Documentable::to_doc($rest));
                )*
                $crate::codegen::go::document::Document::Vec(vec)
            },
            first => {
                $crate::codegen::go::document::Document::Vec(
                    vec![first, $($crate::codegen::go::document::Documentable::to_doc($rest)),+]
                )
            }
        }
    };
}

/// Creates a `Line` document: a mandatory newline followed by indentation.
#[must_use]
pub fn line() -> Document<'static> {
    Document::Line
}

/// Creates a `Nil` document.
#[must_use]
pub fn nil() -> Document<'static> {
    Document::Nil
}

/// Creates a `Nest` document that increases indentation for the inner
/// document.
#[must_use]
pub fn nest(indent: isize, doc: Document<'_>) -> Document<'_> {
    Document::Nest(indent, Box::new(doc))
}

/// Joins documents with a separator between each pair.
#[must_use]
pub fn join<'a>(
    docs: impl IntoIterator<Item = Document<'a>>,
    separator: &Document<'a>,
) -> Document<'a> {
    let docs: Vec<_> = docs.into_iter().collect();
    if docs.is_empty() {
        return Document::Nil;
    }
    let mut result = Vec::with_capacity(docs.len() * 2 - 1);
    let mut first = true;
    for doc in docs {
        if !first {
            result.push(separator.clone());
        }
        result.push(doc);
        first = false;
    }
    Document::Vec(result)
}

/// Concatenates documents without any separator.
#[must_use]
pub fn concat<'a>(docs: impl IntoIterator<Item = Document<'a>>) -> Document<'a> {
    Document::Vec(docs.into_iter().collect())
}

/// Lays out one statement per line.
#[must_use]
pub fn lines<'a>(docs: impl IntoIterator<Item = Document<'a>>) -> Document<'a> {
    join(docs, &Document::Line)
}

/// A brace-delimited Go block: `header {`, the indented statements, `}`.
///
/// ```
/// use talkc_core::codegen::go::document::{braced, Document};
///
/// let doc = braced(Document::Str("if ok"), vec![Document::Str("run()")]);
/// assert_eq!(doc.to_pretty_string(), "if ok {\n\trun()\n}");
/// ```
#[must_use]
pub fn braced<'a>(header: Document<'a>, body: Vec<Document<'a>>) -> Document<'a> {
    if body.is_empty() {
        return crate::docvec![header, " {", line(), "}"];
    }
    crate::docvec![
        header,
        " {",
        nest(INDENT, crate::docvec![line(), lines(body)]),
        line(),
        "}",
    ]
}

// --- Rendering ---

/// Renders with lazy indentation: a `Line` only records the indent, which is
/// written when the next non-empty text arrives.
struct Renderer {
    output: String,
    pending_indent: Option<isize>,
}

impl Renderer {
    fn text(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if let Some(indent) = self.pending_indent.take() {
            for _ in 0..indent {
                self.output.push('\t');
            }
        }
        self.output.push_str(s);
    }

    fn render(&mut self, doc: &Document<'_>, indent: isize) {
        match doc {
            Document::Str(s) => self.text(s),
            Document::String(s) => self.text(s),
            Document::Nil => {}
            Document::Line => {
                self.output.push('\n');
                self.pending_indent = Some(indent);
            }
            Document::Nest(extra, inner) => self.render(inner, indent + extra),
            Document::Vec(docs) => {
                for doc in docs {
                    self.render(doc, indent);
                }
            }
        }
    }
}

impl Document<'_> {
    /// Renders the document to a string.
    ///
    /// Go has fixed formatting here, so there is no line-width fitting.
    #[must_use]
    pub fn to_pretty_string(&self) -> String {
        let mut renderer = Renderer {
            output: String::new(),
            pending_indent: None,
        };
        renderer.render(self, 0);
        renderer.output
    }
}
