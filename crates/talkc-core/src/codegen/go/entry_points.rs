// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Generated file layout.
//!
//! ```text
//! header, package, imports
//! constants: class name, parent, hash, source, default interpreter
//! selector lists for --info
//! instance struct, class-side struct
//! constructors and load functions
//! compiled methods
//! dispatch and responds for both structs
//! _receiverFor
//! runtime library, then the mode's entry points
//! ```
//!
//! Both modes share everything above the entry points. Persistence is a JSON
//! object per instance: text variables as JSON strings, structured variables
//! as their JSON value, plus a `class` marker.

use tracing::trace;

use super::analysis::Field;
use super::document::{Document, INDENT, braced, join, line, lines, nest};
use super::selector_mangler::{go_quote, go_raw_quote};
use super::value_type::ValueType;
use super::{Doc, GoGenerator, Result, runtime};
use crate::ast::{MethodKind, StorageKind};
use crate::docvec;

impl GoGenerator<'_> {
    /// Builds the whole file.
    pub(super) fn generate_file(&mut self) -> Result<Doc> {
        let mode = self.options.mode;
        let mut sections: Vec<Doc> = vec![
            docvec!["// Code generated by talkc. DO NOT EDIT."],
            docvec!["package main"],
            runtime::imports(mode),
            self.constants(),
            self.selector_lists(),
            self.struct_def(MethodKind::Instance),
            self.struct_def(MethodKind::Class),
            self.constructor(MethodKind::Instance),
            self.constructor(MethodKind::Class),
            self.load(MethodKind::Instance),
            self.load(MethodKind::Class),
        ];

        let plans = self.skip_set.methods.clone();
        for plan in &plans {
            trace!(selector = %plan.selector, go_name = %plan.go_name, "emitting method");
            sections.push(self.method(plan)?);
        }

        sections.push(self.dispatch(MethodKind::Instance));
        sections.push(self.dispatch(MethodKind::Class));
        sections.push(self.responds(MethodKind::Instance));
        sections.push(self.responds(MethodKind::Class));
        sections.push(self.receiver_factory());
        for section in runtime::sections(mode) {
            sections.push(Document::Str(section));
        }

        Ok(docvec![join(sections, &docvec![line(), line()]), line()])
    }

    fn constants(&self) -> Doc {
        let class = &self.class;
        let parent = class.parent.as_deref().unwrap_or("");
        let hash = self.options.source_hash.as_deref().unwrap_or("");
        let source = self.options.source_text.as_deref().unwrap_or("");
        let values = [
            ("_className", go_quote(&class.name)),
            ("_parentName", go_quote(parent)),
            ("_sourceHash", go_quote(hash)),
            ("_defaultInterpreter", go_quote(&self.options.interpreter)),
        ];
        let width = values.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        let specs: Vec<Doc> = values
            .into_iter()
            .map(|(name, value)| docvec![format!("{name:<width$} = {value}")])
            .collect();
        docvec![
            "const (",
            nest(INDENT, docvec![line(), lines(specs)]),
            line(),
            ")",
            line(),
            line(),
            format!("const _sourceCode = {}", go_raw_quote(source)),
        ]
    }

    fn selector_lists(&self) -> Doc {
        let compiled = self
            .skip_set
            .compiled_selectors()
            .iter()
            .map(|s| go_quote(s))
            .collect::<Vec<_>>()
            .join(", ");
        let skipped = self
            .skip_set
            .skipped
            .iter()
            .map(|s| go_quote(&s.selector))
            .collect::<Vec<_>>()
            .join(", ");
        docvec![
            format!("var _compiledSelectors = []string{{{compiled}}}"),
            line(),
            format!("var _skippedSelectors = []string{{{skipped}}}"),
        ]
    }

    fn struct_def(&self, kind: MethodKind) -> Doc {
        let fields = self.skip_set.layout.fields(kind);
        let mut rows: Vec<(String, &'static str, String)> = vec![
            ("ID".to_string(), "string", "`json:\"-\"`".to_string()),
            ("Class".to_string(), "string", "`json:\"class\"`".to_string()),
        ];
        for field in fields {
            let tag = if field.persisted {
                format!("`json:{}`", go_quote(&field.name))
            } else {
                "`json:\"-\"`".to_string()
            };
            rows.push((
                field.go_name.clone(),
                ValueType::from(field.storage).go_type(),
                tag,
            ));
        }

        let name_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(0);
        let type_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(0);
        let body = rows
            .into_iter()
            .map(|(name, ty, tag)| docvec![format!("{name:<name_width$} {ty:<type_width$} {tag}")])
            .collect();
        braced(
            docvec![format!("type {} struct", self.struct_name(kind))],
            body,
        )
    }

    fn constructor(&self, kind: MethodKind) -> Doc {
        let name = self.struct_name(kind);
        let (signature, id) = match kind {
            MethodKind::Instance => (format!("func new{name}(id string) *{name}"), "id"),
            MethodKind::Class => (format!("func new{name}() *{name}"), "_className"),
        };
        let mut inits = vec![
            docvec![format!("ID: {id},")],
            docvec!["Class: _className,"],
        ];
        for field in self.skip_set.layout.fields(kind) {
            if let Some(value) = Self::default_value(field) {
                inits.push(docvec![format!("{}: {value},", field.go_name)]);
            }
        }
        braced(
            docvec![signature],
            vec![braced(docvec![format!("return &{name}")], inits)],
        )
    }

    /// The Go initializer of a field default.
    fn default_value(field: &Field) -> Option<String> {
        let default = field.default.as_ref()?;
        let literal = go_quote(&default.value);
        Some(match field.storage {
            StorageKind::Text => literal,
            StorageKind::Json => format!("_parseJSON({literal})"),
        })
    }

    fn load(&self, kind: MethodKind) -> Doc {
        let receiver = Self::receiver_for(kind);
        let header = format!(
            "func ({receiver} *{}) load(raw string) error",
            self.struct_name(kind)
        );
        let persisted: Vec<&Field> = self
            .skip_set
            .layout
            .fields(kind)
            .iter()
            .filter(|f| f.persisted)
            .collect();
        if persisted.is_empty() {
            return braced(
                docvec![header],
                vec![
                    docvec!["_, err := _decodeObject(raw)"],
                    docvec!["return err"],
                ],
            );
        }

        let mut body = vec![
            docvec!["obj, err := _decodeObject(raw)"],
            braced(Document::Str("if err != nil"), vec![Document::Str("return err")]),
        ];
        for field in persisted {
            let value = match field.storage {
                StorageKind::Text => "_jsonText(v)",
                StorageKind::Json => "v",
            };
            body.push(braced(
                docvec![format!("if v, ok := obj[{}]; ok", go_quote(&field.name))],
                vec![docvec![format!("{receiver}.{} = {value}", field.go_name)]],
            ));
        }
        body.push(docvec!["return nil"]);
        braced(docvec![header], body)
    }

    /// Picks the struct a request addresses.
    fn receiver_factory(&self) -> Doc {
        braced(
            Document::Str("func _receiverFor(id string) _receiver"),
            vec![
                braced(
                    Document::Str("if id == _className"),
                    vec![docvec![format!(
                        "return new{}()",
                        self.struct_name(MethodKind::Class)
                    )]],
                ),
                docvec![format!(
                    "return new{}(id)",
                    self.struct_name(MethodKind::Instance)
                )],
            ],
        )
    }
}
