// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Class declaration parsing.
//!
//! Grammar, in order:
//!
//! ```text
//! package: Name                 (optional)
//! import: Pkg::Name             (zero or more)
//! Name subclass: Parent | Name trait
//! body item*
//! ```
//!
//! Body items start with one of the [`BODY_KEYWORDS`](super::BODY_KEYWORDS).
//! Method and advice bodies are collected by bracket depth and stored as
//! raw token spans.

use ecow::EcoString;

use super::{Parser, describe};
use crate::ast::{
    Advice, AdviceKind, Alias, ClassDecl, DefaultKind, MethodDecl, MethodKind, ParseErrorKind,
    ParseWarningKind, VarSpec, keyword_selector,
};
use crate::source_analysis::{Position, Token, TokenKind};

/// Selector, keyword parts and argument names of a method header.
type MethodHeader = (EcoString, Vec<EcoString>, Vec<EcoString>);

impl Parser {
    /// Parses a complete class declaration.
    pub(super) fn parse_class_decl(&mut self) -> ClassDecl {
        let mut class = ClassDecl::default();
        self.parse_prelude(&mut class);
        self.parse_class_header(&mut class);

        let mut category = None;
        loop {
            self.skip_trivia();
            if self.is_at_end() {
                break;
            }
            self.parse_body_item(&mut class, &mut category);
        }

        let (warnings, errors) = self.take_diagnostics();
        class.warnings = warnings;
        class.errors = errors;
        class
    }

    // ========================================================================
    // Header
    // ========================================================================

    /// Parses the optional `package:` and `import:` lines.
    fn parse_prelude(&mut self, class: &mut ClassDecl) {
        loop {
            self.skip_trivia();
            let (is_package, context) = if self.check_keyword("package:") {
                (true, "package declaration")
            } else if self.check_keyword("import:") {
                (false, "import declaration")
            } else {
                return;
            };
            self.advance();

            match self.parse_qualified_name() {
                Some(name) if is_package => class.package = Some(name),
                Some(name) => class.imports.push(name),
                None => {
                    self.error(
                        ParseErrorKind::MalformedDeclaration,
                        format!("expected a name in {context}"),
                        context,
                    );
                    self.skip_line();
                }
            }
        }
    }

    /// Parses `Name subclass: Parent` or `Name trait`.
    fn parse_class_header(&mut self, class: &mut ClassDecl) {
        const CONTEXT: &str = "class header";
        self.skip_trivia();

        let Some(name) = self.match_token(TokenKind::Identifier) else {
            let found = self
                .current_token()
                .map_or_else(|| "end of input".to_string(), describe);
            self.error(
                ParseErrorKind::MissingClassHeader,
                format!("expected `Name subclass: Parent` or `Name trait`, found {found}"),
                CONTEXT,
            );
            self.recover_to_body_keyword();
            return;
        };
        class.name = name.text().into();

        if self.check_keyword("subclass:") {
            self.advance();
            if let Some(parent) = self.parse_qualified_name() {
                class.parent = Some(parent);
            } else {
                self.error(
                    ParseErrorKind::MissingClassHeader,
                    format!("expected a parent class after `{} subclass:`", class.name),
                    CONTEXT,
                );
                self.recover_to_body_keyword();
            }
        } else if self.current_token().is_some_and(|t| t.is_identifier("trait")) {
            self.advance();
            class.is_trait = true;
        } else {
            self.error(
                ParseErrorKind::MissingClassHeader,
                format!("expected `subclass:` or `trait` after `{}`", class.name),
                CONTEXT,
            );
            self.recover_to_body_keyword();
        }
    }

    /// Parses `Name` or `Pkg::Name` (any depth), joined with `::`.
    fn parse_qualified_name(&mut self) -> Option<EcoString> {
        self.skip_comments();
        let first = self.match_token(TokenKind::Identifier)?;
        let mut name = EcoString::from(first.text());
        while self.check(TokenKind::NamespaceSep)
            && self
                .peek_at(1)
                .is_some_and(|t| t.kind() == TokenKind::Identifier)
        {
            self.advance();
            if let Some(part) = self.advance() {
                name.push_str("::");
                name.push_str(part.text());
            }
        }
        Some(name)
    }

    // ========================================================================
    // Body items
    // ========================================================================

    /// Parses one declaration inside the class body.
    fn parse_body_item(&mut self, class: &mut ClassDecl, category: &mut Option<EcoString>) {
        let Some(token) = self.current_token().cloned() else {
            return;
        };
        let Some((keyword, _)) = token.keyword_parts() else {
            self.error(
                ParseErrorKind::UnexpectedToken,
                format!("unexpected {} at class body scope", describe(&token)),
                "class body",
            );
            self.synchronize();
            return;
        };

        match keyword {
            "category:" => self.parse_category(category),
            "instanceVars:" => {
                self.advance();
                let vars = self.parse_var_list("instanceVars: declaration");
                class.instance_vars.extend(vars);
            }
            "classInstanceVars:" => {
                self.advance();
                let vars = self.parse_var_list("classInstanceVars: declaration");
                class.class_instance_vars.extend(vars);
            }
            "include:" => self.parse_include(class),
            "requires:" => self.parse_requires(class),
            "method:" => self.parse_method(class, MethodKind::Instance, false, category.as_ref()),
            "classMethod:" => self.parse_method(class, MethodKind::Class, false, category.as_ref()),
            "rawMethod:" => self.parse_method(class, MethodKind::Instance, true, category.as_ref()),
            "rawClassMethod:" => self.parse_method(class, MethodKind::Class, true, category.as_ref()),
            "alias:" => self.parse_alias(class),
            "before:" => self.parse_advice(class, AdviceKind::Before),
            "after:" => self.parse_advice(class, AdviceKind::After),
            _ => {
                self.error(
                    ParseErrorKind::UnexpectedToken,
                    format!("unexpected keyword `{keyword}` at class body scope"),
                    "class body",
                );
                self.synchronize();
            }
        }
    }

    /// `category: "name"` sets the category for the methods that follow.
    fn parse_category(&mut self, category: &mut Option<EcoString>) {
        self.advance();
        self.skip_comments();
        let name = match self.current_token() {
            Some(t) if t.kind().is_string() => t.string_content(),
            Some(t) if t.kind() == TokenKind::Identifier => Some(t.text().into()),
            _ => None,
        };
        if let Some(name) = name {
            self.advance();
            *category = Some(name);
        } else {
            self.error(
                ParseErrorKind::MalformedDeclaration,
                "expected a category name after `category:`",
                "category declaration",
            );
            self.recover_to_body_keyword();
        }
    }

    /// Parses the rest of an `instanceVars:` / `classInstanceVars:` line.
    fn parse_var_list(&mut self, context: &str) -> Vec<VarSpec> {
        let mut vars = Vec::new();
        while !self.at_line_end() && !self.at_body_keyword() {
            let Some(token) = self.advance() else {
                break;
            };
            match token.kind() {
                TokenKind::Identifier => vars.push(VarSpec::new(token.text())),
                TokenKind::Keyword => {
                    if let Some(var) = self.parse_var_with_default(&token) {
                        vars.push(var);
                    }
                }
                _ => {
                    self.error_at(
                        ParseErrorKind::MalformedDeclaration,
                        format!("unexpected {} in variable list", describe(&token)),
                        context,
                        Some(token),
                    );
                    self.skip_line();
                }
            }
        }
        vars
    }

    /// Parses `name:0`, `name: 'x'`, `name: '''x'''` and a bare `name:`.
    fn parse_var_with_default(&mut self, keyword: &Token) -> Option<VarSpec> {
        let (name, embedded) = keyword.keyword_parts()?;
        let name = name.trim_end_matches(':');
        if let Some(digits) = embedded {
            return Some(VarSpec::with_default(name, DefaultKind::Number, digits));
        }

        let var = match self.current_token() {
            Some(t) if t.kind() == TokenKind::TripleString => {
                VarSpec::with_default(name, DefaultKind::TripleString, t.string_content()?)
            }
            Some(t) if t.kind().is_string() => {
                VarSpec::with_default(name, DefaultKind::String, t.string_content()?)
            }
            Some(t) if t.kind() == TokenKind::Number => {
                VarSpec::with_default(name, DefaultKind::Number, t.text())
            }
            Some(t)
                if t.kind() == TokenKind::Minus
                    && self
                        .peek_at(1)
                        .is_some_and(|n| n.kind() == TokenKind::Number) =>
            {
                self.advance();
                let digits = self.current_token()?.text();
                VarSpec::with_default(name, DefaultKind::Number, format!("-{digits}"))
            }
            Some(t) if t.kind() == TokenKind::Identifier => {
                let message = format!(
                    "`{name}:` is followed by a separate name `{}`; write `{name}:<default>` or put a space before the colon",
                    t.text()
                );
                self.warning(
                    ParseWarningKind::AmbiguousVarSpacing,
                    message,
                    keyword.position(),
                );
                return Some(VarSpec::new(name));
            }
            _ => return Some(VarSpec::new(name)),
        };
        self.advance();
        Some(var)
    }

    /// `include: TraitA TraitB`
    fn parse_include(&mut self, class: &mut ClassDecl) {
        self.advance();
        let before = class.traits.len();
        while !self.at_line_end() && !self.at_body_keyword() {
            if let Some(name) = self.parse_qualified_name() {
                class.traits.push(name);
            } else {
                self.error(
                    ParseErrorKind::MalformedDeclaration,
                    "expected a trait name in `include:`",
                    "include declaration",
                );
                self.skip_line();
            }
        }
        if class.traits.len() == before {
            self.error(
                ParseErrorKind::MalformedDeclaration,
                "expected a trait name after `include:`",
                "include declaration",
            );
        }
    }

    /// `requires: 'file.sh'` (file dependency) or `requires: selector`
    /// (method requirement).
    fn parse_requires(&mut self, class: &mut ClassDecl) {
        const CONTEXT: &str = "requires declaration";
        self.advance();
        let mut found = false;
        while !self.at_line_end() && !self.at_body_keyword() {
            let Some(token) = self.current_token().cloned() else {
                break;
            };
            if token.kind().is_string() {
                self.advance();
                if let Some(path) = token.string_content() {
                    class.requires.push(path);
                }
                found = true;
            } else if let Some(selector) = self.parse_selector(None) {
                if !class.is_trait {
                    self.warning(
                        ParseWarningKind::MethodRequirementOnClass,
                        format!(
                            "`{}` is not a trait; the requirement `{selector}` only constrains subclasses",
                            class.name
                        ),
                        token.position(),
                    );
                }
                class.method_requirements.push(selector);
                found = true;
            } else {
                self.error(
                    ParseErrorKind::MalformedDeclaration,
                    format!("unexpected {} in `requires:`", describe(&token)),
                    CONTEXT,
                );
                self.skip_line();
            }
        }
        if !found {
            self.error(
                ParseErrorKind::MalformedDeclaration,
                "expected a file name or selector after `requires:`",
                CONTEXT,
            );
        }
    }

    /// `alias: newName for: existingName`
    fn parse_alias(&mut self, class: &mut ClassDecl) {
        const CONTEXT: &str = "alias declaration";
        self.advance();
        let Some(new_name) = self.parse_selector(Some("for:")) else {
            self.error(
                ParseErrorKind::MalformedDeclaration,
                "expected a selector after `alias:`",
                CONTEXT,
            );
            self.recover_to_body_keyword();
            return;
        };
        if !self.check_keyword("for:") {
            self.error(
                ParseErrorKind::MalformedDeclaration,
                format!("expected `for:` after `alias: {new_name}`"),
                CONTEXT,
            );
            self.recover_to_body_keyword();
            return;
        }
        self.advance();
        let Some(existing_name) = self.parse_selector(None) else {
            self.error(
                ParseErrorKind::MalformedDeclaration,
                format!("expected the aliased selector after `alias: {new_name} for:`"),
                CONTEXT,
            );
            self.recover_to_body_keyword();
            return;
        };
        class.aliases.push(Alias {
            new_name,
            existing_name,
        });
    }

    /// `before: selector do: [ ... ]` / `after: selector do: [ ... ]`
    fn parse_advice(&mut self, class: &mut ClassDecl, kind: AdviceKind) {
        let Some(keyword) = self.advance() else {
            return;
        };
        let context = format!("{} advice", keyword.text());
        let Some(selector) = self.parse_selector(Some("do:")) else {
            self.error(
                ParseErrorKind::MalformedDeclaration,
                format!("expected a selector after `{}`", keyword.text()),
                context,
            );
            self.recover_past_body();
            return;
        };
        if !self.check_keyword("do:") {
            self.error(
                ParseErrorKind::MalformedDeclaration,
                format!("expected `do:` after `{} {selector}`", keyword.text()),
                context,
            );
            self.recover_past_body();
            return;
        }
        self.advance();
        self.skip_trivia();
        if !self.check_block_open() {
            self.error(
                ParseErrorKind::MalformedDeclaration,
                format!("expected `[` to open the {context} for `{selector}`"),
                context,
            );
            self.recover_to_body_keyword();
            return;
        }
        if let Some(body) = self.collect_block(&context) {
            class.advice.push(Advice {
                kind,
                selector,
                body,
                line: keyword.line(),
            });
        }
    }

    // ========================================================================
    // Methods
    // ========================================================================

    /// Parses any of the four method declaration forms.
    fn parse_method(
        &mut self,
        class: &mut ClassDecl,
        kind: MethodKind,
        raw: bool,
        category: Option<&EcoString>,
    ) {
        let Some(keyword) = self.advance() else {
            return;
        };
        let context = format!("{} declaration", keyword.text());

        let Some((selector, keywords, args)) = self.parse_method_header(&context) else {
            self.recover_past_body();
            return;
        };

        self.skip_trivia();
        if !self.check_block_open() {
            self.error(
                ParseErrorKind::MalformedDeclaration,
                format!("expected `[` to open the body of method `{selector}`"),
                context,
            );
            self.recover_to_body_keyword();
            return;
        }

        let Some(body) = self.collect_block(&format!("method `{selector}`")) else {
            return;
        };
        let (pragmas, body) = strip_pragmas(body);

        class.methods.push(MethodDecl {
            kind,
            raw,
            selector,
            keywords,
            args,
            pragmas,
            category: category.cloned(),
            body,
            line: keyword.line(),
        });
    }

    /// Parses `name` or `k1: a1 k2: a2`.
    fn parse_method_header(&mut self, context: &str) -> Option<MethodHeader> {
        self.skip_comments();
        match self.current_kind() {
            Some(TokenKind::Identifier) => {
                let name = self.advance()?;
                Some((name.text().into(), Vec::new(), Vec::new()))
            }
            Some(TokenKind::Keyword) => {
                let mut keywords = Vec::new();
                let mut args = Vec::new();
                while let Some(token) = self.match_token(TokenKind::Keyword) {
                    let (name, embedded) = token.keyword_parts()?;
                    if embedded.is_some() {
                        self.error_at(
                            ParseErrorKind::MalformedDeclaration,
                            format!("keyword `{}` in a method header cannot carry a value", token.text()),
                            context,
                            Some(token.clone()),
                        );
                        return None;
                    }
                    self.skip_comments();
                    let Some(arg) = self.match_token(TokenKind::Identifier) else {
                        self.error(
                            ParseErrorKind::MalformedDeclaration,
                            format!("expected an argument name after `{name}`"),
                            context,
                        );
                        return None;
                    };
                    keywords.push(EcoString::from(name));
                    args.push(EcoString::from(arg.text()));
                    self.skip_comments();
                }
                let selector = keyword_selector(keywords.iter().map(EcoString::as_str));
                Some((selector, keywords, args))
            }
            _ => {
                let found = self
                    .current_token()
                    .map_or_else(|| "end of input".to_string(), describe);
                self.error(
                    ParseErrorKind::MalformedDeclaration,
                    format!("expected a selector, found {found}"),
                    context,
                );
                None
            }
        }
    }

    /// Parses a selector reference: an identifier or a run of keywords.
    ///
    /// A keyword run stops at `stop` (for `alias: a: for:`), at a
    /// non-keyword token, or at the end of the line.
    fn parse_selector(&mut self, stop: Option<&str>) -> Option<EcoString> {
        self.skip_comments();
        if let Some(name) = self.match_token(TokenKind::Identifier) {
            return Some(name.text().into());
        }
        let mut parts = Vec::new();
        while let Some(token) = self.current_token() {
            if stop.is_some_and(|s| token.is_keyword(s)) {
                break;
            }
            let Some((name, _)) = token.keyword_parts() else {
                break;
            };
            parts.push(EcoString::from(name));
            self.advance();
        }
        (!parts.is_empty()).then(|| keyword_selector(parts.iter().map(EcoString::as_str)))
    }

    fn check_block_open(&self) -> bool {
        self.check(TokenKind::LBracket) || self.check(TokenKind::DLBracket)
    }

    /// Collects the tokens between a `[` and its matching `]`.
    ///
    /// `[[` and `]]` count as two brackets each. When a `]]` closes both an
    /// inner block and the outer one, the inner half is kept as a single
    /// `]` token at the same position.
    fn collect_block(&mut self, context: &str) -> Option<Vec<Token>> {
        let open = self.advance()?;
        let mut body = Vec::new();
        let mut depth: usize = 1;
        if open.kind() == TokenKind::DLBracket {
            depth = 2;
            let inner = open.position();
            body.push(Token::new(
                TokenKind::LBracket,
                "[",
                Position::new(inner.line(), inner.column() + 1),
            ));
        }

        loop {
            let Some(token) = self.advance() else {
                self.error_at(
                    ParseErrorKind::UnterminatedBlock,
                    format!("unterminated block in {context}: missing `]`"),
                    context,
                    Some(open),
                );
                return None;
            };
            match token.kind() {
                TokenKind::LBracket => {
                    depth += 1;
                    body.push(token);
                }
                TokenKind::DLBracket => {
                    depth += 2;
                    body.push(token);
                }
                TokenKind::RBracket => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(body);
                    }
                    body.push(token);
                }
                TokenKind::DRBracket if depth > 2 => {
                    depth -= 2;
                    body.push(token);
                }
                TokenKind::DRBracket if depth == 2 => {
                    body.push(Token::new(TokenKind::RBracket, "]", token.position()));
                    return Some(body);
                }
                TokenKind::DRBracket => {
                    self.error_at(
                        ParseErrorKind::UnexpectedToken,
                        "stray `]` after the end of the block",
                        context,
                        Some(token),
                    );
                    return Some(body);
                }
                _ => body.push(token),
            }
        }
    }

    // ========================================================================
    // Recovery helpers
    // ========================================================================

    /// Skips to the end of the current line, leaving the newline in place.
    fn skip_line(&mut self) {
        while !self.is_at_end() && !self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    /// Synchronizes unless already sitting on a body-level keyword.
    fn recover_to_body_keyword(&mut self) {
        if !self.is_at_end() && !self.at_body_keyword() {
            self.synchronize();
        }
    }

    /// Skips a malformed method header together with its body block, so the
    /// body's tokens are not mistaken for declarations.
    fn recover_past_body(&mut self) {
        while !self.is_at_end() && !self.at_body_keyword() && !self.check_block_open() {
            self.advance();
        }
        if self.check_block_open() {
            let _ = self.collect_block("skipped declaration");
        }
    }
}

/// Splits a leading run of `pragma: name` pairs off a method body.
fn strip_pragmas(body: Vec<Token>) -> (Vec<EcoString>, Vec<Token>) {
    let mut pragmas = Vec::new();
    let mut index = 0;
    loop {
        let mut probe = index;
        while body.get(probe).is_some_and(|t| t.kind().is_trivia()) {
            probe += 1;
        }
        match (body.get(probe), body.get(probe + 1)) {
            (Some(keyword), Some(name))
                if keyword.is_keyword("pragma:") && name.kind() == TokenKind::Identifier =>
            {
                pragmas.push(EcoString::from(name.text()));
                index = probe + 2;
            }
            _ => break,
        }
    }
    let body = body.into_iter().skip(index).collect();
    (pragmas, body)
}

#[cfg(test)]
mod tests {
    use crate::ast::{ParseErrorKind, ParseWarningKind, Pragma, StorageKind};
    use crate::source_analysis::{TokenKind, parse_source};

    use super::*;

    fn body_texts(tokens: &[Token]) -> Vec<&str> {
        tokens
            .iter()
            .filter(|t| !t.kind().is_trivia())
            .map(Token::text)
            .collect()
    }

    #[test]
    fn parse_minimal_class() {
        let class = parse_source("Counter subclass: Object");
        assert!(class.errors.is_empty());
        assert_eq!(class.name, "Counter");
        assert_eq!(class.parent.as_deref(), Some("Object"));
        assert!(!class.is_trait);
    }

    #[test]
    fn parse_package_imports_and_qualified_parent() {
        let class = parse_source(
            "package: MyApp\nimport: Core\nimport: Util::Text\nWidget subclass: Ui::Base\n",
        );
        assert!(class.errors.is_empty(), "{:?}", class.errors);
        assert_eq!(class.package.as_deref(), Some("MyApp"));
        assert_eq!(class.imports, vec!["Core", "Util::Text"]);
        assert_eq!(class.parent.as_deref(), Some("Ui::Base"));
    }

    #[test]
    fn parse_trait_header() {
        let class = parse_source("Greeter trait\n  requires: describe\n");
        assert!(class.is_trait);
        assert!(class.parent.is_none());
        assert_eq!(class.method_requirements, vec!["describe"]);
        assert!(class.warnings.is_empty());
    }

    #[test]
    fn method_requirement_on_class_warns_but_is_kept() {
        let class = parse_source("Shape subclass: Object\n  requires: area\n");
        assert_eq!(class.method_requirements, vec!["area"]);
        assert_eq!(class.warnings.len(), 1);
        assert_eq!(
            class.warnings[0].kind,
            ParseWarningKind::MethodRequirementOnClass
        );
    }

    #[test]
    fn requires_file_dependency() {
        let class = parse_source("A subclass: Object\n  requires: 'lib/helpers.sh'\n");
        assert_eq!(class.requires, vec!["lib/helpers.sh"]);
        assert!(class.method_requirements.is_empty());
    }

    #[test]
    fn instance_vars_with_defaults() {
        let class = parse_source(
            "Counter subclass: Object\n  instanceVars: value:0 items:'[]' label: 'x' notes ratio:0.5 text:'''a\nb'''\n",
        );
        assert!(class.errors.is_empty(), "{:?}", class.errors);
        let names: Vec<_> = class.instance_vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["value", "items", "label", "notes", "ratio", "text"]);

        let value = class.instance_var("value").unwrap();
        let default = value.default.as_ref().unwrap();
        assert_eq!(default.kind, DefaultKind::Number);
        assert_eq!(default.value, "0");
        assert_eq!(value.storage(), StorageKind::Text);

        let items = class.instance_var("items").unwrap();
        assert_eq!(items.default.as_ref().unwrap().kind, DefaultKind::String);
        assert_eq!(items.storage(), StorageKind::Json);

        assert!(class.instance_var("notes").unwrap().default.is_none());
        assert_eq!(
            class.instance_var("ratio").unwrap().default.as_ref().unwrap().value,
            "0.5"
        );
        assert_eq!(
            class.instance_var("text").unwrap().default.as_ref().unwrap().kind,
            DefaultKind::TripleString
        );
    }

    #[test]
    fn ambiguous_var_spacing_is_two_vars_with_warning() {
        let class = parse_source("A subclass: Object\n  instanceVars: count: total\n");
        assert!(class.errors.is_empty());
        let names: Vec<_> = class.instance_vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["count", "total"]);
        assert_eq!(class.warnings.len(), 1);
        assert_eq!(class.warnings[0].kind, ParseWarningKind::AmbiguousVarSpacing);
        assert_eq!(class.warnings[0].position.line(), 2);
    }

    #[test]
    fn negative_number_default() {
        let class = parse_source("A subclass: Object\n  instanceVars: low: -5\n");
        let default = class.instance_vars[0].default.as_ref().unwrap();
        assert_eq!(default.value, "-5");
    }

    #[test]
    fn class_instance_vars_and_include() {
        let class = parse_source(
            "A subclass: Object\n  classInstanceVars: created:0\n  include: Debuggable Pkg::Printable\n",
        );
        assert_eq!(class.class_instance_vars[0].name, "created");
        assert_eq!(class.traits, vec!["Debuggable", "Pkg::Printable"]);
    }

    #[test]
    fn unary_and_keyword_methods() {
        let class = parse_source(
            "A subclass: Object\n  method: increment [ value := value + 1 ]\n  method: at: key put: val [\n    ^ key\n  ]\n",
        );
        assert!(class.errors.is_empty(), "{:?}", class.errors);
        assert_eq!(class.methods.len(), 2);

        let increment = &class.methods[0];
        assert_eq!(increment.selector, "increment");
        assert!(increment.args.is_empty());
        assert_eq!(body_texts(&increment.body), vec!["value", ":=", "value", "+", "1"]);
        assert_eq!(increment.line, 2);

        let at_put = &class.methods[1];
        assert_eq!(at_put.selector, "at_put_");
        assert_eq!(at_put.keywords, vec!["at:", "put:"]);
        assert_eq!(at_put.args, vec!["key", "val"]);
        assert_eq!(body_texts(&at_put.body), vec!["^", "key"]);
    }

    #[test]
    fn method_kinds_and_raw_flag() {
        let class = parse_source(
            "A subclass: Object\n  classMethod: create [ ]\n  rawMethod: shell [ echo $x ]\n  rawClassMethod: boot [ ]\n",
        );
        let kinds: Vec<_> = class.methods.iter().map(|m| (m.kind, m.raw)).collect();
        assert_eq!(
            kinds,
            vec![
                (MethodKind::Class, false),
                (MethodKind::Instance, true),
                (MethodKind::Class, true),
            ]
        );
    }

    #[test]
    fn nested_brackets_stay_in_body() {
        let class = parse_source(
            "A subclass: Object\n  method: run [ x ifTrue: [ y ] ifFalse: [ z ] ]\n  method: other [ ]\n",
        );
        assert_eq!(class.methods.len(), 2);
        assert_eq!(
            body_texts(&class.methods[0].body),
            vec!["x", "ifTrue:", "[", "y", "]", "ifFalse:", "[", "z", "]"]
        );
    }

    #[test]
    fn doubled_close_bracket_ends_inner_and_outer_block() {
        let class = parse_source("A subclass: Object\n  method: run [ x ifTrue: [ y ]]\n");
        assert!(class.errors.is_empty(), "{:?}", class.errors);
        let body = &class.methods[0].body;
        assert_eq!(body_texts(body), vec!["x", "ifTrue:", "[", "y", "]"]);
        assert_eq!(body.last().unwrap().kind(), TokenKind::RBracket);
    }

    #[test]
    fn shell_test_brackets_are_balanced() {
        let class = parse_source(
            "A subclass: Object\n  rawMethod: check [ [[ -f x ]] && echo ok ]\n  method: next [ ]\n",
        );
        assert!(class.errors.is_empty(), "{:?}", class.errors);
        assert_eq!(class.methods.len(), 2);
    }

    #[test]
    fn pragmas_are_stripped() {
        let class = parse_source(
            "A subclass: Object\n  method: read [\n    pragma: primitive\n    pragma: compileOnly\n    ^ 1\n  ]\n",
        );
        let method = &class.methods[0];
        assert_eq!(method.pragmas, vec!["primitive", "compileOnly"]);
        assert!(method.has_pragma(Pragma::Primitive));
        assert_eq!(body_texts(&method.body), vec!["^", "1"]);
    }

    #[test]
    fn category_applies_to_following_methods() {
        let class = parse_source(
            "A subclass: Object\n  method: a [ ]\n  category: \"accessing\"\n  method: b [ ]\n  category: testing\n  method: c [ ]\n",
        );
        let categories: Vec<_> = class.methods.iter().map(|m| m.category.as_deref()).collect();
        assert_eq!(categories, vec![None, Some("accessing"), Some("testing")]);
    }

    #[test]
    fn alias_and_advice() {
        let class = parse_source(
            "A subclass: Object\n  alias: size for: count\n  alias: at:put: for: put:at:\n  before: increment do: [ log := 1 ]\n  after: at:put: do: [ ]\n",
        );
        assert!(class.errors.is_empty(), "{:?}", class.errors);
        assert_eq!(class.aliases[0].new_name, "size");
        assert_eq!(class.aliases[0].existing_name, "count");
        assert_eq!(class.aliases[1].new_name, "at_put_");
        assert_eq!(class.aliases[1].existing_name, "put_at_");
        assert_eq!(class.advice[0].kind, AdviceKind::Before);
        assert_eq!(class.advice[0].selector, "increment");
        assert_eq!(body_texts(&class.advice[0].body), vec!["log", ":=", "1"]);
        assert_eq!(class.advice[1].kind, AdviceKind::After);
        assert_eq!(class.advice[1].selector, "at_put_");
    }

    #[test]
    fn missing_header_is_recorded_and_body_still_parsed() {
        let class = parse_source("  method: foo [ ^ 1 ]\n");
        assert_eq!(class.errors.len(), 1);
        assert_eq!(class.errors[0].kind, ParseErrorKind::MissingClassHeader);
        assert_eq!(class.methods.len(), 1);
    }

    #[test]
    fn missing_parent_after_subclass() {
        let class = parse_source("A subclass:\n  method: foo [ ]\n");
        assert_eq!(class.errors[0].kind, ParseErrorKind::MissingClassHeader);
        assert_eq!(class.name, "A");
        assert_eq!(class.methods.len(), 1);
    }

    #[test]
    fn unexpected_token_recovers_at_next_declaration() {
        let class = parse_source(
            "A subclass: Object\n  garbage 42 + ;\n  method: ok [ ^ 1 ]\n  oops: 1\n  method: fine [ ]\n",
        );
        assert_eq!(class.errors.len(), 2);
        assert!(
            class
                .errors
                .iter()
                .all(|e| e.kind == ParseErrorKind::UnexpectedToken)
        );
        assert_eq!(class.errors[0].position.line(), 2);
        let selectors: Vec<_> = class.methods.iter().map(|m| m.selector.as_str()).collect();
        assert_eq!(selectors, vec!["ok", "fine"]);
    }

    #[test]
    fn malformed_method_header_skips_its_body() {
        let class = parse_source(
            "A subclass: Object\n  method: 42 [ @ self before: x ]\n  method: good [ ]\n",
        );
        assert_eq!(class.errors.len(), 1);
        assert_eq!(class.errors[0].kind, ParseErrorKind::MalformedDeclaration);
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].selector, "good");
    }

    #[test]
    fn unterminated_block_is_reported() {
        let class = parse_source("A subclass: Object\n  method: broken [ x := 1\n");
        assert_eq!(class.errors.len(), 1);
        assert_eq!(class.errors[0].kind, ParseErrorKind::UnterminatedBlock);
        assert_eq!(class.errors[0].position.line(), 2);
        assert!(class.methods.is_empty());
    }

    #[test]
    fn keyword_header_with_embedded_value_is_malformed() {
        let class = parse_source("A subclass: Object\n  method: at:1 [ ]\n");
        assert_eq!(class.errors[0].kind, ParseErrorKind::MalformedDeclaration);
        assert!(class.methods.is_empty());
    }

    #[test]
    fn comments_between_declarations_are_ignored() {
        let class = parse_source(
            "# header comment\nA subclass: Object # trailing\n\n  # about foo\n  method: foo [ ]\n",
        );
        assert!(class.errors.is_empty(), "{:?}", class.errors);
        assert_eq!(class.methods.len(), 1);
    }

    #[test]
    fn declaration_json_round_trip() {
        let class = parse_source(
            "Counter subclass: Object\n  instanceVars: value:0\n  method: increment [ value := value + 1 ]\n",
        );
        let json = serde_json::to_string(&class).unwrap();
        let back: ClassDecl = serde_json::from_str(&json).unwrap();
        assert_eq!(back, class);
    }
}
