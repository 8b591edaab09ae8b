// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Token definitions for talk source code.
//!
//! A token is a `{kind, text, line, column}` record. The text is always the
//! exact lexeme as written (quotes and sigils included), so a token stream
//! can be laid back out over its original columns.

use ecow::EcoString;
use serde::{Deserialize, Serialize};

use super::Position;

/// The kind of a token.
///
/// The set is closed. Shell-flavoured kinds (`Variable`, `Subshell`,
/// `Arithmetic`, `Redirect`, `Path`) are carried through unchanged so the
/// body parser can name them when it refuses a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    // === Names ===
    /// `value`, `Counter`, `_throw`
    Identifier,
    /// `at:`, also with a fused digit run: `count:0`
    Keyword,

    // === Literals ===
    /// `'text'`
    String,
    /// `"text $(cmd)"`
    #[serde(rename = "DSTRING")]
    DString,
    /// `'''text'''`
    TripleString,
    /// `42`, `3.5`
    Number,

    // === Delimiters ===
    /// `[`
    #[serde(rename = "LBRACKET")]
    LBracket,
    /// `]`
    #[serde(rename = "RBRACKET")]
    RBracket,
    /// `[[`
    #[serde(rename = "DLBRACKET")]
    DLBracket,
    /// `]]`
    #[serde(rename = "DRBRACKET")]
    DRBracket,
    /// `(`
    #[serde(rename = "LPAREN")]
    LParen,
    /// `)`
    #[serde(rename = "RPAREN")]
    RParen,
    /// `{`
    #[serde(rename = "LBRACE")]
    LBrace,
    /// `}`
    #[serde(rename = "RBRACE")]
    RBrace,
    /// `#(`
    HashParen,
    /// `#{`
    HashBrace,

    // === Punctuation ===
    /// `:=`
    Assign,
    /// `::`
    NamespaceSep,
    /// `:name`
    BlockParam,
    Colon,
    Caret,
    At,
    Dot,
    Pipe,
    Semicolon,
    Bang,

    // === Operators ===
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Comma,
    Gt,
    Lt,
    Ge,
    Le,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `=`
    Equals,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `&`
    Amp,

    // === Shell constructs ===
    /// `$x`, `${x}`, `$1`, `$@`
    Variable,
    /// `$(cmd)`
    Subshell,
    /// `$((1 + 2))`
    Arithmetic,
    /// `>>`, `<<`, `<<<`, `&>`, `2>`
    Redirect,
    /// `/usr/bin`, `./run`, `../x`, `~/y`
    Path,

    // === Trivia and errors ===
    Newline,
    /// `# comment`
    Comment,
    /// An unknown character.
    Error,
}

impl TokenKind {
    /// The wire name of this kind (`IDENTIFIER`, `DSTRING`, ...).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Identifier => "IDENTIFIER",
            Self::Keyword => "KEYWORD",
            Self::String => "STRING",
            Self::DString => "DSTRING",
            Self::TripleString => "TRIPLE_STRING",
            Self::Number => "NUMBER",
            Self::LBracket => "LBRACKET",
            Self::RBracket => "RBRACKET",
            Self::DLBracket => "DLBRACKET",
            Self::DRBracket => "DRBRACKET",
            Self::LParen => "LPAREN",
            Self::RParen => "RPAREN",
            Self::LBrace => "LBRACE",
            Self::RBrace => "RBRACE",
            Self::HashParen => "HASH_PAREN",
            Self::HashBrace => "HASH_BRACE",
            Self::Assign => "ASSIGN",
            Self::NamespaceSep => "NAMESPACE_SEP",
            Self::BlockParam => "BLOCK_PARAM",
            Self::Colon => "COLON",
            Self::Caret => "CARET",
            Self::At => "AT",
            Self::Dot => "DOT",
            Self::Pipe => "PIPE",
            Self::Semicolon => "SEMICOLON",
            Self::Bang => "BANG",
            Self::Plus => "PLUS",
            Self::Minus => "MINUS",
            Self::Star => "STAR",
            Self::Slash => "SLASH",
            Self::Percent => "PERCENT",
            Self::Comma => "COMMA",
            Self::Gt => "GT",
            Self::Lt => "LT",
            Self::Ge => "GE",
            Self::Le => "LE",
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Equals => "EQUALS",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Amp => "AMP",
            Self::Variable => "VARIABLE",
            Self::Subshell => "SUBSHELL",
            Self::Arithmetic => "ARITHMETIC",
            Self::Redirect => "REDIRECT",
            Self::Path => "PATH",
            Self::Newline => "NEWLINE",
            Self::Comment => "COMMENT",
            Self::Error => "ERROR",
        }
    }

    /// Returns true for tokens the declaration parser skips between
    /// declarations.
    #[must_use]
    pub const fn is_trivia(self) -> bool {
        matches!(self, Self::Newline | Self::Comment)
    }

    /// Returns true for shell constructs the compiler never translates.
    #[must_use]
    pub const fn is_shell(self) -> bool {
        matches!(
            self,
            Self::Variable | Self::Subshell | Self::Arithmetic | Self::Redirect | Self::Path
        )
    }

    /// Returns true for the three string literal kinds.
    #[must_use]
    pub const fn is_string(self) -> bool {
        matches!(self, Self::String | Self::DString | Self::TripleString)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A token with its exact source text and position.
///
/// Serialized as `{type, value, line, col}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "type")]
    kind: TokenKind,
    #[serde(rename = "value")]
    text: EcoString,
    #[serde(flatten)]
    position: Position,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<EcoString>, position: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }

    /// Returns the token kind.
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Returns the exact lexeme.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns where the token starts.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Returns the 1-based line.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.position.line()
    }

    /// Returns the 1-based column.
    #[must_use]
    pub fn column(&self) -> u32 {
        self.position.column()
    }

    /// Returns true if this is an identifier with the given name.
    #[must_use]
    pub fn is_identifier(&self, name: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == name
    }

    /// Returns true if this is a keyword whose name (colon included,
    /// embedded default excluded) is `keyword`.
    #[must_use]
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.keyword_parts()
            .is_some_and(|(name, _)| name == keyword)
    }

    /// Splits a keyword token into its name (with colon) and the fused
    /// digit run, if any.
    ///
    /// ```
    /// use talkc_core::source_analysis::{lex, TokenKind};
    ///
    /// let tokens = lex("count:0 at:");
    /// assert_eq!(tokens[0].keyword_parts(), Some(("count:", Some("0"))));
    /// assert_eq!(tokens[1].keyword_parts(), Some(("at:", None)));
    /// ```
    #[must_use]
    pub fn keyword_parts(&self) -> Option<(&str, Option<&str>)> {
        if self.kind != TokenKind::Keyword {
            return None;
        }
        let colon = self.text.find(':')?;
        let (name, rest) = self.text.split_at(colon + 1);
        Some((name, (!rest.is_empty()).then_some(rest)))
    }

    /// Returns the literal content of a string token, without delimiters.
    ///
    /// Double-quoted strings have their backslash escapes resolved.
    /// Unterminated strings yield everything after the opening delimiter.
    #[must_use]
    pub fn string_content(&self) -> Option<EcoString> {
        let text = self.text.as_str();
        match self.kind {
            TokenKind::String => {
                let inner = text.strip_prefix('\'')?;
                Some(inner.strip_suffix('\'').unwrap_or(inner).into())
            }
            TokenKind::TripleString => {
                let inner = text.strip_prefix("'''")?;
                Some(inner.strip_suffix("'''").unwrap_or(inner).into())
            }
            TokenKind::DString => {
                let inner = text.strip_prefix('"')?;
                let inner = inner.strip_suffix('"').unwrap_or(inner);
                Some(unescape_double_quoted(inner))
            }
            _ => None,
        }
    }
}

fn unescape_double_quoted(inner: &str) -> EcoString {
    let mut out = EcoString::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, text, Position::START)
    }

    #[test]
    fn wire_format_uses_short_field_names() {
        let json = serde_json::to_value(tok(TokenKind::DString, "\"x\"")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "DSTRING", "value": "\"x\"", "line": 1, "col": 1})
        );
    }

    #[test]
    fn wire_format_round_trips() {
        let token = Token::new(TokenKind::HashBrace, "#{", Position::new(3, 7));
        let text = serde_json::to_string(&token).unwrap();
        let back: Token = serde_json::from_str(&text).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn serde_names_agree_with_name() {
        for kind in [
            TokenKind::LBracket,
            TokenKind::DRBracket,
            TokenKind::TripleString,
            TokenKind::NamespaceSep,
            TokenKind::BlockParam,
            TokenKind::Ge,
        ] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::from(kind.name()));
        }
    }

    #[test]
    fn keyword_parts_without_default() {
        assert_eq!(
            tok(TokenKind::Keyword, "put:").keyword_parts(),
            Some(("put:", None))
        );
        assert_eq!(tok(TokenKind::Identifier, "put").keyword_parts(), None);
    }

    #[test]
    fn keyword_parts_with_fraction() {
        assert_eq!(
            tok(TokenKind::Keyword, "ratio:0.5").keyword_parts(),
            Some(("ratio:", Some("0.5")))
        );
        assert!(tok(TokenKind::Keyword, "ratio:0.5").is_keyword("ratio:"));
    }

    #[test]
    fn string_content_strips_delimiters() {
        assert_eq!(
            tok(TokenKind::String, "'abc'").string_content().as_deref(),
            Some("abc")
        );
        assert_eq!(
            tok(TokenKind::TripleString, "'''a\n'b'''''")
                .string_content()
                .as_deref(),
            Some("a\n'b''")
        );
        assert_eq!(
            tok(TokenKind::DString, r#""say \"hi\"\n""#)
                .string_content()
                .as_deref(),
            Some("say \"hi\"\n")
        );
    }

    #[test]
    fn unterminated_string_content() {
        assert_eq!(
            tok(TokenKind::String, "'open").string_content().as_deref(),
            Some("open")
        );
    }
}
