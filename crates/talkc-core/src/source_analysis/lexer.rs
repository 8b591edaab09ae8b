// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for talk source code.
//!
//! This module converts source text into a flat stream of [`Token`]s in a
//! single left-to-right pass. Most decisions use one character of
//! lookahead; triple quotes, `<<<` and `$((` need two.
//!
//! # Design Principles
//!
//! - **Never fail**: unknown characters become [`TokenKind::Error`] and
//!   unterminated strings still produce a string token
//! - **Exact positions**: every newline emits a [`TokenKind::Newline`] and
//!   resets the column, so positions are always correct for diagnostics
//! - **Scan-time merging only**: `[[`, `]]`, `&&`, `::` and friends are merged
//!   while scanning; nothing is re-typed afterwards
//!
//! # Example
//!
//! ```
//! use talkc_core::source_analysis::{Lexer, TokenKind};
//!
//! let kinds: Vec<_> = Lexer::new("value := value + 1").map(|t| t.kind()).collect();
//! assert_eq!(
//!     kinds,
//!     vec![
//!         TokenKind::Identifier,
//!         TokenKind::Assign,
//!         TokenKind::Identifier,
//!         TokenKind::Plus,
//!         TokenKind::Number,
//!     ]
//! );
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use tracing::debug;

use super::{Position, Token, TokenKind};

/// A lexer that tokenizes talk source code.
///
/// Whitespace other than newlines is consumed without producing a token.
/// Every other character ends up in exactly one token.
pub struct Lexer<'src> {
    /// The source text being lexed.
    source: &'src str,
    /// Character iterator with byte positions.
    chars: Peekable<CharIndices<'src>>,
    /// Current byte position in source.
    position: usize,
    /// Line of the next character.
    line: u32,
    /// Column of the next character.
    column: u32,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("line", &self.line)
            .field("column", &self.column)
            .field("remaining", &self.source.get(self.position..).unwrap_or(""))
            .finish()
    }
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source text.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Peeks `n+1` characters ahead without consuming (n=0 is same as `peek_char`).
    fn peek_char_n(&self, n: usize) -> Option<char> {
        let mut iter = self.chars.clone();
        for _ in 0..n {
            iter.next();
        }
        iter.next().map(|(_, c)| c)
    }

    /// Consumes the next character and returns it, tracking line and column.
    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.position = pos + c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consumes `n` characters.
    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    /// Consumes characters while the predicate is true.
    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    fn skip_blanks(&mut self) {
        self.advance_while(|c| matches!(c, ' ' | '\t' | '\r'));
    }

    /// Lexes the next token, or returns `None` at end of input.
    fn lex_token(&mut self) -> Option<Token> {
        self.skip_blanks();
        let c = self.peek_char()?;

        let start_offset = self.position;
        let start = Position::new(self.line, self.column);
        let kind = self.lex_token_kind(c);
        let text = &self.source[start_offset..self.position];
        Some(Token::new(kind, text, start))
    }

    /// Lexes a token kind based on the first character.
    fn lex_token_kind(&mut self, c: char) -> TokenKind {
        match c {
            '\n' => self.single(TokenKind::Newline),

            // Identifiers and keywords
            'a'..='z' | 'A'..='Z' | '_' => self.lex_identifier_or_keyword(),

            // `2>` is a redirect only when the digit starts the token
            '1' | '2' if self.peek_char_n(1) == Some('>') => self.lex_fd_redirect(),
            '0'..='9' => self.lex_number(),

            // Strings
            '\'' if self.peek_char_n(1) == Some('\'') && self.peek_char_n(2) == Some('\'') => {
                self.lex_triple_string()
            }
            '\'' => self.lex_single_string(),
            '"' => self.lex_double_string(),

            // Shell expansions
            '$' => self.lex_dollar(),

            // Comments and literal openers
            '#' => match self.peek_char_n(1) {
                Some('(') => self.pair(TokenKind::HashParen),
                Some('{') => self.pair(TokenKind::HashBrace),
                _ => {
                    self.advance_while(|c| c != '\n');
                    TokenKind::Comment
                }
            },

            // Brackets
            '[' if self.peek_char_n(1) == Some('[') => self.pair(TokenKind::DLBracket),
            '[' => self.single(TokenKind::LBracket),
            ']' if self.peek_char_n(1) == Some(']') => self.pair(TokenKind::DRBracket),
            ']' => self.single(TokenKind::RBracket),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),

            ':' => self.lex_colon(),

            '^' => self.single(TokenKind::Caret),
            '@' => self.single(TokenKind::At),
            ';' => self.single(TokenKind::Semicolon),
            ',' => self.single(TokenKind::Comma),
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '*' => self.single(TokenKind::Star),
            '%' => self.single(TokenKind::Percent),

            // Paths
            '.' if self.peek_char_n(1) == Some('/') => self.lex_path(),
            '.' if self.peek_char_n(1) == Some('.') && self.peek_char_n(2) == Some('/') => {
                self.lex_path()
            }
            '.' => self.single(TokenKind::Dot),
            '~' if self.peek_char_n(1) == Some('/') => self.lex_path(),
            '/' if self.peek_char_n(1).is_some_and(is_path_char) => self.lex_path(),
            '/' => self.single(TokenKind::Slash),

            // Operators with merged forms
            '|' if self.peek_char_n(1) == Some('|') => self.pair(TokenKind::Or),
            '|' => self.single(TokenKind::Pipe),
            '&' if self.peek_char_n(1) == Some('&') => self.pair(TokenKind::And),
            '&' if self.peek_char_n(1) == Some('>') => self.pair(TokenKind::Redirect),
            '&' => self.single(TokenKind::Amp),
            '>' if self.peek_char_n(1) == Some('>') => self.pair(TokenKind::Redirect),
            '>' if self.peek_char_n(1) == Some('=') => self.pair(TokenKind::Ge),
            '>' => self.single(TokenKind::Gt),
            '<' if self.peek_char_n(1) == Some('<') && self.peek_char_n(2) == Some('<') => {
                self.advance_n(3);
                TokenKind::Redirect
            }
            '<' if self.peek_char_n(1) == Some('<') => self.pair(TokenKind::Redirect),
            '<' if self.peek_char_n(1) == Some('=') => self.pair(TokenKind::Le),
            '<' => self.single(TokenKind::Lt),
            '=' if self.peek_char_n(1) == Some('=') => self.pair(TokenKind::Eq),
            '=' => self.single(TokenKind::Equals),
            '!' if self.peek_char_n(1) == Some('=') => self.pair(TokenKind::Ne),
            '!' => self.single(TokenKind::Bang),

            // Unknown character - error recovery
            _ => self.single(TokenKind::Error),
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn pair(&mut self, kind: TokenKind) -> TokenKind {
        self.advance_n(2);
        kind
    }

    /// Lexes an identifier or keyword.
    ///
    /// A keyword is an identifier immediately followed by a `:` that does not
    /// start `:=` or `::`. A digit run right after the colon is fused into the
    /// keyword token (`count:0`, `ratio:0.5`).
    fn lex_identifier_or_keyword(&mut self) -> TokenKind {
        self.advance_while(is_identifier_char);

        if self.peek_char() != Some(':') || matches!(self.peek_char_n(1), Some('=' | ':')) {
            return TokenKind::Identifier;
        }

        self.advance(); // consume the colon
        if self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance_while(|c| c.is_ascii_digit());
            if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
            {
                self.advance();
                self.advance_while(|c| c.is_ascii_digit());
            }
        }
        TokenKind::Keyword
    }

    /// Lexes an integer or decimal literal.
    fn lex_number(&mut self) -> TokenKind {
        self.advance_while(|c| c.is_ascii_digit());
        if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // consume '.'
            self.advance_while(|c| c.is_ascii_digit());
        }
        TokenKind::Number
    }

    /// Lexes `2>`, `2>>` and `2>&1` style redirects.
    fn lex_fd_redirect(&mut self) -> TokenKind {
        self.advance_n(2);
        if self.peek_char() == Some('>') {
            self.advance();
        } else if self.peek_char() == Some('&') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance_n(2);
        }
        TokenKind::Redirect
    }

    /// Lexes a single-quoted string. There are no escapes; the string stops at
    /// the next `'` or runs to end of input.
    fn lex_single_string(&mut self) -> TokenKind {
        self.advance(); // opening quote
        self.advance_while(|c| c != '\'');
        self.advance(); // closing quote, if any
        TokenKind::String
    }

    /// Lexes a triple-quoted string. It ends at the first run of exactly
    /// three `'`; shorter or longer runs are content.
    fn lex_triple_string(&mut self) -> TokenKind {
        self.advance_n(3);
        while let Some(c) = self.peek_char() {
            if c != '\'' {
                self.advance();
                continue;
            }
            let mut run = 0;
            while self.peek_char() == Some('\'') {
                self.advance();
                run += 1;
            }
            if run == 3 {
                break;
            }
        }
        TokenKind::TripleString
    }

    /// Lexes a double-quoted string.
    ///
    /// Backslash escapes the next character. A `$(` inside the string opens a
    /// subshell, and quotes inside an open subshell do not end the string.
    fn lex_double_string(&mut self) -> TokenKind {
        self.advance(); // opening quote
        let mut depth = 0usize;
        while let Some(c) = self.peek_char() {
            match c {
                '\\' => {
                    self.advance();
                    self.advance();
                }
                '$' if self.peek_char_n(1) == Some('(') => {
                    self.advance_n(2);
                    depth += 1;
                }
                '(' if depth > 0 => {
                    self.advance();
                    depth += 1;
                }
                ')' if depth > 0 => {
                    self.advance();
                    depth -= 1;
                }
                '"' if depth == 0 => {
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
        TokenKind::DString
    }

    /// Lexes a `$` expansion: arithmetic, subshell, braced or plain variable.
    fn lex_dollar(&mut self) -> TokenKind {
        match (self.peek_char_n(1), self.peek_char_n(2)) {
            (Some('('), Some('(')) => {
                self.advance_n(3);
                self.skip_balanced_parens(2);
                TokenKind::Arithmetic
            }
            (Some('('), _) => {
                self.advance_n(2);
                self.skip_balanced_parens(1);
                TokenKind::Subshell
            }
            (Some('{'), _) => {
                self.advance_n(2);
                self.advance_while(|c| c != '}' && c != '\n');
                if self.peek_char() == Some('}') {
                    self.advance();
                }
                TokenKind::Variable
            }
            (Some(c), _) if c.is_ascii_alphabetic() || c == '_' => {
                self.advance();
                self.advance_while(is_identifier_char);
                TokenKind::Variable
            }
            (Some(c), _) if c.is_ascii_digit() || matches!(c, '@' | '?' | '#' | '$' | '!' | '*' | '-') => {
                self.advance_n(2);
                TokenKind::Variable
            }
            _ => self.single(TokenKind::Variable),
        }
    }

    /// Consumes up to the point where `depth` open parentheses are closed.
    fn skip_balanced_parens(&mut self, mut depth: usize) {
        while depth > 0 {
            match self.advance() {
                Some('(') => depth += 1,
                Some(')') => depth -= 1,
                Some(_) => {}
                None => break,
            }
        }
    }

    /// Lexes `:=`, `::`, `:name` and a bare `:`.
    fn lex_colon(&mut self) -> TokenKind {
        match self.peek_char_n(1) {
            Some('=') => self.pair(TokenKind::Assign),
            Some(':') => self.pair(TokenKind::NamespaceSep),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                self.advance();
                self.advance_while(is_identifier_char);
                TokenKind::BlockParam
            }
            _ => self.single(TokenKind::Colon),
        }
    }

    /// Lexes a filesystem path starting at `/`, `./`, `../` or `~/`.
    fn lex_path(&mut self) -> TokenKind {
        self.advance();
        self.advance_while(|c| is_path_char(c) || c == '/');
        TokenKind::Path
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '~')
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.lex_token()?;
        if token.kind() == TokenKind::Error {
            debug!(
                text = token.text(),
                line = token.line(),
                col = token.column(),
                "unrecognized character"
            );
        }
        Some(token)
    }
}

/// Tokenizes source text into the complete ordered token list, including
/// `NEWLINE` and `COMMENT` tokens.
#[must_use]
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}

/// Tokenizes source text, dropping `NEWLINE` and `COMMENT` tokens.
#[must_use]
pub fn lex_significant(source: &str) -> Vec<Token> {
    Lexer::new(source)
        .filter(|token| !token.kind().is_trivia())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to lex and extract just the token kinds.
    fn lex_kinds(source: &str) -> Vec<TokenKind> {
        lex(source).iter().map(Token::kind).collect()
    }

    fn lex_texts(source: &str) -> Vec<String> {
        lex(source).iter().map(|t| t.text().to_string()).collect()
    }

    #[test]
    fn lex_empty() {
        assert!(lex("").is_empty());
        assert!(lex("  \t ").is_empty());
    }

    #[test]
    fn lex_identifiers_and_keywords() {
        assert_eq!(
            lex_kinds("foo Bar _throw at: put:"),
            vec![
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Keyword,
                TokenKind::Keyword,
            ]
        );
    }

    #[test]
    fn keyword_fuses_digit_run() {
        assert_eq!(lex_texts("count:0 ratio:0.5 at:"), vec!["count:0", "ratio:0.5", "at:"]);
        assert_eq!(lex_kinds("count:0"), vec![TokenKind::Keyword]);
    }

    #[test]
    fn keyword_does_not_fuse_identifier() {
        assert_eq!(
            lex_kinds("count:total"),
            vec![TokenKind::Keyword, TokenKind::Identifier]
        );
    }

    #[test]
    fn assign_and_namespace_are_not_keywords() {
        assert_eq!(
            lex_kinds("x := Pkg::Base"),
            vec![
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Identifier,
                TokenKind::NamespaceSep,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn block_params_and_colon() {
        assert_eq!(
            lex_kinds("[:each | each] :"),
            vec![
                TokenKind::LBracket,
                TokenKind::BlockParam,
                TokenKind::Pipe,
                TokenKind::Identifier,
                TokenKind::RBracket,
                TokenKind::Colon,
            ]
        );
        assert_eq!(lex_texts(":each"), vec![":each"]);
    }

    #[test]
    fn numbers() {
        assert_eq!(lex_texts("42 3.5 7."), vec!["42", "3.5", "7", "."]);
    }

    #[test]
    fn minus_before_digit_is_an_operator() {
        assert_eq!(lex_kinds("-5"), vec![TokenKind::Minus, TokenKind::Number]);
    }

    #[test]
    fn single_quoted_strings() {
        assert_eq!(lex_texts("'it''s'"), vec!["'it'", "'s'"]);
        assert_eq!(lex_kinds("'abc'"), vec![TokenKind::String]);
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        let tokens = lex("x := 'open\nmore");
        let last = tokens.last().unwrap();
        assert_eq!(last.kind(), TokenKind::String);
        assert_eq!(last.text(), "'open\nmore");
        assert_eq!(last.line(), 1);
        assert_eq!(last.column(), 6);
    }

    #[test]
    fn triple_string_allows_quote_pairs() {
        let tokens = lex("'''it''s \"fine\"''' x");
        assert_eq!(tokens[0].kind(), TokenKind::TripleString);
        assert_eq!(tokens[0].text(), "'''it''s \"fine\"'''");
        assert_eq!(tokens[1].kind(), TokenKind::Identifier);
    }

    #[test]
    fn triple_string_spans_lines() {
        let tokens = lex("'''a\nb''' c");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].line(), 2);
        assert_eq!(tokens[1].column(), 6);
    }

    #[test]
    fn double_string_with_escape() {
        assert_eq!(lex_texts(r#""a \" b" c"#), vec![r#""a \" b""#, "c"]);
    }

    #[test]
    fn double_string_tracks_subshell_depth() {
        let tokens = lex(r#""a $(b "c") d" e"#);
        assert_eq!(tokens[0].kind(), TokenKind::DString);
        assert_eq!(tokens[0].text(), r#""a $(b "c") d""#);
        assert_eq!(tokens[1].text(), "e");
    }

    #[test]
    fn dollar_forms() {
        assert_eq!(
            lex_kinds("$x ${y} $1 $@ $(ls) $((1 + 2))"),
            vec![
                TokenKind::Variable,
                TokenKind::Variable,
                TokenKind::Variable,
                TokenKind::Variable,
                TokenKind::Subshell,
                TokenKind::Arithmetic,
            ]
        );
        assert_eq!(lex_texts("$(a (b) c)"), vec!["$(a (b) c)"]);
        assert_eq!(lex_texts("$((1 + (2)))"), vec!["$((1 + (2)))"]);
    }

    #[test]
    fn doubled_brackets_merge() {
        assert_eq!(
            lex_kinds("[[ ]] [ ]"),
            vec![
                TokenKind::DLBracket,
                TokenKind::DRBracket,
                TokenKind::LBracket,
                TokenKind::RBracket,
            ]
        );
    }

    #[test]
    fn hash_openers_and_comments() {
        assert_eq!(
            lex_kinds("#( #{ # a note\nx"),
            vec![
                TokenKind::HashParen,
                TokenKind::HashBrace,
                TokenKind::Comment,
                TokenKind::Newline,
                TokenKind::Identifier,
            ]
        );
        assert_eq!(lex_texts("# a note"), vec!["# a note"]);
    }

    #[test]
    fn redirects() {
        assert_eq!(
            lex_kinds(">> << <<< &> 2> > <"),
            vec![
                TokenKind::Redirect,
                TokenKind::Redirect,
                TokenKind::Redirect,
                TokenKind::Redirect,
                TokenKind::Redirect,
                TokenKind::Gt,
                TokenKind::Lt,
            ]
        );
    }

    #[test]
    fn two_inside_number_is_not_redirect() {
        assert_eq!(
            lex_kinds("12> 3"),
            vec![TokenKind::Number, TokenKind::Gt, TokenKind::Number]
        );
    }

    #[test]
    fn paths() {
        assert_eq!(
            lex_texts("/usr/bin ./run ../up ~/home a / b"),
            vec!["/usr/bin", "./run", "../up", "~/home", "a", "/", "b"]
        );
        assert_eq!(lex_kinds("./run"), vec![TokenKind::Path]);
    }

    #[test]
    fn comparison_and_logic_operators() {
        assert_eq!(
            lex_kinds(">= <= == != = && || & !"),
            vec![
                TokenKind::Ge,
                TokenKind::Le,
                TokenKind::Eq,
                TokenKind::Ne,
                TokenKind::Equals,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Amp,
                TokenKind::Bang,
            ]
        );
    }

    #[test]
    fn unknown_character_is_error_token() {
        let tokens = lex("a ` b");
        assert_eq!(tokens[1].kind(), TokenKind::Error);
        assert_eq!(tokens[1].text(), "`");
        assert_eq!(tokens[2].kind(), TokenKind::Identifier);
    }

    #[test]
    fn newline_resets_column() {
        let tokens = lex("ab cd\n  ef");
        assert_eq!(tokens[0].position(), Position::new(1, 1));
        assert_eq!(tokens[1].position(), Position::new(1, 4));
        assert_eq!(tokens[2].kind(), TokenKind::Newline);
        assert_eq!(tokens[2].position(), Position::new(1, 6));
        assert_eq!(tokens[3].position(), Position::new(2, 3));
    }

    #[test]
    fn significant_drops_trivia() {
        assert_eq!(
            lex_significant("a # c\nb")
                .iter()
                .map(Token::kind)
                .collect::<Vec<_>>(),
            vec![TokenKind::Identifier, TokenKind::Identifier]
        );
    }
}
