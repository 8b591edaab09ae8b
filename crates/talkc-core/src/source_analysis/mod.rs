// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Tokenizing and parsing talk source code.
//!
//! # Lexical Analysis
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s. Each
//! token carries its raw text and a 1-based [`Position`]. Shell fragments
//! (`$HOME`, `$(cmd)`, `2>&1`, paths) get their own kinds so later stages
//! can recognize and reject them.
//!
//! ```
//! use talkc_core::source_analysis::{Lexer, TokenKind};
//!
//! let tokens: Vec<_> = Lexer::new("x + 1").collect();
//! assert_eq!(tokens.len(), 3);
//! assert_eq!(tokens[1].kind(), TokenKind::Plus);
//! ```
//!
//! # Parsing
//!
//! [`parse_class`] builds the declaration tree for a whole class;
//! [`parse_method_body`] turns one method's token span into statements.
//!
//! # Error Handling
//!
//! The lexer never fails: unknown characters become [`TokenKind::Error`].
//! The declaration parser records errors and keeps going. The body parser
//! answers [`Unsupported`] for anything it cannot compile.

mod lexer;
mod parser;
mod position;
mod token;

#[cfg(test)]
mod lexer_property_tests;

pub use lexer::{Lexer, lex, lex_significant};
pub use parser::{Unsupported, parse_class, parse_method_body, parse_source};
pub use position::Position;
pub use token::{Token, TokenKind};
