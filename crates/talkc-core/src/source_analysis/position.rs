// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Source location tracking.
//!
//! Tokens carry a 1-based line/column pair rather than a byte range. The
//! token wire format exposes exactly these two numbers, and diagnostics are
//! reported against them.

use serde::{Deserialize, Serialize};

/// A 1-based line/column position in source text.
///
/// Columns count characters, not bytes.
///
/// # Examples
///
/// ```
/// use talkc_core::source_analysis::Position;
///
/// let pos = Position::new(2, 5);
/// assert_eq!(pos.line(), 2);
/// assert_eq!(pos.column(), 5);
/// assert_eq!(pos.byte_offset_in("ab\ncdef ghi"), Some(7));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    line: u32,
    #[serde(rename = "col")]
    column: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

impl Position {
    /// The first character of any source.
    pub const START: Self = Self { line: 1, column: 1 };

    /// Creates a new position.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Returns the 1-based line.
    #[must_use]
    pub const fn line(self) -> u32 {
        self.line
    }

    /// Returns the 1-based column.
    #[must_use]
    pub const fn column(self) -> u32 {
        self.column
    }

    /// Converts this position to a byte offset into `source`.
    ///
    /// Returns `None` when the position lies outside the text. A column one
    /// past the end of a line maps to the offset of its line terminator.
    #[must_use]
    pub fn byte_offset_in(self, source: &str) -> Option<usize> {
        let line_index = usize::try_from(self.line.checked_sub(1)?).ok()?;
        let column_index = usize::try_from(self.column.checked_sub(1)?).ok()?;

        let mut line_start = 0;
        for _ in 0..line_index {
            let newline = source.get(line_start..)?.find('\n')?;
            line_start += newline + 1;
        }

        let line_text = source.get(line_start..)?;
        let line_text = line_text.split('\n').next().unwrap_or("");
        let mut chars = line_text.char_indices();
        match chars.nth(column_index) {
            Some((offset, _)) => Some(line_start + offset),
            None if column_index == line_text.chars().count() => {
                Some(line_start + line_text.len())
            }
            None => None,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_of_first_character() {
        assert_eq!(Position::START.byte_offset_in("abc"), Some(0));
    }

    #[test]
    fn offset_on_later_line() {
        let source = "one\ntwo\nthree";
        assert_eq!(Position::new(3, 2).byte_offset_in(source), Some(9));
    }

    #[test]
    fn offset_counts_characters_not_bytes() {
        let source = "é x";
        assert_eq!(Position::new(1, 3).byte_offset_in(source), Some(3));
    }

    #[test]
    fn offset_past_end_of_line() {
        assert_eq!(Position::new(1, 4).byte_offset_in("abc\nd"), Some(3));
        assert_eq!(Position::new(1, 9).byte_offset_in("abc\nd"), None);
        assert_eq!(Position::new(5, 1).byte_offset_in("abc"), None);
    }

    #[test]
    fn zero_is_never_valid() {
        assert_eq!(Position::new(0, 1).byte_offset_in("abc"), None);
        assert_eq!(Position::new(1, 0).byte_offset_in("abc"), None);
    }

    #[test]
    fn display_is_line_colon_column() {
        assert_eq!(Position::new(4, 12).to_string(), "4:12");
    }
}
