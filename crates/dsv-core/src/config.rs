// dsv - Streaming delimiter-separated value parser
//
// Copyright (c) 2025 the dsv contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Parse session configuration.
//!
//! A [`ParseConfig`] is an immutable snapshot created once per parse session.
//! `Auto` delimiter/newline settings are resolved exactly once, by running the
//! detector over the first chunk (or a bounded prefix of a blob); the resolved
//! [`Dialect`] is what the tokenizer actually consumes.

use std::collections::HashMap;
use thiserror::Error;

/// Default candidate delimiters, in tie-break priority order.
pub const DEFAULT_DELIMITERS_TO_GUESS: [char; 4] = [',', '\t', '|', ';'];

/// Field delimiter setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    /// Auto-detect from the first chunk.
    #[default]
    Auto,
    /// A fixed delimiter character.
    Char(char),
}

/// Line-break setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Newline {
    /// Auto-detect from the first chunk.
    #[default]
    Auto,
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
    /// `\r`
    Cr,
}

impl Newline {
    /// The concrete line-break sequence. `Auto` has none.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto | Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }
}

/// Empty-line suppression policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkipEmptyLines {
    /// Keep empty lines (each becomes a row with one empty field).
    #[default]
    None,
    /// Drop rows that are fully empty.
    Empty,
    /// Also drop rows whose fields are all whitespace.
    Greedy,
}

/// Dynamic typing policy.
///
/// Columns are addressed by header name when a header is enabled, or by the
/// decimal string of the zero-based column index otherwise.
#[derive(Debug, Clone, Default)]
pub enum DynamicTyping {
    /// Every field stays a string.
    #[default]
    Off,
    /// Cast every field through the strict literal grammars.
    All,
    /// Per-column opt-in/out; unlisted columns stay strings.
    Columns(HashMap<String, bool>),
}

impl DynamicTyping {
    /// Whether casting applies to the given column.
    pub fn enabled_for(&self, index: usize, name: Option<&str>) -> bool {
        match self {
            Self::Off => false,
            Self::All => true,
            Self::Columns(map) => {
                if let Some(name) = name {
                    if let Some(&enabled) = map.get(name) {
                        return enabled;
                    }
                }
                map.get(&index.to_string()).copied().unwrap_or(false)
            }
        }
    }
}

/// Invalid session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The comment prefix would be tokenized as quoting.
    #[error("comment prefix {0:?} conflicts with the quote character")]
    CommentQuoteClash(String),

    /// The comment prefix would be split by the delimiter.
    #[error("comment prefix {0:?} conflicts with the delimiter {1:?}")]
    CommentDelimiterClash(String, char),

    /// The delimiter collides with quoting or line breaks.
    #[error("invalid delimiter {0:?}")]
    InvalidDelimiter(char),
}

/// Immutable configuration snapshot for one parse session.
///
/// # Examples
///
/// ```
/// use dsv_core::{Delimiter, ParseConfig, SkipEmptyLines};
///
/// let config = ParseConfig::default()
///     .with_delimiter('\t')
///     .with_header(true)
///     .with_skip_empty_lines(SkipEmptyLines::Empty);
/// assert_eq!(config.delimiter, Delimiter::Char('\t'));
/// ```
#[derive(Debug, Clone)]
pub struct ParseConfig {
    /// Field delimiter, or auto-detect.
    pub delimiter: Delimiter,
    /// Line-break sequence, or auto-detect.
    pub newline: Newline,
    /// Quote character. Default `"`.
    pub quote_char: char,
    /// Escape character for quotes inside quoted fields.
    /// `None` means the quote character itself (`""` doubling).
    pub escape_char: Option<char>,
    /// Treat the first row as a header; data rows become keyed records.
    pub header: bool,
    /// Empty-line suppression policy.
    pub skip_empty_lines: SkipEmptyLines,
    /// Dynamic typing policy.
    pub dynamic_typing: DynamicTyping,
    /// Comment line prefix. Lines starting with it are discarded wholesale.
    pub comments: Option<String>,
    /// Maximum number of rows to tokenize (plus one for the header row when
    /// `header` is enabled). `0` = unlimited.
    pub preview: usize,
    /// Candidate delimiters for auto-detection, in tie-break priority order.
    pub delimiters_to_guess: Vec<char>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Auto,
            newline: Newline::Auto,
            quote_char: '"',
            escape_char: None,
            header: false,
            skip_empty_lines: SkipEmptyLines::None,
            dynamic_typing: DynamicTyping::Off,
            comments: None,
            preview: 0,
            delimiters_to_guess: DEFAULT_DELIMITERS_TO_GUESS.to_vec(),
        }
    }
}

impl ParseConfig {
    /// All-default configuration: auto-detect everything, no header, no
    /// typing, no preview cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fixed delimiter.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Delimiter::Char(delimiter);
        self
    }

    /// Set a fixed line-break convention.
    pub fn with_newline(mut self, newline: Newline) -> Self {
        self.newline = newline;
        self
    }

    /// Set the quote character.
    pub fn with_quote_char(mut self, quote: char) -> Self {
        self.quote_char = quote;
        self
    }

    /// Set an escape character distinct from the quote character.
    pub fn with_escape_char(mut self, escape: char) -> Self {
        self.escape_char = Some(escape);
        self
    }

    /// Enable or disable header-row handling.
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Set the empty-line suppression policy.
    pub fn with_skip_empty_lines(mut self, policy: SkipEmptyLines) -> Self {
        self.skip_empty_lines = policy;
        self
    }

    /// Set the dynamic typing policy.
    pub fn with_dynamic_typing(mut self, policy: DynamicTyping) -> Self {
        self.dynamic_typing = policy;
        self
    }

    /// Enable comment-line discarding with the given prefix.
    pub fn with_comments(mut self, prefix: impl Into<String>) -> Self {
        self.comments = Some(prefix.into());
        self
    }

    /// Cap the number of tokenized rows.
    pub fn with_preview(mut self, preview: usize) -> Self {
        self.preview = preview;
        self
    }

    /// Replace the delimiter candidate list used by auto-detection.
    pub fn with_delimiters_to_guess(mut self, candidates: Vec<char>) -> Self {
        self.delimiters_to_guess = candidates;
        self
    }

    /// The effective escape character.
    pub fn escape(&self) -> char {
        self.escape_char.unwrap_or(self.quote_char)
    }

    /// Resolve `Auto` settings against a detection outcome, validating the
    /// combination.
    ///
    /// Detection results never land in shared state: the returned [`Dialect`]
    /// belongs to exactly one session.
    pub fn resolve(&self, delimiter: char, newline: Newline) -> Result<Dialect, ConfigError> {
        let newline = match self.newline {
            Newline::Auto => newline,
            fixed => fixed,
        };
        let delimiter = match self.delimiter {
            Delimiter::Auto => delimiter,
            Delimiter::Char(c) => c,
        };

        if delimiter == self.quote_char || delimiter == '\n' || delimiter == '\r' {
            return Err(ConfigError::InvalidDelimiter(delimiter));
        }
        if let Some(prefix) = &self.comments {
            if prefix.contains(self.quote_char) {
                return Err(ConfigError::CommentQuoteClash(prefix.clone()));
            }
            if prefix.contains(delimiter) {
                return Err(ConfigError::CommentDelimiterClash(prefix.clone(), delimiter));
            }
        }

        Ok(Dialect {
            delimiter,
            newline,
            quote: self.quote_char,
            escape: self.escape(),
            comment: self.comments.clone(),
        })
    }
}

/// Fully resolved tokenizer settings: no `Auto` left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    /// Field delimiter.
    pub delimiter: char,
    /// Resolved line-break convention.
    pub newline: Newline,
    /// Quote character.
    pub quote: char,
    /// Escape character (equal to `quote` for `""` doubling).
    pub escape: char,
    /// Comment line prefix, if any.
    pub comment: Option<String>,
}
