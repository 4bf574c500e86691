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

//! Data-level parse errors.
//!
//! Every error in this module is **non-fatal**: it is recorded against a row
//! index and parsing continues. Malformed CSV is the norm in the wild, so the
//! engine is deliberately permissive; the only conditions that stop a stream
//! are I/O failures, consumer hook failures and explicit aborts, all of which
//! live in `dsv-stream`.

use thiserror::Error;

/// Category of a non-fatal parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ErrorKind {
    /// Malformed quoting inside a field.
    #[error("Quotes")]
    Quotes,
    /// The delimiter could not be auto-detected.
    #[error("Delimiter")]
    Delimiter,
    /// A row's field count deviates from the expected column count.
    #[error("FieldMismatch")]
    FieldMismatch,
}

/// A recoverable parse error, recorded against the row it occurred on.
///
/// `code` is a stable machine-readable identifier; `message` is for humans.
/// `row` is the zero-based row index the error is attributed to, or `None`
/// for session-level errors such as failed delimiter detection.
///
/// # Examples
///
/// ```
/// use dsv_core::{ErrorKind, ParseError};
///
/// let err = ParseError::missing_quotes(3);
/// assert_eq!(err.kind, ErrorKind::Quotes);
/// assert_eq!(err.code, "MissingQuotes");
/// assert_eq!(err.row, Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[error("{kind} error: {message}")]
pub struct ParseError {
    /// Error category.
    pub kind: ErrorKind,
    /// Stable error code.
    pub code: &'static str,
    /// Human-readable description.
    pub message: String,
    /// Zero-based row index, when attributable to a row. Errors delivered
    /// through the parsing APIs index data rows (header and skipped rows not
    /// counted); inside the tokenizer the index is the raw row.
    pub row: Option<usize>,
}

impl ParseError {
    /// Quoted field left unterminated at end of input.
    pub fn missing_quotes(row: usize) -> Self {
        Self {
            kind: ErrorKind::Quotes,
            code: "MissingQuotes",
            message: "Quoted field unterminated".to_string(),
            row: Some(row),
        }
    }

    /// Stray character after the closing quote of a quoted field.
    pub fn invalid_quotes(row: usize) -> Self {
        Self {
            kind: ErrorKind::Quotes,
            code: "InvalidQuotes",
            message: "Trailing quote on quoted field is malformed".to_string(),
            row: Some(row),
        }
    }

    /// Auto-detection found no workable delimiter and fell back to a comma.
    pub fn undetectable_delimiter() -> Self {
        Self {
            kind: ErrorKind::Delimiter,
            code: "UndetectableDelimiter",
            message: "Unable to auto-detect delimiting character; defaulted to ','".to_string(),
            row: None,
        }
    }

    /// Row parsed fewer fields than the header defines.
    pub fn too_few_fields(row: usize, expected: usize, got: usize) -> Self {
        Self {
            kind: ErrorKind::FieldMismatch,
            code: "TooFewFields",
            message: format!("Too few fields: expected {expected} fields but parsed {got}"),
            row: Some(row),
        }
    }

    /// Row parsed more fields than the header defines.
    pub fn too_many_fields(row: usize, expected: usize, got: usize) -> Self {
        Self {
            kind: ErrorKind::FieldMismatch,
            code: "TooManyFields",
            message: format!("Too many fields: expected {expected} fields but parsed {got}"),
            row: Some(row),
        }
    }
}
