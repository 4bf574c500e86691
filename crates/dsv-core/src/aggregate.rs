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

//! Result accumulation: [`Meta`], [`ParseResult`], and the [`Aggregator`]
//! that builds them over the course of a session.

use crate::config::Newline;
use crate::error::ParseError;
use crate::value::Row;

/// Facts about how a parse went, independent of the data itself.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Meta {
    /// Delimiter actually used (configured or detected).
    pub delimiter: char,
    /// Line-break sequence actually used.
    pub linebreak: Newline,
    /// True when the session was aborted before the input ended.
    pub aborted: bool,
    /// True when a preview cap stopped the parse before the input ended.
    pub truncated: bool,
    /// Absolute input offset consumed so far, in bytes.
    pub cursor: usize,
}

impl Meta {
    pub fn new(delimiter: char, linebreak: Newline) -> Self {
        Self {
            delimiter,
            linebreak,
            aborted: false,
            truncated: false,
            cursor: 0,
        }
    }
}

impl Default for Meta {
    fn default() -> Self {
        Self::new(',', Newline::Lf)
    }
}

/// Everything a completed parse produced.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParseResult {
    /// Delivered rows, in input order.
    pub data: Vec<Row>,
    /// Non-fatal errors, in the order they were found.
    pub errors: Vec<ParseError>,
    /// Session metadata.
    pub meta: Meta,
}

/// Builds a [`ParseResult`] incrementally.
///
/// Collection of data and errors can each be switched off: a streaming
/// session with a per-row hook does not retain rows, and one with a step
/// hook hands errors to the hook instead of retaining them. Metadata is
/// always maintained.
#[derive(Debug)]
pub struct Aggregator {
    data: Vec<Row>,
    errors: Vec<ParseError>,
    meta: Meta,
    collect_data: bool,
    collect_errors: bool,
}

impl Aggregator {
    pub fn new(collect_data: bool, collect_errors: bool) -> Self {
        Self {
            data: Vec::new(),
            errors: Vec::new(),
            meta: Meta::default(),
            collect_data,
            collect_errors,
        }
    }

    /// Record the dialect the session settled on.
    pub fn set_dialect(&mut self, delimiter: char, linebreak: Newline) {
        self.meta.delimiter = delimiter;
        self.meta.linebreak = linebreak;
    }

    pub fn push_row(&mut self, row: Row) {
        if self.collect_data {
            self.data.push(row);
        }
    }

    pub fn push_error(&mut self, error: ParseError) {
        if self.collect_errors {
            self.errors.push(error);
        }
    }

    pub fn extend_errors<I: IntoIterator<Item = ParseError>>(&mut self, errors: I) {
        if self.collect_errors {
            self.errors.extend(errors);
        }
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.meta.cursor = cursor;
    }

    pub fn mark_aborted(&mut self) {
        self.meta.aborted = true;
    }

    pub fn mark_truncated(&mut self) {
        self.meta.truncated = true;
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Snapshot of the metadata as it stands mid-session.
    pub fn snapshot_meta(&self) -> Meta {
        self.meta.clone()
    }

    pub fn finish(self) -> ParseResult {
        ParseResult {
            data: self.data,
            errors: self.errors,
            meta: self.meta,
        }
    }
}
