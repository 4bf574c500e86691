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

//! Row post-processing: the pipeline between raw tokenized fields and
//! delivered [`Row`]s.
//!
//! For each tokenized row the [`RowProcessor`] applies, in order: empty-row
//! skipping, header capture, the per-field transform, dynamic typing, and
//! field-count validation. The processor is stateful across a session — it
//! remembers the captured header and the running data-row index used for
//! error attribution.

use std::collections::HashMap;

use crate::config::{DynamicTyping, ParseConfig, SkipEmptyLines};
use crate::error::ParseError;
use crate::typing;
use crate::value::{Row, Value};

/// User-supplied per-field rewrite, applied before dynamic typing. Receives
/// the raw field text and its zero-based column index.
pub type Transform<'a> = Box<dyn FnMut(&str, usize) -> String + 'a>;

/// Stateful converter from tokenized rows to delivered [`Row`]s.
pub struct RowProcessor<'a> {
    header: bool,
    skip: SkipEmptyLines,
    typing: DynamicTyping,
    transform: Option<Transform<'a>>,
    columns: Option<Vec<String>>,
    data_index: usize,
}

impl<'a> RowProcessor<'a> {
    pub fn new(config: &ParseConfig) -> Self {
        Self {
            header: config.header,
            skip: config.skip_empty_lines,
            typing: config.dynamic_typing.clone(),
            transform: None,
            columns: None,
            data_index: 0,
        }
    }

    pub fn with_transform(config: &ParseConfig, transform: Transform<'a>) -> Self {
        Self {
            transform: Some(transform),
            ..Self::new(config)
        }
    }

    /// Captured header names, once the header row has been seen.
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    /// Data rows produced so far (header and skipped rows excluded).
    pub fn data_rows(&self) -> usize {
        self.data_index
    }

    /// Process one tokenized row. Returns `None` when the row is consumed
    /// without producing data (an empty row being skipped, or the header row
    /// being captured). Field-count mismatches are reported through `errors`
    /// but still produce the row.
    pub fn process(&mut self, fields: Vec<String>, errors: &mut Vec<ParseError>) -> Option<Row> {
        if is_empty_row(&fields, self.skip) {
            return None;
        }
        if self.header && self.columns.is_none() {
            self.columns = Some(dedup_headers(fields));
            return None;
        }

        let mut values = Vec::with_capacity(fields.len());
        for (idx, raw) in fields.into_iter().enumerate() {
            let text = match &mut self.transform {
                Some(f) => f(&raw, idx),
                None => raw,
            };
            let name = self
                .columns
                .as_ref()
                .and_then(|cols| cols.get(idx))
                .map(String::as_str);
            let value = if self.typing.enabled_for(idx, name) {
                typing::cast(&text)
            } else {
                Value::String(text)
            };
            values.push(value);
        }

        let row = match &self.columns {
            Some(cols) => {
                if values.len() < cols.len() {
                    errors.push(ParseError::too_few_fields(
                        self.data_index,
                        cols.len(),
                        values.len(),
                    ));
                } else if values.len() > cols.len() {
                    errors.push(ParseError::too_many_fields(
                        self.data_index,
                        cols.len(),
                        values.len(),
                    ));
                }
                let pairs = values
                    .into_iter()
                    .enumerate()
                    // Extra fields beyond the header get their column index
                    // as the key.
                    .map(|(idx, value)| {
                        let key = cols.get(idx).cloned().unwrap_or_else(|| idx.to_string());
                        (key, value)
                    })
                    .collect();
                Row::Record(pairs)
            }
            None => Row::Fields(values),
        };
        self.data_index += 1;
        Some(row)
    }

    /// Like [`process`](Self::process), but also re-attributes tokenizer
    /// errors. The tokenizer indexes errors by raw row (header and skipped
    /// rows included); delivered errors index by data row, so a quote error
    /// and a field-count mismatch on the same physical row agree. Errors in
    /// `tokenizer_errors` whose row matches `raw_row` are moved into `errors`
    /// with the row rewritten to the current data-row index. Errors on the
    /// header or a skipped row take the index of the data row that follows.
    pub fn process_indexed(
        &mut self,
        fields: Vec<String>,
        raw_row: usize,
        tokenizer_errors: &mut Vec<ParseError>,
        errors: &mut Vec<ParseError>,
    ) -> Option<Row> {
        let data_row = self.data_index;
        let mut i = 0;
        while i < tokenizer_errors.len() {
            if tokenizer_errors[i].row == Some(raw_row) {
                let mut err = tokenizer_errors.remove(i);
                err.row = Some(data_row);
                errors.push(err);
            } else {
                i += 1;
            }
        }
        self.process(fields, errors)
    }
}

/// Empty-row test under the configured policy. `None` keeps everything,
/// `Empty` drops rows that are a single empty field, `Greedy` also drops
/// rows whose every field is blank or whitespace.
pub(crate) fn is_empty_row(fields: &[String], policy: SkipEmptyLines) -> bool {
    match policy {
        SkipEmptyLines::None => false,
        SkipEmptyLines::Empty => {
            fields.is_empty() || (fields.len() == 1 && fields[0].is_empty())
        }
        SkipEmptyLines::Greedy => fields.iter().all(|f| f.trim().is_empty()),
    }
}

/// Make header names unique: the second occurrence of `name` becomes
/// `name_1`, the third `name_2`, and so on.
fn dedup_headers(fields: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(fields.len());
    let mut out = Vec::with_capacity(fields.len());
    for name in fields {
        match seen.get_mut(&name) {
            None => {
                seen.insert(name.clone(), 0);
                out.push(name);
            }
            Some(count) => {
                *count += 1;
                out.push(format!("{}_{}", name, count));
            }
        }
    }
    out
}
