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

//! Whole-input parsing: the one-shot API over in-memory text.

use crate::aggregate::{Aggregator, ParseResult};
use crate::config::{ConfigError, ParseConfig};
use crate::detect::detect;
use crate::process::{RowProcessor, Transform};
use crate::tokenizer::{tokenize, TokenizerState};

/// Bytes of input the dialect detector samples.
const DETECT_SAMPLE_BYTES: usize = 4096;

/// Parse a complete in-memory input in one call.
///
/// Dialect detection runs over a bounded prefix; the only failure mode is an
/// invalid configuration (malformed input is reported through
/// [`ParseResult::errors`], never as an `Err`).
///
/// # Examples
///
/// ```
/// use dsv_core::{parse, ParseConfig, Value};
///
/// let result = parse("name,age\nida,35\n", &ParseConfig::new().with_header(true))?;
/// assert_eq!(result.data.len(), 1);
/// assert_eq!(result.data[0].get_field("age"), Some(&Value::String("35".into())));
/// assert_eq!(result.meta.delimiter, ',');
/// # Ok::<(), dsv_core::ConfigError>(())
/// ```
pub fn parse(input: &str, config: &ParseConfig) -> Result<ParseResult, ConfigError> {
    parse_inner(input, config, None)
}

/// [`parse`] with a per-field transform applied before dynamic typing.
///
/// # Examples
///
/// ```
/// use dsv_core::{parse_with_transform, ParseConfig, Value};
///
/// let result = parse_with_transform(
///     " a , b \n",
///     &ParseConfig::new(),
///     Box::new(|field, _| field.trim().to_string()),
/// )?;
/// assert_eq!(result.data[0].get(0), Some(&Value::String("a".into())));
/// # Ok::<(), dsv_core::ConfigError>(())
/// ```
pub fn parse_with_transform(
    input: &str,
    config: &ParseConfig,
    transform: Transform<'_>,
) -> Result<ParseResult, ConfigError> {
    parse_inner(input, config, Some(transform))
}

fn parse_inner(
    input: &str,
    config: &ParseConfig,
    transform: Option<Transform<'_>>,
) -> Result<ParseResult, ConfigError> {
    let detection = detect(sample(input), config);
    let dialect = config.resolve(detection.delimiter, detection.newline)?;

    let mut aggregator = Aggregator::new(true, true);
    aggregator.set_dialect(dialect.delimiter, dialect.newline);
    if let Some(error) = detection.error {
        aggregator.push_error(error);
    }

    // The header row spends one tokenizer row without producing data, so the
    // preview cap covers it on top of the requested data rows.
    let budget = if config.preview > 0 {
        config.preview + usize::from(config.header)
    } else {
        0
    };

    let mut state = TokenizerState::new();
    let run = tokenize(input, &mut state, &dialect, true, budget);
    if run.consumed < input.len() {
        aggregator.mark_truncated();
    }
    let mut processor = match transform {
        Some(t) => RowProcessor::with_transform(config, t),
        None => RowProcessor::new(config),
    };
    let mut errors = Vec::new();
    // Fresh tokenizer state, so raw row indices start at zero here.
    let mut tokenizer_errors = run.errors;
    for (raw_row, fields) in run.rows.into_iter().enumerate() {
        if let Some(row) =
            processor.process_indexed(fields, raw_row, &mut tokenizer_errors, &mut errors)
        {
            aggregator.push_row(row);
        }
    }
    errors.extend(tokenizer_errors);
    aggregator.extend_errors(errors);
    aggregator.set_cursor(state.cursor);
    Ok(aggregator.finish())
}

/// Detection prefix: up to [`DETECT_SAMPLE_BYTES`], cut at a char boundary.
fn sample(input: &str) -> &str {
    let mut end = input.len().min(DETECT_SAMPLE_BYTES);
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    &input[..end]
}
