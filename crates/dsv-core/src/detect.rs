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

//! Dialect detection: guessing the line-break sequence and the delimiter
//! from a bounded sample of the input.
//!
//! Detection runs once per session, on the first chunk, before any rows are
//! tokenized. Both guesses are heuristics and both are overridden by an
//! explicit [`Newline`](crate::Newline) or [`Delimiter`](crate::Delimiter)
//! setting in the configuration.

use crate::config::{Delimiter, Dialect, Newline, ParseConfig};
use crate::error::ParseError;
use crate::process::is_empty_row;
use crate::tokenizer::{tokenize, TokenizerState};

/// Rows of the sample each delimiter candidate is scored over.
const DETECT_ROWS: usize = 10;

/// Outcome of dialect detection over a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Delimiter to use: the configured one, the best-scoring guess, or the
    /// `,` fallback.
    pub delimiter: char,
    /// Line-break sequence to use.
    pub newline: Newline,
    /// Set when no delimiter candidate scored and the `,` fallback was taken.
    pub error: Option<ParseError>,
}

/// Detect the dialect of `sample` under `config`.
///
/// The sample should be a bounded prefix of the input (the blob API caps it,
/// the streaming driver passes the first chunk). Detection never fails: an
/// undetectable delimiter falls back to `,` and surfaces as a non-fatal
/// [`ParseError`] in `error`.
///
/// # Examples
///
/// ```
/// use dsv_core::{detect, Newline, ParseConfig};
///
/// let detection = detect("a;b;c\n1;2;3", &ParseConfig::new());
/// assert_eq!(detection.delimiter, ';');
/// assert_eq!(detection.newline, Newline::Lf);
/// assert!(detection.error.is_none());
/// ```
pub fn detect(sample: &str, config: &ParseConfig) -> Detection {
    let newline = match config.newline {
        Newline::Auto => guess_newline(sample, config.quote_char),
        explicit => explicit,
    };
    let (delimiter, error) = match config.delimiter {
        Delimiter::Char(c) => (c, None),
        Delimiter::Auto => guess_delimiter(sample, newline, config),
    };
    Detection {
        delimiter,
        newline,
        error,
    }
}

/// Guess the line-break sequence by counting non-empty lines outside quoted
/// sections. Candidates are tried in priority order `\r\n`, `\n`, `\r`; ties
/// go to the higher-priority sequence. A sample with no line breaks at all
/// defaults to `\n`.
fn guess_newline(sample: &str, quote: char) -> Newline {
    // Splitting on the quote char leaves the even-indexed pieces outside
    // quotes; line breaks inside quoted fields must not vote.
    let outside: String = sample
        .split(quote)
        .enumerate()
        .filter(|(i, _)| i % 2 == 0)
        .map(|(_, piece)| piece)
        .collect();
    if !outside.contains('\r') && !outside.contains('\n') {
        return Newline::Lf;
    }
    let mut best = Newline::Lf;
    let mut best_score = 0usize;
    for cand in [Newline::CrLf, Newline::Lf, Newline::Cr] {
        let score = outside
            .split(cand.as_str())
            .filter(|line| !line.trim().is_empty())
            .count();
        if score > best_score {
            best = cand;
            best_score = score;
        }
    }
    best
}

/// Score each delimiter candidate by tokenizing up to [`DETECT_ROWS`] sample
/// rows with it: a candidate qualifies when its mean field count exceeds one,
/// and the qualifying candidate with the lowest field-count variance wins.
/// Earlier candidates win ties, so the order of
/// [`delimiters_to_guess`](ParseConfig::delimiters_to_guess) is a preference
/// ranking.
fn guess_delimiter(
    sample: &str,
    newline: Newline,
    config: &ParseConfig,
) -> (char, Option<ParseError>) {
    let mut best: Option<(char, f64)> = None;
    for &cand in &config.delimiters_to_guess {
        if cand == config.quote_char || cand == '\n' || cand == '\r' {
            continue;
        }
        let dialect = Dialect {
            delimiter: cand,
            newline,
            quote: config.quote_char,
            escape: config.escape(),
            comment: config.comments.clone(),
        };
        let mut state = TokenizerState::new();
        let run = tokenize(sample, &mut state, &dialect, true, DETECT_ROWS);
        let counts: Vec<usize> = run
            .rows
            .iter()
            .filter(|row| !is_empty_row(row, config.skip_empty_lines))
            .map(|row| row.len())
            .collect();
        if counts.is_empty() {
            continue;
        }
        let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        if mean <= 1.0 {
            continue;
        }
        let variance = counts
            .iter()
            .map(|&c| {
                let d = c as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / counts.len() as f64;
        match best {
            Some((_, v)) if variance >= v => {}
            _ => best = Some((cand, variance)),
        }
    }
    match best {
        Some((c, _)) => (c, None),
        None => (',', Some(ParseError::undetectable_delimiter())),
    }
}
