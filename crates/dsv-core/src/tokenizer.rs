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

//! The row/field tokenizer: a resumable state machine over text buffers.
//!
//! [`tokenize`] is a pure function of `(buffer, starting state)`: it performs
//! no I/O and retains no reference to the buffer. Between calls the state is
//! always **row-aligned** — an incomplete trailing row is rewound, its bytes
//! left unconsumed, so the caller can carry `&buffer[consumed..]` into the
//! next chunk and retokenize it from a cold start. That rewind is what makes
//! the output independent of where chunk boundaries fall, including splits
//! inside quoted fields, inside `\r\n`, and inside comment lines.
//!
//! # Examples
//!
//! ```
//! use dsv_core::{tokenize, Dialect, Newline, TokenizerState};
//!
//! let dialect = Dialect {
//!     delimiter: ',',
//!     newline: Newline::Lf,
//!     quote: '"',
//!     escape: '"',
//!     comment: None,
//! };
//! let mut state = TokenizerState::new();
//! let run = tokenize("a,\"b,c\"\nd", &mut state, &dialect, true, 0);
//! assert_eq!(run.rows, vec![vec!["a", "b,c"], vec!["d"]]);
//! assert!(run.errors.is_empty());
//! ```

use crate::config::Dialect;
use crate::error::ParseError;

/// Tag of the state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Before the first character of a field.
    #[default]
    FieldStart,
    /// Accumulating an unquoted field.
    InUnquotedField,
    /// Accumulating a quoted field; delimiters and line breaks are data.
    InQuotedField,
    /// Just saw a quote inside a quoted field: either the closing quote or
    /// the first half of an escaped `""`.
    QuoteInQuotedField,
}

/// The resumable state of the tokenizer.
///
/// Owned by one session's driver and handed to [`tokenize`] per invocation.
/// Between invocations the machine is row-aligned: `phase` is
/// [`Phase::FieldStart`] and the accumulators are empty.
#[derive(Debug, Clone, Default)]
pub struct TokenizerState {
    /// Current machine position.
    pub phase: Phase,
    /// Partially accumulated field text.
    field: String,
    /// Completed fields of the row being built.
    row: Vec<String>,
    /// Absolute input offset consumed so far, across all chunks.
    pub cursor: usize,
    /// Rows emitted so far, across all chunks.
    pub rows_emitted: usize,
}

impl TokenizerState {
    /// Fresh state for a new session.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the machine sits exactly on a row boundary.
    pub fn is_row_aligned(&self) -> bool {
        matches!(self.phase, Phase::FieldStart) && self.row.is_empty() && self.field.is_empty()
    }
}

/// Output of one [`tokenize`] invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenizeRun {
    /// Complete rows, in input order.
    pub rows: Vec<Vec<String>>,
    /// Non-fatal errors encountered, attributed to absolute raw row indices
    /// (emitted only alongside the row they belong to).
    pub errors: Vec<ParseError>,
    /// Bytes of `buffer` consumed; `buffer[consumed..]` is the remainder the
    /// caller must carry into the next invocation.
    pub consumed: usize,
}

/// Tokenize `buffer`, resuming from `state`.
///
/// `last` signals end of input: a trailing partial row is then finalized
/// instead of left as remainder, and an unterminated quoted field produces a
/// `MissingQuotes` error with its accumulated text kept as the field value.
///
/// `max_rows` (`0` = unlimited) stops the machine once `state.rows_emitted`
/// reaches it; the machine stops on a row boundary so the caller can still
/// rely on `consumed` being row-aligned.
pub fn tokenize(
    buffer: &str,
    state: &mut TokenizerState,
    dialect: &Dialect,
    last: bool,
    max_rows: usize,
) -> TokenizeRun {
    debug_assert!(state.is_row_aligned(), "tokenize entered mid-row");

    let mut out = TokenizeRun::default();
    let nl = dialect.newline.as_str();
    // Line-break sequences are ASCII; the first byte is a valid stop char.
    let nl_first = nl.as_bytes()[0] as char;
    let len = buffer.len();
    let mut i = 0usize;
    let mut row_start = 0usize;
    // Errors for the row being accumulated. They flush when the row is
    // emitted and are dropped with the row on rewind, so a partial row
    // retokenized with the next chunk cannot report an error twice.
    let mut row_errors: Vec<ParseError> = Vec::new();

    'scan: while i < len {
        if max_rows != 0 && state.rows_emitted >= max_rows {
            break;
        }
        match state.phase {
            Phase::FieldStart => {
                if state.row.is_empty() && state.field.is_empty() {
                    // Row start: comment lines are discarded wholesale.
                    if let Some(prefix) = dialect.comment.as_deref() {
                        let rest = &buffer[i..];
                        if rest.starts_with(prefix) {
                            match rest.find(nl) {
                                Some(p) => {
                                    i += p + nl.len();
                                    row_start = i;
                                    continue;
                                }
                                None if last => {
                                    i = len;
                                    row_start = i;
                                    continue;
                                }
                                // Comment line may continue in the next
                                // chunk; leave it unconsumed.
                                None => break 'scan,
                            }
                        }
                        if !last && prefix.len() > rest.len() && prefix.starts_with(rest) {
                            // Possible comment prefix split across chunks.
                            break 'scan;
                        }
                    }
                }
                // Safe: loop condition guarantees i < len.
                let c = buffer[i..].chars().next().expect("in bounds");
                if c == dialect.quote {
                    state.phase = Phase::InQuotedField;
                    i += c.len_utf8();
                } else {
                    state.phase = Phase::InUnquotedField;
                }
            }
            Phase::InUnquotedField => {
                let stop = find2(buffer, i, dialect.delimiter, nl_first);
                state.field.push_str(&buffer[i..stop]);
                i = stop;
                if i >= len {
                    break;
                }
                if buffer[i..].starts_with(dialect.delimiter) {
                    end_field(state);
                    state.phase = Phase::FieldStart;
                    i += dialect.delimiter.len_utf8();
                } else if buffer[i..].starts_with(nl) {
                    end_field(state);
                    emit_row(state, &mut out, &mut row_errors);
                    i += nl.len();
                    row_start = i;
                    state.phase = Phase::FieldStart;
                } else {
                    let rest = &buffer[i..];
                    if !last && nl.len() > rest.len() && nl.starts_with(rest) {
                        // Line break possibly split across chunks.
                        break 'scan;
                    }
                    // A lone newline first-byte (e.g. '\r' under CRLF) is data.
                    let c = rest.chars().next().expect("in bounds");
                    state.field.push(c);
                    i += c.len_utf8();
                }
            }
            Phase::InQuotedField => {
                let stop = find2(buffer, i, dialect.quote, dialect.escape);
                state.field.push_str(&buffer[i..stop]);
                i = stop;
                if i >= len {
                    break;
                }
                // Safe: stop < len here.
                let c = buffer[i..].chars().next().expect("in bounds");
                if c == dialect.escape && dialect.escape != dialect.quote {
                    let after = i + c.len_utf8();
                    if after >= len {
                        if last {
                            state.field.push(c);
                            i = after;
                        } else {
                            // Escape possibly split from its quote.
                            break 'scan;
                        }
                    } else if buffer[after..].starts_with(dialect.quote) {
                        state.field.push(dialect.quote);
                        i = after + dialect.quote.len_utf8();
                    } else {
                        // Escape not followed by a quote is literal.
                        state.field.push(c);
                        i = after;
                    }
                } else {
                    state.phase = Phase::QuoteInQuotedField;
                    i += c.len_utf8();
                }
            }
            Phase::QuoteInQuotedField => {
                // Safe: loop condition guarantees i < len.
                let c = buffer[i..].chars().next().expect("in bounds");
                if c == dialect.quote {
                    // "" escaped literal quote.
                    state.field.push(dialect.quote);
                    state.phase = Phase::InQuotedField;
                    i += c.len_utf8();
                } else if buffer[i..].starts_with(dialect.delimiter) {
                    end_field(state);
                    state.phase = Phase::FieldStart;
                    i += dialect.delimiter.len_utf8();
                } else if buffer[i..].starts_with(nl) {
                    end_field(state);
                    emit_row(state, &mut out, &mut row_errors);
                    i += nl.len();
                    row_start = i;
                    state.phase = Phase::FieldStart;
                } else {
                    let rest = &buffer[i..];
                    if !last && nl.len() > rest.len() && nl.starts_with(rest) {
                        break 'scan;
                    }
                    // Stray character after a closing quote: record the
                    // malformation, treat the quote as closed, keep going
                    // unquoted.
                    row_errors.push(ParseError::invalid_quotes(state.rows_emitted));
                    state.phase = Phase::InUnquotedField;
                    state.field.push(c);
                    i += c.len_utf8();
                }
            }
        }
    }

    out.consumed = if state.is_row_aligned() {
        i
    } else if last {
        if matches!(state.phase, Phase::InQuotedField) {
            row_errors.push(ParseError::missing_quotes(state.rows_emitted));
        }
        end_field(state);
        emit_row(state, &mut out, &mut row_errors);
        state.phase = Phase::FieldStart;
        len
    } else {
        // Rewind the partial row: its bytes stay in the remainder and will be
        // retokenized from a cold start with the next chunk appended. Errors
        // recorded for the partial row are discarded with it.
        state.field.clear();
        state.row.clear();
        state.phase = Phase::FieldStart;
        row_start
    };
    state.cursor += out.consumed;
    out
}

fn end_field(state: &mut TokenizerState) {
    state.row.push(std::mem::take(&mut state.field));
}

fn emit_row(state: &mut TokenizerState, out: &mut TokenizeRun, row_errors: &mut Vec<ParseError>) {
    out.errors.append(row_errors);
    out.rows.push(std::mem::take(&mut state.row));
    state.rows_emitted += 1;
}

/// First occurrence of either stop character at or after `from`.
fn find2(s: &str, from: usize, a: char, b: char) -> usize {
    if a.is_ascii() && b.is_ascii() {
        match memchr::memchr2(a as u8, b as u8, &s.as_bytes()[from..]) {
            Some(p) => from + p,
            None => s.len(),
        }
    } else {
        s[from..].find([a, b]).map_or(s.len(), |p| from + p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Newline;

    fn dialect() -> Dialect {
        Dialect {
            delimiter: ',',
            newline: Newline::Lf,
            quote: '"',
            escape: '"',
            comment: None,
        }
    }

    fn rows_of(input: &str, d: &Dialect) -> (Vec<Vec<String>>, Vec<ParseError>) {
        let mut state = TokenizerState::new();
        let run = tokenize(input, &mut state, d, true, 0);
        assert_eq!(run.consumed, input.len());
        (run.rows, run.errors)
    }

    // ==================== Basic shapes ====================

    #[test]
    fn test_simple_rows() {
        let (rows, errors) = rows_of("a,b,c\n1,2,3", &dialect());
        assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_empty_input_produces_nothing() {
        let (rows, errors) = rows_of("", &dialect());
        assert!(rows.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_trailing_newline_no_spurious_row() {
        let (rows, _) = rows_of("a,b\n", &dialect());
        assert_eq!(rows, vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_interior_empty_line_is_single_empty_field() {
        let (rows, _) = rows_of("a\n\nb", &dialect());
        assert_eq!(rows, vec![vec!["a"], vec![""], vec!["b"]]);
    }

    #[test]
    fn test_empty_fields() {
        let (rows, _) = rows_of("a,,c\n,,", &dialect());
        assert_eq!(rows, vec![vec!["a", "", "c"], vec!["", "", ""]]);
    }

    #[test]
    fn test_trailing_delimiter_yields_trailing_empty_field() {
        let (rows, _) = rows_of("a,b,", &dialect());
        assert_eq!(rows, vec![vec!["a", "b", ""]]);
    }

    #[test]
    fn test_whitespace_is_preserved() {
        let (rows, _) = rows_of(" a , b ", &dialect());
        assert_eq!(rows, vec![vec![" a ", " b "]]);
    }

    // ==================== Quoting ====================

    #[test]
    fn test_quoted_field_hides_delimiter() {
        let (rows, errors) = rows_of("a,\"b,c\",d", &dialect());
        assert_eq!(rows, vec![vec!["a", "b,c", "d"]]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_quoted_field_hides_newline() {
        let (rows, _) = rows_of("a,\"line1\nline2\",b", &dialect());
        assert_eq!(rows, vec![vec!["a", "line1\nline2", "b"]]);
    }

    #[test]
    fn test_escaped_quote_doubling() {
        let (rows, errors) = rows_of("a,\"b\"\"c\",d", &dialect());
        assert_eq!(rows, vec![vec!["a", "b\"c", "d"]]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_quote_mid_unquoted_field_is_literal() {
        let (rows, errors) = rows_of("a\"b,c", &dialect());
        assert_eq!(rows, vec![vec!["a\"b", "c"]]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_quoted_empty_field() {
        let (rows, _) = rows_of("\"\",b", &dialect());
        assert_eq!(rows, vec![vec!["", "b"]]);
    }

    #[test]
    fn test_stray_char_after_closing_quote() {
        let (rows, errors) = rows_of("a,\"b\"x,c", &dialect());
        assert_eq!(rows, vec![vec!["a", "bx", "c"]]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "InvalidQuotes");
        assert_eq!(errors[0].row, Some(0));
    }

    #[test]
    fn test_unterminated_quote_at_end_of_input() {
        let (rows, errors) = rows_of("a,\"bc", &dialect());
        assert_eq!(rows, vec![vec!["a", "bc"]]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "MissingQuotes");
    }

    #[test]
    fn test_custom_escape_char() {
        let d = Dialect {
            escape: '\\',
            ..dialect()
        };
        let (rows, errors) = rows_of("a,\"b\\\"c\",d", &d);
        assert_eq!(rows, vec![vec!["a", "b\"c", "d"]]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_custom_escape_not_before_quote_is_literal() {
        let d = Dialect {
            escape: '\\',
            ..dialect()
        };
        let (rows, _) = rows_of("\"a\\b\"", &d);
        assert_eq!(rows, vec![vec!["a\\b"]]);
    }

    // ==================== Line breaks ====================

    #[test]
    fn test_crlf_rows() {
        let d = Dialect {
            newline: Newline::CrLf,
            ..dialect()
        };
        let (rows, _) = rows_of("a,b\r\nc,d\r\n", &d);
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_cr_rows() {
        let d = Dialect {
            newline: Newline::Cr,
            ..dialect()
        };
        let (rows, _) = rows_of("a\rb\rc", &d);
        assert_eq!(rows, vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn test_lone_cr_under_crlf_is_data() {
        let d = Dialect {
            newline: Newline::CrLf,
            ..dialect()
        };
        let (rows, _) = rows_of("a\rb\r\nc", &d);
        assert_eq!(rows, vec![vec!["a\rb"], vec!["c"]]);
    }

    #[test]
    fn test_lone_lf_under_crlf_is_data() {
        let d = Dialect {
            newline: Newline::CrLf,
            ..dialect()
        };
        let (rows, _) = rows_of("a\nb\r\nc", &d);
        assert_eq!(rows, vec![vec!["a\nb"], vec!["c"]]);
    }

    // ==================== Comments ====================

    fn commented() -> Dialect {
        Dialect {
            comment: Some("#".to_string()),
            ..dialect()
        }
    }

    #[test]
    fn test_comment_lines_discarded() {
        let (rows, _) = rows_of("# note\na,b\n#tail", &commented());
        assert_eq!(rows, vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_comment_prefix_mid_field_is_data() {
        let (rows, _) = rows_of("a,#b\n", &commented());
        assert_eq!(rows, vec![vec!["a", "#b"]]);
    }

    #[test]
    fn test_multichar_comment_prefix() {
        let d = Dialect {
            comment: Some("//".to_string()),
            ..dialect()
        };
        let (rows, _) = rows_of("//skip\n/x,y\n", &d);
        assert_eq!(rows, vec![vec!["/x", "y"]]);
    }

    // ==================== Other delimiters ====================

    #[test]
    fn test_tab_delimiter() {
        let d = Dialect {
            delimiter: '\t',
            ..dialect()
        };
        let (rows, _) = rows_of("a\tb\nc\td", &d);
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_multibyte_delimiter() {
        let d = Dialect {
            delimiter: '§',
            ..dialect()
        };
        let (rows, _) = rows_of("a§b\nc§d", &d);
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_unicode_field_content() {
        let (rows, _) = rows_of("日本語,\"émoji 🎉\"", &dialect());
        assert_eq!(rows, vec![vec!["日本語", "émoji 🎉"]]);
    }

    // ==================== Chunked resumption ====================

    /// Feed the input in pieces and collect all rows, carrying the remainder
    /// exactly as the streaming driver does.
    fn rows_chunked(input: &str, d: &Dialect, sizes: &[usize]) -> (Vec<Vec<String>>, Vec<ParseError>) {
        let mut state = TokenizerState::new();
        let mut remainder = String::new();
        let mut rows = Vec::new();
        let mut errors = Vec::new();
        let mut pos = 0;
        let mut sizes = sizes.iter().cycle();
        while pos < input.len() {
            let mut end = (pos + sizes.next().unwrap()).min(input.len());
            while !input.is_char_boundary(end) {
                end += 1;
            }
            let mut buffer = std::mem::take(&mut remainder);
            buffer.push_str(&input[pos..end]);
            pos = end;
            let run = tokenize(&buffer, &mut state, d, false, 0);
            remainder = buffer[run.consumed..].to_string();
            rows.extend(run.rows);
            errors.extend(run.errors);
        }
        let run = tokenize(&remainder, &mut state, d, true, 0);
        assert_eq!(run.consumed, remainder.len());
        rows.extend(run.rows);
        errors.extend(run.errors);
        (rows, errors)
    }

    #[test]
    fn test_chunk_split_inside_quoted_field() {
        // "a,\"b" + "c\"\nd,e" must equal parsing the whole text at once.
        let d = dialect();
        let whole = "a,\"bc\"\nd,e";
        let (expected, _) = rows_of(whole, &d);
        let mut state = TokenizerState::new();
        let run1 = tokenize("a,\"b", &mut state, &d, false, 0);
        assert!(run1.rows.is_empty());
        assert_eq!(run1.consumed, 0);
        let mut buffer = "a,\"b".to_string();
        buffer.push_str("c\"\nd,e");
        let run2 = tokenize(&buffer, &mut state, &d, true, 0);
        assert_eq!(run2.rows, expected);
    }

    #[test]
    fn test_chunk_split_inside_crlf() {
        let d = Dialect {
            newline: Newline::CrLf,
            ..dialect()
        };
        let input = "a,b\r\nc,d\r\ne,f";
        let (expected, _) = rows_of(input, &d);
        for size in 1..input.len() {
            let (rows, _) = rows_chunked(input, &d, &[size]);
            assert_eq!(rows, expected, "split size {}", size);
        }
    }

    #[test]
    fn test_chunk_split_everywhere_matches_whole() {
        let d = commented();
        let input = "#c\na,\"x\"\"y\",b\n\"open\nline\",2\nq,\"v\"w\nlast,row\n";
        let (expected, expected_errors) = rows_of(input, &d);
        assert_eq!(expected_errors.len(), 1);
        for size in 1..input.len() {
            let (rows, errors) = rows_chunked(input, &d, &[size]);
            assert_eq!(rows, expected, "split size {}", size);
            assert_eq!(errors, expected_errors, "split size {}", size);
        }
    }

    #[test]
    fn test_rewound_row_does_not_repeat_error() {
        // Cut right after the stray character so the malformed row is
        // rewound and retokenized with the next chunk. The quote error
        // must be reported exactly once.
        let d = dialect();
        let input = "ok,row\na,\"b\"x,c\n";
        let (_, expected_errors) = rows_of(input, &d);
        assert_eq!(expected_errors.len(), 1);
        let mut state = TokenizerState::new();
        let run = tokenize(&input[..13], &mut state, &d, false, 0);
        assert!(run.errors.is_empty());
        let mut errors = run.errors;
        let mut buffer = input[run.consumed..13].to_string();
        buffer.push_str(&input[13..]);
        let run = tokenize(&buffer, &mut state, &d, true, 0);
        errors.extend(run.errors);
        assert_eq!(errors, expected_errors);
    }

    #[test]
    fn test_remainder_is_partial_row() {
        let d = dialect();
        let mut state = TokenizerState::new();
        let run = tokenize("a,b\nc,d", &mut state, &d, false, 0);
        assert_eq!(run.rows, vec![vec!["a", "b"]]);
        assert_eq!(run.consumed, 4);
        assert!(state.is_row_aligned());
        assert_eq!(state.cursor, 4);
    }

    // ==================== Row caps ====================

    #[test]
    fn test_max_rows_stops_on_row_boundary() {
        let d = dialect();
        let mut state = TokenizerState::new();
        let run = tokenize("a\nb\nc\nd\n", &mut state, &d, true, 2);
        assert_eq!(run.rows, vec![vec!["a"], vec!["b"]]);
        assert_eq!(run.consumed, 4);
        assert_eq!(state.rows_emitted, 2);
        assert!(state.is_row_aligned());
    }

    #[test]
    fn test_max_rows_spans_invocations() {
        let d = dialect();
        let mut state = TokenizerState::new();
        let run = tokenize("a\n", &mut state, &d, false, 3);
        assert_eq!(run.rows.len(), 1);
        let run = tokenize("b\nc\nd\n", &mut state, &d, false, 3);
        assert_eq!(run.rows, vec![vec!["b"], vec!["c"]]);
    }
}
