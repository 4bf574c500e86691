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

//! A streaming parser for delimiter-separated values (CSV, TSV and friends).
//!
//! The parser auto-detects the delimiter and line-break convention, handles
//! quoted fields (including embedded delimiters, line breaks and escaped
//! quotes), and keeps its output identical no matter how the input is cut
//! into chunks. Malformed content never stops a parse: problems surface as
//! typed, non-fatal errors alongside the data they concern.
//!
//! This crate is a facade re-exporting the two layers:
//!
//! - [`dsv-core`](dsv_core): the pure parsing engine — configuration,
//!   detection, the resumable tokenizer, typing and the one-shot [`parse`]
//! - [`dsv-stream`](dsv_stream): chunked sessions over [`std::io::Read`]
//!   sources with hooks, pause/resume and abort
//!
//! # Parsing a string
//!
//! ```
//! use dsv::{parse, DynamicTyping, ParseConfig, Value};
//!
//! let config = ParseConfig::new()
//!     .with_header(true)
//!     .with_dynamic_typing(DynamicTyping::All);
//! let result = parse("city,population\nreykjavik,140000\n", &config)?;
//!
//! assert_eq!(result.data[0].get_field("population"), Some(&Value::Int(140000)));
//! assert_eq!(result.meta.delimiter, ',');
//! # Ok::<(), dsv::ConfigError>(())
//! ```
//!
//! # Streaming from a reader
//!
//! ```
//! use std::io::Cursor;
//! use dsv::{Hooks, ParseConfig, ReadSession, SessionStatus};
//!
//! let mut widest = 0usize;
//! let hooks = Hooks::new().on_step(|payload, _control| {
//!     widest = widest.max(payload.row.len());
//!     Ok(())
//! });
//! let source = Cursor::new("a|b|c\n1|2|3\n");
//! let mut session = ReadSession::new(source, ParseConfig::new(), hooks);
//! assert_eq!(session.run()?, SessionStatus::Complete);
//! drop(session);
//! assert_eq!(widest, 3);
//! # Ok::<(), dsv::StreamError>(())
//! ```

pub use dsv_core::{
    detect, parse, parse_with_transform, Aggregator, ConfigError, Delimiter, Detection, Dialect,
    DynamicTyping, ErrorKind, Meta, Newline, ParseConfig, ParseError, ParseResult, Row,
    SkipEmptyLines, Transform, Value,
};
pub use dsv_stream::{
    parse_reader, ChunkDriver, ChunkPayload, ChunkReader, Control, DriverStatus, HookError,
    HookResult, Hooks, ReadSession, SessionStatus, StepPayload, StreamError, StreamResult,
    DEFAULT_CHUNK_SIZE,
};

/// Low-level engine internals for callers embedding the tokenizer directly.
pub mod core {
    pub use dsv_core::{tokenize, Phase, RowProcessor, TokenizeRun, TokenizerState};
}
