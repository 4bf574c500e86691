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

//! Core parsing engine for delimiter-separated values (CSV, TSV and friends).
//!
//! This crate provides the pure, I/O-free part of the dsv parser:
//!
//! - Delimiter and line-break auto-detection over a bounded text sample
//! - A resumable row/field tokenizer whose state survives arbitrary chunk
//!   boundaries, including splits inside quoted fields and inside `\r\n`
//! - Row post-processing: header capture, empty-line skipping, per-field
//!   transforms and strict dynamic typing
//! - Result aggregation into a [`ParseResult`] with accumulated non-fatal
//!   errors and parse metadata
//!
//! The chunked streaming driver that feeds this engine lives in `dsv-stream`;
//! this crate only ever sees already-decoded text.
//!
//! # Quick start
//!
//! ```
//! use dsv_core::{parse, ParseConfig};
//!
//! let result = parse("a,b,c\n1,2,3", &ParseConfig::default()).unwrap();
//! assert_eq!(result.data.len(), 2);
//! assert_eq!(result.meta.delimiter, ',');
//! assert!(result.errors.is_empty());
//! ```

pub mod aggregate;
pub mod config;
pub mod detect;
mod error;
mod parse;
pub mod process;
pub mod tokenizer;
pub mod typing;
mod value;

pub use aggregate::{Aggregator, Meta, ParseResult};
pub use config::{
    ConfigError, Delimiter, Dialect, DynamicTyping, Newline, ParseConfig, SkipEmptyLines,
};
pub use detect::{detect, Detection};
pub use error::{ErrorKind, ParseError};
pub use parse::{parse, parse_with_transform};
pub use process::{RowProcessor, Transform};
pub use tokenizer::{tokenize, Phase, TokenizeRun, TokenizerState};
pub use value::{Row, Value};
