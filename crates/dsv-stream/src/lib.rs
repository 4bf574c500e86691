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

//! Streaming driver for the dsv parsing engine.
//!
//! `dsv-core` is pure and I/O-free; this crate adds everything a long-running
//! parse needs:
//!
//! - [`ChunkDriver`]: a push-based session you feed decoded text, with
//!   per-row or per-batch delivery hooks and in-hook pause/resume/abort
//! - [`ChunkReader`] and [`ReadSession`]: fixed-size chunked reading from any
//!   [`std::io::Read`] source, with UTF-8 sequences kept whole across chunk
//!   boundaries
//! - [`parse_reader`]: the one-call convenience for when no hooks are needed
//!
//! # Quick start
//!
//! ```
//! use std::io::Cursor;
//! use dsv_core::ParseConfig;
//! use dsv_stream::{Hooks, ReadSession, SessionStatus};
//!
//! let mut rows = 0usize;
//! let hooks = Hooks::new().on_step(|_, _| {
//!     rows += 1;
//!     Ok(())
//! });
//! let source = Cursor::new("a,b\n1,2\n3,4\n");
//! let mut session = ReadSession::new(source, ParseConfig::new(), hooks);
//! assert_eq!(session.run()?, SessionStatus::Complete);
//! drop(session);
//! assert_eq!(rows, 3);
//! # Ok::<(), dsv_stream::StreamError>(())
//! ```

mod driver;
mod error;
mod hooks;
mod reader;

pub use driver::{ChunkDriver, Control, DriverStatus};
pub use error::{HookError, StreamError, StreamResult};
pub use hooks::{ChunkPayload, HookResult, Hooks, StepPayload};
pub use reader::{parse_reader, ChunkReader, ReadSession, SessionStatus, DEFAULT_CHUNK_SIZE};
