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

//! Session hooks: the callback surface of a streaming parse.
//!
//! All hooks are optional. Registering a `step` hook switches the session to
//! per-row delivery; registering a `chunk` hook delivers per-chunk batches.
//! Either one stops the driver retaining rows — with neither, rows accumulate
//! into the final [`ParseResult`]. Errors are retained in every mode, so the
//! final result always lists them.

use dsv_core::{Meta, ParseError, ParseResult, Row, Transform};

use crate::driver::Control;
use crate::error::{HookError, StreamError};

/// What a batch-delivery (`chunk`) hook receives: every row the chunk
/// produced, the non-fatal errors found in it, and a metadata snapshot.
#[derive(Debug)]
pub struct ChunkPayload {
    pub rows: Vec<Row>,
    pub errors: Vec<ParseError>,
    pub meta: Meta,
}

/// What a per-row (`step`) hook receives. `errors` holds the non-fatal
/// errors attributed to this row, plus any batch-level ones (dialect
/// fallback, quote errors) pending when the row was produced.
#[derive(Debug)]
pub struct StepPayload {
    pub row: Row,
    pub errors: Vec<ParseError>,
    pub meta: Meta,
}

pub type HookResult = Result<(), HookError>;

type BeforeFirstChunkFn<'a> = dyn FnMut(&str) -> Result<Option<String>, HookError> + 'a;
type ChunkFn<'a> = dyn FnMut(ChunkPayload, &mut Control) -> HookResult + 'a;
type StepFn<'a> = dyn FnMut(StepPayload, &mut Control) -> HookResult + 'a;
type CompleteFn<'a> = dyn FnOnce(&ParseResult) + 'a;
type ErrorFn<'a> = dyn FnMut(&StreamError) + 'a;

/// The hook set for one session. Built with the `on_*` methods:
///
/// ```
/// use dsv_stream::Hooks;
///
/// let mut total = 0usize;
/// let hooks = Hooks::new().on_step(|payload, _control| {
///     total += payload.row.len();
///     Ok(())
/// });
/// # let _ = hooks;
/// ```
#[derive(Default)]
pub struct Hooks<'a> {
    pub(crate) before_first_chunk: Option<Box<BeforeFirstChunkFn<'a>>>,
    pub(crate) chunk: Option<Box<ChunkFn<'a>>>,
    pub(crate) step: Option<Box<StepFn<'a>>>,
    pub(crate) complete: Option<Box<CompleteFn<'a>>>,
    pub(crate) error: Option<Box<ErrorFn<'a>>>,
    pub(crate) transform: Option<Transform<'a>>,
}

impl<'a> Hooks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect or rewrite the first chunk before anything is parsed.
    /// Returning `Ok(Some(text))` replaces the chunk; `Ok(None)` keeps it.
    /// An error is fatal and routed to the `error` hook.
    pub fn on_before_first_chunk<F>(mut self, f: F) -> Self
    where
        F: FnMut(&str) -> Result<Option<String>, HookError> + 'a,
    {
        self.before_first_chunk = Some(Box::new(f));
        self
    }

    /// Receive each chunk's rows as one batch. An error is fatal.
    pub fn on_chunk<F>(mut self, f: F) -> Self
    where
        F: FnMut(ChunkPayload, &mut Control) -> HookResult + 'a,
    {
        self.chunk = Some(Box::new(f));
        self
    }

    /// Receive rows one at a time. An error is reported to the `error` hook
    /// but does not stop the session.
    pub fn on_step<F>(mut self, f: F) -> Self
    where
        F: FnMut(StepPayload, &mut Control) -> HookResult + 'a,
    {
        self.step = Some(Box::new(f));
        self
    }

    /// Run exactly once when the session ends normally or by abort — never
    /// after a fatal error.
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&ParseResult) + 'a,
    {
        self.complete = Some(Box::new(f));
        self
    }

    /// Observe fatal errors (and failed step hooks) as they happen.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: FnMut(&StreamError) + 'a,
    {
        self.error = Some(Box::new(f));
        self
    }

    /// Rewrite each field before dynamic typing, same as
    /// [`parse_with_transform`](dsv_core::parse_with_transform).
    pub fn with_transform<F>(mut self, f: F) -> Self
    where
        F: FnMut(&str, usize) -> String + 'a,
    {
        self.transform = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for Hooks<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("before_first_chunk", &self.before_first_chunk.is_some())
            .field("chunk", &self.chunk.is_some())
            .field("step", &self.step.is_some())
            .field("complete", &self.complete.is_some())
            .field("error", &self.error.is_some())
            .field("transform", &self.transform.is_some())
            .finish()
    }
}
