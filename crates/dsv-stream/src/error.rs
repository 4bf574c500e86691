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

//! Fatal streaming errors.
//!
//! These end the session: no `complete` hook fires after one. They are
//! distinct from the non-fatal [`ParseError`](dsv_core::ParseError)s the
//! engine accumulates, which describe malformed *content* and never stop a
//! parse.

use thiserror::Error;

/// Error returned by a user hook. Any error type works; the driver wraps it
/// in [`StreamError::Hook`] with the hook's name attached.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A condition that ends a streaming session.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Reading a chunk from the underlying source failed.
    #[error("i/o error while reading input")]
    Io(#[from] std::io::Error),

    /// The input is not valid UTF-8. Incomplete sequences at chunk
    /// boundaries are carried over and never trigger this; a genuinely
    /// malformed sequence does.
    #[error("invalid utf-8 in input at byte {offset}")]
    Utf8 {
        /// Absolute byte offset of the offending sequence.
        offset: usize,
    },

    /// A `before_first_chunk` or `chunk` hook returned an error.
    #[error("{hook} hook failed")]
    Hook {
        /// Name of the failing hook.
        hook: &'static str,
        #[source]
        source: HookError,
    },

    /// The session configuration is invalid.
    #[error(transparent)]
    Config(#[from] dsv_core::ConfigError),
}

pub type StreamResult<T> = Result<T, StreamError>;
