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

//! The chunk driver: a push-based streaming session.
//!
//! [`ChunkDriver`] owns everything a session accumulates — the tokenizer
//! state, the carried remainder, the captured header, the result aggregator —
//! and is fed decoded text through [`push_chunk`](ChunkDriver::push_chunk)
//! followed by one [`finish`](ChunkDriver::finish). Rows are delivered to the
//! registered hooks; a hook receives a [`Control`] and can pause, resume or
//! abort the session from inside the callback.
//!
//! Pausing does not lose data: deliveries produced while paused are queued
//! and flushed by [`resume`](ChunkDriver::resume). A pause followed by a
//! resume inside the same callback cancels out before the next delivery.

use std::collections::VecDeque;

use dsv_core::{
    detect, tokenize, Aggregator, Dialect, ParseConfig, ParseError, ParseResult, Row,
    RowProcessor, TokenizerState,
};

use crate::error::{StreamError, StreamResult};
use crate::hooks::{ChunkPayload, Hooks, StepPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Running,
    Paused,
    /// Paused and resumed within the same callback; nets out to `Running`
    /// once the callback returns.
    PendingResume,
}

/// Session control handle passed to `chunk` and `step` hooks.
#[derive(Debug)]
pub struct Control {
    state: RunState,
    aborted: bool,
}

impl Control {
    fn new() -> Self {
        Self {
            state: RunState::Running,
            aborted: false,
        }
    }

    /// Hold further deliveries until the session is resumed.
    pub fn pause(&mut self) {
        if !self.aborted {
            self.state = RunState::Paused;
        }
    }

    /// Undo a pause. Inside the same callback as the pause this cancels it
    /// entirely; the session never observes the paused state.
    pub fn resume(&mut self) {
        if self.state == RunState::Paused {
            self.state = RunState::PendingResume;
        }
    }

    /// End the session early. Queued deliveries and the carried remainder
    /// are dropped, `meta.aborted` is set, and the `complete` hook still
    /// runs with everything gathered so far.
    pub fn abort(&mut self) {
        self.aborted = true;
    }

    pub fn is_paused(&self) -> bool {
        self.state == RunState::Paused
    }
}

/// Where a driver stands after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverStatus {
    /// Ready for more input.
    Ready,
    /// Paused by a hook; deliveries are queued until `resume`.
    Paused,
    /// Aborted by a hook; the session is over.
    Aborted,
    /// The session ran to completion.
    Complete,
}

enum Delivery {
    Batch(Vec<Row>, Vec<ParseError>),
    Row(Row, Vec<ParseError>),
}

/// A push-based streaming parse session.
///
/// # Examples
///
/// ```
/// use dsv_core::ParseConfig;
/// use dsv_stream::{ChunkDriver, DriverStatus, Hooks};
///
/// let mut driver = ChunkDriver::new(ParseConfig::new().with_header(true), Hooks::new());
/// driver.push_chunk("name,age\nida,")?;
/// driver.push_chunk("35\n")?;
/// assert_eq!(driver.finish()?, DriverStatus::Complete);
///
/// let result = driver.take_result().unwrap();
/// assert_eq!(result.data.len(), 1);
/// # Ok::<(), dsv_stream::StreamError>(())
/// ```
pub struct ChunkDriver<'a> {
    config: ParseConfig,
    hooks: Hooks<'a>,
    processor: RowProcessor<'a>,
    state: TokenizerState,
    remainder: String,
    dialect: Option<Dialect>,
    aggregator: Aggregator,
    control: Control,
    queue: VecDeque<Delivery>,
    pending_errors: Vec<ParseError>,
    /// Raw tokenizer-row cap derived from the preview setting; `0` = none.
    budget: usize,
    finished_input: bool,
    completed: bool,
    aborted: bool,
    halted: bool,
    final_result: Option<ParseResult>,
}

impl<'a> ChunkDriver<'a> {
    pub fn new(config: ParseConfig, mut hooks: Hooks<'a>) -> Self {
        // With a delivery hook the driver does not retain rows; errors are
        // always retained so the final result lists them either way.
        let collect_data = hooks.step.is_none() && hooks.chunk.is_none();
        let processor = match hooks.transform.take() {
            Some(t) => RowProcessor::with_transform(&config, t),
            None => RowProcessor::new(&config),
        };
        // The header row spends one tokenizer row without producing data.
        let budget = if config.preview > 0 {
            config.preview + usize::from(config.header)
        } else {
            0
        };
        Self {
            config,
            hooks,
            processor,
            state: TokenizerState::new(),
            remainder: String::new(),
            dialect: None,
            aggregator: Aggregator::new(collect_data, true),
            control: Control::new(),
            queue: VecDeque::new(),
            pending_errors: Vec::new(),
            budget,
            finished_input: false,
            completed: false,
            aborted: false,
            halted: false,
            final_result: None,
        }
    }

    /// Feed the next piece of decoded input. The first call runs the
    /// `before_first_chunk` hook and dialect detection; every call tokenizes
    /// the carried remainder plus the new text and delivers what completed.
    pub fn push_chunk(&mut self, chunk: &str) -> StreamResult<DriverStatus> {
        if self.done() {
            return Ok(self.status());
        }
        if self.dialect.is_none() {
            let replacement = self.run_first_chunk_hook(chunk)?;
            let text = replacement.as_deref().unwrap_or(chunk);
            self.setup_dialect(text)?;
            self.consume(text, false);
        } else {
            self.consume(chunk, false);
        }
        self.drain()?;
        self.check_budget(false);
        Ok(self.status())
    }

    /// Signal end of input: the remainder is tokenized as the final row and
    /// the session completes (or stays paused with the completion pending).
    pub fn finish(&mut self) -> StreamResult<DriverStatus> {
        if self.done() {
            return Ok(self.status());
        }
        if self.dialect.is_none() {
            // No input ever arrived; still resolve a dialect for the meta
            // (and let before_first_chunk substitute text if it wants to).
            let replacement = self.run_first_chunk_hook("")?;
            let text = replacement.unwrap_or_default();
            self.setup_dialect(&text)?;
            self.remainder = text;
        }
        let tail = std::mem::take(&mut self.remainder);
        self.consume(&tail, true);
        self.drain()?;
        self.check_budget(true);
        self.finished_input = true;
        self.maybe_complete();
        Ok(self.status())
    }

    /// Resume a paused session: flush queued deliveries and, if the input
    /// already finished, complete.
    pub fn resume(&mut self) -> StreamResult<DriverStatus> {
        if self.control.state == RunState::Paused {
            self.control.state = RunState::Running;
            self.drain()?;
            self.maybe_complete();
        }
        Ok(self.status())
    }

    /// Abort from outside a hook.
    pub fn abort(&mut self) {
        if !self.done() {
            self.do_abort();
        }
    }

    pub fn status(&self) -> DriverStatus {
        if self.aborted {
            DriverStatus::Aborted
        } else if self.completed {
            DriverStatus::Complete
        } else if self.control.state == RunState::Paused {
            DriverStatus::Paused
        } else {
            DriverStatus::Ready
        }
    }

    pub fn is_paused(&self) -> bool {
        self.control.state == RunState::Paused
    }

    /// Header names captured so far, if a header row has been seen.
    pub fn columns(&self) -> Option<&[String]> {
        self.processor.columns()
    }

    /// The final result, once the session has completed or aborted.
    pub fn take_result(&mut self) -> Option<ParseResult> {
        self.final_result.take()
    }

    fn done(&self) -> bool {
        self.halted || self.completed || self.aborted
    }

    fn run_first_chunk_hook(&mut self, chunk: &str) -> StreamResult<Option<String>> {
        let Some(hook) = self.hooks.before_first_chunk.as_mut() else {
            return Ok(None);
        };
        let outcome = hook(chunk);
        match outcome {
            Ok(replacement) => Ok(replacement),
            Err(e) => Err(self.fatal(StreamError::Hook {
                hook: "before_first_chunk",
                source: e,
            })),
        }
    }

    fn setup_dialect(&mut self, sample: &str) -> StreamResult<()> {
        let detection = detect(sample, &self.config);
        match self.config.resolve(detection.delimiter, detection.newline) {
            Ok(dialect) => {
                self.aggregator.set_dialect(dialect.delimiter, dialect.newline);
                if let Some(error) = detection.error {
                    self.pending_errors.push(error);
                }
                self.dialect = Some(dialect);
                Ok(())
            }
            Err(e) => Err(self.fatal(StreamError::Config(e))),
        }
    }

    /// Tokenize remainder + chunk, post-process the completed rows and queue
    /// deliveries. Never calls hooks itself; that happens in `drain`.
    fn consume(&mut self, chunk: &str, last: bool) {
        let Some(dialect) = self.dialect.clone() else {
            return;
        };
        let mut buffer = std::mem::take(&mut self.remainder);
        buffer.push_str(chunk);
        let run = tokenize(&buffer, &mut self.state, &dialect, last, self.budget);
        self.remainder = buffer.split_off(run.consumed);
        self.aggregator.set_cursor(self.state.cursor);
        // Tokenizer errors carry raw row indices; the processor rewrites them
        // to data-row indices as each row goes through.
        let mut tokenizer_errors = run.errors;
        let raw_base = self.state.rows_emitted - run.rows.len();

        if self.hooks.step.is_some() {
            for (i, fields) in run.rows.into_iter().enumerate() {
                let mut errors = std::mem::take(&mut self.pending_errors);
                match self.processor.process_indexed(
                    fields,
                    raw_base + i,
                    &mut tokenizer_errors,
                    &mut errors,
                ) {
                    Some(row) => {
                        self.aggregator.extend_errors(errors.iter().cloned());
                        self.queue.push_back(Delivery::Row(row, errors));
                    }
                    // Skipped row or header capture: keep the errors pending
                    // so the next row carries them.
                    None => self.pending_errors = errors,
                }
            }
            self.pending_errors.extend(tokenizer_errors);
            if last {
                self.aggregator
                    .extend_errors(self.pending_errors.drain(..));
            }
        } else {
            let mut errors: Vec<ParseError> = self.pending_errors.drain(..).collect();
            let mut rows = Vec::new();
            for (i, fields) in run.rows.into_iter().enumerate() {
                if let Some(row) = self.processor.process_indexed(
                    fields,
                    raw_base + i,
                    &mut tokenizer_errors,
                    &mut errors,
                ) {
                    rows.push(row);
                }
            }
            errors.extend(tokenizer_errors);
            self.aggregator.extend_errors(errors.iter().cloned());
            if self.hooks.chunk.is_some() {
                if !(last && rows.is_empty() && errors.is_empty()) {
                    self.queue.push_back(Delivery::Batch(rows, errors));
                }
            } else {
                for row in rows {
                    self.aggregator.push_row(row);
                }
            }
        }
    }

    /// Hand queued deliveries to the hooks until the queue is empty, a hook
    /// pauses, or a hook aborts.
    fn drain(&mut self) -> StreamResult<()> {
        loop {
            if self.control.aborted {
                self.do_abort();
                return Ok(());
            }
            if self.control.state == RunState::Paused {
                return Ok(());
            }
            let Some(delivery) = self.queue.pop_front() else {
                return Ok(());
            };
            let meta = self.aggregator.snapshot_meta();
            let failure = match delivery {
                Delivery::Batch(rows, errors) => match self.hooks.chunk.as_mut() {
                    Some(hook) => hook(ChunkPayload { rows, errors, meta }, &mut self.control)
                        .err()
                        .map(|e| ("chunk", e)),
                    None => None,
                },
                Delivery::Row(row, errors) => match self.hooks.step.as_mut() {
                    Some(hook) => hook(StepPayload { row, errors, meta }, &mut self.control)
                        .err()
                        .map(|e| ("step", e)),
                    None => None,
                },
            };
            if self.control.state == RunState::PendingResume {
                self.control.state = RunState::Running;
            }
            match failure {
                Some(("step", e)) => {
                    // A failed step hook is reported but does not end the
                    // session.
                    self.report(&StreamError::Hook {
                        hook: "step",
                        source: e,
                    });
                }
                Some((hook, e)) => {
                    return Err(self.fatal(StreamError::Hook { hook, source: e }));
                }
                None => {}
            }
        }
    }

    fn check_budget(&mut self, last: bool) {
        if self.budget == 0 || self.state.rows_emitted < self.budget || self.done() {
            return;
        }
        if !last || !self.remainder.is_empty() {
            self.aggregator.mark_truncated();
        }
        self.remainder.clear();
        self.finished_input = true;
        self.maybe_complete();
    }

    fn maybe_complete(&mut self) {
        if self.finished_input
            && !self.done()
            && self.queue.is_empty()
            && self.control.state != RunState::Paused
        {
            self.complete_now();
        }
    }

    fn complete_now(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        self.aggregator.set_cursor(self.state.cursor);
        let aggregator = std::mem::replace(&mut self.aggregator, Aggregator::new(false, false));
        let result = aggregator.finish();
        if let Some(hook) = self.hooks.complete.take() {
            hook(&result);
        }
        self.final_result = Some(result);
    }

    fn do_abort(&mut self) {
        self.queue.clear();
        self.remainder.clear();
        self.pending_errors.clear();
        self.aborted = true;
        self.finished_input = true;
        self.aggregator.mark_aborted();
        self.complete_now();
    }

    /// Route an externally produced fatal error (reader I/O, bad UTF-8)
    /// through the same path as a hook failure.
    pub(crate) fn fail(&mut self, err: StreamError) -> StreamError {
        self.fatal(err)
    }

    /// Route a fatal error to the `error` hook and poison the session.
    fn fatal(&mut self, err: StreamError) -> StreamError {
        self.halted = true;
        self.remainder.clear();
        self.queue.clear();
        self.report(&err);
        err
    }

    fn report(&mut self, err: &StreamError) {
        if let Some(hook) = self.hooks.error.as_mut() {
            hook(err);
        }
    }
}

impl std::fmt::Debug for ChunkDriver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkDriver")
            .field("status", &self.status())
            .field("cursor", &self.state.cursor)
            .field("queued", &self.queue.len())
            .field("remainder_len", &self.remainder.len())
            .finish()
    }
}
