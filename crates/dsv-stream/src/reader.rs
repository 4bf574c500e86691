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

//! Reading chunks from any [`Read`] source and pumping them through a
//! [`ChunkDriver`].
//!
//! [`ChunkReader`] handles the byte side: fixed-size reads and UTF-8
//! decoding, carrying an incomplete multi-byte sequence at a chunk tail over
//! to the next read. [`ReadSession`] pairs a reader with a driver and runs
//! the pump loop, surfacing pauses and aborts to the caller.

use std::io::Read;

use dsv_core::{ParseConfig, ParseResult};

use crate::driver::{ChunkDriver, DriverStatus};
use crate::error::{StreamError, StreamResult};
use crate::hooks::Hooks;

/// Default read size. Matches a typical filesystem readahead granule; small
/// enough that per-chunk hooks stay responsive.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Fixed-size chunked UTF-8 decoder over any [`Read`] source.
#[derive(Debug)]
pub struct ChunkReader<R: Read> {
    inner: R,
    chunk_size: usize,
    /// Bytes held back: an incomplete UTF-8 sequence at the last chunk tail.
    carry: Vec<u8>,
    /// Absolute offset of the first undelivered byte, for error reporting.
    offset: usize,
    eof: bool,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_chunk_size(inner, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(inner: R, chunk_size: usize) -> Self {
        Self {
            inner,
            chunk_size: chunk_size.max(1),
            carry: Vec::new(),
            offset: 0,
            eof: false,
        }
    }

    /// The next decoded chunk, or `None` at end of input.
    ///
    /// A chunk boundary that falls inside a multi-byte sequence is invisible
    /// to the caller: the partial sequence is carried into the next chunk.
    /// Genuinely malformed UTF-8 (including input that ends mid-sequence) is
    /// a fatal [`StreamError::Utf8`].
    pub fn next_chunk(&mut self) -> StreamResult<Option<String>> {
        if self.eof {
            return Ok(None);
        }
        loop {
            let start = self.carry.len();
            self.carry.resize(start + self.chunk_size, 0);
            let n = read_retry(&mut self.inner, &mut self.carry[start..])?;
            self.carry.truncate(start + n);
            if n == 0 {
                self.eof = true;
                if self.carry.is_empty() {
                    return Ok(None);
                }
                // Input ended inside a multi-byte sequence.
                return Err(StreamError::Utf8 {
                    offset: self.offset,
                });
            }
            let valid = match std::str::from_utf8(&self.carry) {
                Ok(_) => self.carry.len(),
                Err(e) if e.error_len().is_none() => e.valid_up_to(),
                Err(e) => {
                    return Err(StreamError::Utf8 {
                        offset: self.offset + e.valid_up_to(),
                    })
                }
            };
            if valid == 0 {
                // Nothing complete yet; read more.
                continue;
            }
            let tail = self.carry.split_off(valid);
            let bytes = std::mem::replace(&mut self.carry, tail);
            self.offset += valid;
            return match String::from_utf8(bytes) {
                Ok(text) => Ok(Some(text)),
                // Unreachable: the prefix was validated just above.
                Err(e) => Err(StreamError::Utf8 {
                    offset: self.offset + e.utf8_error().valid_up_to(),
                }),
            };
        }
    }
}

fn read_retry<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// How a [`ReadSession::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The whole input was parsed.
    Complete,
    /// A hook paused the session; call [`ReadSession::resume`].
    Paused,
    /// A hook (or the caller) aborted the session.
    Aborted,
}

/// A streaming session over a [`Read`] source: reads chunks and feeds them
/// to the driver until the input is exhausted, a hook pauses, or a hook
/// aborts.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use dsv_core::ParseConfig;
/// use dsv_stream::{Hooks, ReadSession, SessionStatus};
///
/// let source = Cursor::new("a,b\n1,2\n");
/// let mut session = ReadSession::new(source, ParseConfig::new(), Hooks::new());
/// assert_eq!(session.run()?, SessionStatus::Complete);
/// assert_eq!(session.take_result().unwrap().data.len(), 2);
/// # Ok::<(), dsv_stream::StreamError>(())
/// ```
#[derive(Debug)]
pub struct ReadSession<'a, R: Read> {
    reader: ChunkReader<R>,
    driver: ChunkDriver<'a>,
}

impl<'a, R: Read> ReadSession<'a, R> {
    pub fn new(source: R, config: ParseConfig, hooks: Hooks<'a>) -> Self {
        Self {
            reader: ChunkReader::new(source),
            driver: ChunkDriver::new(config, hooks),
        }
    }

    pub fn with_chunk_size(source: R, chunk_size: usize, config: ParseConfig, hooks: Hooks<'a>) -> Self {
        Self {
            reader: ChunkReader::with_chunk_size(source, chunk_size),
            driver: ChunkDriver::new(config, hooks),
        }
    }

    /// Pump chunks until the session completes, pauses, or aborts. Reader
    /// errors (I/O, invalid UTF-8) are fatal and routed through the `error`
    /// hook like any other fatal error.
    pub fn run(&mut self) -> StreamResult<SessionStatus> {
        loop {
            match self.driver.status() {
                DriverStatus::Paused => return Ok(SessionStatus::Paused),
                DriverStatus::Aborted => return Ok(SessionStatus::Aborted),
                DriverStatus::Complete => return Ok(SessionStatus::Complete),
                DriverStatus::Ready => {}
            }
            let chunk = match self.reader.next_chunk() {
                Ok(chunk) => chunk,
                Err(e) => return Err(self.driver.fail(e)),
            };
            match chunk {
                Some(text) => {
                    self.driver.push_chunk(&text)?;
                }
                None => {
                    self.driver.finish()?;
                    match self.driver.status() {
                        DriverStatus::Paused => return Ok(SessionStatus::Paused),
                        DriverStatus::Aborted => return Ok(SessionStatus::Aborted),
                        _ => return Ok(SessionStatus::Complete),
                    }
                }
            }
        }
    }

    /// Resume a paused session and keep pumping.
    pub fn resume(&mut self) -> StreamResult<SessionStatus> {
        self.driver.resume()?;
        self.run()
    }

    /// Abort from outside a hook, then let [`run`](Self::run) (or the final
    /// result) reflect it.
    pub fn abort(&mut self) {
        self.driver.abort();
    }

    pub fn is_paused(&self) -> bool {
        self.driver.is_paused()
    }

    /// The final result, once the session completed or aborted.
    pub fn take_result(&mut self) -> Option<ParseResult> {
        self.driver.take_result()
    }
}

/// Parse everything from a [`Read`] source in one call, accumulating rows.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use dsv_core::ParseConfig;
/// use dsv_stream::parse_reader;
///
/// let result = parse_reader(Cursor::new("x;y\n1;2\n"), ParseConfig::new())?;
/// assert_eq!(result.meta.delimiter, ';');
/// assert_eq!(result.data.len(), 2);
/// # Ok::<(), dsv_stream::StreamError>(())
/// ```
pub fn parse_reader<R: Read>(source: R, config: ParseConfig) -> StreamResult<ParseResult> {
    let mut session = ReadSession::new(source, config, Hooks::new());
    session.run()?;
    Ok(session.take_result().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    // ==================== ChunkReader ====================

    #[test]
    fn test_reads_in_fixed_chunks() {
        let mut reader = ChunkReader::with_chunk_size(Cursor::new("abcdefgh"), 3);
        assert_eq!(reader.next_chunk().unwrap().as_deref(), Some("abc"));
        assert_eq!(reader.next_chunk().unwrap().as_deref(), Some("def"));
        assert_eq!(reader.next_chunk().unwrap().as_deref(), Some("gh"));
        assert_eq!(reader.next_chunk().unwrap(), None);
        assert_eq!(reader.next_chunk().unwrap(), None);
    }

    #[test]
    fn test_carries_split_multibyte_sequence() {
        // 'é' is two bytes; a 3-byte chunk cuts it in half.
        let mut reader = ChunkReader::with_chunk_size(Cursor::new("aaéb"), 3);
        assert_eq!(reader.next_chunk().unwrap().as_deref(), Some("aa"));
        assert_eq!(reader.next_chunk().unwrap().as_deref(), Some("éb"));
        assert_eq!(reader.next_chunk().unwrap(), None);
    }

    #[test]
    fn test_tiny_chunks_of_wide_chars() {
        // One-byte chunks over four-byte scalars.
        let input = "🎉🎈";
        let mut reader = ChunkReader::with_chunk_size(Cursor::new(input), 1);
        let mut out = String::new();
        while let Some(chunk) = reader.next_chunk().unwrap() {
            out.push_str(&chunk);
        }
        assert_eq!(out, input);
    }

    #[test]
    fn test_invalid_utf8_is_fatal() {
        let mut reader = ChunkReader::new(Cursor::new(&b"ab\xff"[..]));
        let err = reader.next_chunk().unwrap_err();
        assert!(matches!(err, StreamError::Utf8 { offset: 2 }));
    }

    #[test]
    fn test_truncated_sequence_at_eof_is_fatal() {
        // First byte of 'é' with no continuation.
        let mut reader = ChunkReader::new(Cursor::new(&b"ab\xc3"[..]));
        assert_eq!(reader.next_chunk().unwrap().as_deref(), Some("ab"));
        assert!(matches!(
            reader.next_chunk().unwrap_err(),
            StreamError::Utf8 { offset: 2 }
        ));
    }

    // ==================== Sessions ====================

    #[test]
    fn test_parse_reader_end_to_end() {
        let result =
            parse_reader(Cursor::new("a,b\n1,2\n3,4\n"), ParseConfig::new()).unwrap();
        assert_eq!(result.data.len(), 3);
        assert_eq!(result.meta.cursor, 12);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_small_chunks_keep_quoted_fields_whole() {
        let input = "a,\"b,\nc\"\nd,e\n";
        let expected = parse_reader(Cursor::new(input), ParseConfig::new().with_delimiter(','))
            .unwrap();
        for size in 1..input.len() {
            let mut session = ReadSession::with_chunk_size(
                Cursor::new(input),
                size,
                ParseConfig::new().with_delimiter(','),
                Hooks::new(),
            );
            session.run().unwrap();
            let result = session.take_result().unwrap();
            assert_eq!(result.data, expected.data, "chunk size {}", size);
            assert_eq!(result.errors, expected.errors, "chunk size {}", size);
        }
    }

    #[test]
    fn test_io_error_routed_to_error_hook() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "gone"))
            }
        }
        let reported = std::cell::RefCell::new(0usize);
        let hooks = Hooks::new().on_error(|_| *reported.borrow_mut() += 1);
        let mut session = ReadSession::new(Failing, ParseConfig::new(), hooks);
        let err = session.run().unwrap_err();
        assert!(matches!(err, StreamError::Io(_)));
        assert_eq!(*reported.borrow(), 1);
    }
}
