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

//! End-to-end streaming scenarios: files on disk, pause/resume across the
//! session API, and hook-driven flow control.

use std::cell::RefCell;
use std::io::{Cursor, Seek, SeekFrom, Write};

use dsv_core::{DynamicTyping, ParseConfig, SkipEmptyLines, Value};
use dsv_stream::{parse_reader, Hooks, ReadSession, SessionStatus};

fn temp_file_with(content: &str) -> std::fs::File {
    let mut file = tempfile::tempfile().expect("create temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file.seek(SeekFrom::Start(0)).expect("rewind temp file");
    file
}

#[test]
fn test_parse_file_with_headers_and_typing() {
    let file = temp_file_with("name,age,active\nida,35,true\nren,28,false\n");
    let config = ParseConfig::new()
        .with_header(true)
        .with_dynamic_typing(DynamicTyping::All);
    let result = parse_reader(file, config).unwrap();
    assert_eq!(result.data.len(), 2);
    assert_eq!(result.data[0].get_field("age"), Some(&Value::Int(35)));
    assert_eq!(result.data[1].get_field("active"), Some(&Value::Bool(false)));
    assert_eq!(result.meta.delimiter, ',');
    assert!(result.errors.is_empty());
}

#[test]
fn test_large_file_in_small_chunks() {
    let mut content = String::from("id,value\n");
    for i in 0..500 {
        content.push_str(&format!("{},\"row {}\"\n", i, i));
    }
    let file = temp_file_with(&content);
    let config = ParseConfig::new().with_header(true);
    let counted = RefCell::new(0usize);
    let hooks = Hooks::new().on_step(|payload, _| {
        *counted.borrow_mut() += 1;
        assert_eq!(payload.row.len(), 2);
        Ok(())
    });
    let mut session = ReadSession::with_chunk_size(file, 7, config, hooks);
    assert_eq!(session.run().unwrap(), SessionStatus::Complete);
    assert_eq!(*counted.borrow(), 500);
}

#[test]
fn test_pause_and_resume_through_session() {
    let rows = RefCell::new(Vec::new());
    let hooks = Hooks::new().on_step(|payload, control| {
        rows.borrow_mut()
            .push(payload.row.get(0).unwrap().as_str().unwrap().to_string());
        control.pause();
        Ok(())
    });
    let source = Cursor::new("a\nb\nc\n");
    let mut session = ReadSession::new(source, ParseConfig::new().with_delimiter(','), hooks);

    assert_eq!(session.run().unwrap(), SessionStatus::Paused);
    assert_eq!(*rows.borrow(), vec!["a"]);
    assert_eq!(session.resume().unwrap(), SessionStatus::Paused);
    assert_eq!(session.resume().unwrap(), SessionStatus::Paused);
    assert_eq!(session.resume().unwrap(), SessionStatus::Complete);
    assert_eq!(*rows.borrow(), vec!["a", "b", "c"]);
}

#[test]
fn test_abort_mid_stream() {
    let hooks = Hooks::new().on_step(|payload, control| {
        if payload.row.get(0).unwrap().as_str() == Some("b") {
            control.abort();
        }
        Ok(())
    });
    let source = Cursor::new("a\nb\nc\nd\n");
    let mut session = ReadSession::new(source, ParseConfig::new().with_delimiter(','), hooks);
    assert_eq!(session.run().unwrap(), SessionStatus::Aborted);
    let result = session.take_result().unwrap();
    assert!(result.meta.aborted);
}

#[test]
fn test_skip_empty_lines_greedy_stream() {
    let source = Cursor::new("a,b\n , \n\nc,d\n");
    let config = ParseConfig::new()
        .with_delimiter(',')
        .with_skip_empty_lines(SkipEmptyLines::Greedy);
    let result = parse_reader(source, config).unwrap();
    assert_eq!(result.data.len(), 2);
}

#[test]
fn test_comments_and_crlf_stream() {
    let source = Cursor::new("# generated\r\nx,y\r\n1,2\r\n");
    let config = ParseConfig::new().with_comments("#").with_header(true);
    let result = parse_reader(source, config).unwrap();
    assert_eq!(result.data.len(), 1);
    assert_eq!(result.data[0].get_field("x"), Some(&Value::String("1".into())));
    assert_eq!(result.meta.linebreak, dsv_core::Newline::CrLf);
}

#[test]
fn test_before_first_chunk_strips_preamble() {
    let hooks = Hooks::new().on_before_first_chunk(|text| {
        // Drop a non-tabular banner line before detection sees it.
        Ok(text.split_once('\n').map(|(_, rest)| rest.to_string()))
    });
    let source = Cursor::new("EXPORT v2;;;\na;b\n1;2\n");
    let mut session = ReadSession::new(source, ParseConfig::new(), hooks);
    assert_eq!(session.run().unwrap(), SessionStatus::Complete);
    let result = session.take_result().unwrap();
    assert_eq!(result.meta.delimiter, ';');
    assert_eq!(result.data.len(), 2);
}

#[test]
fn test_preview_on_file() {
    let file = temp_file_with("h1,h2\n1,2\n3,4\n5,6\n7,8\n");
    let config = ParseConfig::new().with_header(true).with_preview(2);
    let result = parse_reader(file, config).unwrap();
    assert_eq!(result.data.len(), 2);
    assert!(result.meta.truncated);
}
