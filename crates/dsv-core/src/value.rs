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

//! Field value and row types.

use std::fmt;

/// A field value.
///
/// Without dynamic typing every field is [`Value::String`]. With dynamic
/// typing enabled, fields matching the strict literal grammars in
/// [`crate::typing`] are cast to `Int`/`Float`/`Bool`, and empty fields
/// become `Null`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Empty field under dynamic typing.
    Null,
    /// Boolean value (true/false).
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// String value.
    String(String),
}

impl Value {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get the value as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as a float.
    ///
    /// Integers widen losslessly where possible.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Try to get the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// One logical record.
///
/// Rows are plain ordered field lists unless the session has `header`
/// enabled, in which case every data row is keyed by header name. Pair
/// order equals header order; duplicate header names are disambiguated
/// at header-capture time (`name`, `name_1`, `name_2`, ...).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Row {
    /// Ordered field values (no header).
    Fields(Vec<Value>),
    /// Header-keyed record, in header order.
    Record(Vec<(String, Value)>),
}

impl Row {
    /// Number of fields in this row.
    pub fn len(&self) -> usize {
        match self {
            Self::Fields(v) => v.len(),
            Self::Record(v) => v.len(),
        }
    }

    /// Returns true if this row carries no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Field by positional index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        match self {
            Self::Fields(v) => v.get(index),
            Self::Record(v) => v.get(index).map(|(_, value)| value),
        }
    }

    /// Field by header name. Always `None` for positional rows.
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Fields(_) => None,
            Self::Record(v) => v
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value),
        }
    }

    /// Iterator over field values, ignoring keys.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        match self {
            Self::Fields(v) => ValuesIter::Fields(v.iter()),
            Self::Record(v) => ValuesIter::Record(v.iter()),
        }
    }
}

enum ValuesIter<'a> {
    Fields(std::slice::Iter<'a, Value>),
    Record(std::slice::Iter<'a, (String, Value)>),
}

impl<'a> Iterator for ValuesIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Fields(it) => it.next(),
            Self::Record(it) => it.next().map(|(_, value)| value),
        }
    }
}
