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

//! Dynamic typing: strict literal grammars for best-effort field casting.
//!
//! Casting is an explicit grammar check, not a general coercion attempt:
//! `str::parse` alone would accept forms like `+1`, `1e5` as an integer
//! prefix, `inf`, or locale-independent oddities that a CSV consumer does
//! not expect to silently become numbers. The grammars here are:
//!
//! - integer: `-? (0 | [1-9][0-9]*)`, must fit `i64`
//! - float:   `-? [0-9]+ ('.' [0-9]+)? ([eE] [+-]? [0-9]+)?`, requiring a
//!   fractional part or exponent (otherwise it is an integer), no leading
//!   zeros in the integer part, never `inf`/`nan`/hex
//! - boolean: exactly `true` or `false`
//! - the empty string becomes [`Value::Null`]
//!
//! Anything else stays a string.

use crate::value::Value;

/// Cast one field through the strict literal grammars.
///
/// # Examples
///
/// ```
/// use dsv_core::{typing::cast, Value};
///
/// assert_eq!(cast("42"), Value::Int(42));
/// assert_eq!(cast("-1.25"), Value::Float(-1.25));
/// assert_eq!(cast("true"), Value::Bool(true));
/// assert_eq!(cast(""), Value::Null);
/// assert_eq!(cast("007"), Value::String("007".to_string()));
/// assert_eq!(cast("+1"), Value::String("+1".to_string()));
/// ```
pub fn cast(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    if field == "true" {
        return Value::Bool(true);
    }
    if field == "false" {
        return Value::Bool(false);
    }
    if is_integer_literal(field) {
        // Grammar-valid but overflowing integers degrade to Float.
        if let Ok(n) = field.parse::<i64>() {
            return Value::Int(n);
        }
        if let Ok(f) = field.parse::<f64>() {
            return Value::Float(f);
        }
    }
    if is_float_literal(field) {
        if let Ok(f) = field.parse::<f64>() {
            return Value::Float(f);
        }
    }
    Value::String(field.to_string())
}

/// `-? (0 | [1-9][0-9]*)`
fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    match digits.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'0', ..] => false,
        bytes => bytes.iter().all(u8::is_ascii_digit),
    }
}

/// `-? int ('.' [0-9]+)? ([eE] [+-]? [0-9]+)?` with a mandatory fractional
/// part or exponent and no leading zeros in the integer part.
fn is_float_literal(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    let bytes = s.as_bytes();

    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    // Integer part is mandatory and may not have leading zeros.
    if i == 0 || (bytes[0] == b'0' && i > 1) {
        return false;
    }

    let mut saw_fraction = false;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false; // "1." has no fractional digits
        }
        saw_fraction = true;
    }

    let mut saw_exponent = false;
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
        saw_exponent = true;
    }

    i == bytes.len() && (saw_fraction || saw_exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Integer casting ====================

    #[test]
    fn test_cast_integers() {
        assert_eq!(cast("0"), Value::Int(0));
        assert_eq!(cast("7"), Value::Int(7));
        assert_eq!(cast("-12"), Value::Int(-12));
        assert_eq!(cast("9223372036854775807"), Value::Int(i64::MAX));
    }

    #[test]
    fn test_cast_integer_overflow_degrades_to_float() {
        assert_eq!(
            cast("9223372036854775808"),
            Value::Float(9.223372036854776e18)
        );
    }

    #[test]
    fn test_cast_rejects_loose_integer_forms() {
        assert_eq!(cast("+1"), Value::String("+1".to_string()));
        assert_eq!(cast("007"), Value::String("007".to_string()));
        assert_eq!(cast("0x1f"), Value::String("0x1f".to_string()));
        assert_eq!(cast("1_000"), Value::String("1_000".to_string()));
        assert_eq!(cast("-"), Value::String("-".to_string()));
        assert_eq!(cast("- 1"), Value::String("- 1".to_string()));
    }

    // ==================== Float casting ====================

    #[test]
    fn test_cast_floats() {
        assert_eq!(cast("1.5"), Value::Float(1.5));
        assert_eq!(cast("-0.25"), Value::Float(-0.25));
        assert_eq!(cast("2e10"), Value::Float(2e10));
        assert_eq!(cast("3.5E-2"), Value::Float(3.5e-2));
        assert_eq!(cast("0.5"), Value::Float(0.5));
    }

    #[test]
    fn test_cast_rejects_loose_float_forms() {
        assert_eq!(cast("1."), Value::String("1.".to_string()));
        assert_eq!(cast(".5"), Value::String(".5".to_string()));
        assert_eq!(cast("1e"), Value::String("1e".to_string()));
        assert_eq!(cast("1e+"), Value::String("1e+".to_string()));
        assert_eq!(cast("inf"), Value::String("inf".to_string()));
        assert_eq!(cast("NaN"), Value::String("NaN".to_string()));
        assert_eq!(cast("1,5"), Value::String("1,5".to_string()));
        assert_eq!(cast("01.5"), Value::String("01.5".to_string()));
    }

    // ==================== Booleans, null, strings ====================

    #[test]
    fn test_cast_booleans_case_sensitive() {
        assert_eq!(cast("true"), Value::Bool(true));
        assert_eq!(cast("false"), Value::Bool(false));
        assert_eq!(cast("True"), Value::String("True".to_string()));
        assert_eq!(cast("FALSE"), Value::String("FALSE".to_string()));
    }

    #[test]
    fn test_cast_empty_is_null() {
        assert_eq!(cast(""), Value::Null);
    }

    #[test]
    fn test_cast_whitespace_stays_string() {
        assert_eq!(cast(" 1"), Value::String(" 1".to_string()));
        assert_eq!(cast("1 "), Value::String("1 ".to_string()));
        assert_eq!(cast(" "), Value::String(" ".to_string()));
    }
}
