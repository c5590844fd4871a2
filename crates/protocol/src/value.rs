// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Write as _;

use serde_json::Value;
use snafu::ensure;

use crate::{
    error::{NonFiniteFloatSnafu, Result, UnknownValueKindSnafu},
    escape::escape_string_value,
};

/// A signed integer field value.
///
/// Numbers are sent as floats unless wrapped in `Integer`, which is written
/// with the `i` suffix so the database stores it as an integer. The value is
/// kept as 32 bits; wider inputs wrap around.
///
/// Its `Display` form carries the suffix, so it can also be used as a tag
/// value via `to_string()`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
)]
#[display("{_0}i")]
pub struct Integer(i32);

impl Integer {
    /// Wraps `n`, truncating it to 32 bits.
    pub fn new(n: i64) -> Self { Self(n as i32) }

    pub fn value(self) -> i32 { self.0 }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(Integer),
    Bool(bool),
    Text(String),
}

impl FieldValue {
    /// Converts a dynamically typed JSON value.
    ///
    /// Numbers become floats. `null`, arrays and objects have no line
    /// protocol representation and are rejected.
    pub fn from_json(field: &str, value: &Value) -> Result<Self> {
        let kind = match value {
            Value::Bool(b) => return Ok(Self::Bool(*b)),
            Value::String(s) => return Ok(Self::Text(s.clone())),
            Value::Number(n) => match n.as_f64() {
                Some(f) => return Ok(Self::Float(f)),
                None => "number",
            },
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        };
        UnknownValueKindSnafu { field, kind }.fail()
    }

    /// Short name of the variant, used in logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Integer(_) => "integer",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
        }
    }

    /// Returns the textual encoding of this value. `field` is only used to
    /// label errors.
    pub fn encode(&self, field: &str) -> Result<String> {
        let mut out = String::new();
        self.encode_into(field, &mut out)?;
        Ok(out)
    }

    /// Appends the textual encoding to `out`. Nothing is appended on error.
    pub fn encode_into(&self, field: &str, out: &mut String) -> Result<()> {
        match self {
            Self::Float(v) => {
                ensure!(v.is_finite(), NonFiniteFloatSnafu { field, value: *v });
                // -0 has no meaning for the database, write it as 0.
                if *v == 0.0 {
                    out.push('0');
                } else {
                    write_float(out, *v);
                }
            }
            Self::Integer(i) => {
                let _ = write!(out, "{i}");
            }
            Self::Bool(true) => out.push('t'),
            Self::Bool(false) => out.push('f'),
            Self::Text(s) => {
                out.push('"');
                out.push_str(&escape_string_value(s));
                out.push('"');
            }
        }
        Ok(())
    }
}

/// Shortest round-trip digits, switching to exponent notation for
/// magnitudes of at least `1e21` or below `1e-6`.
fn write_float(out: &mut String, v: f64) {
    let scientific = format!("{v:e}");
    match scientific
        .split_once('e')
        .map(|(mantissa, exp)| (mantissa, exp.parse::<i32>()))
    {
        Some((mantissa, Ok(exp))) if exp >= 21 => {
            let _ = write!(out, "{mantissa}e+{exp}");
        }
        Some((_, Ok(exp))) if exp <= -7 => out.push_str(&scientific),
        _ => {
            let _ = write!(out, "{v}");
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self { Self::Float(v) }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self { Self::Float(f64::from(v)) }
}

impl From<Integer> for FieldValue {
    fn from(v: Integer) -> Self { Self::Integer(v) }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self { Self::Bool(v) }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self { Self::Text(v) }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self { Self::Text(v.to_string()) }
}
