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

use std::{collections::BTreeMap, fmt};

use serde_json::{Map, Value};
use snafu::ensure;

use crate::{
    error::{EmptyFieldsSnafu, Result},
    escape::escape_name,
    value::{FieldValue, Integer},
};

/// Tag set of a point. Iterates in ascending key order, which is the order
/// tags are written on the wire.
pub type Tags = BTreeMap<String, String>;

/// Field set of a point.
///
/// Unlike tags, fields keep the order they were inserted in. Inserting a key
/// that is already present replaces its value without moving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Vec<(String, FieldValue)>);

impl Fields {
    pub fn new() -> Self { Self::default() }

    /// Chaining form of [`Fields::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a field, returning the previous value if the key was present.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Builds a field set from a JSON object, keeping the object's key order.
    pub fn from_json(object: &Map<String, Value>) -> Result<Self> {
        let mut fields = Self::new();
        for (key, value) in object {
            fields.insert(key.as_str(), FieldValue::from_json(key, value)?);
        }
        Ok(fields)
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl<K: Into<String>, V: Into<FieldValue>, const N: usize> From<[(K, V); N]> for Fields {
    fn from(entries: [(K, V); N]) -> Self { entries.into_iter().collect() }
}

/// Name of the implicit field used when a bare value is written.
pub const DEFAULT_FIELD: &str = "value";

impl From<FieldValue> for Fields {
    fn from(value: FieldValue) -> Self { Self::new().with(DEFAULT_FIELD, value) }
}

impl From<f64> for Fields {
    fn from(value: f64) -> Self { FieldValue::from(value).into() }
}

impl From<Integer> for Fields {
    fn from(value: Integer) -> Self { FieldValue::from(value).into() }
}

/// Grouping key of a point: its measurement and tag set.
///
/// Two points with the same measurement and the same tags share a key no
/// matter what fields or timestamp they carry. Equality is structural, so
/// inputs that would render to the same text cannot be confused. `Display`
/// renders the escaped wire form, see [`encode_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    measurement: String,
    tags:        Vec<(String, String)>,
}

impl IdentityKey {
    pub fn new(measurement: impl Into<String>, tags: &Tags) -> Self {
        Self {
            measurement: measurement.into(),
            tags:        tags.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    pub fn measurement(&self) -> &str { &self.measurement }

    /// Tags in ascending key order.
    pub fn tags(&self) -> &[(String, String)] { &self.tags }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut key = String::new();
        write_key(
            &mut key,
            &self.measurement,
            self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );
        f.write_str(&key)
    }
}

fn write_key<'a>(
    out: &mut String,
    measurement: &str,
    tags: impl Iterator<Item = (&'a str, &'a str)>,
) {
    out.push_str(&escape_name(measurement));
    for (key, value) in tags {
        out.push(',');
        out.push_str(&escape_name(key));
        out.push('=');
        out.push_str(&escape_name(value));
    }
}

/// Renders the escaped measurement followed by the tags in ascending key
/// order.
pub fn encode_key(measurement: &str, tags: &Tags) -> String {
    let mut out = String::with_capacity(measurement.len() + tags.len() * 16);
    write_key(
        &mut out,
        measurement,
        tags.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    );
    out
}

/// Renders the field segment in insertion order. An empty field set renders
/// as an empty string; [`encode_line`] rejects it.
pub fn encode_fields(fields: &Fields) -> Result<String> {
    let mut out = String::new();
    write_fields(&mut out, fields)?;
    Ok(out)
}

fn write_fields(out: &mut String, fields: &Fields) -> Result<()> {
    for (i, (key, value)) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_name(key));
        out.push('=');
        value.encode_into(key, out)?;
    }
    Ok(())
}

/// Encodes one complete protocol line.
///
/// The timestamp segment is written only when `timestamp` is `Some`.
///
/// # Errors
/// Returns an `EncodeError` if `fields` is empty or a field value cannot be
/// encoded.
pub fn encode_line(
    measurement: &str,
    tags: &Tags,
    fields: &Fields,
    timestamp: Option<i64>,
) -> Result<String> {
    ensure!(!fields.is_empty(), EmptyFieldsSnafu { measurement });

    let mut line = encode_key(measurement, tags);
    line.push(' ');
    write_fields(&mut line, fields)?;
    if let Some(ts) = timestamp {
        line.push(' ');
        line.push_str(&ts.to_string());
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_case::test_case;

    use super::*;
    use crate::EncodeError;

    fn tags<const N: usize>(entries: [(&str, &str); N]) -> Tags {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn line(measurement: &str, tags: &Tags, fields: impl Into<Fields>, ts: Option<i64>) -> String {
        encode_line(measurement, tags, &fields.into(), ts).unwrap()
    }

    #[test]
    fn test_basic_line() {
        let t = tags([("m", "h")]);
        assert_eq!(line("t", &t, [("value", 1.0)], Some(0)), "t,m=h value=1 0");
    }

    #[test_case("a.b", "a.b v=1 0")]
    #[test_case("a.b.", "a.b. v=1 0")]
    #[test_case(".a.b", ".a.b v=1 0")]
    #[test_case("a,b", "a\\,b v=1 0")]
    #[test_case("a=b", "a\\=b v=1 0")]
    #[test_case("a b", "a\\ b v=1 0")]
    #[test_case(" ab", "\\ ab v=1 0")]
    #[test_case("ab ", "ab\\  v=1 0")]
    #[test_case(" ab ", "\\ ab\\  v=1 0")]
    #[test_case("   ", "\\ \\ \\  v=1 0")]
    fn test_measurement_escaping(measurement: &str, expected: &str) {
        assert_eq!(line(measurement, &Tags::new(), [("v", 1.0)], Some(0)), expected);
    }

    #[test_case("a,b", "m,a\\,b=1 v=1 0")]
    #[test_case("a=b", "m,a\\=b=1 v=1 0")]
    #[test_case("a b", "m,a\\ b=1 v=1 0")]
    #[test_case(" ab", "m,\\ ab=1 v=1 0")]
    #[test_case("ab ", "m,ab\\ =1 v=1 0")]
    #[test_case(" ab ", "m,\\ ab\\ =1 v=1 0")]
    #[test_case("   ", "m,\\ \\ \\ =1 v=1 0")]
    fn test_tag_key_escaping(key: &str, expected: &str) {
        assert_eq!(line("m", &tags([(key, "1")]), [("v", 1.0)], Some(0)), expected);
    }

    #[test_case("a,b", "m,t=a\\,b v=1 0")]
    #[test_case("a=b", "m,t=a\\=b v=1 0")]
    #[test_case("a b", "m,t=a\\ b v=1 0")]
    #[test_case(" ab", "m,t=\\ ab v=1 0")]
    #[test_case("ab ", "m,t=ab\\  v=1 0")]
    #[test_case(" ab ", "m,t=\\ ab\\  v=1 0")]
    #[test_case("   ", "m,t=\\ \\ \\  v=1 0")]
    fn test_tag_value_escaping(value: &str, expected: &str) {
        assert_eq!(line("m", &tags([("t", value)]), [("v", 1.0)], Some(0)), expected);
    }

    #[test_case("a,b", "m a\\,b=1 0")]
    #[test_case("a=b", "m a\\=b=1 0")]
    #[test_case("a b", "m a\\ b=1 0")]
    #[test_case(" ab", "m \\ ab=1 0")]
    #[test_case("ab ", "m ab\\ =1 0")]
    #[test_case(" ab ", "m \\ ab\\ =1 0")]
    #[test_case("   ", "m \\ \\ \\ =1 0")]
    fn test_field_key_escaping(key: &str, expected: &str) {
        assert_eq!(line("m", &Tags::new(), [(key, 1.0)], Some(0)), expected);
    }

    #[test]
    fn test_tags_sorted_regardless_of_insertion_order() {
        let mut t = Tags::new();
        for k in ["z", "a", "b", "c", "y", "x"] {
            t.insert(k.to_string(), "0".to_string());
        }
        assert_eq!(
            line("m", &t, [("v", 1.0)], Some(0)),
            "m,a=0,b=0,c=0,x=0,y=0,z=0 v=1 0"
        );
        assert_eq!(
            encode_key("m", &tags([("z", "0"), ("a", "0"), ("b", "0")])),
            encode_key("m", &tags([("a", "0"), ("b", "0"), ("z", "0")]))
        );
    }

    #[test]
    fn test_integer_tag_value_keeps_suffix() {
        let t = tags([("shard", &Integer::new(3).to_string())]);
        assert_eq!(encode_key("m", &t), "m,shard=3i");
    }

    #[test]
    fn test_fields_keep_insertion_order() {
        let fields = Fields::new()
            .with("z", 1.0)
            .with("a", Integer::new(2))
            .with("m", true)
            .with("b", "x");
        assert_eq!(encode_fields(&fields).unwrap(), "z=1,a=2i,m=t,b=\"x\"");
    }

    #[test]
    fn test_reinserting_field_keeps_position() {
        let mut fields = Fields::from([("a", 1.0), ("b", 2.0)]);
        let previous = fields.insert("a", 3.0);
        assert_eq!(previous, Some(FieldValue::Float(1.0)));
        assert_eq!(fields.len(), 2);
        assert_eq!(encode_fields(&fields).unwrap(), "a=3,b=2");
    }

    #[test_case(Some(0), "m v=1 0")]
    #[test_case(Some(1), "m v=1 1")]
    #[test_case(Some(1_700_000_000_000_000_000), "m v=1 1700000000000000000")]
    #[test_case(Some(-5), "m v=1 -5"; "pre epoch")]
    #[test_case(None, "m v=1"; "absent timestamp has no trailing space")]
    fn test_timestamp(ts: Option<i64>, expected: &str) {
        assert_eq!(line("m", &Tags::new(), [("v", 1.0)], ts), expected);
    }

    #[test]
    fn test_value_kinds() {
        assert_eq!(line("m", &Tags::new(), [("v", Integer::new(-1))], Some(0)), "m v=-1i 0");
        assert_eq!(line("m", &Tags::new(), [("v", true)], None), "m v=t");
        assert_eq!(line("m", &Tags::new(), [("v", false)], None), "m v=f");
        assert_eq!(line("m", &Tags::new(), [("v", "\"")], Some(0)), "m v=\"\\\"\" 0");
    }

    #[test]
    fn test_bare_value_uses_value_field() {
        assert_eq!(line("m", &Tags::new(), 0.0, Some(0)), "m value=0 0");
        assert_eq!(line("m", &Tags::new(), -1.0, Some(0)), "m value=-1 0");
        assert_eq!(line("m", &Tags::new(), Integer::new(5), None), "m value=5i");
    }

    #[test]
    fn test_empty_fields_rejected() {
        let err = encode_line("cpu", &Tags::new(), &Fields::new(), Some(0)).unwrap_err();
        assert_eq!(err, EncodeError::EmptyFields {
            measurement: "cpu".to_string(),
        });
        assert_eq!(encode_fields(&Fields::new()).unwrap(), "");
    }

    #[test]
    fn test_bad_value_fails_whole_line() {
        let fields = Fields::new().with("ok", 1.0).with("bad", f64::NAN);
        let err = encode_line("m", &Tags::new(), &fields, None).unwrap_err();
        assert!(matches!(err, EncodeError::NonFiniteFloat { ref field, .. } if field == "bad"));
    }

    #[test]
    fn test_identity_key() {
        let a = IdentityKey::new("m", &tags([("b", "2"), ("a", "1")]));
        let b = IdentityKey::new("m", &tags([("a", "1"), ("b", "2")]));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "m,a=1,b=2");
        assert_eq!(a.tags()[0], ("a".to_string(), "1".to_string()));
        assert_ne!(a, IdentityKey::new("m", &tags([("a", "1")])));
    }

    #[test]
    fn test_identity_keys_do_not_collide_on_rendered_text() {
        // Both render as `a\,b\=c` but describe different series.
        let with_tag = IdentityKey::new("a\\", &tags([("b\\", "c")]));
        let plain = IdentityKey::new("a,b=c", &Tags::new());
        assert_eq!(with_tag.to_string(), plain.to_string());
        assert_ne!(with_tag, plain);
    }

    #[test]
    fn test_fields_from_json_keeps_key_order() {
        let object = json!({"z": 1, "a": "x", "m": false});
        let fields = Fields::from_json(object.as_object().unwrap()).unwrap();
        assert_eq!(encode_fields(&fields).unwrap(), "z=1,a=\"x\",m=f");
    }

    #[test]
    fn test_fields_from_json_rejects_nested_values() {
        let object = json!({"ok": 1, "nested": {"x": 1}});
        let err = Fields::from_json(object.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, EncodeError::UnknownValueKind { ref field, .. } if field == "nested"));
    }
}
