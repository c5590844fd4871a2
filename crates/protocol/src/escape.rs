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

//! Escaping of reserved characters.
//!
//! Names (measurement, tag keys, tag values and field keys) reserve space,
//! comma and `=`. Quoted string field values reserve `"`. Every reserved
//! character is prefixed with a single backslash; everything else, including
//! multi-byte UTF-8 sequences and backslashes, passes through untouched.

use std::borrow::Cow;

/// Escapes a measurement name, tag key, tag value or field key.
pub fn escape_name(s: &str) -> Cow<'_, str> { escape_with(s, is_name_reserved) }

/// Escapes the body of a string field value (without the surrounding
/// quotes).
pub fn escape_string_value(s: &str) -> Cow<'_, str> { escape_with(s, |c| c == '"') }

fn is_name_reserved(c: char) -> bool { matches!(c, ' ' | ',' | '=') }

fn escape_with(s: &str, reserved: impl Fn(char) -> bool) -> Cow<'_, str> {
    let Some(first) = s.find(&reserved) else {
        return Cow::Borrowed(s);
    };

    let mut escaped = String::with_capacity(s.len() + 4);
    escaped.push_str(&s[..first]);
    for c in s[first..].chars() {
        if reserved(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    /// Drops the backslash in front of every reserved character.
    fn unescape(s: &str, reserved: impl Fn(char) -> bool) -> String {
        let mut out = String::with_capacity(s.len());
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\\' && chars.peek().copied().is_some_and(&reserved) {
                continue;
            }
            out.push(c);
        }
        out
    }

    #[test_case("a.b", "a.b"; "dots are not reserved")]
    #[test_case("a,b", "a\\,b"; "comma")]
    #[test_case("a=b", "a\\=b"; "equals")]
    #[test_case("a b", "a\\ b"; "inner space")]
    #[test_case(" ab", "\\ ab"; "leading space")]
    #[test_case("ab ", "ab\\ "; "trailing space")]
    #[test_case(" ab ", "\\ ab\\ "; "surrounding spaces")]
    #[test_case("   ", "\\ \\ \\ "; "only spaces")]
    #[test_case("", ""; "empty")]
    #[test_case("a\"b", "a\"b"; "quotes are kept in names")]
    #[test_case("grüße=ja", "grüße\\=ja"; "utf8 passes through")]
    fn test_escape_name(input: &str, expected: &str) {
        assert_eq!(escape_name(input), expected);
    }

    #[test_case("", ""; "empty")]
    #[test_case("f", "f"; "plain")]
    #[test_case(" ", " "; "spaces are kept")]
    #[test_case("a,b=c", "a,b=c"; "name reserved characters are kept")]
    #[test_case("\"", "\\\""; "single quote char")]
    #[test_case("\\\"", "\\\\\""; "already backslashed")]
    #[test_case("say \"hi\"", "say \\\"hi\\\""; "two quotes")]
    fn test_escape_string_value(input: &str, expected: &str) {
        assert_eq!(escape_string_value(input), expected);
    }

    #[test]
    fn test_no_allocation_without_reserved_characters() {
        assert!(matches!(escape_name("cpu_load"), Cow::Borrowed(_)));
        assert!(matches!(escape_string_value("no quotes"), Cow::Borrowed(_)));
        assert!(matches!(escape_name("cpu load"), Cow::Owned(_)));
    }

    #[test]
    fn test_every_reserved_character_gets_one_backslash() {
        let inputs = ["a b,c=d", " , = ", "x==y", ",,,", "tab\tand space "];
        for input in inputs {
            let escaped = escape_name(input);
            let reserved = input.chars().filter(|c| is_name_reserved(*c)).count();
            let backslashes = escaped.matches('\\').count();
            assert_eq!(backslashes, reserved, "input {input:?}");
            assert_eq!(unescape(&escaped, is_name_reserved), input);
        }
    }

    #[test]
    fn test_string_value_unescape_recovers_original() {
        for input in ["\"", "a\"b\"c", "\"\"", "plain"] {
            let escaped = escape_string_value(input);
            assert_eq!(unescape(&escaped, |c| c == '"'), input);
        }
    }
}
