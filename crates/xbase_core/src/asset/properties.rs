//! Line-oriented `key=value` configuration format.
//!
//! Supports the platform properties syntax: `#`/`!` comments, `=`, `:` or
//! whitespace separators, backslash line continuation and `\uXXXX` escapes.

use serde::Serialize;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Flat string-to-string mapping materialized from one properties file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns the value for `key`, or `default` when absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Inserts one entry, returning the replaced value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.entries.iter()
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Malformed properties content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertiesError {
    /// `\u` escape not followed by four hex digits.
    MalformedUnicodeEscape { line: usize },
    /// `\uXXXX` escape naming a lone surrogate.
    InvalidCodePoint { line: usize, code: u32 },
}

impl Display for PropertiesError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedUnicodeEscape { line } => {
                write!(f, "malformed \\uxxxx escape on line {line}")
            }
            Self::InvalidCodePoint { line, code } => {
                write!(f, "invalid code point U+{code:04X} on line {line}")
            }
        }
    }
}

impl Error for PropertiesError {}

/// Parses properties text. Later duplicate keys replace earlier ones.
pub fn parse_properties(input: &str) -> Result<Properties, PropertiesError> {
    let mut properties = Properties::new();
    for logical in logical_lines(input) {
        let (key, value) = split_entry(&logical.chars);
        let key = unescape(key, logical.line)?;
        let value = unescape(value, logical.line)?;
        properties.set(key, value);
    }
    Ok(properties)
}

struct LogicalLine {
    /// 1-based number of the first natural line.
    line: usize,
    chars: Vec<char>,
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

fn natural_lines(input: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = input.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'\n' => {
                lines.push(&input[start..index]);
                start = index + 1;
            }
            b'\r' => {
                lines.push(&input[start..index]);
                if bytes.get(index + 1) == Some(&b'\n') {
                    index += 1;
                }
                start = index + 1;
            }
            _ => {}
        }
        index += 1;
    }
    if start < input.len() {
        lines.push(&input[start..]);
    }
    lines
}

fn logical_lines(input: &str) -> Vec<LogicalLine> {
    let mut result = Vec::new();
    let mut current: Option<LogicalLine> = None;

    for (index, raw) in natural_lines(input).into_iter().enumerate() {
        let stripped = raw.trim_start_matches(is_blank);
        let mut chars: Vec<char> = match current {
            Some(_) => stripped.chars().collect(),
            None => {
                if stripped.is_empty() || stripped.starts_with(['#', '!']) {
                    continue;
                }
                stripped.chars().collect()
            }
        };

        let trailing_backslashes = chars.iter().rev().take_while(|c| **c == '\\').count();
        let continues = trailing_backslashes % 2 == 1;
        if continues {
            chars.pop();
        }

        let line = current.get_or_insert_with(|| LogicalLine {
            line: index + 1,
            chars: Vec::new(),
        });
        line.chars.extend(chars);

        if !continues {
            if let Some(done) = current.take() {
                result.push(done);
            }
        }
    }

    // A continuation on the final line still yields its entry.
    if let Some(done) = current.take() {
        result.push(done);
    }
    result
}

fn split_entry(chars: &[char]) -> (&[char], &[char]) {
    let mut key_len = 0;
    let mut value_start = chars.len();
    let mut has_separator = false;
    let mut preceding_backslash = false;

    while key_len < chars.len() {
        let c = chars[key_len];
        if (c == '=' || c == ':') && !preceding_backslash {
            value_start = key_len + 1;
            has_separator = true;
            break;
        }
        if is_blank(c) && !preceding_backslash {
            value_start = key_len + 1;
            break;
        }
        preceding_backslash = c == '\\' && !preceding_backslash;
        key_len += 1;
    }

    while value_start < chars.len() {
        let c = chars[value_start];
        if !is_blank(c) {
            if !has_separator && (c == '=' || c == ':') {
                has_separator = true;
            } else {
                break;
            }
        }
        value_start += 1;
    }

    (&chars[..key_len], &chars[value_start.min(chars.len())..])
}

fn unescape(chars: &[char], line: usize) -> Result<String, PropertiesError> {
    let mut out = String::with_capacity(chars.len());
    let mut index = 0;
    while index < chars.len() {
        let c = chars[index];
        index += 1;
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(&escaped) = chars.get(index) else {
            break;
        };
        index += 1;
        match escaped {
            'u' => {
                let digits = chars
                    .get(index..index + 4)
                    .ok_or(PropertiesError::MalformedUnicodeEscape { line })?;
                let mut code = 0u32;
                for digit in digits {
                    let value = digit
                        .to_digit(16)
                        .ok_or(PropertiesError::MalformedUnicodeEscape { line })?;
                    code = (code << 4) | value;
                }
                index += 4;
                out.push(decode_code_unit(code, chars, &mut index, line)?);
            }
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'n' => out.push('\n'),
            'f' => out.push('\x0c'),
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Decodes one `\uXXXX` unit, pairing a high surrogate with a following
/// `\uXXXX` low surrogate when present.
fn decode_code_unit(
    code: u32,
    chars: &[char],
    index: &mut usize,
    line: usize,
) -> Result<char, PropertiesError> {
    if (0xD800..0xDC00).contains(&code) {
        let low = chars
            .get(*index..*index + 6)
            .filter(|window| window[0] == '\\' && window[1] == 'u')
            .and_then(|window| {
                window[2..]
                    .iter()
                    .try_fold(0u32, |acc, c| c.to_digit(16).map(|d| (acc << 4) | d))
            })
            .filter(|low| (0xDC00..0xE000).contains(low));
        if let Some(low) = low {
            *index += 6;
            let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
            return char::from_u32(combined)
                .ok_or(PropertiesError::InvalidCodePoint { line, code });
        }
    }
    char::from_u32(code).ok_or(PropertiesError::InvalidCodePoint { line, code })
}

#[cfg(test)]
mod tests {
    use super::{parse_properties, PropertiesError};
    use std::collections::BTreeMap;

    #[test]
    fn parses_all_separator_styles() {
        let props = parse_properties("a=1\nb:2\nc 3\nd = 4\ne\t:\t5\nf\n").unwrap();
        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
        assert_eq!(props.get("c"), Some("3"));
        assert_eq!(props.get("d"), Some("4"));
        assert_eq!(props.get("e"), Some("5"));
        assert_eq!(props.get("f"), Some(""));
        assert_eq!(props.len(), 6);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let props = parse_properties("# comment\n  ! other\n\n   \nkey=value\n").unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("key"), Some("value"));
    }

    #[test]
    fn joins_continuation_lines() {
        let props =
            parse_properties("fruits = apple, \\\n         banana, \\\r\n   pear\nnext=1").unwrap();
        assert_eq!(props.get("fruits"), Some("apple, banana, pear"));
        assert_eq!(props.get("next"), Some("1"));
    }

    #[test]
    fn even_backslashes_do_not_continue() {
        let props = parse_properties("path=c:\\\\\nother=x").unwrap();
        assert_eq!(props.get("path"), Some("c:\\"));
        assert_eq!(props.get("other"), Some("x"));
    }

    #[test]
    fn unescapes_keys_and_values() {
        let props =
            parse_properties("key\\ with\\=sep = tab\\there\nuni=\\u4e2d\\u6587\nemoji=\\ud83c\\udf4e")
                .unwrap();
        assert_eq!(props.get("key with=sep"), Some("tab\there"));
        assert_eq!(props.get("uni"), Some("中文"));
        assert_eq!(props.get("emoji"), Some("🍎"));
    }

    #[test]
    fn later_duplicates_win() {
        let props = parse_properties("a=1\na=2\r").unwrap();
        assert_eq!(props.get("a"), Some("2"));
    }

    #[test]
    fn rejects_malformed_unicode_escape() {
        let err = parse_properties("ok=1\nbad=\\u12G4").unwrap_err();
        assert_eq!(err, PropertiesError::MalformedUnicodeEscape { line: 2 });

        let err = parse_properties("short=\\u12").unwrap_err();
        assert_eq!(err, PropertiesError::MalformedUnicodeEscape { line: 1 });
    }

    #[test]
    fn rejects_lone_surrogate() {
        let err = parse_properties("x=\\ud800").unwrap_err();
        assert_eq!(
            err,
            PropertiesError::InvalidCodePoint {
                line: 1,
                code: 0xD800
            }
        );
    }

    #[test]
    fn lookups_and_iteration_follow_key_order() {
        let props = parse_properties("zeta=last\nalpha=first\nempty=\n").unwrap();

        assert_eq!(props.get_or("alpha", "x"), "first");
        assert_eq!(props.get_or("empty", "x"), "");
        assert_eq!(props.get_or("missing", "fallback"), "fallback");
        assert!(props.contains_key("empty"));
        assert!(!props.contains_key("missing"));

        let keys: Vec<&str> = props.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, ["alpha", "empty", "zeta"]);

        let mut collected = BTreeMap::new();
        for (key, value) in &props {
            collected.insert(key.clone(), value.clone());
        }
        assert_eq!(collected, props.clone().into_map());
    }

    #[test]
    fn serializes_as_flat_object() {
        let props = parse_properties("b=2\na=1\nname=xbase\n").unwrap();
        assert_eq!(
            serde_json::to_value(&props).unwrap(),
            serde_json::json!({"a": "1", "b": "2", "name": "xbase"})
        );
    }
}
