//! Line-oriented `key=value` properties parsing.
//!
//! Follows the Java `.properties` conventions that matter for hand-written
//! config files: `=`, `:` or whitespace separators, `#`/`!` comments,
//! backslash line continuation and the usual escapes including `\uXXXX`.

use crate::PlatformError;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::str::Chars;

const WHITESPACE: [char; 3] = [' ', '\t', '\u{c}'];
const HIGH_SURROGATES: RangeInclusive<u16> = 0xD800..=0xDBFF;

/// Flat string-to-string mapping, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse properties text.
    ///
    /// Later duplicates of a key replace earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::InvalidInput`] for a malformed `\u` escape
    /// or a surrogate escape that does not form a pair.
    pub fn parse(input: &str) -> Result<Self, PlatformError> {
        let mut entries = BTreeMap::new();
        for (line_no, line) in logical_lines(input) {
            let (key, value) = split_entry(&line);
            entries.insert(unescape(key, line_no)?, unescape(value, line_no)?);
        }
        Ok(Self { entries })
    }

    /// Parse properties from raw bytes, which must be UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::InvalidInput`] if the bytes are not UTF-8 or
    /// the text fails to parse.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PlatformError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| PlatformError::invalid_input(format!("properties are not UTF-8: {e}")))?;
        Self::parse(text)
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Look up a value, treating blank values as absent.
    #[must_use]
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Insert or replace a value, returning the previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Join continued lines and drop comments and blanks.
///
/// Each logical line carries the number of the physical line it started on.
fn logical_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in physical_lines(input).enumerate() {
        let stripped = raw.trim_start_matches(WHITESPACE);
        let (start, mut buf) = match pending.take() {
            Some(open) => open,
            None => {
                if stripped.is_empty() || stripped.starts_with(['#', '!']) {
                    continue;
                }
                (idx + 1, String::new())
            }
        };

        if has_continuation(stripped) {
            buf.push_str(&stripped[..stripped.len() - 1]);
            pending = Some((start, buf));
        } else {
            buf.push_str(stripped);
            lines.push((start, buf));
        }
    }

    if let Some(open) = pending {
        lines.push(open);
    }
    lines
}

/// Split on `\n`, `\r` or `\r\n`.
fn physical_lines(input: &str) -> impl Iterator<Item = &str> {
    let mut rest = input;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let line = match rest.find(['\r', '\n']) {
            Some(end) => {
                let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                let line = &rest[..end];
                rest = &rest[end + terminator..];
                line
            }
            None => std::mem::take(&mut rest),
        };
        Some(line)
    })
}

/// An odd run of trailing backslashes continues the line.
fn has_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\u{c}' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let rest = line[key_end..].trim_start_matches(WHITESPACE);
    let value = rest
        .strip_prefix(['=', ':'])
        .map_or(rest, |r| r.trim_start_matches(WHITESPACE));
    (&line[..key_end], value)
}

fn unescape(raw: &str, line_no: usize) -> Result<String, PlatformError> {
    if !raw.contains('\\') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => out.push(unicode_escape(&mut chars, line_no)?),
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

/// Decode the code unit after `\u`, pairing a high surrogate with the
/// `\uXXXX` low surrogate that must follow it.
fn unicode_escape(chars: &mut Chars<'_>, line_no: usize) -> Result<char, PlatformError> {
    let first = code_unit(chars, line_no)?;
    let second = if HIGH_SURROGATES.contains(&first) {
        if chars.next() != Some('\\') || chars.next() != Some('u') {
            return Err(unpaired(first, line_no));
        }
        Some(code_unit(chars, line_no)?)
    } else {
        None
    };

    char::decode_utf16(std::iter::once(first).chain(second))
        .next()
        .and_then(Result::ok)
        .ok_or_else(|| unpaired(first, line_no))
}

fn code_unit(chars: &mut Chars<'_>, line_no: usize) -> Result<u16, PlatformError> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() == 4 && hex.chars().all(|h| h.is_ascii_hexdigit()) {
        if let Ok(unit) = u16::from_str_radix(&hex, 16) {
            return Ok(unit);
        }
    }
    Err(PlatformError::invalid_input(format!(
        "malformed \\u{hex} escape on line {line_no}"
    )))
}

fn unpaired(unit: u16, line_no: usize) -> PlatformError {
    PlatformError::invalid_input(format!(
        "unpaired surrogate \\u{unit:04X} on line {line_no}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_separators() {
        let props = Properties::parse("a=1\nb: 2\nc 3\nd = 4\ne\t:\t5").unwrap();
        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
        assert_eq!(props.get("c"), Some("3"));
        assert_eq!(props.get("d"), Some("4"));
        assert_eq!(props.get("e"), Some("5"));
        assert_eq!(props.len(), 5);
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let text = "# comment\n! also comment\n\n   \nvault.gateway=https://vault:8200\n";
        let props = Properties::parse(text).unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("vault.gateway"), Some("https://vault:8200"));
    }

    #[test]
    fn test_value_keeps_separators_after_first() {
        let props = Properties::parse("url=https://host:8200/a=b").unwrap();
        assert_eq!(props.get("url"), Some("https://host:8200/a=b"));
    }

    #[test]
    fn test_line_continuation() {
        let text = "key=first \\\n    second \\\n    third\nother=x";
        let props = Properties::parse(text).unwrap();
        assert_eq!(props.get("key"), Some("first second third"));
        assert_eq!(props.get("other"), Some("x"));
    }

    #[test]
    fn test_escaped_backslash_is_not_continuation() {
        let props = Properties::parse("path=C:\\\\dir\\\\\nnext=1").unwrap();
        assert_eq!(props.get("path"), Some("C:\\dir\\"));
        assert_eq!(props.get("next"), Some("1"));
    }

    #[test]
    fn test_escapes() {
        let props = Properties::parse("my\\ key=tab\\there\nu=\\u0041\\u00e9\neq\\=k=v").unwrap();
        assert_eq!(props.get("my key"), Some("tab\there"));
        assert_eq!(props.get("u"), Some("Aé"));
        assert_eq!(props.get("eq=k"), Some("v"));
    }

    #[test]
    fn test_malformed_unicode_escape() {
        let err = Properties::parse("ok=1\nbad=\\u12G4").unwrap_err();
        assert!(matches!(err, PlatformError::InvalidInput(_)));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let props = Properties::parse("k=1\nk=2").unwrap();
        assert_eq!(props.get("k"), Some("2"));
    }

    #[test]
    fn test_crlf_line_endings() {
        let props = Properties::parse("a=1\r\nb=2\r\n").unwrap();
        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
    }

    #[test]
    fn test_bare_cr_line_endings() {
        let props = Properties::parse("a=1\rb=2\r").unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
    }

    #[test]
    fn test_mixed_line_endings_with_continuation() {
        let text = "# header\r\nkey=one \\\r  two\n\rnext=3\r\nbad=\\u12G4";
        let err = Properties::parse(text).unwrap_err();
        assert!(err.to_string().contains("line 6"));

        let props = Properties::parse(text.trim_end_matches("\r\nbad=\\u12G4")).unwrap();
        assert_eq!(props.get("key"), Some("one two"));
        assert_eq!(props.get("next"), Some("3"));
    }

    #[test]
    fn test_surrogate_pair_escape() {
        let props = Properties::parse("emoji=\\uD83D\\uDE00\nmixed=a\\ud83d\\ude80b").unwrap();
        assert_eq!(props.get("emoji"), Some("\u{1F600}"));
        assert_eq!(props.get("mixed"), Some("a\u{1F680}b"));
    }

    #[test]
    fn test_unpaired_surrogate_escape() {
        for text in ["k=\\uD83D", "k=\\uD83Dx", "k=\\uD83D\\u0041", "k=\\uDE00"] {
            let err = Properties::parse(text).unwrap_err();
            assert!(matches!(err, PlatformError::InvalidInput(_)), "{text}");
        }
    }

    #[test]
    fn test_key_without_value() {
        let props = Properties::parse("empty\nempty2=").unwrap();
        assert_eq!(props.get("empty"), Some(""));
        assert_eq!(props.get_non_empty("empty2"), None);
    }

    #[test]
    fn test_from_bytes_rejects_invalid_utf8() {
        let err = Properties::from_bytes(&[b'a', b'=', 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, PlatformError::InvalidInput(_)));
    }

    #[test]
    fn test_set_remove_and_collect() {
        let mut props: Properties = [("user", "app"), ("password", "cipher")].into_iter().collect();
        assert_eq!(props.set("password", "plain"), Some("cipher".to_string()));
        assert_eq!(props.get("password"), Some("plain"));
        assert_eq!(props.remove("user"), Some("app".to_string()));
        assert_eq!(props.iter().collect::<Vec<_>>(), vec![("password", "plain")]);
        assert!(!props.is_empty());
    }
}
