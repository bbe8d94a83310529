//! Hand-written matchers for the transition tables.
//!
//! Each finder returns the leftmost match at or after `from`. Anchored
//! finders only match at offset 0 of the text they are given, which is
//! always the unconsumed remainder of a raw-text run.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Match {
    pub start: usize,
    pub end: usize,
    /// The interesting part of the match, e.g. a tag name or a quote.
    pub group: Option<Range<usize>>,
}

impl Match {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            group: None,
        }
    }

    pub fn with_group(mut self, group: Range<usize>) -> Self {
        self.group = Some(group);
        self
    }

    pub fn group<'t>(&self, text: &'t str) -> &'t str {
        self.group.clone().map_or("", |g| &text[g])
    }
}

pub(crate) type Finder = fn(&str, usize) -> Option<Match>;

/// Whitespace as regular-expression `\s` sees it.
pub(crate) fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}

pub(crate) fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

pub(crate) fn skip_spaces(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && is_space(bytes[i]) {
        i += 1;
    }
    i
}

/// Case-insensitive ASCII prefix test at `at`.
pub(crate) fn starts_with_ci(bytes: &[u8], at: usize, prefix: &[u8]) -> bool {
    bytes
        .get(at..at + prefix.len())
        .is_some_and(|s| s.eq_ignore_ascii_case(prefix))
}

/// Leftmost occurrence of a literal.
pub(crate) fn find_literal(text: &str, from: usize, literal: &str) -> Option<Match> {
    let start = from + text.get(from..)?.find(literal)?;
    Some(Match::new(start, start + literal.len()))
}

/// Leftmost byte from `set`.
pub(crate) fn find_any_byte(text: &str, from: usize, set: &[u8]) -> Option<Match> {
    let bytes = text.as_bytes();
    let start = from + bytes.get(from..)?.iter().position(|b| set.contains(b))?;
    Some(Match::new(start, start + 1))
}

/// Zero-width match at the end of the text.
pub(crate) fn find_end(text: &str, from: usize) -> Option<Match> {
    (from <= text.len()).then(|| Match::new(text.len(), text.len()))
}

/// Zero-width match at the start of the text.
pub(crate) fn find_start(_text: &str, from: usize) -> Option<Match> {
    (from == 0).then(|| Match::new(0, 0))
}

/// `\\(?:\r\n?|[\n\f<quote>])`: an escaped line break or quote.
pub(crate) fn find_css_escape(text: &str, from: usize, quote: u8) -> Option<Match> {
    let bytes = text.as_bytes();
    let mut i = from;
    while let Some(found) = memchr::memchr(b'\\', bytes.get(i..)?) {
        let start = i + found;
        match bytes.get(start + 1) {
            Some(b'\r') => {
                let end = if bytes.get(start + 2) == Some(&b'\n') {
                    start + 3
                } else {
                    start + 2
                };
                return Some(Match::new(start, end));
            }
            Some(&b) if b == b'\n' || b == 0x0C || b == quote => {
                return Some(Match::new(start, start + 2));
            }
            _ => i = start + 1,
        }
    }
    None
}

/// Length of a JS line terminator (`\r`, `\n`, U+2028, U+2029) at `i`.
pub(crate) fn js_line_break_len(bytes: &[u8], i: usize) -> Option<usize> {
    match bytes.get(i)? {
        b'\r' | b'\n' => Some(1),
        0xE2 if bytes.get(i + 1) == Some(&0x80)
            && matches!(bytes.get(i + 2), Some(0xA8 | 0xA9)) =>
        {
            Some(3)
        }
        _ => None,
    }
}

/// Length of the UTF-8 sequence starting at byte `i`.
pub(crate) fn char_len_at(text: &str, i: usize) -> usize {
    text[i..].chars().next().map_or(1, char::len_utf8)
}

/// `(?i)</<name>\b`: an end tag for `name`.
pub(crate) fn find_end_tag(text: &str, from: usize, name: &str) -> Option<Match> {
    let bytes = text.as_bytes();
    let mut i = from;
    while let Some(found) = memchr::memmem::find(bytes.get(i..)?, b"</") {
        let start = i + found;
        let name_end = start + 2 + name.len();
        if starts_with_ci(bytes, start + 2, name.as_bytes())
            && !bytes.get(name_end).copied().is_some_and(is_word)
        {
            return Some(Match::new(start, name_end));
        }
        i = start + 1;
    }
    None
}

/// Whether `</script` (any case) starts at `i`.
pub(crate) fn is_script_end_at(bytes: &[u8], i: usize) -> bool {
    bytes.get(i) == Some(&b'<') && starts_with_ci(bytes, i + 1, b"/script")
}
