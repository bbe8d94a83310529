//! HTML entity decoding for attribute values.
//!
//! Attribute values are decoded by the browser before the embedded grammar
//! sees them, so `onclick="alert(&quot;x&quot;)"` contains a JS string and
//! `href="javascript&colon;..."` names a scheme.

/// Text with character references replaced, plus where each decoded byte
/// came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    /// `offsets[i]` is the encoded offset of decoded byte `i`; the extra
    /// last entry is the encoded length.
    offsets: Vec<usize>,
}

impl Decoded {
    /// Encoded offset of a decoded offset (`0..=text.len()`).
    pub fn encoded_offset(&self, decoded: usize) -> usize {
        self.offsets[decoded]
    }
}

const NAMED: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{00A0}'),
    ("colon", ':'),
    ("sol", '/'),
    ("num", '#'),
    ("quest", '?'),
    ("equals", '='),
    ("lpar", '('),
    ("rpar", ')'),
    ("semi", ';'),
    ("comma", ','),
    ("period", '.'),
    ("excl", '!'),
    ("Tab", '\t'),
    ("NewLine", '\n'),
];

/// Legacy names browsers also accept without the semicolon.
const LEGACY: &[&str] = &["amp", "lt", "gt", "quot"];

const MAX_HEX_DIGITS: usize = 6;
const MAX_DEC_DIGITS: usize = 7;

pub fn decode_entities(s: &str) -> Decoded {
    let bytes = s.as_bytes();
    let mut text = String::with_capacity(s.len());
    let mut offsets = Vec::with_capacity(s.len() + 1);
    let mut copy_start = 0;
    let mut i = 0;

    let copy = |text: &mut String, offsets: &mut Vec<usize>, from: usize, to: usize| {
        text.push_str(&s[from..to]);
        offsets.extend(from..to);
    };

    while let Some(found) = memchr::memchr(b'&', &bytes[i..]) {
        let amp = i + found;
        let Some((ch, len)) = reference_at(bytes, amp) else {
            i = amp + 1;
            continue;
        };
        copy(&mut text, &mut offsets, copy_start, amp);
        let start = text.len();
        text.push(ch);
        offsets.extend(std::iter::repeat_n(amp, text.len() - start));
        i = amp + len;
        copy_start = i;
    }
    copy(&mut text, &mut offsets, copy_start, s.len());
    offsets.push(s.len());

    Decoded { text, offsets }
}

/// The character referenced at `amp` and the encoded length of the reference.
fn reference_at(bytes: &[u8], amp: usize) -> Option<(char, usize)> {
    let rest = &bytes[amp + 1..];
    if let Some(numeric) = rest.strip_prefix(b"#") {
        let (hex, digits) = match numeric.first() {
            Some(b'x' | b'X') => (true, &numeric[1..]),
            _ => (false, numeric),
        };
        let max = if hex { MAX_HEX_DIGITS } else { MAX_DEC_DIGITS };
        let count = digits
            .iter()
            .take(max)
            .take_while(|b| if hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
            .count();
        if count == 0 {
            return None;
        }
        let digits_text = std::str::from_utf8(&digits[..count]).ok()?;
        let value = u32::from_str_radix(digits_text, if hex { 16 } else { 10 }).ok()?;
        let ch = char::from_u32(value).unwrap_or('\u{FFFD}');
        let prefix = if hex { 3 } else { 2 };
        let semicolon = usize::from(digits.get(count) == Some(&b';'));
        return Some((ch, prefix + count + semicolon));
    }

    let name_len = rest
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    let name = std::str::from_utf8(&rest[..name_len]).ok()?;
    let terminated = rest.get(name_len) == Some(&b';');
    let &(_, ch) = NAMED.iter().find(|(n, _)| *n == name)?;
    if terminated {
        return Some((ch, 1 + name_len + 1));
    }
    let next_blocks = rest
        .get(name_len)
        .is_some_and(|&b| b.is_ascii_alphanumeric() || b == b'=');
    (LEGACY.contains(&name) && !next_blocks).then_some((ch, 1 + name_len))
}
