//! CSS productions: comments, strings and `url(...)`.

use super::patterns::{Match, find_css_escape, is_word, skip_spaces, starts_with_ci};
use super::{Action, Pattern, TO_SELF_AT_END, Transition, end_tag, uri};
use crate::context::{Context, State, UriPart, UriType};
use crate::error::AutoescapeError;

const NEWLINES: &[u8] = b"\n\r\x0C";

pub(super) const CSS: &[Transition] = &[
    Transition::new(Pattern::Literal("/*"), Action::ToState(State::CssComment)),
    Transition::new(Pattern::Literal("\""), Action::ToState(State::CssDqString)),
    Transition::new(Pattern::Literal("'"), Action::ToState(State::CssSqString)),
    Transition::new(Pattern::Custom(find_media_url), Action::Compute(media_url)),
    Transition::new(Pattern::Custom(find_url), Action::Compute(normal_url)),
    end_tag("style"),
    TO_SELF_AT_END,
];

pub(super) const COMMENT: &[Transition] = &[
    Transition::new(Pattern::Literal("*/"), Action::ToState(State::Css)),
    end_tag("style"),
    TO_SELF_AT_END,
];

pub(super) const DQ_STRING: &[Transition] = &[
    Transition::new(Pattern::Literal("\""), Action::ToState(State::Css)),
    Transition::new(Pattern::Custom(find_dq_escape), Action::ToSelf),
    Transition::new(
        Pattern::AnyByte(NEWLINES),
        Action::Error("Newlines not permitted in string literals."),
    ),
    end_tag("style"),
    TO_SELF_AT_END,
];

pub(super) const SQ_STRING: &[Transition] = &[
    Transition::new(Pattern::Literal("'"), Action::ToState(State::Css)),
    Transition::new(Pattern::Custom(find_sq_escape), Action::ToSelf),
    Transition::new(
        Pattern::AnyByte(NEWLINES),
        Action::Error("Newlines not permitted in string literals."),
    ),
    end_tag("style"),
    TO_SELF_AT_END,
];

pub(super) const URI: &[Transition] = &[
    Transition::new(Pattern::AnyByte(b") \t\n\x0B\x0C\r"), Action::ToState(State::Css)),
    uri::PART,
    uri::START,
    Transition::new(
        Pattern::AnyByte(b"\"'"),
        Action::Error("Quotes not permitted in CSS URIs."),
    ),
    end_tag("style"),
];

pub(super) const DQ_URI: &[Transition] = &[
    Transition::new(Pattern::Literal("\""), Action::ToState(State::Css)),
    uri::PART,
    uri::START,
    Transition::new(Pattern::Custom(find_dq_escape), Action::ToSelf),
    Transition::new(
        Pattern::AnyByte(NEWLINES),
        Action::Error("Newlines not permitted in string literal."),
    ),
    end_tag("style"),
];

pub(super) const SQ_URI: &[Transition] = &[
    Transition::new(Pattern::Literal("'"), Action::ToState(State::Css)),
    uri::PART,
    uri::START,
    Transition::new(Pattern::Custom(find_sq_escape), Action::ToSelf),
    Transition::new(
        Pattern::AnyByte(NEWLINES),
        Action::Error("Newlines not permitted in string literal."),
    ),
    end_tag("style"),
];

fn find_dq_escape(text: &str, from: usize) -> Option<Match> {
    find_css_escape(text, from, b'"')
}

fn find_sq_escape(text: &str, from: usize) -> Option<Match> {
    find_css_escape(text, from, b'\'')
}

/// Properties that only ever take images.
const MEDIA_PROPERTIES: &[&str] = &[
    "background",
    "background-image",
    "border-image",
    "content",
    "cursor",
    "list-style",
    "list-style-image",
];

/// `url\s*\(\s*(['"]?)` at `i`: the end and the range of the quote.
fn url_call_at(bytes: &[u8], i: usize) -> Option<(usize, std::ops::Range<usize>)> {
    if !starts_with_ci(bytes, i, b"url") {
        return None;
    }
    let paren = skip_spaces(bytes, i + 3);
    if bytes.get(paren) != Some(&b'(') {
        return None;
    }
    let quote = skip_spaces(bytes, paren + 1);
    let end = match bytes.get(quote) {
        Some(b'"' | b'\'') => quote + 1,
        _ => quote,
    };
    Some((end, quote..end))
}

/// `\s*(property)\s*:\s*url\s*\(\s*(['"]?)` at `i`.
fn media_url_at(bytes: &[u8], i: usize) -> Option<(usize, std::ops::Range<usize>)> {
    let name = skip_spaces(bytes, i);
    MEDIA_PROPERTIES.iter().find_map(|property| {
        if !starts_with_ci(bytes, name, property.as_bytes()) {
            return None;
        }
        let colon = skip_spaces(bytes, name + property.len());
        if bytes.get(colon) != Some(&b':') {
            return None;
        }
        url_call_at(bytes, skip_spaces(bytes, colon + 1))
    })
}

/// `(?i)(?:[^a-z0-9-]|^)\s*(properties)\s*:\s*url\s*\(\s*(['"]?)`
///
/// Does not see through comments; `{if 1}foo-{/if}background` fools it.
fn find_media_url(text: &str, from: usize) -> Option<Match> {
    let bytes = text.as_bytes();
    if from == 0
        && let Some((end, quote)) = media_url_at(bytes, 0)
    {
        return Some(Match::new(0, end).with_group(quote));
    }
    text.char_indices()
        .skip_while(|&(i, _)| i < from)
        .filter(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '-'))
        .find_map(|(i, c)| {
            let (end, quote) = media_url_at(bytes, i + c.len_utf8())?;
            Some(Match::new(i, end).with_group(quote))
        })
}

/// `(?i)\burl\s*\(\s*(['"]?)`
fn find_url(text: &str, from: usize) -> Option<Match> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        let at_boundary = i == 0 || !is_word(bytes[i - 1]);
        if at_boundary && let Some((end, quote)) = url_call_at(bytes, i) {
            return Some(Match::new(i, end).with_group(quote));
        }
        i += 1;
    }
    None
}

fn css_uri(prior: Context, text: &str, m: &Match, uri_type: UriType) -> Context {
    let state = match m.group(text) {
        "\"" => State::CssDqUri,
        "'" => State::CssSqUri,
        _ => State::CssUri,
    };
    prior
        .with_state(state)
        .with_uri_type(uri_type)
        .with_uri_part(UriPart::Start)
}

fn media_url(prior: Context, text: &str, m: &Match) -> Result<Context, AutoescapeError> {
    Ok(css_uri(prior, text, m, UriType::Media))
}

fn normal_url(prior: Context, text: &str, m: &Match) -> Result<Context, AutoescapeError> {
    Ok(css_uri(prior, text, m, UriType::Normal))
}
