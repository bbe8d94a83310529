//! JavaScript productions: comments, strings, regular expressions, and the
//! slash heuristic.

use super::patterns::{
    Match, char_len_at, is_script_end_at, is_space, js_line_break_len,
};
use super::{Action, Pattern, TO_SELF_AT_END, Transition, end_tag};
use crate::context::{Context, JsFollowingSlash, State, UriPart};
use crate::error::AutoescapeError;

pub(super) const JS: &[Transition] = &[
    Transition::new(Pattern::Literal("/*"), Action::ToState(State::JsBlockComment)),
    Transition::new(Pattern::Literal("//"), Action::ToState(State::JsLineComment)),
    Transition::new(Pattern::Literal("\""), Action::Compute(dq_string)),
    Transition::new(Pattern::Literal("'"), Action::Compute(sq_string)),
    Transition::new(Pattern::Literal("/"), Action::Compute(slash)),
    Transition::new(Pattern::Custom(find_token), Action::Compute(after_token)),
    Transition::new(Pattern::Custom(find_spaces), Action::ToSelf),
    end_tag("script"),
];

pub(super) const BLOCK_COMMENT: &[Transition] = &[
    Transition::new(Pattern::Literal("*/"), Action::ToState(State::Js)),
    end_tag("script"),
    TO_SELF_AT_END,
];

/// Line continuations do not exist in line comments.
pub(super) const LINE_COMMENT: &[Transition] = &[
    Transition::new(Pattern::Custom(find_line_break), Action::ToState(State::Js)),
    end_tag("script"),
    TO_SELF_AT_END,
];

pub(super) const DQ_STRING: &[Transition] = &[
    Transition::new(Pattern::Literal("\""), Action::Compute(div_preceder)),
    end_tag("script"),
    Transition::new(Pattern::Custom(find_dq_string_body), Action::ToSelf),
];

pub(super) const SQ_STRING: &[Transition] = &[
    Transition::new(Pattern::Literal("'"), Action::Compute(div_preceder)),
    end_tag("script"),
    Transition::new(Pattern::Custom(find_sq_string_body), Action::ToSelf),
];

pub(super) const REGEX: &[Transition] = &[
    Transition::new(Pattern::Literal("/"), Action::Compute(div_preceder)),
    end_tag("script"),
    Transition::new(Pattern::Custom(find_regex_body), Action::ToSelf),
];

// ============================================================================
// Finders
// ============================================================================

/// `(?i)(?:[^</"'\s\\]|<(?!/script))+`: words, numbers and punctuation
/// other than slashes.
fn find_token(text: &str, from: usize) -> Option<Match> {
    let bytes = text.as_bytes();
    let in_token = |i: usize| match bytes[i] {
        b'<' => !is_script_end_at(bytes, i),
        b'/' | b'"' | b'\'' | b'\\' => false,
        b => !is_space(b),
    };
    let start = (from..bytes.len()).find(|&i| text.is_char_boundary(i) && in_token(i))?;
    let mut end = start;
    while end < bytes.len() && in_token(end) {
        end += char_len_at(text, end);
    }
    Some(Match::new(start, end))
}

/// `\s+`
fn find_spaces(text: &str, from: usize) -> Option<Match> {
    let bytes = text.as_bytes();
    let start = from + bytes.get(from..)?.iter().position(|&b| is_space(b))?;
    let len = bytes[start..].iter().take_while(|&&b| is_space(b)).count();
    Some(Match::new(start, start + len))
}

/// A JS line terminator: CR, LF, U+2028 or U+2029.
fn find_line_break(text: &str, from: usize) -> Option<Match> {
    let bytes = text.as_bytes();
    (from..bytes.len()).find_map(|i| js_line_break_len(bytes, i).map(|len| Match::new(i, i + len)))
}

/// Anchored run of string content up to the closing `quote`, a line break
/// or `</script`. Backslash escapes, including line continuations, are
/// consumed whole.
fn string_body(text: &str, from: usize, quote: u8) -> Option<Match> {
    if from != 0 {
        return None;
    }
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == quote || js_line_break_len(bytes, i).is_some() {
            break;
        }
        match b {
            b'\\' => match bytes.get(i + 1) {
                None => break,
                Some(b'\r') => i += if bytes.get(i + 2) == Some(&b'\n') { 3 } else { 2 },
                Some(b'<') if is_script_end_at(bytes, i + 1) => break,
                Some(_) => i += 1 + char_len_at(text, i + 1),
            },
            b'<' if is_script_end_at(bytes, i) => break,
            _ => i += char_len_at(text, i),
        }
    }
    (i > 0).then(|| Match::new(0, i))
}

fn find_dq_string_body(text: &str, from: usize) -> Option<Match> {
    string_body(text, from, b'"')
}

fn find_sq_string_body(text: &str, from: usize) -> Option<Match> {
    string_body(text, from, b'\'')
}

/// Anchored run of regular-expression body. A `/` inside a character set
/// such as `/[/]/` does not end the literal.
fn find_regex_body(text: &str, from: usize) -> Option<Match> {
    if from != 0 {
        return None;
    }
    let bytes = text.as_bytes();
    let escape_len = |i: usize| -> Option<usize> {
        let next = i + 1;
        (next < bytes.len() && js_line_break_len(bytes, next).is_none())
            .then(|| 1 + char_len_at(text, next))
    };

    let mut i = 0;
    while i < bytes.len() && js_line_break_len(bytes, i).is_none() {
        match bytes[i] {
            b'/' => break,
            b'\\' => match escape_len(i) {
                Some(len) => i += len,
                None => break,
            },
            b'<' if is_script_end_at(bytes, i) => break,
            b'[' => {
                i += 1;
                while i < bytes.len() && js_line_break_len(bytes, i).is_none() {
                    match bytes[i] {
                        b']' | b'<' => break,
                        b'\\' => match escape_len(i) {
                            Some(len) => i += len,
                            None => break,
                        },
                        _ => i += char_len_at(text, i),
                    }
                }
            }
            _ => i += char_len_at(text, i),
        }
    }
    (i > 0).then(|| Match::new(0, i))
}

// ============================================================================
// Context computations
// ============================================================================

fn js_string(prior: Context, state: State) -> Context {
    prior
        .with_state(state)
        .with_slash(JsFollowingSlash::None)
        .with_uri_part(UriPart::None)
}

fn dq_string(prior: Context, _: &str, _: &Match) -> Result<Context, AutoescapeError> {
    Ok(js_string(prior, State::JsDqString))
}

fn sq_string(prior: Context, _: &str, _: &Match) -> Result<Context, AutoescapeError> {
    Ok(js_string(prior, State::JsSqString))
}

/// The end of a string or regular expression: a slash next is division.
fn div_preceder(prior: Context, _: &str, _: &Match) -> Result<Context, AutoescapeError> {
    Ok(prior
        .with_state(State::Js)
        .with_slash(JsFollowingSlash::DivOp))
}

fn slash(prior: Context, text: &str, m: &Match) -> Result<Context, AutoescapeError> {
    match prior.slash() {
        // `a / b`: an operand follows, so another slash would start a regex.
        JsFollowingSlash::DivOp => Ok(prior
            .with_state(State::Js)
            .with_slash(JsFollowingSlash::Regex)),
        JsFollowingSlash::Regex => Ok(prior
            .with_state(State::JsRegex)
            .with_slash(JsFollowingSlash::None)),
        JsFollowingSlash::None | JsFollowingSlash::Unknown => Err(AutoescapeError::new(format!(
            "Slash (/) cannot follow the preceding branches since it is unclear whether the \
             slash is a RegExp literal or division operator.  Please add parentheses in the \
             branches leading to `{}`",
            &text[m.end..]
        ))),
    }
}

fn after_token(prior: Context, text: &str, m: &Match) -> Result<Context, AutoescapeError> {
    let slash = if is_regex_preceder(&text[m.start..m.end]) {
        JsFollowingSlash::Regex
    } else {
        JsFollowingSlash::DivOp
    };
    Ok(prior.with_slash(slash))
}

const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "break",
    "case",
    "continue",
    "delete",
    "do",
    "else",
    "finally",
    "instanceof",
    "return",
    "throw",
    "try",
    "typeof",
];

/// Whether a slash right after `token` starts a regular expression.
///
/// Only the tail of the token matters: `x++ /` divides while `x + /`
/// starts a regex, and a trailing keyword like `return` expects an
/// operand.
pub fn is_regex_preceder(token: &str) -> bool {
    let bytes = token.as_bytes();
    let Some(&last) = bytes.last() else {
        return true;
    };
    let run_of = |c: u8| bytes.iter().rev().take_while(|&&b| b == c).count();

    match last {
        b'+' | b'-' => run_of(last) % 2 == 1,
        b'.' => {
            // `1.` is a number, `a.` or `...` are not.
            bytes.len() == 1 || !bytes[bytes.len() - 2].is_ascii_digit()
        }
        b'/' => bytes.len() <= 2,
        b'!' | b'#' | b'%' | b'&' | b'(' | b'*' | b',' | b':' | b';' | b'<' | b'=' | b'>'
        | b'?' | b'@' | b'[' | b'^' | b'{' | b'|' | b'~' => true,
        _ => REGEX_PRECEDING_KEYWORDS.iter().any(|keyword| {
            token.strip_suffix(keyword).is_some_and(|head| {
                !head
                    .bytes()
                    .next_back()
                    .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'$')
            })
        }),
    }
}
