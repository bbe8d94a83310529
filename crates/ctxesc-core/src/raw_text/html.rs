//! HTML productions: tags, attributes, comments and RCDATA bodies.

use super::patterns::{Match, is_space, is_word, skip_spaces, starts_with_ci};
use super::{Action, Pattern, TO_SELF_AT_END, Transition};
use crate::context::{
    AttributeEndDelimiter, AttributeType, Context, ElementType, JsFollowingSlash, State, UriType,
};
use crate::error::AutoescapeError;
use crate::escaping::ContentKind;

pub(super) const PCDATA: &[Transition] = &[
    Transition::new(Pattern::Literal("<!--"), Action::ToState(State::HtmlComment)),
    Transition::new(Pattern::Custom(find_template_tag), Action::Compute(template_tag)),
    Transition::new(
        Pattern::Literal("<"),
        Action::ToState(State::HtmlBeforeOpenTagName),
    ),
    Transition::new(Pattern::Custom(find_text), Action::ToSelf),
];

pub(super) const BEFORE_OPEN_TAG_NAME: &[Transition] = &[
    Transition::new(Pattern::Custom(find_tag_name), Action::Compute(tag_name)),
    Transition::new(
        Pattern::Custom(find_leading_slash),
        Action::ToState(State::HtmlBeforeCloseTagName),
    ),
    // `I <3 kittens`: not a tag after all.
    Transition::new(Pattern::Start, Action::ToStartOf(ContentKind::Html)),
];

pub(super) const BEFORE_CLOSE_TAG_NAME: &[Transition] = &[
    Transition::new(Pattern::Custom(find_tag_name), Action::Compute(tag_name)),
    Transition::new(Pattern::Start, Action::Error("Invalid end-tag name.")),
];

pub(super) const TAG_NAME: &[Transition] = &[
    Transition::new(Pattern::Custom(find_tag_name_end), Action::BackToTag),
    Transition::new(
        Pattern::End,
        Action::Error(
            "Tag names should not be split up. For example, the autoescaper can't easily \
             understand that <s{if 1}cript{/if}> is a script tag.",
        ),
    ),
];

pub(super) const TAG: &[Transition] = &[
    Transition::new(Pattern::Custom(find_attribute_name), Action::Compute(attribute_name)),
    Transition::new(Pattern::Custom(find_tag_end), Action::Compute(tag_end)),
    Transition::new(Pattern::Custom(find_trailing_space), Action::ToSelf),
];

pub(super) const ATTRIBUTE_NAME: &[Transition] = &[
    Transition::new(
        Pattern::Custom(find_equals),
        Action::ToState(State::HtmlBeforeAttributeValue),
    ),
    // Value-less attribute.
    Transition::new(Pattern::Start, Action::BackToTag),
];

pub(super) const BEFORE_ATTRIBUTE_VALUE: &[Transition] = &[
    Transition::new(Pattern::Custom(find_double_quote), Action::Compute(double_quoted_value)),
    Transition::new(Pattern::Custom(find_single_quote), Action::Compute(single_quoted_value)),
    Transition::new(Pattern::Custom(find_unquoted_value), Action::Compute(unquoted_value)),
    // `<input value=>` and `<input value= name=foo>`: empty value.
    Transition::new(Pattern::Custom(find_empty_value), Action::BackToTag),
    Transition::new(Pattern::Custom(find_leading_space), Action::ToSelf),
];

pub(super) const COMMENT: &[Transition] = &[
    Transition::new(Pattern::Literal("-->"), Action::ToStartOf(ContentKind::Html)),
    TO_SELF_AT_END,
];

pub(super) const NORMAL_ATTR_VALUE: &[Transition] = &[TO_SELF_AT_END];

pub(super) const RCDATA: &[Transition] = &[
    Transition::new(Pattern::Custom(find_any_end_tag), Action::EndTag).when(closes_rcdata),
    TO_SELF_AT_END,
];

// ============================================================================
// Finders
// ============================================================================

/// `[^<]+`
fn find_text(text: &str, from: usize) -> Option<Match> {
    let bytes = text.as_bytes();
    let start = from + bytes.get(from..)?.iter().position(|&b| b != b'<')?;
    let end = memchr::memchr(b'<', &bytes[start..]).map_or(text.len(), |i| start + i);
    Some(Match::new(start, end))
}

/// `(?i)<(/?)template(?=[\s>/]|\z)`, the slash in the group.
fn find_template_tag(text: &str, from: usize) -> Option<Match> {
    let bytes = text.as_bytes();
    let mut i = from;
    while let Some(found) = memchr::memchr(b'<', bytes.get(i..)?) {
        let start = i + found;
        let slash = usize::from(bytes.get(start + 1) == Some(&b'/'));
        let name_end = start + 1 + slash + "template".len();
        if starts_with_ci(bytes, start + 1 + slash, b"template")
            && bytes
                .get(name_end)
                .is_none_or(|&b| is_space(b) || b == b'>' || b == b'/')
        {
            return Some(Match::new(start, name_end).with_group(start + 1..start + 1 + slash));
        }
        i = start + 1;
    }
    None
}

/// `(?i)^([a-z][a-z0-9:-]*)`
fn find_tag_name(text: &str, from: usize) -> Option<Match> {
    let bytes = text.as_bytes();
    if from != 0 || !bytes.first()?.is_ascii_alphabetic() {
        return None;
    }
    let len = bytes
        .iter()
        .take_while(|&&b| b.is_ascii_alphanumeric() || b == b':' || b == b'-')
        .count();
    Some(Match::new(0, len).with_group(0..len))
}

/// `^/`
fn find_leading_slash(text: &str, from: usize) -> Option<Match> {
    (from == 0 && text.starts_with('/')).then(|| Match::new(0, 1))
}

/// `^(?=[/\s>])`
fn find_tag_name_end(text: &str, from: usize) -> Option<Match> {
    let &first = text.as_bytes().first()?;
    (from == 0 && (first == b'/' || first == b'>' || is_space(first))).then(|| Match::new(0, 0))
}

/// `(?i)^\s*([a-z](?:[a-z0-9_:?$\-]*[a-z0-9?$])?)`
fn find_attribute_name(text: &str, from: usize) -> Option<Match> {
    if from != 0 {
        return None;
    }
    let bytes = text.as_bytes();
    let start = skip_spaces(bytes, 0);
    if !bytes.get(start)?.is_ascii_alphabetic() {
        return None;
    }
    let in_name = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'_' | b':' | b'?' | b'$' | b'-');
    let can_end = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'?' | b'$');
    let run = bytes[start..].iter().take_while(|&&b| in_name(b)).count();
    // Never end on `_`, `:` or `-`, so that `--` cannot be a name.
    let len = bytes[start..start + run]
        .iter()
        .rposition(|&b| can_end(b))
        .map_or(1, |last| last + 1);
    Some(Match::new(0, start + len).with_group(start..start + len))
}

/// `^\s*/?>`
fn find_tag_end(text: &str, from: usize) -> Option<Match> {
    if from != 0 {
        return None;
    }
    let bytes = text.as_bytes();
    let mut i = skip_spaces(bytes, 0);
    if bytes.get(i) == Some(&b'/') {
        i += 1;
    }
    (bytes.get(i) == Some(&b'>')).then(|| Match::new(0, i + 1))
}

/// `^\s+\z`
fn find_trailing_space(text: &str, from: usize) -> Option<Match> {
    (from == 0 && !text.is_empty() && text.bytes().all(is_space))
        .then(|| Match::new(0, text.len()))
}

/// `^\s*=`
fn find_equals(text: &str, from: usize) -> Option<Match> {
    let bytes = text.as_bytes();
    let i = skip_spaces(bytes, 0);
    (from == 0 && bytes.get(i) == Some(&b'=')).then(|| Match::new(0, i + 1))
}

fn find_quote(text: &str, from: usize, quote: u8) -> Option<Match> {
    let bytes = text.as_bytes();
    let i = skip_spaces(bytes, 0);
    (from == 0 && bytes.get(i) == Some(&quote)).then(|| Match::new(0, i + 1))
}

/// `^\s*"`
fn find_double_quote(text: &str, from: usize) -> Option<Match> {
    find_quote(text, from, b'"')
}

/// `^\s*'`
fn find_single_quote(text: &str, from: usize) -> Option<Match> {
    find_quote(text, from, b'\'')
}

/// `^(?=[^"'\s>])`
fn find_unquoted_value(text: &str, from: usize) -> Option<Match> {
    let &first = text.as_bytes().first()?;
    (from == 0 && !matches!(first, b'"' | b'\'' | b'>') && !is_space(first))
        .then(|| Match::new(0, 0))
}

/// `^(?=>|\s+[\w-]+\s*=)`
fn find_empty_value(text: &str, from: usize) -> Option<Match> {
    if from != 0 {
        return None;
    }
    let bytes = text.as_bytes();
    if bytes.first() == Some(&b'>') {
        return Some(Match::new(0, 0));
    }
    let name_start = skip_spaces(bytes, 0);
    if name_start == 0 {
        return None;
    }
    let name_len = bytes[name_start..]
        .iter()
        .take_while(|&&b| is_word(b) || b == b'-')
        .count();
    let after_name = skip_spaces(bytes, name_start + name_len);
    (name_len > 0 && bytes.get(after_name) == Some(&b'=')).then(|| Match::new(0, 0))
}

/// `^\s+`
fn find_leading_space(text: &str, from: usize) -> Option<Match> {
    let end = skip_spaces(text.as_bytes(), 0);
    (from == 0 && end > 0).then(|| Match::new(0, end))
}

/// `</(\w+)\b`, the name in the group.
fn find_any_end_tag(text: &str, from: usize) -> Option<Match> {
    let bytes = text.as_bytes();
    let mut i = from;
    while let Some(found) = memchr::memmem::find(bytes.get(i..)?, b"</") {
        let start = i + found;
        let name_len = bytes[start + 2..].iter().take_while(|&&b| is_word(b)).count();
        if name_len > 0 {
            let end = start + 2 + name_len;
            return Some(Match::new(start, end).with_group(start + 2..end));
        }
        i = start + 1;
    }
    None
}

// ============================================================================
// Context computations
// ============================================================================

fn template_tag(prior: Context, text: &str, m: &Match) -> Result<Context, AutoescapeError> {
    let is_end_tag = !m.group(text).is_empty();
    let depth = prior.template_nest_depth();
    let base = prior.without_attr_context();
    if !is_end_tag {
        return Ok(base
            .with_template_nest_depth(depth + 1)
            .with_state(State::HtmlPcdata)
            .with_element_type(ElementType::None));
    }
    let Some(depth) = depth.checked_sub(1) else {
        return Err(AutoescapeError::new(
            "Saw an html5 </template> without encountering <template>.",
        ));
    };
    Ok(base
        .with_template_nest_depth(depth)
        .with_state(State::HtmlTag)
        .with_element_type(ElementType::Normal))
}

fn tag_name(prior: Context, text: &str, m: &Match) -> Result<Context, AutoescapeError> {
    let name = m.group(text).to_ascii_lowercase();
    let element_type = ElementType::for_tag_name(&name);
    if prior.state() == State::HtmlBeforeCloseTagName
        && !matches!(element_type, ElementType::Normal | ElementType::Media)
    {
        // `</script>` without an open script: something earlier went wrong.
        return Err(AutoescapeError::new(format!(
            "Saw unmatched close tag for context-changing tag: {name}"
        )));
    }
    Ok(prior
        .with_state(State::HtmlTagName)
        .without_attr_context()
        .with_element_type(element_type))
}

/// Attribute local names whose value is a URI.
const URI_ATTRIBUTE_NAMES: &[&str] = &[
    "action",
    "archive",
    "base",
    "background",
    "cite",
    "classid",
    "codebase",
    "data",
    "dsync",
    "formaction",
    "href",
    "icon",
    "longdesc",
    "manifest",
    "poster",
    "src",
    "usemap",
    "entity",
];

/// `\bur[il]|ur[il]s?$` over a lower-case local name.
fn follows_uri_naming_convention(local_name: &str) -> bool {
    let bytes = local_name.as_bytes();
    let is_uri_at = |i: usize| {
        bytes.get(i..i + 2) == Some(&b"ur"[..]) && matches!(bytes.get(i + 2), Some(b'i' | b'l'))
    };
    let at_word_start = (0..bytes.len())
        .any(|i| is_uri_at(i) && (i == 0 || !is_word(bytes[i - 1])));
    let trimmed = local_name.strip_suffix('s').unwrap_or(local_name);
    at_word_start || trimmed.ends_with("uri") || trimmed.ends_with("url")
}

fn attribute_name(prior: Context, text: &str, m: &Match) -> Result<Context, AutoescapeError> {
    let name = m.group(text).to_ascii_lowercase();
    // `xlink:href` and `svg:style` behave like their HTML counterparts.
    let local = name.rfind(':').map_or(name.as_str(), |i| &name[i + 1..]);

    let (attribute_type, uri_type) = if local.starts_with("on") {
        (AttributeType::Script, UriType::None)
    } else if local == "style" {
        (AttributeType::Style, UriType::None)
    } else if prior.element_type() == ElementType::Media && name == "src" {
        (AttributeType::Uri, UriType::Media)
    } else if prior.element_type() == ElementType::Script && name == "src" {
        (AttributeType::Uri, UriType::TrustedResource)
    } else if URI_ATTRIBUTE_NAMES.contains(&local)
        || follows_uri_naming_convention(local)
        || name == "xmlns"
        || name.starts_with("xmlns:")
    {
        (AttributeType::Uri, UriType::Normal)
    } else {
        (AttributeType::PlainText, UriType::None)
    };

    Ok(prior
        .with_state(State::HtmlAttributeName)
        .without_attr_context()
        .with_attribute_type(attribute_type)
        .with_uri_type(uri_type))
}

fn tag_end(prior: Context, _: &str, _: &Match) -> Result<Context, AutoescapeError> {
    let base = prior.without_attr_context();
    Ok(match prior.element_type() {
        ElementType::Script => base
            .with_state(State::Js)
            .with_slash(JsFollowingSlash::Regex)
            .with_element_type(ElementType::None),
        ElementType::Style => base
            .with_state(State::Css)
            .with_element_type(ElementType::None),
        ElementType::Textarea | ElementType::Title | ElementType::Xmp => {
            base.with_state(State::HtmlRcdata)
        }
        // A kind="attributes" block has no element of its own.
        ElementType::Normal | ElementType::Media | ElementType::None => base
            .with_state(State::HtmlPcdata)
            .with_element_type(ElementType::None),
    })
}

fn attribute_value(prior: Context, delimiter: AttributeEndDelimiter) -> Context {
    Context::after_attribute_delimiter(
        prior.element_type(),
        prior.attribute_type(),
        delimiter,
        prior.uri_type(),
        prior.template_nest_depth(),
    )
}

fn double_quoted_value(prior: Context, _: &str, _: &Match) -> Result<Context, AutoescapeError> {
    Ok(attribute_value(prior, AttributeEndDelimiter::DoubleQuote))
}

fn single_quoted_value(prior: Context, _: &str, _: &Match) -> Result<Context, AutoescapeError> {
    Ok(attribute_value(prior, AttributeEndDelimiter::SingleQuote))
}

fn unquoted_value(prior: Context, _: &str, _: &Match) -> Result<Context, AutoescapeError> {
    Ok(attribute_value(prior, AttributeEndDelimiter::SpaceOrTagEnd))
}

fn closes_rcdata(context: &Context, text: &str, m: &Match) -> bool {
    m.group(text)
        .eq_ignore_ascii_case(context.element_type().name())
}
