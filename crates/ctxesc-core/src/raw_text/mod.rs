//! The raw-text state machine.
//!
//! Literal template text is consumed one token at a time. Each state owns
//! an ordered table of transitions; the transition whose pattern matches
//! earliest in the remaining text wins, and ties go to the one declared
//! first. Text before the winning match stays in the prior context.
//!
//! Attribute values are special: the value is bounded by its delimiter,
//! entity-decoded, and the decoded text is tokenized by the embedded
//! grammar, so `onclick="f(&quot;{$x}&quot;)"` is seen as a JS string.

mod css;
mod entities;
mod html;
mod js;
mod patterns;
mod uri;

#[cfg(test)]
mod css_tests;
#[cfg(test)]
mod entities_tests;
#[cfg(test)]
mod html_tests;
#[cfg(test)]
mod raw_text_tests;

pub use entities::{Decoded, decode_entities};
pub use js::is_regex_preceder;

use crate::context::{AttributeEndDelimiter, Context, State};
use crate::error::AutoescapeError;
use crate::escaping::ContentKind;
use crate::invariants::ensure_progress;
use crate::sliced::{SlicedText, TextSlice};

use patterns::{Finder, Match};

/// Where a transition looks for its token.
#[derive(Clone, Copy)]
pub(crate) enum Pattern {
    /// Leftmost occurrence of a literal.
    Literal(&'static str),
    /// Leftmost byte out of a set.
    AnyByte(&'static [u8]),
    /// Zero-width, at offset 0 only.
    Start,
    /// Zero-width, at the end of the text. Lowest precedence by construction.
    End,
    /// `</name` not followed by a word character, any case.
    EndTag(&'static str),
    Custom(Finder),
}

impl Pattern {
    fn find(self, text: &str, from: usize) -> Option<Match> {
        match self {
            Pattern::Literal(literal) => patterns::find_literal(text, from, literal),
            Pattern::AnyByte(set) => patterns::find_any_byte(text, from, set),
            Pattern::Start => patterns::find_start(text, from),
            Pattern::End => patterns::find_end(text, from),
            Pattern::EndTag(name) => patterns::find_end_tag(text, from, name),
            Pattern::Custom(finder) => finder(text, from),
        }
    }
}

pub(crate) type Compute = fn(Context, &str, &Match) -> Result<Context, AutoescapeError>;

/// What a transition does to the context once its token is consumed.
#[derive(Clone, Copy)]
pub(crate) enum Action {
    /// Stay put.
    ToSelf,
    /// Change state, leaving any open URI.
    ToState(State),
    ToStartOf(ContentKind),
    /// Back into the body of the open tag.
    BackToTag,
    /// Leave a special element for its end tag.
    EndTag,
    Error(&'static str),
    Compute(Compute),
}

impl Action {
    fn apply(self, prior: Context, text: &str, m: &Match) -> Result<Context, AutoescapeError> {
        match self {
            Action::ToSelf => Ok(prior),
            Action::ToState(state) => Ok(prior.to_state(state)),
            Action::ToStartOf(kind) => Ok(prior.to_start_of(kind)),
            Action::BackToTag => Ok(prior.with_state(State::HtmlTag).without_attr_context()),
            Action::EndTag => Ok(prior
                .with_state(State::HtmlTag)
                .with_element_type(crate::context::ElementType::Normal)
                .without_attr_context()),
            Action::Error(message) => Err(AutoescapeError::new(message)),
            Action::Compute(compute) => compute(prior, text, m),
        }
    }
}

pub(crate) type Guard = fn(&Context, &str, &Match) -> bool;

/// One production of a state's grammar.
#[derive(Clone, Copy)]
pub(crate) struct Transition {
    pattern: Pattern,
    action: Action,
    guard: Option<Guard>,
}

impl Transition {
    pub(crate) const fn new(pattern: Pattern, action: Action) -> Self {
        Self {
            pattern,
            action,
            guard: None,
        }
    }

    /// Only applies when `guard` accepts the match. A rejected match is
    /// retried further along the text.
    pub(crate) const fn when(self, guard: Guard) -> Self {
        Self {
            guard: Some(guard),
            ..self
        }
    }

    /// Earliest applicable match of this transition.
    fn find(&self, context: &Context, text: &str) -> Option<Match> {
        let mut from = 0;
        loop {
            let m = self.pattern.find(text, from)?;
            let applies = self.guard.is_none_or(|guard| guard(context, text, &m));
            if applies {
                return Some(m);
            }
            if m.start >= text.len() {
                return None;
            }
            from = m.start + patterns::char_len_at(text, m.start);
        }
    }
}

pub(crate) const TO_SELF_AT_END: Transition = Transition::new(Pattern::End, Action::ToSelf);

/// `</name\b` leaves a script, style or RCDATA element, unless it is only
/// text inside an attribute value.
pub(crate) const fn end_tag(name: &'static str) -> Transition {
    Transition::new(Pattern::EndTag(name), Action::EndTag).when(outside_attribute)
}

fn outside_attribute(context: &Context, _: &str, _: &Match) -> bool {
    context.attribute_type() == crate::context::AttributeType::None
}

fn transitions(state: State) -> &'static [Transition] {
    match state {
        State::HtmlPcdata => html::PCDATA,
        State::HtmlRcdata => html::RCDATA,
        State::HtmlBeforeOpenTagName => html::BEFORE_OPEN_TAG_NAME,
        State::HtmlBeforeCloseTagName => html::BEFORE_CLOSE_TAG_NAME,
        State::HtmlTagName => html::TAG_NAME,
        State::HtmlTag => html::TAG,
        State::HtmlAttributeName => html::ATTRIBUTE_NAME,
        State::HtmlBeforeAttributeValue => html::BEFORE_ATTRIBUTE_VALUE,
        State::HtmlComment => html::COMMENT,
        State::HtmlNormalAttrValue => html::NORMAL_ATTR_VALUE,
        State::Css => css::CSS,
        State::CssComment => css::COMMENT,
        State::CssDqString => css::DQ_STRING,
        State::CssSqString => css::SQ_STRING,
        State::CssUri => css::URI,
        State::CssDqUri => css::DQ_URI,
        State::CssSqUri => css::SQ_URI,
        State::Js => js::JS,
        State::JsLineComment => js::LINE_COMMENT,
        State::JsBlockComment => js::BLOCK_COMMENT,
        State::JsDqString => js::DQ_STRING,
        State::JsSqString => js::SQ_STRING,
        State::JsRegex => js::REGEX,
        State::Uri => uri::URI,
        State::Text => &[TO_SELF_AT_END],
    }
}

/// Consumes one token of `text` (non-empty) in `context`, ignoring
/// attribute delimiters.
fn next_token(context: Context, text: &str) -> Result<(Context, usize), AutoescapeError> {
    let mut earliest: Option<(&Transition, Match)> = None;
    for transition in transitions(context.state()) {
        let Some(m) = transition.find(&context, text) else {
            continue;
        };
        if earliest.as_ref().is_none_or(|(_, best)| m.start < best.start) {
            earliest = Some((transition, m));
        }
    }

    let Some((transition, m)) = earliest else {
        return Err(AutoescapeError::new(format!(
            "Error determining next state when encountering \"{text}\" in {context}"
        )));
    };

    let next = transition.action.apply(context, text, &m)?;
    ensure_progress(context, next, m.end, text);
    log::trace!(target: "ctxesc::raw_text", "{context} --{:?}--> {next}", &text[..m.end]);
    Ok((next, m.end))
}

/// End of the attribute value at the start of `text`, or `None` outside
/// attribute values. `text.len()` when the delimiter is not in `text`.
fn attribute_value_end(text: &str, delimiter: AttributeEndDelimiter) -> Option<usize> {
    match delimiter {
        AttributeEndDelimiter::None => None,
        AttributeEndDelimiter::DoubleQuote => {
            Some(memchr::memchr(b'"', text.as_bytes()).unwrap_or(text.len()))
        }
        AttributeEndDelimiter::SingleQuote => {
            Some(memchr::memchr(b'\'', text.as_bytes()).unwrap_or(text.len()))
        }
        AttributeEndDelimiter::SpaceOrTagEnd => Some(
            text.char_indices()
                .find(|&(_, c)| c == '>' || c.is_whitespace())
                .map_or(text.len(), |(i, _)| i),
        ),
    }
}

/// One step of the machine over `text`, which starts at `base` in the
/// whole run. Slices are recorded into `slices`.
fn step(
    context: Context,
    text: &str,
    base: usize,
    slices: &mut Vec<TextSlice>,
) -> Result<(Context, usize), AutoescapeError> {
    let Some(value_end) = attribute_value_end(text, context.delimiter()) else {
        let (next, consumed) = next_token(context, text)?;
        push_slice(slices, base, base + consumed, context);
        return Ok((next, consumed));
    };

    let decoded = decode_entities(&text[..value_end]);
    let mut inner = context;
    let mut offset = 0;
    while offset < decoded.text.len() {
        let (next, consumed) = next_token(inner, &decoded.text[offset..])?;
        let start = base + decoded.encoded_offset(offset);
        let end = base + decoded.encoded_offset(offset + consumed);
        push_slice(slices, start, end, inner);
        inner = next;
        offset += consumed;
    }

    if value_end == text.len() {
        // Unterminated: the value continues after this text.
        return Ok((inner, text.len()));
    }

    let delimiter = context.delimiter().text();
    let end = value_end + delimiter.len();
    push_slice(slices, base + value_end, base + end, inner);
    let next = context
        .with_state(State::HtmlTag)
        .without_attr_context();
    Ok((next, end))
}

fn push_slice(slices: &mut Vec<TextSlice>, start: usize, end: usize, context: Context) {
    if start < end {
        slices.push(TextSlice {
            start,
            end,
            context,
        });
    }
}

/// Consumes one token of `text` starting in `context`.
///
/// Returns the context after the token and how many bytes it spans. Inside
/// an attribute value the whole value up to and including its delimiter is
/// one token.
pub fn advance(context: Context, text: &str) -> Result<(Context, usize), AutoescapeError> {
    step(context, text, 0, &mut Vec::new())
}

/// Runs the machine over all of `text`, labelling each byte range with
/// the context it starts in.
pub fn process_raw_text(text: &str, context: Context) -> Result<SlicedText, AutoescapeError> {
    let mut slices = Vec::new();
    let mut context = context;
    let mut offset = 0;
    while offset < text.len() {
        let (next, consumed) = step(context, &text[offset..], offset, &mut slices)?;
        context = next;
        offset += consumed;
    }
    Ok(SlicedText::new(slices, context))
}
