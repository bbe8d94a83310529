//! The context lattice.
//!
//! A [`Context`] says where a byte of template output lands: which grammar
//! (HTML, CSS, JS, URI), which sub-state of it, and what nested constructs
//! are open around it. Contexts are small `Copy` values; every "mutation"
//! returns a new one.

mod display;
mod fields;
mod union;

#[cfg(test)]
mod context_tests;
#[cfg(test)]
mod display_tests;
#[cfg(test)]
mod union_tests;

pub use display::ParseContextError;
pub use fields::{
    AttributeEndDelimiter, AttributeType, ElementType, JsFollowingSlash, State, StateEscaping,
    UriPart, UriType,
};

use crate::escaping::{ContentKind, EscapingMode, escaping_modes_for};

/// Snapshot of the scanner position across nested grammars.
///
/// Invariant: a non-`None` URI part always comes with a non-`None` URI type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Context {
    state: State,
    element_type: ElementType,
    attribute_type: AttributeType,
    delimiter: AttributeEndDelimiter,
    slash: JsFollowingSlash,
    uri_part: UriPart,
    uri_type: UriType,
    template_nest_depth: u32,
}

impl Context {
    /// Start of an HTML document.
    pub const HTML_PCDATA: Context = Context::new(State::HtmlPcdata);

    /// A context in `state` with every other field cleared.
    pub const fn new(state: State) -> Self {
        Self {
            state,
            element_type: ElementType::None,
            attribute_type: AttributeType::None,
            delimiter: AttributeEndDelimiter::None,
            slash: JsFollowingSlash::None,
            uri_part: UriPart::None,
            uri_type: UriType::None,
            template_nest_depth: 0,
        }
    }

    /// Builds a context from all of its fields, checking the URI invariant.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        state: State,
        element_type: ElementType,
        attribute_type: AttributeType,
        delimiter: AttributeEndDelimiter,
        slash: JsFollowingSlash,
        uri_part: UriPart,
        uri_type: UriType,
        template_nest_depth: u32,
    ) -> Option<Self> {
        if uri_part != UriPart::None && uri_type == UriType::None {
            return None;
        }
        Some(Self {
            state,
            element_type,
            attribute_type,
            delimiter,
            slash,
            uri_part,
            uri_type,
            template_nest_depth,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }

    pub fn delimiter(&self) -> AttributeEndDelimiter {
        self.delimiter
    }

    pub fn slash(&self) -> JsFollowingSlash {
        self.slash
    }

    pub fn uri_part(&self) -> UriPart {
        self.uri_part
    }

    pub fn uri_type(&self) -> UriType {
        self.uri_type
    }

    pub fn template_nest_depth(&self) -> u32 {
        self.template_nest_depth
    }

    #[must_use]
    pub fn with_state(self, state: State) -> Self {
        Self { state, ..self }
    }

    #[must_use]
    pub fn with_element_type(self, element_type: ElementType) -> Self {
        Self {
            element_type,
            ..self
        }
    }

    #[must_use]
    pub fn with_attribute_type(self, attribute_type: AttributeType) -> Self {
        Self {
            attribute_type,
            ..self
        }
    }

    #[must_use]
    pub fn with_delimiter(self, delimiter: AttributeEndDelimiter) -> Self {
        Self { delimiter, ..self }
    }

    #[must_use]
    pub fn with_slash(self, slash: JsFollowingSlash) -> Self {
        Self { slash, ..self }
    }

    #[must_use]
    pub fn with_uri_part(self, uri_part: UriPart) -> Self {
        debug_assert!(
            uri_part == UriPart::None || self.uri_type != UriType::None,
            "URI part {} requires a URI type",
            uri_part.name()
        );
        Self { uri_part, ..self }
    }

    #[must_use]
    pub fn with_uri_type(self, uri_type: UriType) -> Self {
        debug_assert!(
            uri_type != UriType::None || self.uri_part == UriPart::None,
            "cannot clear the URI type while inside a URI"
        );
        Self { uri_type, ..self }
    }

    #[must_use]
    pub fn with_template_nest_depth(self, template_nest_depth: u32) -> Self {
        Self {
            template_nest_depth,
            ..self
        }
    }

    /// Drops everything describing the attribute being scanned.
    #[must_use]
    pub fn without_attr_context(self) -> Self {
        Self {
            attribute_type: AttributeType::None,
            delimiter: AttributeEndDelimiter::None,
            slash: JsFollowingSlash::None,
            uri_part: UriPart::None,
            uri_type: UriType::None,
            ..self
        }
    }

    /// Moves to `state`, leaving any URI that was open.
    #[must_use]
    pub fn to_state(self, state: State) -> Self {
        let leaving_uri = self.uri_part != UriPart::None;
        let next = Self {
            state,
            uri_part: UriPart::None,
            ..self
        };
        if leaving_uri {
            next.with_uri_type(UriType::None)
        } else {
            next
        }
    }

    /// Context at the start of a block of `kind`, keeping the element
    /// type and nest depth of `self`.
    #[must_use]
    pub fn to_start_of(self, kind: ContentKind) -> Self {
        let base = self.without_attr_context();
        match kind {
            ContentKind::Html => base
                .with_state(State::HtmlPcdata)
                .with_element_type(ElementType::None),
            ContentKind::Attributes => base.with_state(State::HtmlTag),
            ContentKind::Css => base.with_state(State::Css),
            ContentKind::Js => base.with_state(State::Js).with_slash(JsFollowingSlash::Regex),
            ContentKind::Uri => base
                .with_state(State::Uri)
                .with_uri_type(UriType::Normal)
                .with_uri_part(UriPart::Start),
            ContentKind::TrustedResourceUri => base
                .with_state(State::Uri)
                .with_uri_type(UriType::TrustedResource)
                .with_uri_part(UriPart::Start),
            ContentKind::Text => base.with_state(State::Text),
        }
    }

    // ------------------------------------------------------------------
    // Epsilon transitions around dynamic values
    // ------------------------------------------------------------------

    /// Settles the context after a value escaped with `mode` was emitted.
    ///
    /// Applying it twice yields the same context as applying it once.
    #[must_use]
    pub fn derive_after_escaping(self, mode: EscapingMode) -> Self {
        if mode == EscapingMode::EscapeJsValue {
            return match self.slash {
                JsFollowingSlash::Regex => self.with_slash(JsFollowingSlash::DivOp),
                JsFollowingSlash::None | JsFollowingSlash::DivOp | JsFollowingSlash::Unknown => {
                    self
                }
            };
        }
        if self.state.is_html_tag_name_start() {
            return self
                .with_state(State::HtmlTagName)
                .with_element_type(ElementType::Normal);
        }
        if self.state == State::HtmlTag {
            return self
                .with_state(State::HtmlAttributeName)
                .with_attribute_type(AttributeType::PlainText);
        }
        if self.uri_part == UriPart::Start {
            return self.with_uri_part(UriPart::MaybeVariableScheme);
        }
        self
    }

    /// Commits deferred decisions right before a dynamic value.
    ///
    /// `<a href={$x}` can only be an unquoted value once the value is
    /// printed; until then a following quote would still be legal.
    #[must_use]
    pub fn context_before_dynamic_value(self) -> Self {
        if self.state == State::HtmlBeforeAttributeValue {
            return Self::after_attribute_delimiter(
                self.element_type,
                self.attribute_type,
                AttributeEndDelimiter::SpaceOrTagEnd,
                self.uri_type,
                self.template_nest_depth,
            );
        }
        self
    }

    /// Context at the start of an attribute value of the given type.
    pub fn after_attribute_delimiter(
        element_type: ElementType,
        attribute_type: AttributeType,
        delimiter: AttributeEndDelimiter,
        uri_type: UriType,
        template_nest_depth: u32,
    ) -> Self {
        debug_assert_eq!(
            uri_type != UriType::None,
            attribute_type == AttributeType::Uri,
            "URI type must be set exactly for URI attributes"
        );
        let (state, slash, uri_part) = match attribute_type {
            AttributeType::PlainText => {
                (State::HtmlNormalAttrValue, JsFollowingSlash::None, UriPart::None)
            }
            AttributeType::Script => (State::Js, JsFollowingSlash::Regex, UriPart::None),
            AttributeType::Style => (State::Css, JsFollowingSlash::None, UriPart::None),
            AttributeType::Uri => (State::Uri, JsFollowingSlash::None, UriPart::Start),
            AttributeType::None => {
                unreachable!("attribute value without an attribute")
            }
        };
        Self {
            state,
            element_type,
            attribute_type,
            delimiter,
            slash,
            uri_part,
            uri_type,
            template_nest_depth,
        }
    }

    // ------------------------------------------------------------------
    // Content kinds
    // ------------------------------------------------------------------

    /// The context a block of `kind` starts in.
    pub fn start_of(kind: ContentKind) -> Self {
        Context::HTML_PCDATA.to_start_of(kind)
    }

    pub fn is_valid_start_for(&self, kind: ContentKind) -> bool {
        if self.template_nest_depth != 0 {
            return false;
        }
        match kind {
            ContentKind::Attributes => {
                matches!(self.state, State::HtmlAttributeName | State::HtmlTag)
            }
            _ => *self == Context::start_of(kind),
        }
    }

    /// Like [`is_valid_start_for`](Self::is_valid_start_for), but any URI
    /// position is accepted for `kind="uri"` blocks. Only contextual callers
    /// of strict templates use this.
    pub fn is_valid_start_for_loose(&self, kind: ContentKind) -> bool {
        match kind {
            ContentKind::Uri => self.state == State::Uri,
            _ => self.is_valid_start_for(kind),
        }
    }

    pub fn is_valid_end_for(&self, kind: ContentKind) -> bool {
        if self.template_nest_depth != 0 {
            return false;
        }
        match kind {
            ContentKind::Css => self.state == State::Css && self.element_type == ElementType::None,
            ContentKind::Html => {
                self.state == State::HtmlPcdata && self.element_type == ElementType::None
            }
            ContentKind::Attributes => {
                matches!(self.state, State::HtmlAttributeName | State::HtmlTag)
            }
            ContentKind::Js => self.state == State::Js && self.element_type == ElementType::None,
            ContentKind::Uri => {
                self.state == State::Uri
                    && self.uri_type == UriType::Normal
                    && self.uri_part != UriPart::Start
            }
            ContentKind::TrustedResourceUri => {
                self.state == State::Uri
                    && self.uri_type == UriType::TrustedResource
                    && self.uri_part != UriPart::Start
            }
            ContentKind::Text => self.state == State::Text,
        }
    }

    /// Best guess at why a block of `kind` ended in this context.
    pub fn likely_end_mismatch_cause(&self, kind: ContentKind) -> &'static str {
        if kind == ContentKind::Attributes {
            return "an unterminated attribute value, or ending with an unquoted attribute";
        }
        match self.state {
            State::HtmlTagName
            | State::HtmlTag
            | State::HtmlAttributeName
            | State::HtmlNormalAttrValue => "an unterminated HTML tag or attribute",
            State::Css => "an unclosed style block or attribute",
            State::Js | State::JsLineComment => "an unclosed script block or attribute",
            State::CssComment | State::HtmlComment | State::JsBlockComment => {
                "an unterminated comment"
            }
            State::CssDqString | State::CssSqString | State::JsDqString | State::JsSqString => {
                "an unterminated string literal"
            }
            State::Uri | State::CssUri | State::CssDqUri | State::CssSqUri => {
                "an unterminated or empty URI"
            }
            State::JsRegex => "an unterminated regular expression",
            _ if self.template_nest_depth != 0 => "an unterminated <template> element",
            _ => "unknown to compiler",
        }
    }

    /// Content kind an author could switch to in order to print here
    /// without escaping. Falls back to text.
    pub fn most_appropriate_content_kind(&self) -> ContentKind {
        let kind = match self.state {
            State::Css => ContentKind::Css,
            State::HtmlPcdata => ContentKind::Html,
            State::HtmlTag => ContentKind::Attributes,
            State::Js => ContentKind::Js,
            State::Uri => ContentKind::Uri,
            State::Text => ContentKind::Text,
            _ => return ContentKind::Text,
        };
        if self.is_valid_start_for_loose(kind) {
            kind
        } else {
            ContentKind::Text
        }
    }

    /// How a translatable message block is escaped here.
    ///
    /// Returns the context the message body is scanned in and the modes
    /// applied to the whole message, or `None` where translators would end
    /// up writing code.
    pub fn msg_escaping_strategy(&self) -> Option<(Context, Vec<EscapingMode>)> {
        match self.state {
            State::HtmlPcdata => Some((*self, Vec::new())),
            State::CssDqString
            | State::CssSqString
            | State::JsDqString
            | State::JsSqString
            | State::Text => self.text_msg_strategy(),
            State::Uri if self.uri_part == UriPart::Query => self.text_msg_strategy(),
            State::HtmlRcdata | State::HtmlNormalAttrValue | State::HtmlComment => {
                Some((*self, vec![EscapingMode::NormalizeHtml]))
            }
            _ => None,
        }
    }

    fn text_msg_strategy(&self) -> Option<(Context, Vec<EscapingMode>)> {
        let modes = escaping_modes_for(self).ok()?;
        Some((Context::new(State::Text), modes))
    }

    // ------------------------------------------------------------------
    // Packing
    // ------------------------------------------------------------------

    /// Packs the context into one integer, usable as a specialization key.
    /// The enum fields take the low 22 bits and the nest depth all of the
    /// rest, so distinct contexts never share a key.
    pub fn pack(&self) -> u64 {
        let mut bits = u64::from(self.template_nest_depth);
        for (width, field) in [
            (UriType::BITS, self.uri_type.bits()),
            (UriPart::BITS, self.uri_part.bits()),
            (JsFollowingSlash::BITS, self.slash.bits()),
            (AttributeEndDelimiter::BITS, self.delimiter.bits()),
            (AttributeType::BITS, self.attribute_type.bits()),
            (ElementType::BITS, self.element_type.bits()),
            (State::BITS, self.state.bits()),
        ] {
            bits = (bits << width) | u64::from(field);
        }
        bits
    }

    /// Inverse of [`pack`](Self::pack). `None` for bit patterns no context
    /// packs to.
    pub fn unpack(packed: u64) -> Option<Self> {
        fn take(bits: &mut u64, width: u32) -> u32 {
            let field = *bits & ((1 << width) - 1);
            *bits >>= width;
            field as u32
        }

        let mut bits = packed;
        let state = State::from_bits(take(&mut bits, State::BITS))?;
        let element_type = ElementType::from_bits(take(&mut bits, ElementType::BITS))?;
        let attribute_type = AttributeType::from_bits(take(&mut bits, AttributeType::BITS))?;
        let delimiter = AttributeEndDelimiter::from_bits(take(&mut bits, AttributeEndDelimiter::BITS))?;
        let slash = JsFollowingSlash::from_bits(take(&mut bits, JsFollowingSlash::BITS))?;
        let uri_part = UriPart::from_bits(take(&mut bits, UriPart::BITS))?;
        let uri_type = UriType::from_bits(take(&mut bits, UriType::BITS))?;
        let depth = u32::try_from(bits).ok()?;
        Context::from_parts(
            state,
            element_type,
            attribute_type,
            delimiter,
            slash,
            uri_part,
            uri_type,
            depth,
        )
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::HTML_PCDATA
    }
}
