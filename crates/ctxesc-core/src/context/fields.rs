//! Field enumerations of [`Context`](super::Context).
//!
//! Declaration order is significant: it fixes the packed representation
//! and the order in which union reconciles differing states.

use crate::escaping::EscapingMode;

macro_rules! context_field {
    (
        $(#[$meta:meta])*
        pub enum $name:ident : $bits:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Bits reserved for this field in a packed context.
            pub const BITS: u32 = $bits;

            /// Upper-case name used in context dumps.
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub(crate) fn from_bits(bits: u32) -> Option<Self> {
                Self::ALL.get(bits as usize).copied()
            }

            pub(crate) fn bits(self) -> u32 {
                self as u32
            }
        }

        const _: () = assert!($name::ALL.len() <= 1 << $name::BITS);
    };
}

context_field! {
    /// Lexical position of the scanner.
    pub enum State: 5 {
        /// Outside an HTML tag, directive, or comment.
        HtmlPcdata => "HTML_PCDATA",
        /// Inside an element whose content is RCDATA (textarea, title, xmp).
        HtmlRcdata => "HTML_RCDATA",
        /// Just after `<`, before a tag name.
        HtmlBeforeOpenTagName => "HTML_BEFORE_OPEN_TAG_NAME",
        /// Just after `</`, before a tag name.
        HtmlBeforeCloseTagName => "HTML_BEFORE_CLOSE_TAG_NAME",
        HtmlTagName => "HTML_TAG_NAME",
        /// Inside a tag, between attributes.
        HtmlTag => "HTML_TAG",
        HtmlAttributeName => "HTML_ATTRIBUTE_NAME",
        /// After `=` and before the attribute value.
        HtmlBeforeAttributeValue => "HTML_BEFORE_ATTRIBUTE_VALUE",
        HtmlComment => "HTML_COMMENT",
        /// Inside a plain-text attribute value.
        HtmlNormalAttrValue => "HTML_NORMAL_ATTR_VALUE",
        Css => "CSS",
        CssComment => "CSS_COMMENT",
        CssDqString => "CSS_DQ_STRING",
        CssSqString => "CSS_SQ_STRING",
        /// Inside an unquoted `url(...)`.
        CssUri => "CSS_URI",
        CssDqUri => "CSS_DQ_URI",
        CssSqUri => "CSS_SQ_URI",
        Js => "JS",
        JsLineComment => "JS_LINE_COMMENT",
        JsBlockComment => "JS_BLOCK_COMMENT",
        JsDqString => "JS_DQ_STRING",
        JsSqString => "JS_SQ_STRING",
        JsRegex => "JS_REGEX",
        Uri => "URI",
        /// Plain text, no escaping convention.
        Text => "TEXT",
    }
}

context_field! {
    /// Special element whose content is parsed differently from HTML.
    pub enum ElementType: 4 {
        None => "NONE",
        Script => "SCRIPT",
        Style => "STYLE",
        Textarea => "TEXTAREA",
        Title => "TITLE",
        Xmp => "XMP",
        /// `<img>` and friends, whose `src` loads media.
        Media => "MEDIA",
        Normal => "NORMAL",
    }
}

context_field! {
    /// Kind of attribute whose name or value is being scanned.
    pub enum AttributeType: 3 {
        None => "NONE",
        Script => "SCRIPT",
        Style => "STYLE",
        Uri => "URI",
        PlainText => "PLAIN_TEXT",
    }
}

context_field! {
    pub enum AttributeEndDelimiter: 2 {
        None => "NONE",
        DoubleQuote => "DOUBLE_QUOTE",
        SingleQuote => "SINGLE_QUOTE",
        /// Unquoted value, ended by whitespace or `>`.
        SpaceOrTagEnd => "SPACE_OR_TAG_END",
    }
}

context_field! {
    /// How a `/` following the current JS position would be read.
    pub enum JsFollowingSlash: 2 {
        None => "NONE",
        Regex => "REGEX",
        DivOp => "DIV_OP",
        /// Branches disagree; a following slash is an error.
        Unknown => "UNKNOWN",
    }
}

context_field! {
    /// Position within a URL.
    pub enum UriPart: 4 {
        None => "NONE",
        /// Nothing has been emitted yet.
        Start => "START",
        /// A dynamic value was emitted at the start; a `:` could still
        /// turn it into a scheme.
        MaybeVariableScheme => "MAYBE_VARIABLE_SCHEME",
        /// Only scheme characters have been seen so far.
        MaybeScheme => "MAYBE_SCHEME",
        AuthorityOrPath => "AUTHORITY_OR_PATH",
        Query => "QUERY",
        Fragment => "FRAGMENT",
        /// Branches joined somewhere before the fragment.
        UnknownPreFragment => "UNKNOWN_PRE_FRAGMENT",
        Unknown => "UNKNOWN",
        /// A hard-coded `javascript:`-like scheme.
        DangerousScheme => "DANGEROUS_SCHEME",
    }
}

context_field! {
    pub enum UriType: 2 {
        None => "NONE",
        Normal => "NORMAL",
        /// Image or other passive media source.
        Media => "MEDIA",
        /// Loads code, e.g. `<script src>`.
        TrustedResource => "TRUSTED_RESOURCE",
    }
}

/// What a state implies about dynamic values printed in it.
pub enum StateEscaping {
    Mode(EscapingMode),
    Forbidden(&'static str),
}

impl State {
    /// The default escaping mode of the state, or why none is safe.
    pub fn escaping(self) -> StateEscaping {
        use EscapingMode as M;
        use StateEscaping::{Forbidden, Mode};

        match self {
            State::HtmlPcdata => Mode(M::EscapeHtml),
            State::HtmlRcdata | State::HtmlComment => Mode(M::EscapeHtmlRcdata),
            State::HtmlBeforeOpenTagName | State::HtmlBeforeCloseTagName => {
                Mode(M::FilterHtmlElementName)
            }
            State::HtmlTagName => Forbidden(
                "Dynamic values are not permitted in the middle of an HTML tag name; \
                 try adding a space before.",
            ),
            State::HtmlTag | State::HtmlAttributeName => Mode(M::FilterHtmlAttributes),
            State::HtmlBeforeAttributeValue => Forbidden("(unexpected state)"),
            State::HtmlNormalAttrValue => Mode(M::EscapeHtmlAttribute),
            State::Css => Mode(M::FilterCssValue),
            State::CssComment => Forbidden("CSS comments cannot contain dynamic values."),
            State::CssDqString | State::CssSqString => Mode(M::EscapeCssString),
            State::CssUri | State::CssDqUri | State::CssSqUri => Mode(M::NormalizeUri),
            State::Js => Mode(M::EscapeJsValue),
            State::JsLineComment | State::JsBlockComment => {
                Forbidden("JS comments cannot contain dynamic values.")
            }
            State::JsDqString | State::JsSqString => Mode(M::EscapeJsString),
            State::JsRegex => Mode(M::EscapeJsRegex),
            State::Uri => Mode(M::NormalizeUri),
            State::Text => Mode(M::Text),
        }
    }

    pub fn is_html_tag_name_start(self) -> bool {
        matches!(
            self,
            State::HtmlBeforeOpenTagName | State::HtmlBeforeCloseTagName
        )
    }
}

impl AttributeEndDelimiter {
    /// The text that closes an attribute value with this delimiter.
    pub fn text(self) -> &'static str {
        match self {
            AttributeEndDelimiter::DoubleQuote => "\"",
            AttributeEndDelimiter::SingleQuote => "'",
            AttributeEndDelimiter::None | AttributeEndDelimiter::SpaceOrTagEnd => "",
        }
    }
}

impl ElementType {
    /// Element type named by a tag, for the few tags that change parsing.
    pub fn for_tag_name(name: &str) -> Self {
        const SPECIAL: &[(&str, ElementType)] = &[
            ("img", ElementType::Media),
            ("script", ElementType::Script),
            ("style", ElementType::Style),
            ("textarea", ElementType::Textarea),
            ("title", ElementType::Title),
            ("xmp", ElementType::Xmp),
        ];
        SPECIAL
            .iter()
            .find(|(tag, _)| tag.eq_ignore_ascii_case(name))
            .map_or(ElementType::Normal, |&(_, el)| el)
    }
}
