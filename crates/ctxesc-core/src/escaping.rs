//! Sanitizers and the choice of sanitizers for a context.

use std::fmt;

use crate::context::{
    AttributeEndDelimiter, Context, State, StateEscaping, UriPart, UriType,
};
use crate::error::AutoescapeError;

/// An output-sanitization function, named by its print directive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EscapingMode {
    EscapeHtml,
    /// Like `EscapeHtml`, but leaves existing entities and safe markup alone.
    NormalizeHtml,
    EscapeHtmlRcdata,
    EscapeHtmlAttribute,
    /// For unquoted attribute values; also escapes whitespace.
    EscapeHtmlAttributeNospace,
    FilterHtmlElementName,
    FilterHtmlAttributes,
    EscapeJsString,
    EscapeJsValue,
    EscapeJsRegex,
    EscapeCssString,
    FilterCssValue,
    EscapeUri,
    NormalizeUri,
    FilterNormalizeUri,
    FilterNormalizeMediaUri,
    FilterTrustedResourceUri,
    NoAutoescape,
    /// Plain-text output. Reserved for the autoescaper.
    Text,
}

impl EscapingMode {
    pub const ALL: &'static [EscapingMode] = &[
        EscapingMode::EscapeHtml,
        EscapingMode::NormalizeHtml,
        EscapingMode::EscapeHtmlRcdata,
        EscapingMode::EscapeHtmlAttribute,
        EscapingMode::EscapeHtmlAttributeNospace,
        EscapingMode::FilterHtmlElementName,
        EscapingMode::FilterHtmlAttributes,
        EscapingMode::EscapeJsString,
        EscapingMode::EscapeJsValue,
        EscapingMode::EscapeJsRegex,
        EscapingMode::EscapeCssString,
        EscapingMode::FilterCssValue,
        EscapingMode::EscapeUri,
        EscapingMode::NormalizeUri,
        EscapingMode::FilterNormalizeUri,
        EscapingMode::FilterNormalizeMediaUri,
        EscapingMode::FilterTrustedResourceUri,
        EscapingMode::NoAutoescape,
        EscapingMode::Text,
    ];

    /// The print directive that applies this mode, e.g. `|escapeHtml`.
    pub fn directive_name(self) -> &'static str {
        match self {
            EscapingMode::EscapeHtml => "|escapeHtml",
            EscapingMode::NormalizeHtml => "|normalizeHtml",
            EscapingMode::EscapeHtmlRcdata => "|escapeHtmlRcdata",
            EscapingMode::EscapeHtmlAttribute => "|escapeHtmlAttribute",
            EscapingMode::EscapeHtmlAttributeNospace => "|escapeHtmlAttributeNospace",
            EscapingMode::FilterHtmlElementName => "|filterHtmlElementName",
            EscapingMode::FilterHtmlAttributes => "|filterHtmlAttributes",
            EscapingMode::EscapeJsString => "|escapeJsString",
            EscapingMode::EscapeJsValue => "|escapeJsValue",
            EscapingMode::EscapeJsRegex => "|escapeJsRegex",
            EscapingMode::EscapeCssString => "|escapeCssString",
            EscapingMode::FilterCssValue => "|filterCssValue",
            EscapingMode::EscapeUri => "|escapeUri",
            EscapingMode::NormalizeUri => "|normalizeUri",
            EscapingMode::FilterNormalizeUri => "|filterNormalizeUri",
            EscapingMode::FilterNormalizeMediaUri => "|filterNormalizeMediaUri",
            EscapingMode::FilterTrustedResourceUri => "|filterTrustedResourceUri",
            EscapingMode::NoAutoescape => "|noAutoescape",
            EscapingMode::Text => "|text",
        }
    }

    pub fn from_directive(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.directive_name() == name)
    }

    /// Whether the output is free of quotes and safe to embed in a quoted
    /// HTML attribute without further escaping.
    pub fn is_html_embeddable(self) -> bool {
        matches!(
            self,
            EscapingMode::EscapeHtml
                | EscapingMode::NormalizeHtml
                | EscapingMode::EscapeHtmlRcdata
                | EscapingMode::EscapeHtmlAttribute
                | EscapingMode::EscapeHtmlAttributeNospace
                | EscapingMode::FilterHtmlElementName
                | EscapingMode::FilterHtmlAttributes
                | EscapingMode::EscapeCssString
                | EscapingMode::EscapeUri
        )
    }

    /// Kind of sanitized content the mode produces, when it is a known kind.
    pub fn content_kind(self) -> Option<ContentKind> {
        match self {
            EscapingMode::EscapeHtml => Some(ContentKind::Html),
            EscapingMode::FilterCssValue => Some(ContentKind::Css),
            EscapingMode::EscapeUri
            | EscapingMode::NormalizeUri
            | EscapingMode::FilterNormalizeUri
            | EscapingMode::FilterNormalizeMediaUri => Some(ContentKind::Uri),
            EscapingMode::FilterTrustedResourceUri => Some(ContentKind::TrustedResourceUri),
            EscapingMode::NoAutoescape | EscapingMode::Text => Some(ContentKind::Text),
            _ => None,
        }
    }

    /// Modes authors may not write themselves.
    pub fn is_internal_only(self) -> bool {
        self == EscapingMode::Text
    }
}

impl fmt::Display for EscapingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EscapingMode::EscapeHtml => "ESCAPE_HTML",
            EscapingMode::NormalizeHtml => "NORMALIZE_HTML",
            EscapingMode::EscapeHtmlRcdata => "ESCAPE_HTML_RCDATA",
            EscapingMode::EscapeHtmlAttribute => "ESCAPE_HTML_ATTRIBUTE",
            EscapingMode::EscapeHtmlAttributeNospace => "ESCAPE_HTML_ATTRIBUTE_NOSPACE",
            EscapingMode::FilterHtmlElementName => "FILTER_HTML_ELEMENT_NAME",
            EscapingMode::FilterHtmlAttributes => "FILTER_HTML_ATTRIBUTES",
            EscapingMode::EscapeJsString => "ESCAPE_JS_STRING",
            EscapingMode::EscapeJsValue => "ESCAPE_JS_VALUE",
            EscapingMode::EscapeJsRegex => "ESCAPE_JS_REGEX",
            EscapingMode::EscapeCssString => "ESCAPE_CSS_STRING",
            EscapingMode::FilterCssValue => "FILTER_CSS_VALUE",
            EscapingMode::EscapeUri => "ESCAPE_URI",
            EscapingMode::NormalizeUri => "NORMALIZE_URI",
            EscapingMode::FilterNormalizeUri => "FILTER_NORMALIZE_URI",
            EscapingMode::FilterNormalizeMediaUri => "FILTER_NORMALIZE_MEDIA_URI",
            EscapingMode::FilterTrustedResourceUri => "FILTER_TRUSTED_RESOURCE_URI",
            EscapingMode::NoAutoescape => "NO_AUTOESCAPE",
            EscapingMode::Text => "TEXT",
        };
        f.write_str(name)
    }
}

/// Declared kind of a block of template output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Html,
    Js,
    Uri,
    Attributes,
    Css,
    Text,
    TrustedResourceUri,
}

impl ContentKind {
    pub const ALL: &'static [ContentKind] = &[
        ContentKind::Html,
        ContentKind::Js,
        ContentKind::Uri,
        ContentKind::Attributes,
        ContentKind::Css,
        ContentKind::Text,
        ContentKind::TrustedResourceUri,
    ];

    /// Spelling of the kind in a `kind="..."` attribute.
    pub fn attribute_value(self) -> &'static str {
        match self {
            ContentKind::Html => "html",
            ContentKind::Js => "js",
            ContentKind::Uri => "uri",
            ContentKind::Attributes => "attributes",
            ContentKind::Css => "css",
            ContentKind::Text => "text",
            ContentKind::TrustedResourceUri => "trusted_resource_uri",
        }
    }

    pub fn from_attribute_value(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.attribute_value() == value)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute_value())
    }
}

/// How a template's output is escaped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AutoescapeMode {
    /// Escaping inferred from context, with typed blocks and calls checked.
    #[default]
    Strict,
    /// Escaping inferred from context.
    Contextual,
    /// Every bare print is HTML-escaped regardless of context.
    NonContextual,
}

impl AutoescapeMode {
    pub fn attribute_value(self) -> &'static str {
        match self {
            AutoescapeMode::Strict => "strict",
            AutoescapeMode::Contextual => "deprecated-contextual",
            AutoescapeMode::NonContextual => "deprecated-noncontextual",
        }
    }

    pub fn from_attribute_value(value: &str) -> Option<Self> {
        [
            AutoescapeMode::Strict,
            AutoescapeMode::Contextual,
            AutoescapeMode::NonContextual,
        ]
        .into_iter()
        .find(|mode| mode.attribute_value() == value)
    }
}

// ============================================================================
// Mode selection
// ============================================================================

const MAYBE_VARIABLE_SCHEME_MESSAGE: &str = "Can't prove this URI concatenation has a safe \
     scheme at compile time. Either combine adjacent print statements (e.g. {$x + $y} instead \
     of {$x}{$y}), or introduce disambiguating characters (e.g. {$x}/{$y}, {$x}?y={$y}, \
     {$x}&y={$y}, {$x}#{$y})";

const MAYBE_SCHEME_MESSAGE: &str = "Can't prove this URI has a safe scheme at compile time. \
     Either make sure one of ':', '/', '?', or '#' comes before the dynamic value (e.g. \
     foo/{$bar}), or move the print statement to the start of the URI to enable runtime \
     validation (e.g. href=\"{'foo' + $bar}\" instead of href=\"foo{$bar}\").";

const DANGEROUS_SCHEME_MESSAGE: &str = "Can't properly escape for this URI scheme. For image \
     sources, you can print full data and blob URIs directly (e.g. src=\"{$someDataUri}\"). \
     Otherwise, hardcode the full URI in the template or pass a complete SanitizedContent or \
     SafeUri object.";

const UNKNOWN_URI_PART_MESSAGE: &str = "Cannot determine which part of the URL this dynamic \
     value is in. Most likely, a preceding conditional block began a ?query or #fragment, but \
     only on one branch.";

/// Sanitizers to apply, in order, to a value printed in `context`.
///
/// Fails when no single choice is safe for every way the context could
/// continue; the error says how to disambiguate.
pub fn escaping_modes_for(context: &Context) -> Result<Vec<EscapingMode>, AutoescapeError> {
    let mut primary = match context.state().escaping() {
        StateEscaping::Mode(mode) => mode,
        StateEscaping::Forbidden(message) => return Err(AutoescapeError::new(message)),
    };
    let mut extra = None;

    let trusted_resource = (context.uri_type() == UriType::TrustedResource)
        .then_some(EscapingMode::FilterTrustedResourceUri);

    match context.uri_part() {
        UriPart::Query => primary = EscapingMode::EscapeUri,
        UriPart::Start => {
            if primary != EscapingMode::NormalizeUri {
                extra = Some(primary);
            }
            primary = if context.uri_type() == UriType::Media {
                EscapingMode::FilterNormalizeMediaUri
            } else {
                EscapingMode::FilterNormalizeUri
            };
        }
        UriPart::Unknown | UriPart::UnknownPreFragment => {
            return Err(AutoescapeError::new(UNKNOWN_URI_PART_MESSAGE));
        }
        UriPart::MaybeVariableScheme => {
            return Err(AutoescapeError::new(MAYBE_VARIABLE_SCHEME_MESSAGE));
        }
        UriPart::MaybeScheme => return Err(AutoescapeError::new(MAYBE_SCHEME_MESSAGE)),
        UriPart::DangerousScheme => return Err(AutoescapeError::new(DANGEROUS_SCHEME_MESSAGE)),
        UriPart::None | UriPart::AuthorityOrPath | UriPart::Fragment => {}
    }

    match context.delimiter() {
        AttributeEndDelimiter::SpaceOrTagEnd => {
            if matches!(
                primary,
                EscapingMode::EscapeHtmlAttribute | EscapingMode::NormalizeUri
            ) {
                primary = EscapingMode::EscapeHtmlAttributeNospace;
            } else {
                extra = Some(EscapingMode::EscapeHtmlAttributeNospace);
            }
        }
        AttributeEndDelimiter::DoubleQuote | AttributeEndDelimiter::SingleQuote => {
            if primary == EscapingMode::NormalizeUri {
                // A normalized URI only needs its quotes escaped.
                primary = EscapingMode::EscapeHtmlAttribute;
            } else if !primary.is_html_embeddable() {
                extra = Some(EscapingMode::EscapeHtmlAttribute);
            }
        }
        AttributeEndDelimiter::None => {}
    }

    Ok(trusted_resource
        .into_iter()
        .chain(Some(primary))
        .chain(extra)
        .collect())
}

impl Context {
    /// Whether an author-supplied `mode` is safe as the first sanitizer here.
    pub fn is_compatible_with(&self, mode: EscapingMode) -> bool {
        if mode == EscapingMode::EscapeJsValue {
            // A JS value would introduce its own quotes inside an open string.
            return !matches!(
                self.state(),
                State::JsSqString | State::JsDqString | State::CssSqString | State::CssDqString
            );
        }
        if mode == EscapingMode::Text {
            return self.state() == State::Text;
        }
        if self.delimiter() == AttributeEndDelimiter::SpaceOrTagEnd {
            return !matches!(
                mode,
                EscapingMode::EscapeHtml
                    | EscapingMode::EscapeHtmlAttribute
                    | EscapingMode::EscapeHtmlRcdata
            );
        }
        true
    }
}
