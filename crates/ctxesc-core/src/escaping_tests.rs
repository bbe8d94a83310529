use crate::context::{Context, State, UriPart};
use crate::escaping::{AutoescapeMode, ContentKind, EscapingMode, escaping_modes_for};

use EscapingMode as M;

fn modes(context: &str) -> Vec<EscapingMode> {
    let context: Context = context.parse().unwrap();
    escaping_modes_for(&context).unwrap()
}

fn error(context: &str) -> String {
    let context: Context = context.parse().unwrap();
    escaping_modes_for(&context).unwrap_err().message().to_owned()
}

#[test]
fn directive_names() {
    assert_eq!(M::EscapeHtml.directive_name(), "|escapeHtml");
    assert_eq!(M::FilterNormalizeMediaUri.directive_name(), "|filterNormalizeMediaUri");
    assert_eq!(M::from_directive("|escapeJsValue"), Some(M::EscapeJsValue));
    assert_eq!(M::from_directive("|bogus"), None);
    for &mode in M::ALL {
        assert_eq!(M::from_directive(mode.directive_name()), Some(mode));
    }
}

#[test]
fn internal_only_modes() {
    let internal: Vec<_> = M::ALL.iter().filter(|m| m.is_internal_only()).collect();
    assert_eq!(internal, [&M::Text]);
}

#[test]
fn content_kind_spellings() {
    assert_eq!(ContentKind::from_attribute_value("js"), Some(ContentKind::Js));
    assert_eq!(
        ContentKind::from_attribute_value("trusted_resource_uri"),
        Some(ContentKind::TrustedResourceUri)
    );
    assert_eq!(ContentKind::from_attribute_value("JS"), None);
    assert_eq!(AutoescapeMode::default(), AutoescapeMode::Strict);
    assert_eq!(
        AutoescapeMode::from_attribute_value("deprecated-contextual"),
        Some(AutoescapeMode::Contextual)
    );
}

#[test]
fn default_modes_per_state() {
    assert_eq!(modes("HTML_PCDATA"), [M::EscapeHtml]);
    assert_eq!(modes("HTML_RCDATA TEXTAREA"), [M::EscapeHtmlRcdata]);
    assert_eq!(modes("HTML_BEFORE_OPEN_TAG_NAME"), [M::FilterHtmlElementName]);
    assert_eq!(modes("HTML_TAG NORMAL"), [M::FilterHtmlAttributes]);
    assert_eq!(modes("JS REGEX"), [M::EscapeJsValue]);
    assert_eq!(modes("JS_SQ_STRING"), [M::EscapeJsString]);
    assert_eq!(modes("JS_REGEX"), [M::EscapeJsRegex]);
    assert_eq!(modes("CSS"), [M::FilterCssValue]);
    assert_eq!(modes("CSS_DQ_STRING"), [M::EscapeCssString]);
    assert_eq!(modes("TEXT"), [M::Text]);
}

#[test]
fn every_state_with_a_default_yields_modes() {
    for &state in State::ALL {
        let context = Context::new(state);
        match state.escaping() {
            crate::context::StateEscaping::Mode(_) => {
                assert!(!escaping_modes_for(&context).unwrap().is_empty(), "{context}");
            }
            crate::context::StateEscaping::Forbidden(message) => {
                let err = escaping_modes_for(&context).unwrap_err();
                assert_eq!(err.message(), message);
            }
        }
    }
}

#[test]
fn quoted_uri_attribute() {
    assert_eq!(
        modes("URI NORMAL URI DOUBLE_QUOTE START NORMAL"),
        [M::FilterNormalizeUri, M::EscapeHtmlAttribute]
    );
    assert_eq!(
        modes("URI NORMAL URI DOUBLE_QUOTE AUTHORITY_OR_PATH NORMAL"),
        [M::EscapeHtmlAttribute]
    );
    assert_eq!(
        modes("URI NORMAL URI DOUBLE_QUOTE QUERY NORMAL"),
        [M::EscapeUri]
    );
}

#[test]
fn unquoted_attribute_values() {
    assert_eq!(
        modes("HTML_NORMAL_ATTR_VALUE NORMAL PLAIN_TEXT SPACE_OR_TAG_END"),
        [M::EscapeHtmlAttributeNospace]
    );
    assert_eq!(
        modes("URI NORMAL URI SPACE_OR_TAG_END START NORMAL"),
        [M::FilterNormalizeUri, M::EscapeHtmlAttributeNospace]
    );
    assert_eq!(
        modes("JS NORMAL SCRIPT SPACE_OR_TAG_END REGEX"),
        [M::EscapeJsValue, M::EscapeHtmlAttributeNospace]
    );
}

#[test]
fn media_and_trusted_uris() {
    assert_eq!(
        modes("URI MEDIA URI DOUBLE_QUOTE START MEDIA"),
        [M::FilterNormalizeMediaUri, M::EscapeHtmlAttribute]
    );
    assert_eq!(
        modes("URI SCRIPT URI DOUBLE_QUOTE START TRUSTED_RESOURCE"),
        [
            M::FilterTrustedResourceUri,
            M::FilterNormalizeUri,
            M::EscapeHtmlAttribute
        ]
    );
    assert_eq!(
        modes("CSS_URI START MEDIA"),
        [M::FilterNormalizeMediaUri]
    );
}

#[test]
fn script_attribute_strings_need_attribute_escaping() {
    assert_eq!(
        modes("JS_DQ_STRING NORMAL SCRIPT SINGLE_QUOTE"),
        [M::EscapeJsString, M::EscapeHtmlAttribute]
    );
}

#[test]
fn ambiguous_uri_parts_are_errors() {
    let attr = |part: &str| format!("URI NORMAL URI DOUBLE_QUOTE {part} NORMAL");
    for part in [
        "UNKNOWN",
        "UNKNOWN_PRE_FRAGMENT",
        "MAYBE_SCHEME",
        "MAYBE_VARIABLE_SCHEME",
        "DANGEROUS_SCHEME",
    ] {
        let context: Context = attr(part).parse().unwrap();
        assert!(escaping_modes_for(&context).is_err(), "{part}");
    }

    insta::assert_snapshot!(
        error(&attr("MAYBE_SCHEME")),
        @r#"Can't prove this URI has a safe scheme at compile time. Either make sure one of ':', '/', '?', or '#' comes before the dynamic value (e.g. foo/{$bar}), or move the print statement to the start of the URI to enable runtime validation (e.g. href="{'foo' + $bar}" instead of href="foo{$bar}")."#
    );
}

#[test]
fn forbidden_states_explain_themselves() {
    assert_eq!(
        error("JS_LINE_COMMENT"),
        "JS comments cannot contain dynamic values."
    );
    assert_eq!(
        error("HTML_TAG_NAME NORMAL"),
        "Dynamic values are not permitted in the middle of an HTML tag name; try adding a space before."
    );
}

#[test]
fn compatibility_of_author_modes() {
    let ctx = |s: &str| s.parse::<Context>().unwrap();
    assert!(!ctx("JS_DQ_STRING").is_compatible_with(M::EscapeJsValue));
    assert!(ctx("JS REGEX").is_compatible_with(M::EscapeJsValue));
    assert!(!ctx("HTML_PCDATA").is_compatible_with(M::Text));
    assert!(ctx("TEXT").is_compatible_with(M::Text));
    let unquoted = ctx("HTML_NORMAL_ATTR_VALUE NORMAL PLAIN_TEXT SPACE_OR_TAG_END");
    assert!(!unquoted.is_compatible_with(M::EscapeHtmlAttribute));
    assert!(unquoted.is_compatible_with(M::EscapeHtmlAttributeNospace));
    assert_eq!(ctx("URI START NORMAL").uri_part(), UriPart::Start);
}
