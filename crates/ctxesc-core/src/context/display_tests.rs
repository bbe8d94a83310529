use super::*;

#[test]
fn display_omits_empty_fields() {
    insta::assert_snapshot!(Context::HTML_PCDATA, @"(Context HTML_PCDATA)");

    let in_href = Context::after_attribute_delimiter(
        ElementType::Normal,
        AttributeType::Uri,
        AttributeEndDelimiter::DoubleQuote,
        UriType::Normal,
        2,
    );
    insta::assert_snapshot!(
        in_href,
        @"(Context URI NORMAL URI DOUBLE_QUOTE START NORMAL templateNestDepth=2)"
    );
}

#[test]
fn parse_accepts_bare_and_wrapped_forms() {
    let wrapped: Context = "(Context JS_DQ_STRING)".parse().unwrap();
    let bare: Context = "JS_DQ_STRING".parse().unwrap();
    assert_eq!(wrapped, bare);
    assert_eq!(bare.state(), State::JsDqString);
}

#[test]
fn parse_round_trips_display() {
    let texts = [
        "(Context HTML_PCDATA)",
        "(Context HTML_TAG SCRIPT)",
        "(Context JS SCRIPT SCRIPT DOUBLE_QUOTE REGEX)",
        "(Context CSS STYLE)",
        "(Context CSS NORMAL STYLE SINGLE_QUOTE)",
        "(Context URI MEDIA URI SPACE_OR_TAG_END START MEDIA)",
        "(Context HTML_RCDATA TEXTAREA templateNestDepth=1)",
    ];
    for text in texts {
        let context: Context = text.parse().unwrap();
        assert_eq!(context.to_string(), text);
    }
}

#[test]
fn parse_disambiguates_shared_names() {
    // STYLE names the element here: no attribute is being scanned.
    let tag: Context = "HTML_TAG STYLE".parse().unwrap();
    assert_eq!(tag.element_type(), ElementType::Style);
    assert_eq!(tag.attribute_type(), AttributeType::None);

    // And the attribute here, since a delimiter is open.
    let value: Context = "CSS STYLE DOUBLE_QUOTE".parse().unwrap();
    assert_eq!(value.element_type(), ElementType::None);
    assert_eq!(value.attribute_type(), AttributeType::Style);
}

#[test]
fn parse_errors() {
    assert_eq!("".parse::<Context>(), Err(ParseContextError::Empty));
    assert_eq!(
        "NOT_A_STATE".parse::<Context>(),
        Err(ParseContextError::UnknownState("NOT_A_STATE".to_owned()))
    );
    assert_eq!(
        "JS BANANA".parse::<Context>(),
        Err(ParseContextError::UnknownField("BANANA".to_owned()))
    );
    assert_eq!(
        "URI START".parse::<Context>(),
        Err(ParseContextError::UriPartWithoutType)
    );
}
