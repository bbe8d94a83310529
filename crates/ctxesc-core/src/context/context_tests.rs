use super::*;

fn ctx(s: &str) -> Context {
    s.parse().unwrap()
}

#[test]
fn pack_round_trips() {
    let contexts = [
        Context::HTML_PCDATA,
        ctx("JS REGEX"),
        ctx("JS_SQ_STRING"),
        ctx("URI NORMAL URI DOUBLE_QUOTE START NORMAL"),
        ctx("CSS_DQ_URI STYLE SPACE_OR_TAG_END AUTHORITY_OR_PATH MEDIA"),
        ctx("HTML_TAG SCRIPT"),
        ctx("HTML_PCDATA templateNestDepth=3"),
        ctx("URI SCRIPT URI SINGLE_QUOTE QUERY TRUSTED_RESOURCE"),
    ];
    for context in contexts {
        assert_eq!(Context::unpack(context.pack()), Some(context), "{context}");
    }
}

#[test]
fn pack_layout() {
    assert_eq!(Context::HTML_PCDATA.pack(), 0);
    assert_eq!(ctx("JS_DQ_STRING").pack(), 0x14);
    assert_eq!(ctx("JS_SQ_STRING").pack(), 0x15);
    assert_eq!(ctx("JS REGEX").pack(), 0x4011);
}

#[test]
fn deep_nesting_keeps_distinct_keys() {
    let shallow = Context::HTML_PCDATA;
    for depth in [1023, 1024, 1 << 20, u32::MAX] {
        let deep = shallow.with_template_nest_depth(depth);
        assert_ne!(deep.pack(), shallow.pack(), "depth {depth}");
        assert_eq!(Context::unpack(deep.pack()), Some(deep), "depth {depth}");
    }
    assert_eq!(Context::HTML_PCDATA.with_template_nest_depth(1024).pack(), 1024 << 22);
}

#[test]
fn unpack_rejects_unused_bits() {
    // State 31 does not exist.
    assert_eq!(Context::unpack(31), None);
    // A URI part with no URI type.
    let part_shift = State::BITS
        + ElementType::BITS
        + AttributeType::BITS
        + AttributeEndDelimiter::BITS
        + JsFollowingSlash::BITS;
    assert_eq!(Context::unpack(1 << part_shift), None);
    // A nest depth wider than 32 bits.
    assert_eq!(Context::unpack(1 << 54), None);
}

#[test]
fn to_state_leaves_uri() {
    let in_uri = ctx("CSS_URI QUERY NORMAL");
    assert_eq!(in_uri.to_state(State::Css), ctx("CSS"));

    // The URI type survives until the URI itself starts.
    let before_value = ctx("HTML_ATTRIBUTE_NAME NORMAL URI NORMAL");
    assert_eq!(
        before_value.to_state(State::HtmlBeforeAttributeValue),
        ctx("HTML_BEFORE_ATTRIBUTE_VALUE NORMAL URI NORMAL")
    );
}

#[test]
fn start_of_each_kind() {
    assert_eq!(Context::start_of(ContentKind::Html), Context::HTML_PCDATA);
    assert_eq!(Context::start_of(ContentKind::Js), ctx("JS REGEX"));
    assert_eq!(Context::start_of(ContentKind::Css), ctx("CSS"));
    assert_eq!(Context::start_of(ContentKind::Uri), ctx("URI START NORMAL"));
    assert_eq!(
        Context::start_of(ContentKind::TrustedResourceUri),
        ctx("URI START TRUSTED_RESOURCE")
    );
    assert_eq!(Context::start_of(ContentKind::Attributes), ctx("HTML_TAG"));
    assert_eq!(Context::start_of(ContentKind::Text), ctx("TEXT"));
}

#[test]
fn derive_after_escaping_is_idempotent() {
    let cases = [
        (ctx("JS REGEX"), EscapingMode::EscapeJsValue, ctx("JS DIV_OP")),
        (
            ctx("HTML_BEFORE_OPEN_TAG_NAME"),
            EscapingMode::FilterHtmlElementName,
            ctx("HTML_TAG_NAME NORMAL"),
        ),
        (
            ctx("HTML_TAG NORMAL"),
            EscapingMode::FilterHtmlAttributes,
            ctx("HTML_ATTRIBUTE_NAME NORMAL PLAIN_TEXT"),
        ),
        (
            ctx("URI NORMAL URI DOUBLE_QUOTE START NORMAL"),
            EscapingMode::FilterNormalizeUri,
            ctx("URI NORMAL URI DOUBLE_QUOTE MAYBE_VARIABLE_SCHEME NORMAL"),
        ),
        (Context::HTML_PCDATA, EscapingMode::EscapeHtml, Context::HTML_PCDATA),
    ];
    for (before, mode, expected) in cases {
        let once = before.derive_after_escaping(mode);
        assert_eq!(once, expected, "{before} |{mode}");
        assert_eq!(once.derive_after_escaping(mode), once);
    }
}

#[test]
fn before_dynamic_value_commits_to_unquoted() {
    let before = ctx("HTML_BEFORE_ATTRIBUTE_VALUE NORMAL URI NORMAL");
    assert_eq!(
        before.context_before_dynamic_value(),
        ctx("URI NORMAL URI SPACE_OR_TAG_END START NORMAL")
    );
    assert_eq!(
        Context::HTML_PCDATA.context_before_dynamic_value(),
        Context::HTML_PCDATA
    );
}

#[test]
fn after_attribute_delimiter_per_type() {
    let value = |attr, uri_type| {
        Context::after_attribute_delimiter(
            ElementType::Normal,
            attr,
            AttributeEndDelimiter::DoubleQuote,
            uri_type,
            0,
        )
    };
    assert_eq!(
        value(AttributeType::PlainText, UriType::None),
        ctx("HTML_NORMAL_ATTR_VALUE NORMAL PLAIN_TEXT DOUBLE_QUOTE")
    );
    assert_eq!(
        value(AttributeType::Script, UriType::None),
        ctx("JS NORMAL SCRIPT DOUBLE_QUOTE REGEX")
    );
    assert_eq!(
        value(AttributeType::Style, UriType::None),
        ctx("CSS NORMAL STYLE DOUBLE_QUOTE")
    );
    assert_eq!(
        value(AttributeType::Uri, UriType::Normal),
        ctx("URI NORMAL URI DOUBLE_QUOTE START NORMAL")
    );
}

#[test]
fn valid_end_contexts() {
    assert!(Context::HTML_PCDATA.is_valid_end_for(ContentKind::Html));
    assert!(!ctx("HTML_PCDATA templateNestDepth=1").is_valid_end_for(ContentKind::Html));
    assert!(ctx("JS DIV_OP").is_valid_end_for(ContentKind::Js));
    assert!(ctx("HTML_ATTRIBUTE_NAME PLAIN_TEXT").is_valid_end_for(ContentKind::Attributes));
    assert!(ctx("URI AUTHORITY_OR_PATH NORMAL").is_valid_end_for(ContentKind::Uri));
    assert!(!ctx("URI START NORMAL").is_valid_end_for(ContentKind::Uri));
    assert!(!ctx("URI QUERY NORMAL").is_valid_end_for(ContentKind::TrustedResourceUri));
    assert!(!ctx("JS_DQ_STRING").is_valid_end_for(ContentKind::Js));
}

#[test]
fn loose_start_accepts_any_uri_position() {
    let mid_uri = ctx("URI NORMAL URI DOUBLE_QUOTE START NORMAL");
    assert!(!mid_uri.is_valid_start_for(ContentKind::Uri));
    assert!(mid_uri.is_valid_start_for_loose(ContentKind::Uri));
    assert!(!ctx("JS DIV_OP").is_valid_start_for_loose(ContentKind::Js));
}

#[test]
fn loose_start_is_strict_for_trusted_resource_uris() {
    let mid_uri = ctx("URI NORMAL URI DOUBLE_QUOTE START NORMAL");
    assert!(!mid_uri.is_valid_start_for_loose(ContentKind::TrustedResourceUri));

    let start = Context::start_of(ContentKind::TrustedResourceUri);
    assert!(start.is_valid_start_for_loose(ContentKind::TrustedResourceUri));
}

#[test]
fn end_mismatch_causes() {
    assert_eq!(
        ctx("JS_DQ_STRING").likely_end_mismatch_cause(ContentKind::Js),
        "an unterminated string literal"
    );
    assert_eq!(
        ctx("HTML_TAG NORMAL").likely_end_mismatch_cause(ContentKind::Html),
        "an unterminated HTML tag or attribute"
    );
    assert_eq!(
        ctx("HTML_PCDATA templateNestDepth=1").likely_end_mismatch_cause(ContentKind::Html),
        "an unterminated <template> element"
    );
    assert_eq!(
        ctx("HTML_TAG NORMAL").likely_end_mismatch_cause(ContentKind::Attributes),
        "an unterminated attribute value, or ending with an unquoted attribute"
    );
}

#[test]
fn most_appropriate_kind() {
    assert_eq!(Context::HTML_PCDATA.most_appropriate_content_kind(), ContentKind::Html);
    assert_eq!(ctx("JS REGEX").most_appropriate_content_kind(), ContentKind::Js);
    assert_eq!(ctx("HTML_TAG NORMAL").most_appropriate_content_kind(), ContentKind::Attributes);
    assert_eq!(ctx("URI QUERY NORMAL").most_appropriate_content_kind(), ContentKind::Uri);
    // Mid-expression JS cannot take a whole JS block.
    assert_eq!(ctx("JS DIV_OP").most_appropriate_content_kind(), ContentKind::Text);
    assert_eq!(ctx("JS_SQ_STRING").most_appropriate_content_kind(), ContentKind::Text);
}

#[test]
fn msg_escaping_strategies() {
    assert_eq!(
        Context::HTML_PCDATA.msg_escaping_strategy(),
        Some((Context::HTML_PCDATA, vec![]))
    );
    assert_eq!(
        ctx("JS_DQ_STRING").msg_escaping_strategy(),
        Some((ctx("TEXT"), vec![EscapingMode::EscapeJsString]))
    );
    assert_eq!(
        ctx("URI NORMAL URI DOUBLE_QUOTE QUERY NORMAL").msg_escaping_strategy(),
        Some((ctx("TEXT"), vec![EscapingMode::EscapeUri]))
    );
    assert_eq!(
        ctx("HTML_NORMAL_ATTR_VALUE NORMAL PLAIN_TEXT DOUBLE_QUOTE").msg_escaping_strategy(),
        Some((
            ctx("HTML_NORMAL_ATTR_VALUE NORMAL PLAIN_TEXT DOUBLE_QUOTE"),
            vec![EscapingMode::NormalizeHtml]
        ))
    );
    assert_eq!(ctx("JS REGEX").msg_escaping_strategy(), None);
    assert_eq!(ctx("URI AUTHORITY_OR_PATH NORMAL").msg_escaping_strategy(), None);
}
