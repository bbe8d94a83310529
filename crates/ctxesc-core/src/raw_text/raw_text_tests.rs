use super::*;

fn ctx(s: &str) -> Context {
    s.parse().unwrap()
}

fn slices(text: &str, start: &str) -> Vec<(usize, usize, String)> {
    process_raw_text(text, ctx(start))
        .unwrap()
        .slices()
        .iter()
        .map(|s| (s.start, s.end, s.context.to_string()))
        .collect()
}

#[test]
fn empty_text_keeps_the_context() {
    let sliced = process_raw_text("", ctx("JS DIV_OP")).unwrap();
    assert!(sliced.slices().is_empty());
    assert_eq!(sliced.end_context(), ctx("JS DIV_OP"));
}

#[test]
fn advance_consumes_one_token() {
    assert_eq!(
        advance(Context::HTML_PCDATA, "<b>").unwrap(),
        (ctx("HTML_BEFORE_OPEN_TAG_NAME"), 1)
    );
    assert_eq!(advance(ctx("JS REGEX"), "foo bar").unwrap(), (ctx("JS DIV_OP"), 3));
}

#[test]
fn advance_treats_an_attribute_value_as_one_token() {
    let in_title = ctx("HTML_NORMAL_ATTR_VALUE NORMAL PLAIN_TEXT DOUBLE_QUOTE");
    assert_eq!(
        advance(in_title, "abc\" x").unwrap(),
        (ctx("HTML_TAG NORMAL"), 4)
    );
    assert_eq!(advance(in_title, "abc").unwrap(), (in_title, 3));
}

#[test]
fn slices_cover_tokens_in_order() {
    assert_eq!(
        slices("<b>hi", "HTML_PCDATA"),
        [
            (0, 1, "(Context HTML_PCDATA)".to_owned()),
            (1, 2, "(Context HTML_BEFORE_OPEN_TAG_NAME)".to_owned()),
            (2, 3, "(Context HTML_TAG NORMAL)".to_owned()),
            (3, 5, "(Context HTML_PCDATA)".to_owned()),
        ]
    );
}

#[test]
fn attribute_slices_map_back_to_encoded_offsets() {
    let start = "JS NORMAL SCRIPT DOUBLE_QUOTE REGEX";
    assert_eq!(
        slices("x&quot;y\"", start),
        [
            (0, 1, "(Context JS NORMAL SCRIPT DOUBLE_QUOTE REGEX)".to_owned()),
            (1, 7, "(Context JS NORMAL SCRIPT DOUBLE_QUOTE DIV_OP)".to_owned()),
            (7, 8, "(Context JS_DQ_STRING NORMAL SCRIPT DOUBLE_QUOTE)".to_owned()),
            (8, 9, "(Context JS_DQ_STRING NORMAL SCRIPT DOUBLE_QUOTE)".to_owned()),
        ]
    );
    assert_eq!(
        process_raw_text("x&quot;y\"", ctx(start))
            .unwrap()
            .end_context(),
        ctx("HTML_TAG NORMAL")
    );
}

#[test]
fn no_transition_is_an_error() {
    let err = process_raw_text("\\", ctx("JS REGEX")).unwrap_err();
    insta::assert_snapshot!(
        err.message(),
        @r#"Error determining next state when encountering "\" in (Context JS REGEX)"#
    );
}

#[test]
fn splitting_at_token_boundaries_does_not_change_the_end() {
    let cases = [
        ("HTML_PCDATA", "Hello, world"),
        ("CSS", "color: red; background: blue"),
        ("URI START NORMAL", "foo/bar/baz"),
        ("JS REGEX", "'abc'"),
        ("HTML_COMMENT", "a - b -- c"),
    ];
    for (start, text) in cases {
        let whole = process_raw_text(text, ctx(start)).unwrap().end_context();
        let mut context = ctx(start);
        for (i, c) in text.char_indices() {
            let chunk = &text[i..i + c.len_utf8()];
            context = process_raw_text(chunk, context).unwrap().end_context();
        }
        assert_eq!(context, whole, "{text:?} from {start}");
    }
}
