use crate::{Context, process_raw_text};

fn ctx(s: &str) -> Context {
    s.parse().unwrap()
}

fn end(text: &str) -> String {
    process_raw_text(text, ctx("CSS"))
        .unwrap()
        .end_context()
        .to_string()
}

fn error(text: &str) -> String {
    process_raw_text(text, ctx("CSS"))
        .unwrap_err()
        .message()
        .to_owned()
}

#[test]
fn declarations_stay_in_css() {
    assert_eq!(end("color: red; background: blue"), "(Context CSS)");
    assert_eq!(end("a { x: 1 }"), "(Context CSS)");
}

#[test]
fn comments() {
    assert_eq!(end("/* x"), "(Context CSS_COMMENT)");
    assert_eq!(end("/* x */ y"), "(Context CSS)");
}

#[test]
fn earliest_token_wins() {
    // The quote comes before the comment opener, so `/*` is string content.
    assert_eq!(end("x \"/*"), "(Context CSS_DQ_STRING)");
    assert_eq!(end("x \"/*\""), "(Context CSS)");
}

#[test]
fn strings() {
    assert_eq!(end("content: '"), "(Context CSS_SQ_STRING)");
    assert_eq!(end("content: \"a\\\nb\""), "(Context CSS)");
    assert_eq!(end("content: \"a\\\"b"), "(Context CSS_DQ_STRING)");
    assert_eq!(
        error("content: \"a\nb"),
        "Newlines not permitted in string literals."
    );
}

#[test]
fn urls() {
    assert_eq!(end("a { x: url(\""), "(Context CSS_DQ_URI START NORMAL)");
    assert_eq!(end("a { x: url( '"), "(Context CSS_SQ_URI START NORMAL)");
    assert_eq!(end("a { x: URL(foo"), "(Context CSS_URI MAYBE_SCHEME NORMAL)");
    assert_eq!(end("url(foo) bar"), "(Context CSS)");
    assert_eq!(end("url('foo')"), "(Context CSS)");
    // Not a word boundary.
    assert_eq!(end("curl("), "(Context CSS)");
}

#[test]
fn media_properties() {
    assert_eq!(end("background: url("), "(Context CSS_URI START MEDIA)");
    assert_eq!(
        end("background-image: url('"),
        "(Context CSS_SQ_URI START MEDIA)"
    );
    assert_eq!(end("p{cursor:url(\""), "(Context CSS_DQ_URI START MEDIA)");
}

#[test]
fn uri_parts_inside_urls() {
    assert_eq!(
        end("x: url(/foo?a="),
        "(Context CSS_URI QUERY NORMAL)"
    );
    assert_eq!(
        end("x: url(javascript:"),
        "(Context CSS_URI DANGEROUS_SCHEME NORMAL)"
    );
}

#[test]
fn quotes_in_unquoted_urls() {
    assert_eq!(error("url(a\""), "Quotes not permitted in CSS URIs.");
}

#[test]
fn style_end_tag() {
    assert_eq!(
        process_raw_text("x</style>", ctx("CSS"))
            .unwrap()
            .end_context(),
        Context::HTML_PCDATA
    );
    assert_eq!(
        process_raw_text("</STYLE >", ctx("CSS_DQ_STRING"))
            .unwrap()
            .end_context(),
        Context::HTML_PCDATA
    );
}
