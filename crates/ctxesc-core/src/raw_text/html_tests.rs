use crate::{Context, process_raw_text};

fn end(text: &str) -> String {
    process_raw_text(text, Context::HTML_PCDATA)
        .unwrap()
        .end_context()
        .to_string()
}

fn error(text: &str) -> String {
    process_raw_text(text, Context::HTML_PCDATA)
        .unwrap_err()
        .message()
        .to_owned()
}

#[test]
fn plain_markup_returns_to_pcdata() {
    assert_eq!(end("<b>Hello, World!</b>"), "(Context HTML_PCDATA)");
    assert_eq!(end("<br/>"), "(Context HTML_PCDATA)");
    assert_eq!(end("<a href=\"foo\" title='bar' checked>x</a>"), "(Context HTML_PCDATA)");
}

#[test]
fn less_than_that_is_not_a_tag() {
    assert_eq!(end("I <3 kittens"), "(Context HTML_PCDATA)");
}

#[test]
fn partial_tags() {
    assert_eq!(end("<"), "(Context HTML_BEFORE_OPEN_TAG_NAME)");
    assert_eq!(end("</"), "(Context HTML_BEFORE_CLOSE_TAG_NAME)");
    assert_eq!(end("<div"), "(Context HTML_TAG_NAME NORMAL)");
    assert_eq!(end("<div "), "(Context HTML_TAG NORMAL)");
    assert_eq!(end("<div class"), "(Context HTML_ATTRIBUTE_NAME NORMAL PLAIN_TEXT)");
    assert_eq!(
        end("<div class ="),
        "(Context HTML_BEFORE_ATTRIBUTE_VALUE NORMAL PLAIN_TEXT)"
    );
}

#[test]
fn special_elements() {
    assert_eq!(end("<script>"), "(Context JS REGEX)");
    assert_eq!(end("<SCRIPT type=text/javascript>"), "(Context JS REGEX)");
    assert_eq!(end("<style>"), "(Context CSS)");
    assert_eq!(end("<textarea>"), "(Context HTML_RCDATA TEXTAREA)");
    assert_eq!(end("<title>x"), "(Context HTML_RCDATA TITLE)");
    assert_eq!(end("<script>x</script>"), "(Context HTML_PCDATA)");
    // A longer name is not the special element.
    assert_eq!(end("<scripts>"), "(Context HTML_PCDATA)");
}

#[test]
fn rcdata_only_ends_at_its_own_end_tag() {
    assert_eq!(end("<textarea></b>"), "(Context HTML_RCDATA TEXTAREA)");
    assert_eq!(end("<textarea></b></textarea>"), "(Context HTML_PCDATA)");
    assert_eq!(end("<title></TITLE>"), "(Context HTML_PCDATA)");
}

#[test]
fn comments() {
    assert_eq!(end("<!-- x"), "(Context HTML_COMMENT)");
    assert_eq!(end("<!-- <script> -->"), "(Context HTML_PCDATA)");
}

#[test]
fn unmatched_special_close_tag() {
    assert_eq!(
        error("</script>"),
        "Saw unmatched close tag for context-changing tag: script"
    );
    assert_eq!(end("</img>"), "(Context HTML_PCDATA)");
}

#[test]
fn invalid_end_tag_name() {
    assert_eq!(error("</ b>"), "Invalid end-tag name.");
}

#[test]
fn split_tag_name() {
    let in_name: Context = "HTML_TAG_NAME NORMAL".parse().unwrap();
    let err = process_raw_text("cript>", in_name).unwrap_err();
    assert!(err.message().starts_with("Tag names should not be split up."));
}

#[test]
fn template_elements_nest() {
    assert_eq!(
        end("<template><b>"),
        "(Context HTML_PCDATA templateNestDepth=1)"
    );
    assert_eq!(
        end("<template><template>"),
        "(Context HTML_PCDATA templateNestDepth=2)"
    );
    assert_eq!(end("<template></template>"), "(Context HTML_PCDATA)");
    assert_eq!(
        error("</template>"),
        "Saw an html5 </template> without encountering <template>."
    );
}

#[test]
fn attribute_types_from_names() {
    assert_eq!(
        end("<a href=\""),
        "(Context URI NORMAL URI DOUBLE_QUOTE START NORMAL)"
    );
    assert_eq!(
        end("<img src='"),
        "(Context URI MEDIA URI SINGLE_QUOTE START MEDIA)"
    );
    assert_eq!(
        end("<script src=\""),
        "(Context URI SCRIPT URI DOUBLE_QUOTE START TRUSTED_RESOURCE)"
    );
    assert_eq!(
        end("<a data-url=\""),
        "(Context URI NORMAL URI DOUBLE_QUOTE START NORMAL)"
    );
    assert_eq!(
        end("<use xlink:href=\""),
        "(Context URI NORMAL URI DOUBLE_QUOTE START NORMAL)"
    );
    assert_eq!(
        end("<a onclick=\""),
        "(Context JS NORMAL SCRIPT DOUBLE_QUOTE REGEX)"
    );
    assert_eq!(end("<a style=\""), "(Context CSS NORMAL STYLE DOUBLE_QUOTE)");
    assert_eq!(
        end("<a title=\""),
        "(Context HTML_NORMAL_ATTR_VALUE NORMAL PLAIN_TEXT DOUBLE_QUOTE)"
    );
    assert_eq!(
        end("<a curly=\""),
        "(Context HTML_NORMAL_ATTR_VALUE NORMAL PLAIN_TEXT DOUBLE_QUOTE)"
    );
}

#[test]
fn unquoted_values() {
    assert_eq!(
        end("<a title=foo"),
        "(Context HTML_NORMAL_ATTR_VALUE NORMAL PLAIN_TEXT SPACE_OR_TAG_END)"
    );
    assert_eq!(
        end("<a title=foo bar"),
        "(Context HTML_ATTRIBUTE_NAME NORMAL PLAIN_TEXT)"
    );
    assert_eq!(end("<a title=foo>"), "(Context HTML_PCDATA)");
}

#[test]
fn empty_values() {
    assert_eq!(end("<input value=>"), "(Context HTML_PCDATA)");
    assert_eq!(
        end("<input value= name=foo"),
        "(Context HTML_NORMAL_ATTR_VALUE NORMAL PLAIN_TEXT SPACE_OR_TAG_END)"
    );
}

#[test]
fn attribute_values_are_entity_decoded() {
    assert_eq!(
        end("<a onclick=\"alert(&quot;"),
        "(Context JS_DQ_STRING NORMAL SCRIPT DOUBLE_QUOTE)"
    );
    assert_eq!(
        end("<a onclick=\"alert(&quot;x&quot;)\">"),
        "(Context HTML_PCDATA)"
    );
}

#[test]
fn end_tags_inside_attributes_are_text() {
    let in_style: Context = "CSS_DQ_STRING NORMAL STYLE DOUBLE_QUOTE".parse().unwrap();
    let sliced = process_raw_text("</style>", in_style).unwrap();
    assert_eq!(sliced.end_context(), in_style);
}
