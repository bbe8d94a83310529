use super::*;

fn ctx(s: &str) -> Context {
    s.parse().unwrap()
}

fn union(a: &str, b: &str) -> Option<Context> {
    let (a, b) = (ctx(a), ctx(b));
    let joined = a.union(b);
    assert_eq!(joined, b.union(a), "union of {a} and {b} is not symmetric");
    joined
}

#[test]
fn union_is_reflexive() {
    for text in [
        "HTML_PCDATA",
        "JS REGEX",
        "URI NORMAL URI DOUBLE_QUOTE QUERY NORMAL",
        "HTML_TAG SCRIPT",
        "CSS_DQ_STRING",
    ] {
        assert_eq!(union(text, text), Some(ctx(text)));
    }
}

#[test]
fn slash_disagreement_becomes_unknown() {
    assert_eq!(union("JS REGEX", "JS DIV_OP"), Some(ctx("JS UNKNOWN")));
}

#[test]
fn uri_parts_join() {
    let attr = |part: &str| format!("URI NORMAL URI DOUBLE_QUOTE {part} NORMAL");
    let join = |a: &str, b: &str| union(&attr(a), &attr(b)).map(|c| c.uri_part());

    assert_eq!(join("QUERY", "DANGEROUS_SCHEME"), Some(UriPart::DangerousScheme));
    assert_eq!(join("FRAGMENT", "QUERY"), Some(UriPart::Unknown));
    assert_eq!(join("UNKNOWN", "AUTHORITY_OR_PATH"), Some(UriPart::Unknown));
    assert_eq!(
        join("MAYBE_VARIABLE_SCHEME", "AUTHORITY_OR_PATH"),
        Some(UriPart::MaybeVariableScheme)
    );
    assert_eq!(
        join("MAYBE_VARIABLE_SCHEME", "UNKNOWN_PRE_FRAGMENT"),
        Some(UriPart::UnknownPreFragment)
    );
    assert_eq!(join("QUERY", "AUTHORITY_OR_PATH"), Some(UriPart::UnknownPreFragment));
    assert_eq!(join("START", "MAYBE_SCHEME"), Some(UriPart::UnknownPreFragment));
}

#[test]
fn tag_name_joins_tag_body() {
    assert_eq!(
        union("HTML_TAG_NAME NORMAL", "HTML_TAG NORMAL"),
        Some(ctx("HTML_TAG NORMAL"))
    );
}

#[test]
fn valueless_attribute_joins_tag_body() {
    assert_eq!(
        union("HTML_TAG NORMAL", "HTML_ATTRIBUTE_NAME NORMAL PLAIN_TEXT"),
        Some(ctx("HTML_TAG NORMAL"))
    );
    assert_eq!(
        union(
            "HTML_TAG NORMAL",
            "HTML_NORMAL_ATTR_VALUE NORMAL PLAIN_TEXT SPACE_OR_TAG_END"
        ),
        Some(ctx("HTML_TAG NORMAL"))
    );
}

#[test]
fn different_elements_do_not_join() {
    assert_eq!(union("HTML_TAG SCRIPT", "HTML_ATTRIBUTE_NAME NORMAL PLAIN_TEXT"), None);
}

#[test]
fn quoted_and_unquoted_values_diverge() {
    assert_eq!(
        union(
            "URI NORMAL URI DOUBLE_QUOTE MAYBE_SCHEME NORMAL",
            "URI NORMAL URI SPACE_OR_TAG_END MAYBE_SCHEME NORMAL"
        ),
        None
    );
}

#[test]
fn states_in_different_grammars_diverge() {
    assert_eq!(union("HTML_PCDATA", "JS REGEX"), None);
    assert_eq!(union("CSS", "CSS_COMMENT"), None);
}

#[test]
fn union_all_folds() {
    let contexts = [ctx("JS REGEX"), ctx("JS DIV_OP"), ctx("JS REGEX")];
    assert_eq!(Context::union_all(contexts), Some(ctx("JS UNKNOWN")));
    assert_eq!(Context::union_all(Vec::new()), None);
}
