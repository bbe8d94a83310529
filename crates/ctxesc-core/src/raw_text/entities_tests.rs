use super::decode_entities;

#[test]
fn named_references() {
    assert_eq!(decode_entities("a&amp;b").text, "a&b");
    assert_eq!(decode_entities("&lt;&gt;&quot;&apos;").text, "<>\"'");
    assert_eq!(decode_entities("javascript&colon;x").text, "javascript:x");
}

#[test]
fn numeric_references() {
    assert_eq!(decode_entities("&#60;&#x3C;&#X3c;").text, "<<<");
    assert_eq!(decode_entities("&#58").text, ":");
    assert_eq!(decode_entities("&#0;").text, "\0");
    assert_eq!(decode_entities("&#x110000;").text, "\u{FFFD}");
}

#[test]
fn legacy_names_without_semicolon() {
    assert_eq!(decode_entities("&amp").text, "&");
    assert_eq!(decode_entities("&quot x").text, "\" x");
    // Only the legacy names, and not when a name character follows.
    assert_eq!(decode_entities("&ampx").text, "&ampx");
    assert_eq!(decode_entities("&amp=").text, "&amp=");
    assert_eq!(decode_entities("&colon").text, "&colon");
}

#[test]
fn unknown_references_are_left_alone() {
    assert_eq!(decode_entities("&bogus;").text, "&bogus;");
    assert_eq!(decode_entities("&#xZZ;").text, "&#xZZ;");
    assert_eq!(decode_entities("a & b").text, "a & b");
    assert_eq!(decode_entities("&").text, "&");
}

#[test]
fn offsets_map_back_to_encoded_text() {
    let decoded = decode_entities("a&amp;b");
    assert_eq!(decoded.encoded_offset(0), 0);
    assert_eq!(decoded.encoded_offset(1), 1);
    assert_eq!(decoded.encoded_offset(2), 6);
    assert_eq!(decoded.encoded_offset(3), 7);

    // Both bytes of U+00A0 come from the same reference.
    let decoded = decode_entities("&nbsp;x");
    assert_eq!(decoded.text, "\u{A0}x");
    assert_eq!(decoded.encoded_offset(0), 0);
    assert_eq!(decoded.encoded_offset(1), 0);
    assert_eq!(decoded.encoded_offset(2), 6);
    assert_eq!(decoded.encoded_offset(3), 7);
}
