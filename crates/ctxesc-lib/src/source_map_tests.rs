use super::source_map::{SourceId, SourceKind, SourceMap};

#[test]
fn inline_source() {
    let map = SourceMap::inline("hello world");
    let id = SourceId(0);

    assert_eq!(map.content(id), "hello world");
    assert_eq!(map.kind(id), &SourceKind::Inline);
    assert_eq!(map.len(), 1);
}

#[test]
fn multiple_sources() {
    let mut map = SourceMap::new();
    let a = map.add_file("a.soy", "content a");
    let b = map.add_stdin("piped");

    assert_eq!(map.len(), 2);
    assert_eq!(map.content(a), "content a");
    assert_eq!(map.content(b), "piped");
    assert_eq!(map.kind(a).display_name(), "a.soy");
    assert_eq!(map.kind(b).display_name(), "<stdin>");

    let ids: Vec<_> = map.iter().map(|s| s.id).collect();
    assert_eq!(ids, [a, b]);
}

#[test]
fn line_and_column() {
    let map = SourceMap::inline("ab\ncdé\n\nx");
    let id = SourceId(0);

    assert_eq!(map.line_col(id, 0), (1, 1));
    assert_eq!(map.line_col(id, 1), (1, 2));
    assert_eq!(map.line_col(id, 2), (1, 3));
    assert_eq!(map.line_col(id, 3), (2, 1));
    // Columns count characters, not bytes.
    assert_eq!(map.line_col(id, 7), (2, 4));
    assert_eq!(map.line_col(id, 8), (3, 1));
    assert_eq!(map.line_col(id, 9), (4, 1));
    // Clamped to the end.
    assert_eq!(map.line_col(id, 100), (4, 2));
}
