use indoc::indoc;

use super::{Node, NodeKind, Print, TemplateSet, parse, print_template};
use crate::source_map::SourceMap;

fn parse_ok(text: &str) -> TemplateSet {
    let mut set = TemplateSet::new();
    let id = SourceMap::inline(text).iter().map(|s| s.id).next().unwrap();
    parse(&mut set, id, text).unwrap();
    set
}

fn nonce(set: &mut TemplateSet, span: super::Span) -> Node {
    Node {
        id: set.ids.next_id(),
        span,
        kind: NodeKind::Print(Print {
            expr: "$nonce".to_owned(),
            directives: Vec::new(),
        }),
    }
}

#[test]
fn clones_get_fresh_ids() {
    let mut set = parse_ok(indoc! {"
        {namespace ns}
        {template .t}
          {if $a}<b>{$x}</b>{/if}
        {/template}
    "});

    let original = set.templates[0].clone();
    let clone = original.clone_with_new_ids("ns.t__C1", &mut set.ids);

    assert_eq!(clone.name, "ns.t__C1");
    assert_ne!(clone.id, original.id);
    assert_ne!(clone.body[0].id, original.body[0].id);
    assert!(clone.body[0].id.index() > original.body[0].id.index());
    assert_eq!(
        print_template(&clone),
        print_template(&original).replace("ns.t}", "ns.t__C1}")
    );
}

#[test]
fn splice_splits_raw_text() {
    let mut set = parse_ok(indoc! {"
        {namespace ns}
        {template .t}
          <script>x</script>
        {/template}
    "});

    let text_node = &set.templates[0].body[0];
    let (id, span) = (text_node.id, text_node.span);
    let inserted = nonce(&mut set, span);

    assert!(set.splice_raw_text(id, 8, vec![inserted]));
    insta::assert_snapshot!(print_template(&set.templates[0]), @r"
    {template ns.t}
    <script>{$nonce}x</script>
    {/template}
    ");

    let body = &set.templates[0].body;
    assert_eq!(body.len(), 3);
    assert_eq!(body[0].id, id);
}

#[test]
fn splice_at_the_edges_drops_empty_halves() {
    let mut set = parse_ok(indoc! {"
        {namespace ns}
        {template .t}
          {if $a}abc{/if}
        {/template}
    "});

    let NodeKind::If(branches) = &set.templates[0].body[0].kind else {
        panic!("expected if");
    };
    let text_node = &branches[0].body[0];
    let (id, span) = (text_node.id, text_node.span);
    let inserted = nonce(&mut set, span);

    assert!(set.splice_raw_text(id, 0, vec![inserted]));
    let NodeKind::If(branches) = &set.templates[0].body[0].kind else {
        panic!("expected if");
    };
    assert_eq!(branches[0].body.len(), 2);
    assert!(matches!(branches[0].body[0].kind, NodeKind::Print(_)));
}

#[test]
fn splice_rejects_unknown_nodes_and_offsets() {
    let mut set = parse_ok(indoc! {"
        {namespace ns}
        {template .t}
          abc{$x}
        {/template}
    "});

    let text_id = set.templates[0].body[0].id;
    let print_id = set.templates[0].body[1].id;
    assert!(!set.splice_raw_text(text_id, 4, Vec::new()));
    assert!(!set.splice_raw_text(print_id, 0, Vec::new()));
}
