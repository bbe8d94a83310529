use std::rc::Rc;

use ctxesc_core::{Context, EscapingMode, State, process_raw_text};
use indoc::indoc;

use super::store::Inferences;
use crate::source_map::SourceMap;
use crate::tree::{IdGenerator, TemplateSet, parse};

fn seeded(text: &str) -> (Inferences, IdGenerator) {
    let mut set = TemplateSet::new();
    let id = SourceMap::inline(text).iter().map(|s| s.id).next().unwrap();
    parse(&mut set, id, text).unwrap();
    let TemplateSet { templates, ids } = set;
    (Inferences::new(templates), ids)
}

const TWO_TEMPLATES: &str = indoc! {"
    {namespace ns}
    {template .a}{$x}{/template}
    {template .b}{$y}{/template}
"};

#[test]
fn speculative_layers_shadow_the_base() {
    let (mut store, mut ids) = seeded(TWO_TEMPLATES);
    let node = ids.next_id();
    let js = Context::new(State::Js);

    store.record_end_context("ns.a", Context::HTML_PCDATA);
    store.push();
    assert_eq!(store.depth(), 2);
    assert_eq!(store.end_context("ns.a"), Some(Context::HTML_PCDATA));

    store.record_end_context("ns.a", js);
    store.record_escaping_modes(node, vec![EscapingMode::EscapeJsValue]);
    assert_eq!(store.end_context("ns.a"), Some(js));
    assert_eq!(
        store.escaping_modes(node),
        Some(&[EscapingMode::EscapeJsValue][..])
    );

    store.fold();
    assert_eq!(store.depth(), 1);
    assert_eq!(store.end_context("ns.a"), Some(js));
    assert_eq!(
        store.escaping_modes(node),
        Some(&[EscapingMode::EscapeJsValue][..])
    );
}

#[test]
fn discard_forgets_the_layer() {
    let (mut store, mut ids) = seeded(TWO_TEMPLATES);
    let call = ids.next_id();

    store.push();
    store.record_end_context("ns.b", Context::HTML_PCDATA);
    store.retarget(call, "ns.b__C1");
    store.record_checked("ns.b");
    let clone = store.templates("ns.b").unwrap();
    store.add_templates("ns.b__C1", clone);
    assert_eq!(store.retargeted(call), Some("ns.b__C1"));
    assert!(store.was_checked("ns.b"));

    store.discard();
    assert_eq!(store.end_context("ns.b"), None);
    assert_eq!(store.retargeted(call), None);
    assert!(!store.was_checked("ns.b"));
    assert!(store.templates("ns.b__C1").is_none());
    assert_eq!(store.template_names(), ["ns.a", "ns.b"]);
}

#[test]
fn nested_layers_fold_one_at_a_time() {
    let (mut store, _) = seeded(TWO_TEMPLATES);

    store.push();
    store.push();
    let shared = store.templates("ns.a").unwrap();
    store.add_templates("ns.a__C2", shared.clone());
    store.fold();
    assert_eq!(store.depth(), 2);
    store.discard();

    assert!(store.templates("ns.a__C2").is_none());
    assert!(Rc::ptr_eq(&store.templates("ns.a").unwrap()[0], &shared[0]));
}

#[test]
fn decisions_keep_originals_before_clones() {
    let (mut store, mut ids) = seeded(TWO_TEMPLATES);
    let call = ids.next_id();

    store.push();
    let clone = store.templates("ns.a").unwrap();
    store.add_templates("ns.a__C5", clone);
    store.retarget(call, "ns.a__C5");
    store.fold();

    let decisions = store.into_decisions();
    let names: Vec<_> = decisions.templates.keys().map(String::as_str).collect();
    assert_eq!(names, ["ns.a", "ns.b", "ns.a__C5"]);
    assert_eq!(
        decisions.retargets.get(&call).map(String::as_str),
        Some("ns.a__C5")
    );
}

#[test]
fn sliced_text_follows_its_layer() {
    let (mut store, mut ids) = seeded(TWO_TEMPLATES);
    let (kept, dropped) = (ids.next_id(), ids.next_id());
    let sliced = process_raw_text("<script>", Context::HTML_PCDATA).unwrap();

    store.push();
    store.record_sliced_text(kept, sliced.clone());
    store.push();
    store.record_sliced_text(dropped, sliced.clone());
    assert_eq!(store.sliced_text(dropped), Some(&sliced));
    store.discard();
    store.fold();

    assert_eq!(store.sliced_text(kept), Some(&sliced));
    assert_eq!(store.sliced_text(dropped), None);
    let decisions = store.into_decisions();
    assert!(decisions.sliced_text.contains_key(&kept));
    assert!(!decisions.sliced_text.contains_key(&dropped));
}

#[test]
#[should_panic(expected = "fold without a speculative layer")]
fn folding_the_base_layer_panics() {
    let (mut store, _) = seeded(TWO_TEMPLATES);
    store.fold();
}
