use std::path::PathBuf;

use indoc::indoc;

use ctxesc_lib::SourceMap;

use super::rewrite::rewrite;
use super::run_common::{build_autoescaper, load_sources};

#[test]
fn rewrite_prints_escaped_templates() {
    let mut sources = SourceMap::new();
    sources.add_file(
        "page.soy",
        indoc! {r#"
            {namespace page autoescape="deprecated-contextual"}
            {template .main}
              <a href="{$url}">{$label}</a>
            {/template}
        "#},
    );

    let out = rewrite(&build_autoescaper(&[], None), &sources).unwrap();
    insta::assert_snapshot!(out, @r#"
    {template page.main autoescape="deprecated-contextual"}
    <a href="{$url |filterNormalizeUri |escapeHtmlAttribute}">{$label |escapeHtml}</a>
    {/template}
    "#);
}

#[test]
fn cancelling_directives_from_flags() {
    let sources = SourceMap::inline(indoc! {r#"
        {namespace page autoescape="deprecated-contextual"}
        {template .main}<script>{$js |customRaw}</script>{/template}
    "#});

    let plain = rewrite(&build_autoescaper(&[], None), &sources).unwrap();
    assert!(plain.contains("{$js |customRaw |escapeJsValue}"), "{plain}");

    let flags = ["customRaw".to_owned()];
    let cancelled = rewrite(&build_autoescaper(&flags, None), &sources).unwrap();
    assert!(cancelled.contains("{$js |customRaw}</script>"), "{cancelled}");
}

#[test]
fn fuel_flag_limits_specialization() {
    let sources = SourceMap::inline(indoc! {r#"
        {namespace page autoescape="deprecated-contextual"}
        {template .main}<script>{call .inner /}</script>{/template}
        {template .inner}{$x}{/template}
    "#});

    let err = rewrite(&build_autoescaper(&[], Some(1)), &sources).unwrap_err();
    assert!(err.to_string().contains("nested re-contextualizations"), "{err}");
}

#[test]
fn missing_files_are_reported() {
    let err = load_sources(&[PathBuf::from("does/not/exist.soy")]).unwrap_err();
    assert!(err.starts_with("failed to read 'does/not/exist.soy'"), "{err}");
}
