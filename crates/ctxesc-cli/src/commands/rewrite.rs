use std::path::PathBuf;

use ctxesc_lib::tree::print_templates;
use ctxesc_lib::{Autoescaper, SourceMap};

use super::run_common::{build_autoescaper, load_sources_or_exit};

pub struct RewriteArgs {
    pub files: Vec<PathBuf>,
    pub cancelling_directives: Vec<String>,
    pub fuel: Option<u32>,
    pub color: bool,
}

pub fn run(args: RewriteArgs) {
    let sources = load_sources_or_exit(&args.files);
    let autoescaper = build_autoescaper(&args.cancelling_directives, args.fuel);

    match rewrite(&autoescaper, &sources) {
        Ok(out) => print!("{out}"),
        Err(err) => {
            eprintln!(
                "{}",
                err.printer().sources(&sources).colored(args.color).render()
            );
            std::process::exit(1);
        }
    }
}

/// Rewritten templates, specialized clones included, in template syntax.
pub fn rewrite(autoescaper: &Autoescaper, sources: &SourceMap) -> ctxesc_lib::Result<String> {
    let out = autoescaper.run_sources(sources)?;
    Ok(print_templates(&out.templates.templates))
}
