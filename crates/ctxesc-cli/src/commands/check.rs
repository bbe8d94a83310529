use std::path::PathBuf;

use super::run_common::{build_autoescaper, load_sources_or_exit};

pub struct CheckArgs {
    pub files: Vec<PathBuf>,
    pub cancelling_directives: Vec<String>,
    pub fuel: Option<u32>,
    pub color: bool,
}

pub fn run(args: CheckArgs) {
    let sources = load_sources_or_exit(&args.files);
    let autoescaper = build_autoescaper(&args.cancelling_directives, args.fuel);

    if let Err(err) = autoescaper.run_sources(&sources) {
        eprintln!(
            "{}",
            err.printer().sources(&sources).colored(args.color).render()
        );
        std::process::exit(1);
    }

    // Silent on success (like cargo check)
}
