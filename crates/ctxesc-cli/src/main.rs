mod cli;
mod commands;

use cli::{CheckParams, RewriteParams, build_cli, init_logging};

fn main() {
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("check", m)) => {
            let params = CheckParams::from_matches(m);
            init_logging(params.verbose);
            commands::check::run(params.into());
        }
        Some(("rewrite", m)) => {
            let params = RewriteParams::from_matches(m);
            init_logging(params.verbose);
            commands::rewrite::run(params.into());
        }
        _ => unreachable!("clap should have caught this"),
    }
}
