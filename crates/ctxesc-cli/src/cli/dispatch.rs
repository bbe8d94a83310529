//! Dispatch logic: extract params from ArgMatches and convert to command args.

use std::path::PathBuf;

use clap::ArgMatches;

use super::ColorChoice;
use crate::commands::check::CheckArgs;
use crate::commands::rewrite::RewriteArgs;

pub struct CheckParams {
    pub files: Vec<PathBuf>,
    pub cancelling_directives: Vec<String>,
    pub fuel: Option<u32>,
    pub color: ColorChoice,
    pub verbose: u8,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            files: files(m),
            cancelling_directives: cancelling_directives(m),
            fuel: m.get_one::<u32>("fuel").copied(),
            color: parse_color(m),
            verbose: m.get_count("verbose"),
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self {
            files: p.files,
            cancelling_directives: p.cancelling_directives,
            fuel: p.fuel,
            color: p.color.should_colorize(),
        }
    }
}

pub struct RewriteParams {
    pub files: Vec<PathBuf>,
    pub cancelling_directives: Vec<String>,
    pub fuel: Option<u32>,
    pub color: ColorChoice,
    pub verbose: u8,
}

impl RewriteParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            files: files(m),
            cancelling_directives: cancelling_directives(m),
            fuel: m.get_one::<u32>("fuel").copied(),
            color: parse_color(m),
            verbose: m.get_count("verbose"),
        }
    }
}

impl From<RewriteParams> for RewriteArgs {
    fn from(p: RewriteParams) -> Self {
        Self {
            files: p.files,
            cancelling_directives: p.cancelling_directives,
            fuel: p.fuel,
            color: p.color.should_colorize(),
        }
    }
}

fn files(m: &ArgMatches) -> Vec<PathBuf> {
    m.get_many::<PathBuf>("files")
        .map(|files| files.cloned().collect())
        .unwrap_or_default()
}

fn cancelling_directives(m: &ArgMatches) -> Vec<String> {
    m.get_many::<String>("cancelling_directive")
        .map(|names| names.cloned().collect())
        .unwrap_or_default()
}

fn parse_color(m: &ArgMatches) -> ColorChoice {
    match m.get_one::<String>("color").map(|s| s.as_str()) {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}
