//! Shared argument builders for CLI commands.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Template files (positional, `-` for stdin).
pub fn files_arg() -> Arg {
    Arg::new("files")
        .value_name("FILES")
        .value_parser(value_parser!(PathBuf))
        .num_args(1..)
        .required(true)
        .help("Template files to autoescape (- reads stdin)")
}

/// Extra autoescape-cancelling print directive (--cancelling-directive).
pub fn cancelling_directive_arg() -> Arg {
    Arg::new("cancelling_directive")
        .long("cancelling-directive")
        .value_name("NAME")
        .action(ArgAction::Append)
        .help("Print directive that disables autoescaping, like |noAutoescape (repeatable)")
}

/// Re-contextualization limit (--fuel).
pub fn fuel_arg() -> Arg {
    Arg::new("fuel")
        .long("fuel")
        .value_name("N")
        .value_parser(value_parser!(u32))
        .help("Nested re-contextualizations allowed before giving up")
}

/// Color output control (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .help("Colorize output")
}

/// Verbosity level (-v, -vv).
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .action(ArgAction::Count)
        .help("Verbosity level (-v for debug logs, -vv for trace logs)")
}
