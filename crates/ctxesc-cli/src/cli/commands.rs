//! Command builders for the CLI.

use clap::Command;

use super::args::*;

/// Flags every command shares: the pass configuration and output options.
fn with_pass_args(cmd: Command) -> Command {
    cmd.arg(files_arg())
        .arg(cancelling_directive_arg())
        .arg(fuel_arg())
        .arg(color_arg())
        .arg(verbose_arg())
}

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("ctxesc")
        .about("Contextual autoescaping for Closure-style templates")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(check_command())
        .subcommand(rewrite_command())
}

/// Run the pass and report errors.
pub fn check_command() -> Command {
    let cmd = Command::new("check")
        .about("Check that every dynamic value can be escaped safely")
        .after_help(
            r#"EXAMPLES:
  ctxesc check page.soy                    # report the first escaping error
  ctxesc check a.soy b.soy                 # templates may call across files
  ctxesc check page.soy --cancelling-directive '|bidiRaw'"#,
        );
    with_pass_args(cmd)
}

/// Run the pass and print the rewritten templates.
pub fn rewrite_command() -> Command {
    let cmd = Command::new("rewrite")
        .about("Print templates with inferred escaping directives added")
        .after_help(
            r#"EXAMPLES:
  ctxesc rewrite page.soy                  # rewritten templates, clones included
  cat page.soy | ctxesc rewrite -          # read stdin"#,
        );
    with_pass_args(cmd)
}
