//! clap command tree for the `keepsake` binary.

use clap::{Arg, ArgAction, Command};

/// Build the top-level command.
pub fn build_cli() -> Command {
    Command::new("keepsake")
        .about("Inspect keepsake object streams")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Raise log verbosity (-v debug, -vv trace)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Print machine-readable JSON"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("TOML")
                .global(true)
                .help("Stream limits file"),
        )
        .subcommand(
            Command::new("inspect")
                .about("Print the object tree of a stream file")
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("info")
                .about("Print the header and summary counts of a stream file")
                .arg(file_arg()),
        )
}

fn file_arg() -> Arg {
    Arg::new("file")
        .required(true)
        .value_name("FILE")
        .help("Stream file to read")
}
