//! ArgMatches → CliAction conversion.

use clap::ArgMatches;
use std::path::PathBuf;

/// What the user asked for.
#[derive(Debug, PartialEq, Eq)]
pub enum CliAction {
    /// Dump the object tree.
    Inspect { file: PathBuf },
    /// Print header and counts.
    Info { file: PathBuf },
}

/// Global options shared by every subcommand.
#[derive(Debug, PartialEq, Eq)]
pub struct GlobalOptions {
    pub verbosity: u8,
    pub json: bool,
    pub config: Option<PathBuf>,
}

/// Extract the global flags.
pub fn global_options(matches: &ArgMatches) -> GlobalOptions {
    GlobalOptions {
        verbosity: matches.get_count("verbose"),
        json: matches.get_flag("json"),
        config: matches.get_one::<String>("config").map(PathBuf::from),
    }
}

/// Convert clap ArgMatches into a CliAction.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    let (sub_name, sub_matches) = matches
        .subcommand()
        .ok_or_else(|| "No command provided".to_string())?;

    let file = sub_matches
        .get_one::<String>("file")
        .map(PathBuf::from)
        .ok_or_else(|| format!("{}: missing FILE", sub_name))?;

    match sub_name {
        "inspect" => Ok(CliAction::Inspect { file }),
        "info" => Ok(CliAction::Info { file }),
        other => Err(format!("Unknown command: {}", other)),
    }
}
