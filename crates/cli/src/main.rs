//! Keepsake CLI: inspect serialized object streams without their classes.
//!
//! - `keepsake inspect FILE` prints the object tree
//! - `keepsake info FILE` prints the header and summary counts
//!
//! `--json` switches to JSON output, `-v`/`-vv` raise the log level
//! (`RUST_LOG` takes precedence when set).

mod commands;
mod format;
mod parse;

use std::fs::File;
use std::io::BufReader;
use std::process;

use keepsake_core::Result;
use keepsake_stream::{inspect_with_config, Inspection, StreamConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{format_error, format_output, InfoReport, Output, OutputMode};
use parse::{global_options, matches_to_action, CliAction, GlobalOptions};

fn main() {
    let matches = build_cli().get_matches();
    let options = global_options(&matches);
    init_tracing(options.verbosity);

    let mode = if options.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    match execute(action, &options) {
        Ok(output) => {
            println!("{}", format_output(&output, mode));
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            process::exit(1);
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(action: CliAction, options: &GlobalOptions) -> Result<Output> {
    let config = match &options.config {
        Some(path) => {
            debug!(path = %path.display(), "loading stream config");
            StreamConfig::from_toml_file(path)?
        }
        None => StreamConfig::default(),
    };
    debug!(?action, max_depth = config.max_depth, "executing");

    match action {
        CliAction::Inspect { file } => {
            let inspection = inspect_file(&file, &config)?;
            Ok(Output::Tree(inspection))
        }
        CliAction::Info { file } => {
            let bytes = std::fs::metadata(&file)?.len();
            let inspection = inspect_file(&file, &config)?;
            Ok(Output::Info(InfoReport {
                file,
                bytes,
                inspection,
            }))
        }
    }
}

fn inspect_file(path: &std::path::Path, config: &StreamConfig) -> Result<Inspection> {
    let file = File::open(path)?;
    let inspection =
        inspect_with_config(BufReader::with_capacity(config.buffer_capacity, file), config)?;
    debug!(
        file = %path.display(),
        roots = inspection.roots,
        objects = inspection.objects,
        "inspected stream"
    );
    Ok(inspection)
}
