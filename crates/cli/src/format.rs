//! Output formatting for the CLI.
//!
//! Human mode prints the tree or an aligned summary; JSON mode prints one
//! JSON document per invocation.

use keepsake_core::Error;
use keepsake_stream::Inspection;
use serde::Serialize;
use std::path::PathBuf;

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Result of one command.
#[derive(Debug)]
pub enum Output {
    Tree(Inspection),
    Info(InfoReport),
}

/// Header and summary counts of a stream file.
#[derive(Debug, Serialize)]
pub struct InfoReport {
    pub file: PathBuf,
    pub bytes: u64,
    #[serde(flatten)]
    pub inspection: Inspection,
}

#[derive(Serialize)]
struct TreeJson<'a> {
    #[serde(flatten)]
    inspection: &'a Inspection,
    tree: Vec<&'a str>,
}

/// Render a command result.
pub fn format_output(output: &Output, mode: OutputMode) -> String {
    match (output, mode) {
        (Output::Tree(inspection), OutputMode::Human) => {
            inspection.text.trim_end().to_string()
        }
        (Output::Tree(inspection), OutputMode::Json) => to_json(&TreeJson {
            inspection,
            tree: inspection.text.lines().collect(),
        }),
        (Output::Info(report), OutputMode::Human) => format_info(report),
        (Output::Info(report), OutputMode::Json) => to_json(report),
    }
}

fn format_info(report: &InfoReport) -> String {
    let classes = if report.inspection.classes.is_empty() {
        "(none)".to_string()
    } else {
        report.inspection.classes.join(", ")
    };
    [
        format!("file:            {}", report.file.display()),
        format!("size:            {} bytes", report.bytes),
        format!("format version:  {}", report.inspection.version),
        format!("roots:           {}", report.inspection.roots),
        format!("objects:         {}", report.inspection.objects),
        format!("back-references: {}", report.inspection.back_references),
        format!("classes:         {}", classes),
    ]
    .join("\n")
}

/// Render an error.
pub fn format_error(error: &Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Human => format!("error: {}", error),
        OutputMode::Json => serde_json::json!({ "error": error.to_string() }).to_string(),
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}
