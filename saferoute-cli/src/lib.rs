//! Command-line interface for scoring routes against incident datasets.
//!
//! Three subcommands share one dataset directory of `<key>.csv` files:
//!
//! - `score <request.json>` scores a route and prints the result as JSON.
//! - `datasets` lists the available dataset keys.
//! - `describe <key>` prints summary statistics for one dataset.
//!
//! Every option can also come from a configuration file or from
//! `SAFEROUTE_CMDS_<SUBCOMMAND>_<FIELD>` environment variables; CLI flags
//! take precedence over both.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use serde::Serialize;

mod datasets;
mod error;
mod score;
mod settings;

pub use error::CliError;

use datasets::{DatasetsArgs, DescribeArgs};
use score::ScoreArgs;

pub(crate) const ARG_SCORE_REQUEST: &str = "request";
pub(crate) const ARG_DESCRIBE_KEY: &str = "key";
pub(crate) const ARG_DATA_DIR: &str = "data-dir";
pub(crate) const ARG_FALLBACK: &str = "fallback";
pub(crate) const ARG_BUILTIN_SAMPLE: &str = "builtin-sample";
pub(crate) const ARG_PRESET: &str = "preset";
pub(crate) const ENV_SCORE_REQUEST: &str = "SAFEROUTE_CMDS_SCORE_REQUEST_PATH";
pub(crate) const ENV_DESCRIBE_KEY: &str = "SAFEROUTE_CMDS_DESCRIBE_KEY";

/// Dataset directory used when none is configured.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Run the SafeRoute CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when argument parsing, configuration, scoring or
/// output fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    run_command(cli.command, &mut stdout)
}

fn run_command(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Score(args) => score::run_score(args, writer),
        Command::Datasets(args) => datasets::run_datasets(args, writer),
        Command::Describe(args) => datasets::run_describe(args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "saferoute",
    about = "Score walking and driving routes against incident datasets",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score a route read from a JSON request file.
    Score(ScoreArgs),
    /// List the datasets in the dataset directory.
    Datasets(DatasetsArgs),
    /// Summarise one dataset.
    Describe(DescribeArgs),
}

/// Write `value` as pretty JSON followed by a newline.
fn write_json(writer: &mut dyn Write, value: &impl Serialize) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
