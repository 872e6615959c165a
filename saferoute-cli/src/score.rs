//! Score command implementation for the SafeRoute CLI.

use std::io::{BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use saferoute_core::GeoPoint;
use saferoute_fs::{file_is_file, open_utf8_file};
use saferoute_scorer::{ScoreResult, ScoringPreset};
use serde::{Deserialize, Serialize};

use crate::settings::DatasetSettings;
use crate::{
    ARG_BUILTIN_SAMPLE, ARG_DATA_DIR, ARG_FALLBACK, ARG_PRESET, ARG_SCORE_REQUEST, CliError,
    ENV_SCORE_REQUEST, write_json,
};

/// Scoring preset selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum PresetChoice {
    /// Square-root weights, 100 m threshold.
    #[default]
    SqrtWeighted,
    /// Linear weights, 200 m threshold.
    LinearWeighted,
}

impl From<PresetChoice> for ScoringPreset {
    fn from(choice: PresetChoice) -> Self {
        match choice {
            PresetChoice::SqrtWeighted => Self::SqrtWeighted,
            PresetChoice::LinearWeighted => Self::LinearWeighted,
        }
    }
}

/// CLI arguments for the `score` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "score",
    long_about = "Score a route against an incident dataset. The request is \
                 a JSON file holding a \"route\" array of {\"lat\", \"lng\"} \
                 points and an optional \"dataset\" key; the result is \
                 printed as JSON.",
    about = "Score a route read from a JSON request file"
)]
#[ortho_config(prefix = "SAFEROUTE")]
pub(crate) struct ScoreArgs {
    /// Path to a JSON file containing the score request.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) request_path: Option<Utf8PathBuf>,
    /// Directory containing `<key>.csv` datasets.
    #[arg(long = ARG_DATA_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) data_dir: Option<Utf8PathBuf>,
    /// Dataset key tried when the requested one has no data.
    #[arg(long = ARG_FALLBACK, value_name = "key")]
    #[serde(default)]
    pub(crate) fallback: Option<String>,
    /// Serve the built-in sample when no dataset is found (default true).
    #[arg(long = ARG_BUILTIN_SAMPLE, value_name = "bool")]
    #[serde(default)]
    pub(crate) builtin_sample: Option<bool>,
    /// Scoring preset.
    #[arg(long = ARG_PRESET, value_enum, value_name = "preset")]
    #[serde(default)]
    pub(crate) preset: Option<PresetChoice>,
}

impl ScoreArgs {
    pub(crate) fn into_config(self) -> Result<ScoreConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ScoreConfig::try_from(merged)
    }
}

/// Resolved `score` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScoreConfig {
    /// Path to the JSON request file.
    pub(crate) request_path: Utf8PathBuf,
    /// Dataset directory and store behaviour.
    pub(crate) datasets: DatasetSettings,
    /// Preset supplying the scoring configuration.
    pub(crate) preset: ScoringPreset,
}

impl ScoreConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.request_path, ARG_SCORE_REQUEST)
    }
}

impl TryFrom<ScoreArgs> for ScoreConfig {
    type Error = CliError;

    fn try_from(args: ScoreArgs) -> Result<Self, Self::Error> {
        let request_path = args.request_path.ok_or(CliError::MissingArgument {
            field: ARG_SCORE_REQUEST,
            env: ENV_SCORE_REQUEST,
        })?;
        Ok(Self {
            request_path,
            datasets: DatasetSettings::resolve(args.data_dir, args.fallback, args.builtin_sample),
            preset: args.preset.unwrap_or_default().into(),
        })
    }
}

fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Body of a score request file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ScoreRequest {
    /// Ordered route points.
    pub(crate) route: Vec<GeoPoint>,
    /// Dataset key; the default dataset when absent.
    #[serde(default)]
    pub(crate) dataset: Option<String>,
}

pub(super) fn run_score(args: ScoreArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let result = execute_score(&config)?;
    write_json(writer, &result)
}

pub(super) fn execute_score(config: &ScoreConfig) -> Result<ScoreResult, CliError> {
    let request = load_score_request(&config.request_path)?;
    let service = config.datasets.open_service(config.preset.config())?;
    Ok(service.score_route(&request.route, request.dataset.as_deref(), None)?)
}

/// Loads a JSON-encoded [`ScoreRequest`] from disk.
pub(super) fn load_score_request(path: &Utf8Path) -> Result<ScoreRequest, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenScoreRequest {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CliError::ParseScoreRequest {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ScoreConfig, CliError> {
    let merged = ScoreArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ScoreConfig::try_from(merged)
}
