//! `datasets` and `describe` command implementations.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use saferoute_core::DatasetSummary;
use saferoute_scorer::ScoringConfig;
use serde::{Deserialize, Serialize};

use crate::settings::DatasetSettings;
use crate::{
    ARG_BUILTIN_SAMPLE, ARG_DATA_DIR, ARG_DESCRIBE_KEY, ARG_FALLBACK, CliError, ENV_DESCRIBE_KEY,
    write_json,
};

/// CLI arguments for the `datasets` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "datasets",
    about = "List the datasets available in the dataset directory"
)]
#[ortho_config(prefix = "SAFEROUTE")]
pub(crate) struct DatasetsArgs {
    /// Directory containing `<key>.csv` datasets.
    #[arg(long = ARG_DATA_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) data_dir: Option<Utf8PathBuf>,
}

impl DatasetsArgs {
    pub(crate) fn into_settings(self) -> Result<DatasetSettings, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(DatasetSettings::resolve(merged.data_dir, None, None))
    }
}

/// CLI arguments for the `describe` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "describe",
    long_about = "Load one dataset and print its point count, weight \
                 statistics, bounding ranges and origin as JSON.",
    about = "Summarise one dataset"
)]
#[ortho_config(prefix = "SAFEROUTE")]
pub(crate) struct DescribeArgs {
    /// Dataset key to summarise.
    #[arg(value_name = "key")]
    #[serde(default)]
    pub(crate) key: Option<String>,
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
}

impl DescribeArgs {
    pub(crate) fn into_config(self) -> Result<DescribeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        DescribeConfig::try_from(merged)
    }
}

/// Resolved `describe` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DescribeConfig {
    /// Dataset key to summarise.
    pub(crate) key: String,
    /// Dataset directory and store behaviour.
    pub(crate) datasets: DatasetSettings,
}

impl TryFrom<DescribeArgs> for DescribeConfig {
    type Error = CliError;

    fn try_from(args: DescribeArgs) -> Result<Self, Self::Error> {
        let key = args.key.ok_or(CliError::MissingArgument {
            field: ARG_DESCRIBE_KEY,
            env: ENV_DESCRIBE_KEY,
        })?;
        Ok(Self {
            key,
            datasets: DatasetSettings::resolve(args.data_dir, args.fallback, args.builtin_sample),
        })
    }
}

pub(super) fn run_datasets(args: DatasetsArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let settings = args.into_settings()?;
    let keys = list_datasets(&settings)?;
    write_json(writer, &keys)
}

pub(super) fn list_datasets(settings: &DatasetSettings) -> Result<Vec<String>, CliError> {
    let service = settings.open_service(ScoringConfig::default())?;
    Ok(service.list_datasets()?)
}

pub(super) fn run_describe(args: DescribeArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let summary = describe_dataset(&config)?;
    write_json(writer, &summary)
}

pub(super) fn describe_dataset(config: &DescribeConfig) -> Result<DatasetSummary, CliError> {
    let service = config.datasets.open_service(ScoringConfig::default())?;
    Ok(service.dataset_info(&config.key)?)
}

#[cfg(test)]
pub(crate) fn describe_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<DescribeConfig, CliError> {
    let merged = DescribeArgs::merge_from_layers(layers).map_err(CliError::from)?;
    DescribeConfig::try_from(merged)
}
