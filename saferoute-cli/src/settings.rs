//! Dataset options shared by every subcommand.

use std::sync::Arc;

use camino::Utf8PathBuf;
use log::debug;
use saferoute_core::{IncidentStore, SamplePolicy, StoreConfig};
use saferoute_data::CsvDirectorySource;
use saferoute_scorer::{RouteSafetyService, ScoringConfig};

use crate::{CliError, DEFAULT_DATA_DIR};

/// Resolved dataset directory and store behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DatasetSettings {
    /// Directory holding `<key>.csv` files.
    pub(crate) data_dir: Utf8PathBuf,
    /// Key tried when the requested dataset has no data.
    pub(crate) fallback: Option<String>,
    /// Whether the built-in sample is served as a last resort.
    pub(crate) sample_policy: SamplePolicy,
}

impl DatasetSettings {
    pub(crate) fn resolve(
        data_dir: Option<Utf8PathBuf>,
        fallback: Option<String>,
        builtin_sample: Option<bool>,
    ) -> Self {
        let sample_policy = if builtin_sample == Some(false) {
            SamplePolicy::Disabled
        } else {
            SamplePolicy::BuiltInSample
        };
        Self {
            data_dir: data_dir.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATA_DIR)),
            fallback,
            sample_policy,
        }
    }

    pub(crate) fn store_config(&self) -> StoreConfig {
        StoreConfig {
            fallback_key: self.fallback.clone(),
            ..StoreConfig::default().with_sample_policy(self.sample_policy)
        }
    }

    /// Open the dataset directory and wrap it in a scoring service.
    pub(crate) fn open_service(
        &self,
        scoring: ScoringConfig,
    ) -> Result<RouteSafetyService, CliError> {
        let source = CsvDirectorySource::open(self.data_dir.clone())?;
        debug!("serving datasets from {}", self.data_dir);
        let store = IncidentStore::new(Arc::new(source), self.store_config());
        Ok(RouteSafetyService::new(Arc::new(store), scoring)?)
    }
}
