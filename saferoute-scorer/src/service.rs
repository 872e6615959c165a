//! Request-level entry points over a shared [`IncidentStore`].

use std::sync::Arc;

use log::{debug, info};
use saferoute_core::{
    DEFAULT_DATASET_KEY, Dataset, DatasetSummary, GeoPoint, IncidentStore, Route,
};
use serde::Serialize;

use crate::{RiskAggregator, ScoreResult, ScoringConfig, ScoringError, classify};

/// Keys removed by [`RouteSafetyService::invalidate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidationReport {
    /// The key the caller asked to clear, or `None` for every key.
    pub requested: Option<String>,
    /// Keys that were cached and have been dropped, sorted.
    pub cleared: Vec<String>,
}

/// Scores routes against cached incident datasets.
///
/// The service is cheap to share behind an `Arc`; every method takes
/// `&self` and the store handles its own locking.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use saferoute_core::{GeoPoint, IncidentStore, StoreConfig, test_support::MemorySource};
/// use saferoute_scorer::{Category, RouteSafetyService, ScoringConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = MemorySource::default()
///     .with_dataset("processed_crime_data", &[(41.2214, -111.9725, 245.0)]);
/// let store = Arc::new(IncidentStore::new(Arc::new(source), StoreConfig::default()));
/// let service = RouteSafetyService::new(store, ScoringConfig::default())?;
///
/// let route = [GeoPoint::new(41.2230, -111.9738)?, GeoPoint::new(41.2198, -111.9712)?];
/// let result = service.score_route(&route, None, None)?;
/// assert_eq!(result.affecting_incident_count, 1);
/// assert!(result.safety_score < 100.0);
/// assert_eq!(result.category, Category::Safe);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RouteSafetyService {
    store: Arc<IncidentStore>,
    config: ScoringConfig,
}

impl RouteSafetyService {
    /// Create a service that scores with `config` unless a call overrides it.
    ///
    /// # Errors
    /// Returns [`ScoringError::Config`] when `config` fails validation.
    pub fn new(store: Arc<IncidentStore>, config: ScoringConfig) -> Result<Self, ScoringError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Default scoring configuration.
    #[must_use]
    pub const fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Shared incident store.
    #[must_use]
    pub const fn store(&self) -> &Arc<IncidentStore> {
        &self.store
    }

    /// Validate `points` as a route and score it.
    ///
    /// `dataset` defaults to [`DEFAULT_DATASET_KEY`]; `overrides` replaces
    /// the service configuration for this call only.
    ///
    /// # Errors
    /// - [`ScoringError::Validation`] for fewer than two points.
    /// - [`ScoringError::Config`] when `overrides` fails validation.
    /// - [`ScoringError::Store`] when the dataset cannot be loaded.
    pub fn score_route(
        &self,
        points: &[GeoPoint],
        dataset: Option<&str>,
        overrides: Option<&ScoringConfig>,
    ) -> Result<ScoreResult, ScoringError> {
        let route = Route::new(points.to_vec())?;
        self.score(&route, dataset, overrides)
    }

    /// Score a validated route.
    ///
    /// # Errors
    /// As for [`RouteSafetyService::score_route`], minus route validation.
    pub fn score(
        &self,
        route: &Route,
        dataset: Option<&str>,
        overrides: Option<&ScoringConfig>,
    ) -> Result<ScoreResult, ScoringError> {
        let config = match overrides {
            Some(config) => {
                config.validate()?;
                config
            }
            None => &self.config,
        };
        let key = dataset.unwrap_or(DEFAULT_DATASET_KEY);
        let incidents = self.store.load(key)?;

        let aggregate = RiskAggregator::new(config).aggregate(route, &incidents);
        let classification = classify(aggregate.normalized_impact, &config.classifier);
        let result = ScoreResult::new(aggregate, classification);
        debug!(
            "scored route of {} points against {key:?}: {:.2} ({})",
            route.points().len(),
            result.safety_score,
            result.category,
        );
        Ok(result)
    }

    /// Drop one cached dataset, or all of them when `key` is `None`.
    pub fn invalidate(&self, key: Option<&str>) -> InvalidationReport {
        let cleared = self.store.invalidate(key);
        info!("cache invalidation for {key:?} cleared {cleared:?}");
        InvalidationReport {
            requested: key.map(str::to_owned),
            cleared,
        }
    }

    /// Summary of the dataset under `key`.
    ///
    /// # Errors
    /// Returns [`ScoringError::Store`] with
    /// [`StoreError::NotFound`](saferoute_core::StoreError::NotFound) when
    /// the dataset has no points, or any load failure.
    pub fn dataset_info(&self, key: &str) -> Result<DatasetSummary, ScoringError> {
        Ok(self.store.describe(key)?)
    }

    /// The loaded dataset under `key` (default [`DEFAULT_DATASET_KEY`]),
    /// for display as a heat map.
    ///
    /// # Errors
    /// Returns [`ScoringError::Store`] when the dataset cannot be loaded.
    pub fn incidents(&self, key: Option<&str>) -> Result<Arc<Dataset>, ScoringError> {
        Ok(self.store.load(key.unwrap_or(DEFAULT_DATASET_KEY))?)
    }

    /// Dataset keys the source can load, sorted.
    ///
    /// # Errors
    /// Returns [`ScoringError::Store`] when the source cannot be enumerated.
    pub fn list_datasets(&self) -> Result<Vec<String>, ScoringError> {
        Ok(self.store.list_available()?)
    }
}
