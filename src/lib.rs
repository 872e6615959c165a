//! Facade crate for the SafeRoute route-risk scoring engine.
//!
//! This crate re-exports the core domain types and the scoring service, and
//! exposes the CSV dataset source behind the `csv-source` feature.

#![forbid(unsafe_code)]

pub use saferoute_core::{
    DEFAULT_DATASET_KEY, DataSourceError, Dataset, DatasetOrigin, DatasetSource, DatasetSummary,
    GeoPoint, GeoPointError, IncidentError, IncidentPoint, IncidentStore, RawDataset, RawRecord,
    Route, RouteError, RouteSegment, SamplePolicy, StoreConfig, StoreError, great_circle_distance,
    point_to_segment_distance,
};

pub use saferoute_scorer::{
    Category, InvalidationReport, RouteSafetyService, ScoreResult, ScoringConfig,
    ScoringConfigError, ScoringError, ScoringPreset,
};

#[cfg(feature = "csv-source")]
pub use saferoute_data::{CsvDirectorySource, CsvSourceError};

#[cfg(feature = "test-support")]
pub use saferoute_core::test_support;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;
    use saferoute_core::test_support::MemorySource;

    use super::*;

    #[rstest]
    fn scores_a_route_through_the_facade() {
        let source = MemorySource::default().with_dataset("city", &[(41.225, -111.975, 245.0)]);
        let store = IncidentStore::new(Arc::new(source), StoreConfig::default());
        let service = RouteSafetyService::new(Arc::new(store), ScoringPreset::default().into())
            .expect("preset configuration is valid");
        let route = [
            GeoPoint::new(41.22, -111.98).expect("valid point"),
            GeoPoint::new(41.23, -111.97).expect("valid point"),
        ];

        let result = service
            .score_route(&route, Some("city"), None)
            .expect("route should score");
        assert_eq!(result.affecting_incident_count, 1);
        assert_eq!(result.category, Category::Safe);
    }
}
