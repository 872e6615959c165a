//! Core domain types for the SafeRoute risk engine.
//!
//! These models validate coordinates and routes at construction, compute
//! distances between points and route segments, and cache incident datasets
//! drawn from a pluggable [`DatasetSource`]. Scoring lives in
//! `saferoute-scorer`; this crate only supplies the inputs.

#![forbid(unsafe_code)]

pub mod geometry;
mod point;
pub mod prefilter;
mod route;
mod source;
mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use geometry::{distance_to_segment, great_circle_distance, point_to_segment_distance};
pub use point::{
    GeoPoint, GeoPointError, IncidentError, IncidentPoint, LATITUDE_RANGE, LONGITUDE_RANGE,
};
pub use route::{MIN_ROUTE_POINTS, Route, RouteError, RouteSegment};
pub use source::{BoxedSourceError, DataSourceError, DatasetSource, RawDataset, RawRecord};
pub use store::{
    DEFAULT_DATASET_KEY, DEFAULT_LOAD_TIMEOUT, Dataset, DatasetOrigin, DatasetSummary,
    IncidentStore, LAT_FIELD, LNG_FIELD, REQUIRED_FIELDS, SampleReason, SamplePolicy, StoreConfig,
    StoreError, WEIGHT_FIELD,
};
