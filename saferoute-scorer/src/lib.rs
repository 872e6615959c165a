//! Route risk scoring for SafeRoute.
//!
//! The pipeline has three stages, each configurable through
//! [`ScoringConfig`]:
//! - [`RiskAggregator`] walks a route's segments and sums the impact of
//!   every incident closer than the proximity threshold.
//! - The aggregate is normalised with a diminishing-returns
//!   [`CrimeFactor`] and capped.
//! - [`classify`] turns the normalised impact into a bounded safety score
//!   and a [`Category`].
//!
//! [`RouteSafetyService`] bundles the pipeline with a shared
//! [`IncidentStore`](saferoute_core::IncidentStore) and exposes the
//! scoring, cache-control and dataset-info entry points.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod aggregator;
mod classifier;
mod config;
mod error;
mod result;
mod service;

pub use aggregator::{RiskAggregate, RiskAggregator};
pub use classifier::{Category, Classification, classify};
pub use config::{
    ClassifierConfig, CrimeFactor, LOG10_COUNT_KNEE, MAX_SAFETY_SCORE, MIN_SAFETY_SCORE,
    ScoringConfig, ScoringConfigError, ScoringPreset, WeightNormalization,
};
pub use error::ScoringError;
pub use result::ScoreResult;
pub use service::{InvalidationReport, RouteSafetyService};
