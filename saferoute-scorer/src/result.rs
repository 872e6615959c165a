//! Serialisable scoring output.

use serde::{Deserialize, Serialize};

use crate::{Category, Classification, RiskAggregate};

/// Safety assessment of one route.
///
/// Serialises with camelCase keys, for example `safetyScore` and
/// `affectingIncidentCount`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    /// Bounded score in `[0, 100]`; higher is safer.
    pub safety_score: f64,
    /// Band the score falls in.
    pub category: Category,
    /// Whether the score clears the `is_safe` threshold.
    pub is_safe: bool,
    /// Number of (incident, segment) pairs inside the proximity threshold.
    pub affecting_incident_count: usize,
    /// Route length in metres.
    pub route_length: f64,
    /// Sum of per-incident impacts.
    pub total_impact: f64,
    /// Impact after the crime factor and cap.
    pub normalized_impact: f64,
}

impl ScoreResult {
    /// Combine an aggregate with its classification.
    #[must_use]
    pub const fn new(aggregate: RiskAggregate, classification: Classification) -> Self {
        Self {
            safety_score: classification.safety_score,
            category: classification.category,
            is_safe: classification.is_safe,
            affecting_incident_count: aggregate.affecting_incident_count,
            route_length: aggregate.route_length,
            total_impact: aggregate.total_impact,
            normalized_impact: aggregate.normalized_impact,
        }
    }
}
