//! Accumulate incident impact along a route.
//!
//! For each segment the aggregator adds the great-circle length to the
//! route length, prefilters candidates with the segment's search box and
//! measures each candidate with the segment distance.
//! Incidents strictly closer than the proximity threshold add
//! `distance_factor * normalised_weight * impact_multiplier` to the total.
//! An incident near several segments counts once per segment.

use log::debug;
use saferoute_core::{
    Dataset, IncidentPoint, Route, RouteSegment, distance_to_segment, great_circle_distance,
    prefilter,
};

use crate::ScoringConfig;

/// Raw aggregate for one route.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RiskAggregate {
    /// Sum of segment great-circle lengths in metres.
    pub route_length: f64,
    /// Sum of per-incident impacts.
    pub total_impact: f64,
    /// Total impact after the crime factor and cap; zero without incidents.
    pub normalized_impact: f64,
    /// Number of (incident, segment) pairs inside the threshold.
    pub affecting_incident_count: usize,
}

/// Computes a [`RiskAggregate`] under one [`ScoringConfig`].
#[derive(Debug, Clone, Copy)]
pub struct RiskAggregator<'a> {
    config: &'a ScoringConfig,
}

impl<'a> RiskAggregator<'a> {
    /// Create an aggregator using `config`.
    #[must_use]
    pub const fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    /// Aggregate `route` against `dataset`, using its spatial index.
    #[must_use]
    pub fn aggregate(&self, route: &Route, dataset: &Dataset) -> RiskAggregate {
        let buffer = self.config.buffer_degrees;
        let threshold = self.config.proximity_threshold_m;
        self.aggregate_with(route, |segment| {
            dataset.points_in(prefilter::search_bounds(segment, buffer, threshold))
        })
    }

    /// Aggregate `route` against a plain slice with the linear prefilter.
    ///
    /// Gives the same result as [`RiskAggregator::aggregate`] over a
    /// dataset holding `incidents`, up to summation order.
    #[must_use]
    pub fn aggregate_points(&self, route: &Route, incidents: &[IncidentPoint]) -> RiskAggregate {
        let buffer = self.config.buffer_degrees;
        let threshold = self.config.proximity_threshold_m;
        self.aggregate_with(route, |segment| {
            prefilter::candidates_within(segment, incidents, buffer, threshold)
        })
    }

    /// Impact of one incident at `distance_m` from a segment, or `None`
    /// when it lies at or beyond the proximity threshold.
    ///
    /// # Examples
    ///
    /// ```
    /// use saferoute_scorer::{RiskAggregator, ScoringConfig, ScoringPreset};
    ///
    /// let config = ScoringConfig::from(ScoringPreset::LinearWeighted);
    /// let aggregator = RiskAggregator::new(&config);
    /// assert_eq!(aggregator.incident_impact(0.0, 10.0), Some(1.5));
    /// assert_eq!(aggregator.incident_impact(100.0, 10.0), Some(0.75));
    /// assert_eq!(aggregator.incident_impact(200.0, 10.0), None);
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "impact combines floating-point distance and weight factors"
    )]
    pub fn incident_impact(&self, distance_m: f64, weight: f64) -> Option<f64> {
        let threshold = self.config.proximity_threshold_m;
        if distance_m >= threshold {
            return None;
        }
        let distance_factor = (1.0 - distance_m / threshold).max(0.0);
        let normalized_weight = self.config.weight_normalization.normalize(weight);
        Some(distance_factor * normalized_weight * self.config.impact_multiplier)
    }

    /// Apply the crime factor and cap to a total impact.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "normalisation scales the floating-point total"
    )]
    pub fn normalize_impact(&self, total_impact: f64, affecting: usize) -> f64 {
        if affecting == 0 {
            return 0.0;
        }
        (total_impact * self.config.crime_factor.factor(affecting)).min(self.config.impact_cap)
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "route length and impact are floating-point sums"
    )]
    fn aggregate_with<'d, F, I>(&self, route: &Route, mut candidates: F) -> RiskAggregate
    where
        F: FnMut(&RouteSegment) -> I,
        I: Iterator<Item = &'d IncidentPoint>,
    {
        let mut aggregate = RiskAggregate::default();
        for segment in route.segments() {
            aggregate.route_length += great_circle_distance(segment.start, segment.end);
            for incident in candidates(&segment) {
                let distance = distance_to_segment(incident.location, &segment);
                if let Some(impact) = self.incident_impact(distance, incident.weight) {
                    aggregate.total_impact += impact;
                    aggregate.affecting_incident_count =
                        aggregate.affecting_incident_count.saturating_add(1);
                }
            }
        }
        aggregate.normalized_impact =
            self.normalize_impact(aggregate.total_impact, aggregate.affecting_incident_count);
        debug!(
            "aggregated {} segments: length {:.1} m, {} affecting incidents, impact {:.4} -> {:.4}",
            route.points().len().saturating_sub(1),
            aggregate.route_length,
            aggregate.affecting_incident_count,
            aggregate.total_impact,
            aggregate.normalized_impact,
        );
        aggregate
    }
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "tests compare floating point values"
)]
mod tests {
    use super::*;
    use crate::ScoringPreset;
    use rstest::{fixture, rstest};
    use saferoute_core::{DatasetOrigin, GeoPoint};

    fn incident(lat: f64, lng: f64, weight: f64) -> IncidentPoint {
        IncidentPoint::new(lat, lng, weight).expect("valid incident")
    }

    #[fixture]
    fn route() -> Route {
        Route::from_coordinates([(41.2230, -111.9738), (41.2198, -111.9712)]).expect("valid route")
    }

    #[rstest]
    fn incident_at_threshold_is_excluded() {
        let config = ScoringConfig::default();
        let aggregator = RiskAggregator::new(&config);
        assert_eq!(aggregator.incident_impact(100.0, 245.0), None);
        assert!(aggregator.incident_impact(99.999, 245.0).is_some());
    }

    #[rstest]
    fn no_incidents_means_no_normalised_impact(route: Route) {
        let config = ScoringConfig::default();
        let aggregate = RiskAggregator::new(&config).aggregate_points(&route, &[]);
        assert_eq!(aggregate.affecting_incident_count, 0);
        assert_eq!(aggregate.total_impact, 0.0);
        assert_eq!(aggregate.normalized_impact, 0.0);
        assert!((aggregate.route_length - 417.0).abs() < 1.0);
    }

    #[rstest]
    fn incident_on_midpoint_affects_route(route: Route) {
        let config = ScoringConfig::default();
        let aggregate =
            RiskAggregator::new(&config).aggregate_points(&route, &[incident(41.2214, -111.9725, 245.0)]);
        assert_eq!(aggregate.affecting_incident_count, 1);
        assert!(aggregate.total_impact > 0.0);
        assert!(aggregate.normalized_impact > 0.0);
    }

    #[rstest]
    fn distant_incident_is_ignored(route: Route) {
        let config = ScoringConfig::default();
        let aggregate =
            RiskAggregator::new(&config).aggregate_points(&route, &[incident(41.30, -111.90, 245.0)]);
        assert_eq!(aggregate.affecting_incident_count, 0);
    }

    #[rstest]
    fn incident_near_shared_vertex_counts_per_segment() {
        let route = Route::from_coordinates([(0.0, 0.0), (0.0, 0.001), (0.0, 0.002)])
            .expect("valid route");
        let config = ScoringConfig::default();
        let aggregate =
            RiskAggregator::new(&config).aggregate_points(&route, &[incident(0.0, 0.001, 1.0)]);
        assert_eq!(aggregate.affecting_incident_count, 2);
    }

    #[rstest]
    #[case(ScoringPreset::SqrtWeighted)]
    #[case(ScoringPreset::LinearWeighted)]
    fn indexed_and_linear_paths_agree(route: Route, #[case] preset: ScoringPreset) {
        let incidents = vec![
            incident(41.2214, -111.9725, 245.0),
            incident(41.2210, -111.9730, 12.0),
            incident(41.2250, -111.9700, 3.0),
            incident(41.3000, -111.9000, 50.0),
        ];
        let dataset = Dataset::new("city", DatasetOrigin::Source, incidents.clone());
        let config = preset.config();
        let aggregator = RiskAggregator::new(&config);
        let indexed = aggregator.aggregate(&route, &dataset);
        let linear = aggregator.aggregate_points(&route, &incidents);
        assert_eq!(indexed.affecting_incident_count, linear.affecting_incident_count);
        assert!((indexed.total_impact - linear.total_impact).abs() < 1e-12);
    }

    #[rstest]
    fn normalised_impact_respects_cap() {
        let config = ScoringConfig {
            impact_cap: 0.5,
            ..ScoringConfig::default()
        };
        let aggregator = RiskAggregator::new(&config);
        assert_eq!(aggregator.normalize_impact(1_000.0, 400), 0.5);
    }

    #[rstest]
    fn degenerate_route_has_zero_length() {
        let point = GeoPoint::new(41.2230, -111.9738).expect("valid point");
        let route = Route::new(vec![point, point]).expect("two points");
        let config = ScoringConfig::default();
        let aggregate = RiskAggregator::new(&config).aggregate_points(&route, &[]);
        assert_eq!(aggregate.route_length, 0.0);
    }

    #[rstest]
    #[case(ScoringPreset::SqrtWeighted)]
    #[case(ScoringPreset::LinearWeighted)]
    fn stationary_route_near_pole_matches_wide_buffer(#[case] preset: ScoringPreset) {
        let route = Route::from_coordinates([(85.0, 10.0), (85.0, 10.0)]).expect("two points");
        // About 58 m east of the route point.
        let incidents = vec![incident(85.0, 10.006, 5.0)];
        let dataset = Dataset::new("arctic", DatasetOrigin::Source, incidents.clone());

        let config = preset.config();
        let wide = ScoringConfig {
            buffer_degrees: 1.0,
            ..config
        };
        let default_run = RiskAggregator::new(&config);
        let wide_run = RiskAggregator::new(&wide);

        let expected = wide_run.aggregate_points(&route, &incidents);
        assert_eq!(expected.affecting_incident_count, 1);
        for aggregate in [
            default_run.aggregate_points(&route, &incidents),
            default_run.aggregate(&route, &dataset),
        ] {
            assert_eq!(aggregate.affecting_incident_count, 1);
            assert!((aggregate.total_impact - expected.total_impact).abs() < 1e-12);
        }
    }
}
