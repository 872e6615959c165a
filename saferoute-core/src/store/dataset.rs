//! Loaded, immutable incident datasets and their summaries.

use std::time::{Duration, SystemTime};

use geo::Rect;
use rstar::{AABB, RTree, RTreeObject};
use serde::Serialize;

use crate::IncidentPoint;

impl RTreeObject for IncidentPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.lng(), self.location.lat()])
    }
}

/// Why the built-in sample dataset was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleReason {
    /// Neither the key nor the fallback key had data.
    Missing,
    /// The source did not answer within the load timeout.
    TimedOut,
}

/// Where a dataset's points came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatasetOrigin {
    /// Loaded from the source under the requested key.
    Source,
    /// Loaded from the source under the configured fallback key.
    Fallback {
        /// Key the points were actually read from.
        key: String,
    },
    /// The built-in sample dataset.
    BuiltInSample {
        /// Why the sample was used.
        reason: SampleReason,
    },
}

/// One cached dataset.
///
/// Points are kept in source order and in an R\*-tree for envelope queries.
#[derive(Debug)]
pub struct Dataset {
    key: String,
    origin: DatasetOrigin,
    points: Vec<IncidentPoint>,
    index: RTree<IncidentPoint>,
    loaded_at: SystemTime,
    load_duration: Duration,
    skipped_records: usize,
}

impl Dataset {
    /// Build a dataset and its spatial index.
    #[must_use]
    pub fn new(key: impl Into<String>, origin: DatasetOrigin, points: Vec<IncidentPoint>) -> Self {
        let index = RTree::bulk_load(points.clone());
        Self {
            key: key.into(),
            origin,
            points,
            index,
            loaded_at: SystemTime::now(),
            load_duration: Duration::ZERO,
            skipped_records: 0,
        }
    }

    /// Record how many raw records were dropped during conversion.
    #[must_use]
    pub const fn with_skipped_records(mut self, skipped: usize) -> Self {
        self.skipped_records = skipped;
        self
    }

    /// Record how long the load took.
    #[must_use]
    pub const fn with_load_duration(mut self, duration: Duration) -> Self {
        self.load_duration = duration;
        self
    }

    /// Key the dataset is cached under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Where the points came from.
    #[must_use]
    pub const fn origin(&self) -> &DatasetOrigin {
        &self.origin
    }

    /// Points in source order.
    #[must_use]
    pub fn points(&self) -> &[IncidentPoint] {
        &self.points
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Report whether the dataset holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// When the dataset was loaded.
    #[must_use]
    pub const fn loaded_at(&self) -> SystemTime {
        self.loaded_at
    }

    /// Wall-clock time spent fetching and converting.
    #[must_use]
    pub const fn load_duration(&self) -> Duration {
        self.load_duration
    }

    /// Raw records dropped because they were malformed.
    #[must_use]
    pub const fn skipped_records(&self) -> usize {
        self.skipped_records
    }

    /// Maximum weight across all points, or `None` when empty.
    #[must_use]
    pub fn max_weight(&self) -> Option<f64> {
        self.points.iter().map(|p| p.weight).reduce(f64::max)
    }

    /// Points inside `bounds`, boundaries included.
    ///
    /// Answers the same set as [`crate::prefilter::candidates`] over
    /// [`Dataset::points`], via the R\*-tree.
    pub fn points_in(&self, bounds: Rect<f64>) -> impl Iterator<Item = &IncidentPoint> + '_ {
        let envelope =
            AABB::from_corners([bounds.min().x, bounds.min().y], [bounds.max().x, bounds.max().y]);
        self.index.locate_in_envelope(&envelope)
    }

    /// Summary statistics, or `None` when the dataset is empty.
    #[must_use]
    pub fn summary(&self) -> Option<DatasetSummary> {
        DatasetSummary::from_dataset(self)
    }
}

/// Summary statistics over one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    /// Dataset key.
    pub key: String,
    /// Where the points came from.
    pub origin: DatasetOrigin,
    /// Number of points.
    pub count: usize,
    /// Smallest weight.
    pub weight_min: f64,
    /// Largest weight.
    pub weight_max: f64,
    /// Mean weight.
    pub weight_avg: f64,
    /// `(min, max)` latitude.
    pub lat_range: (f64, f64),
    /// `(min, max)` longitude.
    pub lng_range: (f64, f64),
    /// Raw records dropped during conversion.
    pub skipped_records: usize,
}

impl DatasetSummary {
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "mean weight divides a float sum by the point count"
    )]
    fn from_dataset(dataset: &Dataset) -> Option<Self> {
        let first = dataset.points.first()?;
        let seed = Self {
            key: dataset.key.clone(),
            origin: dataset.origin.clone(),
            count: dataset.len(),
            weight_min: first.weight,
            weight_max: first.weight,
            weight_avg: 0.0,
            lat_range: (first.location.lat(), first.location.lat()),
            lng_range: (first.location.lng(), first.location.lng()),
            skipped_records: dataset.skipped_records,
        };
        let (mut summary, total) =
            dataset
                .points
                .iter()
                .fold((seed, 0.0_f64), |(mut acc, total), point| {
                    let lat = point.location.lat();
                    let lng = point.location.lng();
                    acc.weight_min = acc.weight_min.min(point.weight);
                    acc.weight_max = acc.weight_max.max(point.weight);
                    acc.lat_range = (acc.lat_range.0.min(lat), acc.lat_range.1.max(lat));
                    acc.lng_range = (acc.lng_range.0.min(lng), acc.lng_range.1.max(lng));
                    (acc, total + point.weight)
                });
        summary.weight_avg = total / dataset.len() as f64;
        Some(summary)
    }
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "tests compare floating point values"
)]
mod tests {
    use super::*;
    use crate::{GeoPoint, RouteSegment, prefilter};
    use rstest::{fixture, rstest};

    fn incident(lat: f64, lng: f64, weight: f64) -> IncidentPoint {
        IncidentPoint::new(lat, lng, weight).expect("valid incident")
    }

    #[fixture]
    fn dataset() -> Dataset {
        Dataset::new(
            "city",
            DatasetOrigin::Source,
            vec![
                incident(41.2214, -111.9725, 245.0),
                incident(41.2300, -111.9800, 5.0),
                incident(41.2100, -111.9600, 50.0),
            ],
        )
    }

    #[rstest]
    fn summary_reports_ranges_and_mean(dataset: Dataset) {
        let summary = dataset.summary().expect("non-empty dataset");
        assert_eq!(summary.count, 3);
        assert_eq!(summary.weight_min, 5.0);
        assert_eq!(summary.weight_max, 245.0);
        assert!((summary.weight_avg - 100.0).abs() < 1e-9);
        assert_eq!(summary.lat_range, (41.2100, 41.2300));
        assert_eq!(summary.lng_range, (-111.9800, -111.9600));
    }

    #[rstest]
    fn empty_dataset_has_no_summary() {
        let empty = Dataset::new("empty", DatasetOrigin::Source, Vec::new());
        assert!(empty.summary().is_none());
        assert_eq!(empty.max_weight(), None);
    }

    #[rstest]
    fn index_matches_linear_prefilter(dataset: Dataset) {
        let segment = RouteSegment::new(
            GeoPoint::new(41.2230, -111.9738).expect("start"),
            GeoPoint::new(41.2198, -111.9712).expect("end"),
        );
        let bounds = prefilter::segment_bounds(&segment, 0.005);
        let mut indexed: Vec<_> = dataset.points_in(bounds).copied().collect();
        let mut linear: Vec<_> = prefilter::candidates(&segment, dataset.points(), 0.005)
            .copied()
            .collect();
        indexed.sort_by(|a, b| a.weight.total_cmp(&b.weight));
        linear.sort_by(|a, b| a.weight.total_cmp(&b.weight));
        assert_eq!(indexed, linear);
        assert_eq!(indexed.len(), 1);
    }

    #[rstest]
    fn max_weight_is_largest_point(dataset: Dataset) {
        assert_eq!(dataset.max_weight(), Some(245.0));
    }
}
