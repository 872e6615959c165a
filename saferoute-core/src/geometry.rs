//! Distance functions used by the risk aggregator.
//!
//! [`great_circle_distance`] is the haversine distance on a sphere of mean
//! Earth radius. [`point_to_segment_distance`] is a flat-Earth
//! approximation: it projects in degree space and converts to metres with
//! per-degree scale factors. It is only meaningful for short, city-scale
//! segments and is not geodesically exact. Scoring thresholds are tuned
//! against this approximation, so it must not be swapped for a true
//! geodesic projection.

use crate::{GeoPoint, RouteSegment};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Approximate metres per degree of latitude.
pub const METRES_PER_DEGREE: f64 = 111_000.0;

/// Great-circle distance in metres between two points (haversine).
///
/// # Examples
///
/// ```
/// use saferoute_core::{GeoPoint, great_circle_distance};
///
/// let a = GeoPoint::new(41.2230, -111.9738).unwrap();
/// let b = GeoPoint::new(41.2198, -111.9712).unwrap();
/// let d = great_circle_distance(a, b);
/// assert!((d - 417.0).abs() < 1.0);
/// assert_eq!(great_circle_distance(a, a), 0.0);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "haversine distance is floating-point trigonometry"
)]
pub fn great_circle_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat().to_radians();
    let lat2 = b.lat().to_radians();
    let dlat = lat2 - lat1;
    let dlng = (b.lng() - a.lng()).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let central_angle = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();
    central_angle * EARTH_RADIUS_M
}

/// Approximate distance in metres from `point` to the closest point of
/// the segment `start`..`end`.
///
/// The projection parameter is clamped to `[0, 1]`, so points beyond either
/// end measure to that endpoint. The planar distance in degrees is scaled by
/// `sqrt((lat_factor² + lng_factor²) / 2)`, where `lat_factor` is
/// [`METRES_PER_DEGREE`] and `lng_factor` is the same value scaled by the
/// cosine of the segment's mean latitude. A zero-length segment falls back
/// to [`great_circle_distance`] to `start`.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "planar projection requires floating-point vector maths"
)]
pub fn point_to_segment_distance(point: GeoPoint, start: GeoPoint, end: GeoPoint) -> f64 {
    let seg_lat = end.lat() - start.lat();
    let seg_lng = end.lng() - start.lng();
    let length_sq = seg_lat.mul_add(seg_lat, seg_lng * seg_lng);
    if length_sq == 0.0 {
        return great_circle_distance(point, start);
    }

    let rel_lat = point.lat() - start.lat();
    let rel_lng = point.lng() - start.lng();
    let t = (rel_lat.mul_add(seg_lat, rel_lng * seg_lng) / length_sq).clamp(0.0, 1.0);

    let closest_lat = t.mul_add(seg_lat, start.lat());
    let closest_lng = t.mul_add(seg_lng, start.lng());
    let planar = (point.lat() - closest_lat).hypot(point.lng() - closest_lng);

    planar * degree_scale(start, end)
}

/// Distance from `point` to `segment`; see [`point_to_segment_distance`].
#[must_use]
pub fn distance_to_segment(point: GeoPoint, segment: &RouteSegment) -> f64 {
    point_to_segment_distance(point, segment.start, segment.end)
}

/// Metres per planar degree at the mean latitude of the two endpoints.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "degree scale combines two floating-point factors"
)]
pub fn degree_scale(start: GeoPoint, end: GeoPoint) -> f64 {
    let mean_lat = f64::midpoint(start.lat(), end.lat()).to_radians();
    let lat_factor = METRES_PER_DEGREE;
    let lng_factor = METRES_PER_DEGREE * mean_lat.cos();
    (lat_factor.mul_add(lat_factor, lng_factor * lng_factor) / 2.0).sqrt()
}

/// Smallest value [`degree_scale`] can take at any latitude.
///
/// Reached at the poles where the longitude factor vanishes.
pub const MIN_DEGREE_SCALE: f64 = METRES_PER_DEGREE * std::f64::consts::FRAC_1_SQRT_2;

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "tests compare floating point values"
)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).expect("valid test coordinate")
    }

    #[rstest]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = great_circle_distance(point(0.0, 0.0), point(1.0, 0.0));
        assert!((d - 111_194.9).abs() < 1.0, "got {d}");
    }

    #[rstest]
    fn antipodal_points_are_half_circumference() {
        let d = great_circle_distance(point(0.0, 0.0), point(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1e-6);
    }

    #[rstest]
    fn projection_beyond_end_measures_to_endpoint() {
        let start = point(0.0, 0.0);
        let end = point(0.0, 0.001);
        let beyond = point(0.0, 0.002);
        let d = point_to_segment_distance(beyond, start, end);
        let expected = 0.001 * degree_scale(start, end);
        assert!((d - expected).abs() < 1e-9, "got {d}, expected {expected}");
    }

    #[rstest]
    fn perpendicular_offset_uses_degree_scale() {
        let start = point(0.0, 0.0);
        let end = point(0.0, 0.01);
        let off = point(0.001, 0.005);
        let d = point_to_segment_distance(off, start, end);
        // At the equator both factors are 111 km per degree.
        assert!((d - 111.0).abs() < 1e-6, "got {d}");
    }

    #[rstest]
    fn endpoint_lies_on_segment() {
        let start = point(41.2230, -111.9738);
        let end = point(41.2198, -111.9712);
        assert_eq!(point_to_segment_distance(start, start, end), 0.0);
    }

    #[rstest]
    fn scale_shrinks_towards_poles() {
        let equator = degree_scale(point(0.0, 0.0), point(0.0, 1.0));
        let pole = degree_scale(point(90.0, 0.0), point(90.0, 1.0));
        assert!(equator > pole);
        assert!((pole - MIN_DEGREE_SCALE).abs() < 1e-6);
    }
}
