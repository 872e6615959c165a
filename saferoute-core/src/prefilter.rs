//! Bounding-box prefilter applied before exact distance computation.
//!
//! A segment's axis-aligned bounding box is expanded by a buffer in degrees
//! and only incidents inside it are measured. Box boundaries are inclusive.
//!
//! Segments of non-zero length are measured with the planar approximation, so
//! a buffer that passes [`buffer_covers_threshold`] is enough for them. A
//! zero-length segment is measured with the great-circle distance instead,
//! whose longitude extent grows towards the poles; [`search_bounds`] widens
//! its box to the spherical cap of the threshold radius.

use std::f64::consts::FRAC_PI_2;

use geo::{Coord, Intersects, Rect};

use crate::{
    IncidentPoint, RouteSegment,
    geometry::{EARTH_RADIUS_M, MIN_DEGREE_SCALE},
};

/// Default buffer, roughly 500 m of latitude.
pub const DEFAULT_BUFFER_DEGREES: f64 = 0.005;

/// The segment's bounding box expanded by `buffer_degrees` on every side.
///
/// Coordinates use `x = longitude`, `y = latitude`. The box is not wrapped at
/// the antimeridian.
#[must_use]
pub fn segment_bounds(segment: &RouteSegment, buffer_degrees: f64) -> Rect<f64> {
    expanded_bounds(segment, buffer_degrees, buffer_degrees)
}

/// Box holding every incident closer than `threshold_m` to `segment`.
///
/// Equal to [`segment_bounds`] unless the segment is degenerate. Around a
/// single point the latitude half-width is at least the cap's angular
/// radius and the longitude half-width at least
/// `asin(sin(radius) / cos(lat))`. A cap that reaches a pole spans every
/// longitude. The box is clamped to valid coordinates.
///
/// # Examples
///
/// ```
/// use saferoute_core::{GeoPoint, RouteSegment, prefilter};
///
/// let point = GeoPoint::new(85.0, 10.0).unwrap();
/// let segment = RouteSegment::new(point, point);
/// let bounds = prefilter::search_bounds(&segment, 0.005, 100.0);
/// assert!(bounds.max().x - 10.0 > 0.01);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "cap extent is spherical trigonometry"
)]
pub fn search_bounds(segment: &RouteSegment, buffer_degrees: f64, threshold_m: f64) -> Rect<f64> {
    if !segment.is_degenerate() {
        return segment_bounds(segment, buffer_degrees);
    }
    let radius = threshold_m / EARTH_RADIUS_M;
    let lat_half = buffer_degrees.max(radius.to_degrees());
    let lng_half = cap_longitude_extent(segment.start.lat(), radius)
        .map_or(360.0, |extent| buffer_degrees.max(extent));
    expanded_bounds(segment, lat_half, lng_half)
}

/// Longitude half-width in degrees of a spherical cap of angular `radius`
/// centred at `lat`, or `None` when the cap contains a pole.
#[expect(
    clippy::float_arithmetic,
    reason = "cap extent is spherical trigonometry"
)]
fn cap_longitude_extent(lat: f64, radius: f64) -> Option<f64> {
    if radius >= FRAC_PI_2 {
        return None;
    }
    let ratio = radius.sin() / lat.to_radians().cos();
    (ratio.is_finite() && ratio < 1.0).then(|| ratio.asin().to_degrees())
}

#[expect(
    clippy::float_arithmetic,
    reason = "box expansion adds the half-widths to each bound"
)]
fn expanded_bounds(segment: &RouteSegment, lat_half: f64, lng_half: f64) -> Rect<f64> {
    let start = segment.start.to_coord();
    let end = segment.end.to_coord();
    Rect::new(
        Coord {
            x: (start.x.min(end.x) - lng_half).max(-180.0),
            y: (start.y.min(end.y) - lat_half).max(-90.0),
        },
        Coord {
            x: (start.x.max(end.x) + lng_half).min(180.0),
            y: (start.y.max(end.y) + lat_half).min(90.0),
        },
    )
}

/// Incidents inside the buffered bounding box of `segment`.
///
/// # Examples
///
/// ```
/// use saferoute_core::{GeoPoint, IncidentPoint, RouteSegment, prefilter};
///
/// let segment = RouteSegment::new(
///     GeoPoint::new(41.2230, -111.9738).unwrap(),
///     GeoPoint::new(41.2198, -111.9712).unwrap(),
/// );
/// let incidents = [
///     IncidentPoint::new(41.2214, -111.9725, 245.0).unwrap(),
///     IncidentPoint::new(34.052, -118.243, 5.0).unwrap(),
/// ];
/// let nearby: Vec<_> = prefilter::candidates(&segment, &incidents, 0.005).collect();
/// assert_eq!(nearby.len(), 1);
/// ```
pub fn candidates<'a>(
    segment: &RouteSegment,
    incidents: &'a [IncidentPoint],
    buffer_degrees: f64,
) -> impl Iterator<Item = &'a IncidentPoint> + use<'a> {
    inside(segment_bounds(segment, buffer_degrees), incidents)
}

/// Incidents inside the [`search_bounds`] of `segment`.
///
/// This is the prefilter the aggregator uses: it never drops an incident
/// closer than `threshold_m` as long as `buffer_degrees` passes
/// [`buffer_covers_threshold`].
pub fn candidates_within<'a>(
    segment: &RouteSegment,
    incidents: &'a [IncidentPoint],
    buffer_degrees: f64,
    threshold_m: f64,
) -> impl Iterator<Item = &'a IncidentPoint> + use<'a> {
    inside(search_bounds(segment, buffer_degrees, threshold_m), incidents)
}

fn inside(
    bounds: Rect<f64>,
    incidents: &[IncidentPoint],
) -> impl Iterator<Item = &IncidentPoint> + use<'_> {
    incidents
        .iter()
        // `Intersects` treats boundary points as inside the rectangle.
        .filter(move |incident| bounds.intersects(&incident.location.to_coord()))
}

/// Report whether `buffer_degrees` keeps every incident closer than
/// `threshold_m` inside [`search_bounds`], at any latitude.
///
/// For a segment of non-zero length the planar offset of such an incident
/// on each axis is at most `threshold_m / degree_scale`, and the scale never
/// drops below [`MIN_DEGREE_SCALE`]. Degenerate segments are widened by
/// [`search_bounds`] itself.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "compares a degree buffer against a metric threshold"
)]
pub fn buffer_covers_threshold(buffer_degrees: f64, threshold_m: f64) -> bool {
    buffer_degrees * MIN_DEGREE_SCALE >= threshold_m
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "tests place incidents at computed offsets"
)]
mod tests {
    use super::*;
    use crate::{GeoPoint, great_circle_distance};
    use rstest::{fixture, rstest};

    #[fixture]
    fn segment() -> RouteSegment {
        RouteSegment::new(
            GeoPoint::new(0.0, 0.0).expect("start"),
            GeoPoint::new(0.01, 0.01).expect("end"),
        )
    }

    fn incident(lat: f64, lng: f64) -> IncidentPoint {
        IncidentPoint::new(lat, lng, 1.0).expect("valid incident")
    }

    #[rstest]
    #[case(incident(0.005, 0.005))] // inside
    #[case(incident(-0.005, 0.0))] // bottom edge
    #[case(incident(0.015, 0.015))] // top-right corner
    fn includes_points_inside_or_on_buffered_box(segment: RouteSegment, #[case] point: IncidentPoint) {
        let incidents = [point];
        assert_eq!(candidates(&segment, &incidents, 0.005).count(), 1);
    }

    #[rstest]
    #[case(incident(0.0151, 0.0))]
    #[case(incident(0.0, -0.0051))]
    fn excludes_points_outside_buffered_box(segment: RouteSegment, #[case] point: IncidentPoint) {
        let incidents = [point];
        assert_eq!(candidates(&segment, &incidents, 0.005).count(), 0);
    }

    #[rstest]
    fn bounds_normalise_reversed_segments() {
        let reversed = RouteSegment::new(
            GeoPoint::new(0.01, 0.01).expect("start"),
            GeoPoint::new(0.0, 0.0).expect("end"),
        );
        let bounds = segment_bounds(&reversed, 0.0);
        assert_eq!(bounds.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(bounds.max(), Coord { x: 0.01, y: 0.01 });
    }

    #[rstest]
    #[case(0.005, 100.0, true)]
    #[case(0.005, 200.0, true)]
    #[case(0.005, 400.0, false)]
    #[case(0.001, 100.0, false)]
    fn buffer_coverage(#[case] buffer: f64, #[case] threshold: f64, #[case] expected: bool) {
        assert_eq!(buffer_covers_threshold(buffer, threshold), expected);
    }

    fn stationary(lat: f64, lng: f64) -> RouteSegment {
        let point = GeoPoint::new(lat, lng).expect("valid point");
        RouteSegment::new(point, point)
    }

    #[rstest]
    #[case(0.0, 100.0)]
    #[case(60.0, 100.0)]
    #[case(80.0, 100.0)]
    #[case(85.0, 100.0)]
    #[case(89.9, 100.0)]
    #[case(69.0, 200.0)]
    #[case(85.0, 200.0)]
    fn stationary_segment_keeps_incidents_east_inside_threshold(
        #[case] lat: f64,
        #[case] threshold: f64,
    ) {
        let segment = stationary(lat, 10.0);
        // Same latitude, great-circle distance just under the threshold.
        let half_angle = (0.99 * threshold / (2.0 * EARTH_RADIUS_M)).sin() / lat.to_radians().cos();
        let offset = (2.0 * half_angle.asin()).to_degrees();
        let point = incident(lat, 10.0 + offset);
        assert!(great_circle_distance(point.location, segment.start) < threshold);

        let incidents = [point];
        assert_eq!(
            candidates_within(&segment, &incidents, DEFAULT_BUFFER_DEGREES, threshold).count(),
            1
        );
    }

    #[rstest]
    fn stationary_segment_at_85_degrees_needs_the_wider_box() {
        let segment = stationary(85.0, 10.0);
        let incidents = [IncidentPoint::new(85.0, 10.006, 5.0).expect("valid incident")];
        assert_eq!(candidates(&segment, &incidents, DEFAULT_BUFFER_DEGREES).count(), 0);
        assert_eq!(
            candidates_within(&segment, &incidents, DEFAULT_BUFFER_DEGREES, 100.0).count(),
            1
        );
    }

    #[rstest]
    fn cap_reaching_the_pole_spans_every_longitude() {
        let bounds = search_bounds(&stationary(89.9995, 10.0), DEFAULT_BUFFER_DEGREES, 100.0);
        assert_eq!(bounds.min().x, -180.0);
        assert_eq!(bounds.max().x, 180.0);
        assert_eq!(bounds.max().y, 90.0);
    }

    #[rstest]
    fn moving_segments_use_the_plain_buffered_box(segment: RouteSegment) {
        assert_eq!(
            search_bounds(&segment, DEFAULT_BUFFER_DEGREES, 100.0),
            segment_bounds(&segment, DEFAULT_BUFFER_DEGREES)
        );
    }

    #[rstest]
    fn stationary_segment_at_equator_keeps_the_buffer() {
        let segment = stationary(0.0, 0.0);
        assert_eq!(
            search_bounds(&segment, DEFAULT_BUFFER_DEGREES, 100.0),
            segment_bounds(&segment, DEFAULT_BUFFER_DEGREES)
        );
    }
}
