//! Validated geographic points and weighted incident records.

use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Valid latitude range in degrees.
pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude range in degrees.
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// Errors returned by [`GeoPoint::new`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeoPointError {
    /// Latitude was not a finite number.
    #[error("latitude must be finite, found {lat}")]
    NonFiniteLatitude {
        /// Rejected value.
        lat: f64,
    },
    /// Longitude was not a finite number.
    #[error("longitude must be finite, found {lng}")]
    NonFiniteLongitude {
        /// Rejected value.
        lng: f64,
    },
    /// Latitude fell outside `[-90, 90]`.
    #[error("latitude {lat} is outside [-90, 90]")]
    LatitudeOutOfRange {
        /// Rejected value.
        lat: f64,
    },
    /// Longitude fell outside `[-180, 180]`.
    #[error("longitude {lng} is outside [-180, 180]")]
    LongitudeOutOfRange {
        /// Rejected value.
        lng: f64,
    },
}

/// A WGS84 coordinate in decimal degrees.
///
/// Construction validates the ranges; out-of-range values are rejected
/// rather than clamped.
///
/// # Examples
///
/// ```
/// use saferoute_core::GeoPoint;
///
/// # fn main() -> Result<(), saferoute_core::GeoPointError> {
/// let point = GeoPoint::new(41.2230, -111.9738)?;
/// assert_eq!(point.lat(), 41.2230);
/// assert!(GeoPoint::new(91.0, 0.0).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct RawGeoPoint {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoPointError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lng)
    }
}

impl GeoPoint {
    /// Validate and construct a [`GeoPoint`].
    ///
    /// # Errors
    /// Returns [`GeoPointError`] when either coordinate is non-finite or out
    /// of range.
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeoPointError> {
        if !lat.is_finite() {
            return Err(GeoPointError::NonFiniteLatitude { lat });
        }
        if !lng.is_finite() {
            return Err(GeoPointError::NonFiniteLongitude { lng });
        }
        if !LATITUDE_RANGE.contains(&lat) {
            return Err(GeoPointError::LatitudeOutOfRange { lat });
        }
        if !LONGITUDE_RANGE.contains(&lng) {
            return Err(GeoPointError::LongitudeOutOfRange { lng });
        }
        Ok(Self { lat, lng })
    }

    /// Construct from literals already known to be in range.
    pub(crate) const fn new_unchecked(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }

    /// Convert to a `geo` coordinate (`x = longitude`, `y = latitude`).
    #[must_use]
    pub const fn to_coord(self) -> Coord<f64> {
        Coord {
            x: self.lng,
            y: self.lat,
        }
    }
}

/// Errors returned by [`IncidentPoint::new`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum IncidentError {
    /// The coordinate was invalid.
    #[error(transparent)]
    Location(#[from] GeoPointError),
    /// The weight was negative or not finite.
    #[error("incident weight must be a finite, non-negative number, found {weight}")]
    InvalidWeight {
        /// Rejected value.
        weight: f64,
    },
}

/// A historical incident at a location, weighted by severity or frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IncidentPoint {
    /// Where the incident happened.
    #[serde(flatten)]
    pub location: GeoPoint,
    /// Severity or frequency weight; always `>= 0`.
    pub weight: f64,
}

impl IncidentPoint {
    /// Validate and construct an [`IncidentPoint`].
    ///
    /// # Errors
    /// Returns [`IncidentError`] for invalid coordinates or a negative or
    /// non-finite weight.
    ///
    /// # Examples
    ///
    /// ```
    /// use saferoute_core::IncidentPoint;
    ///
    /// let incident = IncidentPoint::new(41.2214, -111.9725, 245.0).unwrap();
    /// assert_eq!(incident.weight, 245.0);
    /// assert!(IncidentPoint::new(41.2214, -111.9725, -1.0).is_err());
    /// ```
    pub fn new(lat: f64, lng: f64, weight: f64) -> Result<Self, IncidentError> {
        let location = GeoPoint::new(lat, lng)?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(IncidentError::InvalidWeight { weight });
        }
        Ok(Self { location, weight })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(90.0, 180.0)]
    #[case(-90.0, -180.0)]
    #[case(0.0, 0.0)]
    fn accepts_boundary_coordinates(#[case] lat: f64, #[case] lng: f64) {
        assert!(GeoPoint::new(lat, lng).is_ok());
    }

    #[rstest]
    #[case(90.000_1, 0.0)]
    #[case(-90.5, 0.0)]
    fn rejects_latitude_out_of_range(#[case] lat: f64, #[case] lng: f64) {
        let err = GeoPoint::new(lat, lng).expect_err("latitude should be rejected");
        assert!(matches!(err, GeoPointError::LatitudeOutOfRange { .. }));
    }

    #[rstest]
    fn rejects_longitude_out_of_range() {
        let err = GeoPoint::new(0.0, 180.5).expect_err("longitude should be rejected");
        assert!(matches!(err, GeoPointError::LongitudeOutOfRange { .. }));
    }

    #[rstest]
    fn rejects_nan() {
        let err = GeoPoint::new(f64::NAN, 0.0).expect_err("NaN should be rejected");
        assert!(matches!(err, GeoPointError::NonFiniteLatitude { .. }));
    }

    #[rstest]
    fn deserialisation_validates_ranges() {
        let ok: GeoPoint = serde_json::from_str(r#"{"lat":1.0,"lng":2.0}"#).expect("valid point");
        assert_eq!(ok.to_coord(), Coord { x: 2.0, y: 1.0 });
        assert!(serde_json::from_str::<GeoPoint>(r#"{"lat":100.0,"lng":2.0}"#).is_err());
    }

    #[rstest]
    #[case(-0.5)]
    #[case(f64::INFINITY)]
    fn incident_rejects_bad_weight(#[case] weight: f64) {
        let err = IncidentPoint::new(0.0, 0.0, weight).expect_err("weight should be rejected");
        assert!(matches!(err, IncidentError::InvalidWeight { .. }));
    }

    #[rstest]
    fn incident_accepts_zero_weight() {
        assert!(IncidentPoint::new(0.0, 0.0, 0.0).is_ok());
    }
}
