//! Caller-supplied routes and the segments derived from them.

use thiserror::Error;

use crate::{GeoPoint, GeoPointError};

/// Minimum number of points a route must contain.
pub const MIN_ROUTE_POINTS: usize = 2;

/// Errors returned when building a [`Route`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    /// Fewer than [`MIN_ROUTE_POINTS`] points were supplied.
    #[error("route must contain at least {MIN_ROUTE_POINTS} points, found {count}")]
    TooFewPoints {
        /// Number of points supplied.
        count: usize,
    },
    /// A point in the route had invalid coordinates.
    #[error("route point {index} is invalid: {source}")]
    InvalidPoint {
        /// Position of the point in the route.
        index: usize,
        /// Validation failure for the coordinate.
        #[source]
        source: GeoPointError,
    },
}

/// A pair of consecutive route points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteSegment {
    /// Segment start.
    pub start: GeoPoint,
    /// Segment end.
    pub end: GeoPoint,
}

impl RouteSegment {
    /// Build a segment from two points.
    #[must_use]
    pub const fn new(start: GeoPoint, end: GeoPoint) -> Self {
        Self { start, end }
    }

    /// Report whether both endpoints are the same coordinate.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }
}

/// An ordered sequence of at least two validated points.
///
/// # Examples
///
/// ```
/// use saferoute_core::Route;
///
/// # fn main() -> Result<(), saferoute_core::RouteError> {
/// let route = Route::from_coordinates([(41.2230, -111.9738), (41.2198, -111.9712)])?;
/// assert_eq!(route.segments().count(), 1);
/// assert!(Route::from_coordinates([(41.2230, -111.9738)]).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    points: Vec<GeoPoint>,
}

impl Route {
    /// Construct a route from already validated points.
    ///
    /// # Errors
    /// Returns [`RouteError::TooFewPoints`] when fewer than two points are
    /// given.
    pub fn new(points: Vec<GeoPoint>) -> Result<Self, RouteError> {
        if points.len() < MIN_ROUTE_POINTS {
            return Err(RouteError::TooFewPoints {
                count: points.len(),
            });
        }
        Ok(Self { points })
    }

    /// Validate raw `(lat, lng)` pairs and construct a route.
    ///
    /// # Errors
    /// Returns [`RouteError::InvalidPoint`] naming the first bad coordinate,
    /// or [`RouteError::TooFewPoints`].
    pub fn from_coordinates<I>(coordinates: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let points = coordinates
            .into_iter()
            .enumerate()
            .map(|(index, (lat, lng))| {
                GeoPoint::new(lat, lng).map_err(|source| RouteError::InvalidPoint { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(points)
    }

    /// Points in travel order.
    #[must_use]
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Iterate over consecutive point pairs.
    pub fn segments(&self) -> impl Iterator<Item = RouteSegment> + '_ {
        self.points
            .windows(2)
            .filter_map(|pair| match pair {
                [start, end] => Some(RouteSegment::new(*start, *end)),
                _ => None,
            })
    }
}
