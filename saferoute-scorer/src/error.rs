//! Error types raised by the scoring entry points.

use saferoute_core::{RouteError, StoreError};
use thiserror::Error;

use crate::ScoringConfigError;

/// Errors raised by [`RouteSafetyService`](crate::RouteSafetyService).
#[derive(Debug, Error)]
pub enum ScoringError {
    /// The route failed validation.
    #[error("invalid route: {0}")]
    Validation(#[from] RouteError),
    /// The scoring configuration failed validation.
    #[error("invalid scoring configuration: {0}")]
    Config(#[from] ScoringConfigError),
    /// The incident store could not supply a dataset.
    #[error(transparent)]
    Store(#[from] StoreError),
}
