//! External dataset sources feeding the [`IncidentStore`](crate::IncidentStore).
//!
//! A source hands over raw, unvalidated records keyed by column name. The
//! store checks the schema, converts records to [`IncidentPoint`]s and skips
//! the malformed ones.
//!
//! [`IncidentPoint`]: crate::IncidentPoint

use serde_json::{Map, Value};
use thiserror::Error;

/// A single raw record as delivered by a source.
pub type RawRecord = Map<String, Value>;

/// Error type boxed inside [`DataSourceError`].
pub type BoxedSourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Raw rows for one dataset key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDataset {
    /// Column names advertised by the source schema.
    pub columns: Vec<String>,
    /// Records in source order.
    pub records: Vec<RawRecord>,
}

impl RawDataset {
    /// Build a dataset from a schema and its records.
    #[must_use]
    pub const fn new(columns: Vec<String>, records: Vec<RawRecord>) -> Self {
        Self { columns, records }
    }

    /// Build a dataset whose columns are inferred from the first record.
    #[must_use]
    pub fn from_records(records: Vec<RawRecord>) -> Self {
        let columns = records
            .first()
            .map(|record| record.keys().cloned().collect())
            .unwrap_or_default();
        Self { columns, records }
    }

    /// Report whether the schema advertises `column`.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Failures raised by a [`DatasetSource`].
#[derive(Debug, Error)]
pub enum DataSourceError {
    /// The backing store could not be reached or read.
    #[error("dataset source unavailable: {reason}")]
    Unavailable {
        /// Human-readable description of the failure.
        reason: String,
        /// Underlying error, when one exists.
        #[source]
        source: Option<BoxedSourceError>,
    },
    /// The key cannot name a dataset in this source.
    #[error("dataset key {key:?} is not valid for this source")]
    InvalidKey {
        /// Rejected key.
        key: String,
    },
}

impl DataSourceError {
    /// Build an [`DataSourceError::Unavailable`] wrapping `source`.
    pub fn unavailable<E>(reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Unavailable {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Provider of raw incident datasets.
///
/// Implementations must be thread-safe: the store calls them from a worker
/// thread so a slow fetch can be abandoned after the load timeout.
///
/// # Examples
///
/// ```rust
/// use saferoute_core::{DataSourceError, DatasetSource, RawDataset};
/// use serde_json::json;
///
/// struct SingleRow;
///
/// impl DatasetSource for SingleRow {
///     fn fetch(&self, key: &str) -> Result<Option<RawDataset>, DataSourceError> {
///         if key != "demo" {
///             return Ok(None);
///         }
///         let record = json!({"lat": 1.0, "lng": 2.0, "weight": 3.0});
///         let record = record.as_object().cloned().unwrap_or_default();
///         Ok(Some(RawDataset::from_records(vec![record])))
///     }
///
///     fn list_keys(&self) -> Result<Vec<String>, DataSourceError> {
///         Ok(vec!["demo".to_owned()])
///     }
/// }
///
/// assert!(SingleRow.fetch("missing").unwrap().is_none());
/// ```
pub trait DatasetSource: Send + Sync {
    /// Return the raw rows for `key`, or `Ok(None)` when the source has no
    /// dataset under that key.
    ///
    /// # Errors
    /// Returns [`DataSourceError`] when the source itself cannot be read.
    fn fetch(&self, key: &str) -> Result<Option<RawDataset>, DataSourceError>;

    /// Enumerate the dataset keys this source can load.
    ///
    /// # Errors
    /// Returns [`DataSourceError`] when the source cannot be enumerated.
    fn list_keys(&self) -> Result<Vec<String>, DataSourceError>;
}
