//! Cached, load-on-demand incident datasets.
//!
//! [`IncidentStore`] owns the cache for one [`DatasetSource`]. Readers share
//! a read lock and clone an `Arc<Dataset>`; only loads and invalidations
//! take the write lock, and they swap whole entries, so an in-flight scoring
//! request never sees a partially built dataset.
//!
//! Loading resolves a key in this order:
//! 1. the requested key;
//! 2. the configured fallback key, when the requested key has no data;
//! 3. the built-in sample dataset, when [`SamplePolicy::BuiltInSample`] is
//!    active. With [`SamplePolicy::Disabled`] the load fails with
//!    [`StoreError::NotFound`].
//!
//! A fetch that outlives [`StoreConfig::load_timeout`] is abandoned and
//! degrades to the sample dataset. Such timed-out samples are not cached, so
//! the next load retries the source. At most one fetch per key runs at a
//! time: a miss that finds an abandoned fetch still running waits up to the
//! same timeout for it to finish and only then starts a new one.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Condvar, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, mpsc,
    },
    thread,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use thiserror::Error;

use crate::{DataSourceError, DatasetSource, GeoPoint, IncidentPoint, RawDataset};

mod convert;
mod dataset;

pub use convert::{LAT_FIELD, LNG_FIELD, REQUIRED_FIELDS, WEIGHT_FIELD};
pub use dataset::{Dataset, DatasetOrigin, DatasetSummary, SampleReason};

/// Dataset key used when a caller does not name one.
pub const DEFAULT_DATASET_KEY: &str = "processed_crime_data";

/// Default upper bound on a single source fetch.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// What to serve when no dataset can be found for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplePolicy {
    /// Serve [`IncidentStore::builtin_sample`].
    #[default]
    BuiltInSample,
    /// Fail with [`StoreError::NotFound`].
    Disabled,
}

/// Tunables for an [`IncidentStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Key tried when the requested key has no data.
    pub fallback_key: Option<String>,
    /// Behaviour when neither key has data.
    pub sample_policy: SamplePolicy,
    /// Upper bound on one source fetch.
    pub load_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            fallback_key: None,
            sample_policy: SamplePolicy::default(),
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }
}

impl StoreConfig {
    /// Set the fallback key.
    #[must_use]
    pub fn with_fallback_key(mut self, key: impl Into<String>) -> Self {
        self.fallback_key = Some(key.into());
        self
    }

    /// Set the sample policy.
    #[must_use]
    pub const fn with_sample_policy(mut self, policy: SamplePolicy) -> Self {
        self.sample_policy = policy;
        self
    }

    /// Set the load timeout.
    #[must_use]
    pub const fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }
}

/// Errors raised by [`IncidentStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The source failed while loading `key`.
    #[error("dataset source unavailable while loading {key:?}: {source}")]
    DataSourceUnavailable {
        /// Requested key.
        key: String,
        /// Source failure.
        #[source]
        source: DataSourceError,
    },
    /// The source failed while enumerating keys.
    #[error("dataset source could not list datasets: {source}")]
    ListingUnavailable {
        /// Source failure.
        #[source]
        source: DataSourceError,
    },
    /// The dataset schema lacks required fields.
    #[error("dataset {key:?} is missing required fields: {}", missing.join(", "))]
    Schema {
        /// Requested key.
        key: String,
        /// Required fields absent from the schema.
        missing: Vec<&'static str>,
    },
    /// No data exists for the key and no fallback applies.
    #[error("no data found for dataset {key:?}")]
    NotFound {
        /// Requested key.
        key: String,
    },
}

enum FetchFailure {
    TimedOut,
    Source(DataSourceError),
}

/// Keys with a fetch currently running on a loader thread.
#[derive(Debug, Default)]
struct InFlight {
    keys: Mutex<HashSet<String>>,
    finished: Condvar,
}

impl InFlight {
    /// Claim `key` for a new fetch, waiting up to `timeout` for a running
    /// fetch of the same key to finish. Returns `None` if it is still running.
    fn claim(self: &Arc<Self>, key: &str, timeout: Duration) -> Option<FetchClaim> {
        let keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut keys, _) = self
            .finished
            .wait_timeout_while(keys, timeout, |keys| keys.contains(key))
            .unwrap_or_else(PoisonError::into_inner);
        if !keys.insert(key.to_owned()) {
            return None;
        }
        Some(FetchClaim {
            in_flight: Arc::clone(self),
            key: key.to_owned(),
        })
    }
}

/// Releases its key when dropped, on success, failure or panic alike.
struct FetchClaim {
    in_flight: Arc<InFlight>,
    key: String,
}

impl Drop for FetchClaim {
    fn drop(&mut self) {
        self.in_flight
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
        self.in_flight.finished.notify_all();
    }
}

/// Owned cache of incident datasets backed by a [`DatasetSource`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use saferoute_core::{IncidentStore, StoreConfig, test_support::MemorySource};
///
/// let source = MemorySource::default().with_dataset("city", &[(41.2214, -111.9725, 245.0)]);
/// let store = IncidentStore::new(Arc::new(source), StoreConfig::default());
/// let dataset = store.load("city").unwrap();
/// assert_eq!(dataset.len(), 1);
/// ```
pub struct IncidentStore {
    source: Arc<dyn DatasetSource>,
    config: StoreConfig,
    cache: RwLock<HashMap<String, Arc<Dataset>>>,
    in_flight: Arc<InFlight>,
}

impl std::fmt::Debug for IncidentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncidentStore")
            .field("config", &self.config)
            .field("cached_keys", &self.cached_keys())
            .finish_non_exhaustive()
    }
}

impl IncidentStore {
    /// Create an empty store over `source`.
    #[must_use]
    pub fn new(source: Arc<dyn DatasetSource>, config: StoreConfig) -> Self {
        Self {
            source,
            config,
            cache: RwLock::new(HashMap::new()),
            in_flight: Arc::default(),
        }
    }

    /// Store configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The documented sample served when no data exists for a key.
    ///
    /// Three weighted incidents in central Los Angeles.
    #[must_use]
    pub fn builtin_sample() -> Vec<IncidentPoint> {
        [(34.052, -118.243, 5.0), (34.049, -118.239, 3.0), (34.047, -118.245, 8.0)]
            .into_iter()
            .map(|(lat, lng, weight)| IncidentPoint {
                location: GeoPoint::new_unchecked(lat, lng),
                weight,
            })
            .collect()
    }

    /// Return the dataset for `key`, loading it on a cache miss.
    ///
    /// # Errors
    /// - [`StoreError::DataSourceUnavailable`] when the source fails.
    /// - [`StoreError::Schema`] when required columns are absent.
    /// - [`StoreError::NotFound`] when no data exists and the sample policy
    ///   is disabled.
    pub fn load(&self, key: &str) -> Result<Arc<Dataset>, StoreError> {
        if let Some(hit) = self.read_cache().get(key) {
            debug!("incident cache hit for {key:?} ({} points)", hit.len());
            return Ok(Arc::clone(hit));
        }
        debug!("incident cache miss for {key:?}");

        let started = Instant::now();
        let dataset = self.resolve(key)?.with_load_duration(started.elapsed());
        info!(
            "loaded dataset {key:?} with {} points in {:?} (origin: {:?}, skipped: {})",
            dataset.len(),
            dataset.load_duration(),
            dataset.origin(),
            dataset.skipped_records(),
        );

        let dataset = Arc::new(dataset);
        if matches!(
            dataset.origin(),
            DatasetOrigin::BuiltInSample {
                reason: SampleReason::TimedOut
            }
        ) {
            return Ok(dataset);
        }
        let mut cache = self.write_cache();
        let entry = cache.entry(key.to_owned()).or_insert(dataset);
        Ok(Arc::clone(entry))
    }

    /// Enumerate keys exposed by the source, sorted and de-duplicated.
    ///
    /// # Errors
    /// Returns [`StoreError::ListingUnavailable`] when the source fails.
    pub fn list_available(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = self
            .source
            .list_keys()
            .map_err(|source| StoreError::ListingUnavailable { source })?;
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    /// Drop one cached key, or every key when `key` is `None`.
    ///
    /// Returns the keys actually removed, sorted. Invalidating a key that is
    /// not cached removes nothing.
    pub fn invalidate(&self, key: Option<&str>) -> Vec<String> {
        let mut cache = self.write_cache();
        let mut removed: Vec<String> = match key {
            Some(key) => cache.remove_entry(key).map(|(k, _)| k).into_iter().collect(),
            None => cache.drain().map(|(k, _)| k).collect(),
        };
        removed.sort();
        debug!("invalidated cached datasets {removed:?}");
        removed
    }

    /// Summary statistics for `key`, loading it if needed.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] when the dataset has no points, and
    /// propagates any [`IncidentStore::load`] failure.
    pub fn describe(&self, key: &str) -> Result<DatasetSummary, StoreError> {
        self.load(key)?.summary().ok_or_else(|| StoreError::NotFound {
            key: key.to_owned(),
        })
    }

    /// Keys currently held in the cache, sorted.
    #[must_use]
    pub fn cached_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read_cache().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn resolve(&self, key: &str) -> Result<Dataset, StoreError> {
        match self.fetch_with_timeout(key) {
            Ok(Some(raw)) => return build_dataset(key, DatasetOrigin::Source, &raw),
            Ok(None) => {}
            Err(failure) => return self.degrade(key, failure),
        }

        if let Some(fallback) = self.config.fallback_key.as_deref().filter(|f| *f != key) {
            debug!("dataset {key:?} has no data; trying fallback {fallback:?}");
            match self.fetch_with_timeout(fallback) {
                Ok(Some(raw)) => {
                    let origin = DatasetOrigin::Fallback {
                        key: fallback.to_owned(),
                    };
                    return build_dataset(key, origin, &raw);
                }
                Ok(None) => {}
                Err(failure) => return self.degrade(key, failure),
            }
        }

        self.sample_or(key, SampleReason::Missing, || StoreError::NotFound {
            key: key.to_owned(),
        })
    }

    fn degrade(&self, key: &str, failure: FetchFailure) -> Result<Dataset, StoreError> {
        match failure {
            FetchFailure::Source(source) => Err(StoreError::DataSourceUnavailable {
                key: key.to_owned(),
                source,
            }),
            FetchFailure::TimedOut => {
                let timeout = self.config.load_timeout;
                warn!("loading dataset {key:?} exceeded {timeout:?}");
                self.sample_or(key, SampleReason::TimedOut, || {
                    StoreError::DataSourceUnavailable {
                        key: key.to_owned(),
                        source: DataSourceError::Unavailable {
                            reason: format!("fetch did not complete within {timeout:?}"),
                            source: None,
                        },
                    }
                })
            }
        }
    }

    fn sample_or<F>(&self, key: &str, reason: SampleReason, error: F) -> Result<Dataset, StoreError>
    where
        F: FnOnce() -> StoreError,
    {
        match self.config.sample_policy {
            SamplePolicy::BuiltInSample => {
                warn!("serving built-in sample incidents for {key:?} ({reason:?})");
                let origin = DatasetOrigin::BuiltInSample { reason };
                Ok(Dataset::new(key, origin, Self::builtin_sample()))
            }
            SamplePolicy::Disabled => Err(error()),
        }
    }

    fn fetch_with_timeout(&self, key: &str) -> Result<Option<RawDataset>, FetchFailure> {
        let Some(claim) = self.in_flight.claim(key, self.config.load_timeout) else {
            debug!("earlier fetch of dataset {key:?} is still running; not starting another");
            return Err(FetchFailure::TimedOut);
        };
        let (tx, rx) = mpsc::sync_channel(1);
        let source = Arc::clone(&self.source);
        thread::Builder::new()
            .name("saferoute-dataset-load".to_owned())
            .spawn(move || {
                if tx.send(source.fetch(&claim.key)).is_err() {
                    debug!("dropping late result for dataset {:?}", claim.key);
                }
            })
            .map_err(|err| {
                FetchFailure::Source(DataSourceError::unavailable(
                    "failed to spawn dataset loader",
                    err,
                ))
            })?;

        match rx.recv_timeout(self.config.load_timeout) {
            Ok(result) => result.map_err(FetchFailure::Source),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(FetchFailure::TimedOut),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(FetchFailure::Source(DataSourceError::Unavailable {
                    reason: "dataset loader exited without a result".to_owned(),
                    source: None,
                }))
            }
        }
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Dataset>>> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Dataset>>> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn build_dataset(key: &str, origin: DatasetOrigin, raw: &RawDataset) -> Result<Dataset, StoreError> {
    let missing = convert::missing_fields(raw);
    if !missing.is_empty() {
        return Err(StoreError::Schema {
            key: key.to_owned(),
            missing,
        });
    }
    let converted = convert::convert_records(&raw.records);
    if converted.skipped > 0 {
        warn!(
            "skipped {} malformed records while loading dataset {key:?}",
            converted.skipped
        );
    }
    Ok(Dataset::new(key, origin, converted.points).with_skipped_records(converted.skipped))
}

#[cfg(test)]
mod tests;
