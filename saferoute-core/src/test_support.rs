//! Test-only, in-memory `DatasetSource` implementations used by unit and
//! behaviour tests.

use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use serde_json::{Value, json};

use crate::{DataSourceError, DatasetSource, RawDataset, RawRecord};

/// Build a raw record with `lat`, `lng` and `weight` fields.
#[must_use]
pub fn incident_record(lat: f64, lng: f64, weight: f64) -> RawRecord {
    match json!({ "lat": lat, "lng": lng, "weight": weight }) {
        Value::Object(map) => map,
        _ => RawRecord::new(),
    }
}

/// In-memory `DatasetSource` that counts fetches.
///
/// Clones share the fetch counter so tests can keep a handle after moving
/// the source into a store.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    datasets: BTreeMap<String, RawDataset>,
    fetches: Arc<AtomicUsize>,
    unavailable: bool,
}

impl MemorySource {
    /// Add a dataset of `(lat, lng, weight)` triples under `key`.
    #[must_use]
    pub fn with_dataset(self, key: &str, incidents: &[(f64, f64, f64)]) -> Self {
        let records = incidents
            .iter()
            .map(|&(lat, lng, weight)| incident_record(lat, lng, weight))
            .collect();
        let columns = ["lat", "lng", "weight"].map(str::to_owned).to_vec();
        self.with_raw(key, RawDataset::new(columns, records))
    }

    /// Add a raw dataset under `key`.
    #[must_use]
    pub fn with_raw(mut self, key: &str, raw: RawDataset) -> Self {
        self.datasets.insert(key.to_owned(), raw);
        self
    }

    /// Make every call fail with [`DataSourceError::Unavailable`].
    #[must_use]
    pub const fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Number of `fetch` calls observed so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), DataSourceError> {
        if self.unavailable {
            return Err(DataSourceError::Unavailable {
                reason: "memory source switched off".to_owned(),
                source: None,
            });
        }
        Ok(())
    }
}

impl DatasetSource for MemorySource {
    fn fetch(&self, key: &str) -> Result<Option<RawDataset>, DataSourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.datasets.get(key).cloned())
    }

    fn list_keys(&self) -> Result<Vec<String>, DataSourceError> {
        self.check_available()?;
        // Reverse order so callers must sort.
        Ok(self.datasets.keys().rev().cloned().collect())
    }
}

/// `DatasetSource` whose fetch sleeps for a fixed delay before answering.
///
/// Clones share the counter of started fetches.
#[derive(Debug, Clone)]
pub struct StalledSource {
    delay: Duration,
    inner: MemorySource,
    started: Arc<AtomicUsize>,
}

impl StalledSource {
    /// Delay every fetch from `inner` by `delay`.
    #[must_use]
    pub fn new(inner: MemorySource, delay: Duration) -> Self {
        Self {
            delay,
            inner,
            started: Arc::default(),
        }
    }

    /// Number of `fetch` calls started so far, finished or not.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

impl DatasetSource for StalledSource {
    fn fetch(&self, key: &str) -> Result<Option<RawDataset>, DataSourceError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        self.inner.fetch(key)
    }

    fn list_keys(&self) -> Result<Vec<String>, DataSourceError> {
        self.inner.list_keys()
    }
}
