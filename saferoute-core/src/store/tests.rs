//! Unit coverage for the incident store cache and fallback rules.

use std::{sync::Arc, thread, time::Duration};

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::test_support::{MemorySource, StalledSource, incident_record};

#[fixture]
fn source() -> MemorySource {
    MemorySource::default()
        .with_dataset("ogden", &[(41.2214, -111.9725, 245.0), (41.2300, -111.9800, 5.0)])
        .with_dataset("fallback", &[(40.0, -111.0, 1.0)])
}

fn store_over(source: &MemorySource, config: StoreConfig) -> IncidentStore {
    IncidentStore::new(Arc::new(source.clone()), config)
}

#[rstest]
fn second_load_is_served_from_cache(source: MemorySource) {
    let store = store_over(&source, StoreConfig::default());
    let first = store.load("ogden").expect("first load");
    let second = store.load("ogden").expect("second load");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.points(), second.points());
    assert_eq!(source.fetch_count(), 1);
}

#[rstest]
fn invalidate_forces_refetch(source: MemorySource) {
    let store = store_over(&source, StoreConfig::default());
    store.load("ogden").expect("first load");
    assert_eq!(store.invalidate(Some("ogden")), vec!["ogden".to_owned()]);
    store.load("ogden").expect("reload");
    assert_eq!(source.fetch_count(), 2);
}

#[rstest]
fn invalidating_missing_key_is_a_no_op(source: MemorySource) {
    let store = store_over(&source, StoreConfig::default());
    assert!(store.invalidate(Some("nowhere")).is_empty());
    assert!(store.invalidate(None).is_empty());
}

#[rstest]
fn invalidate_all_clears_every_key(source: MemorySource) {
    let store = store_over(&source, StoreConfig::default());
    store.load("ogden").expect("load ogden");
    store.load("fallback").expect("load fallback");
    assert_eq!(
        store.invalidate(None),
        vec!["fallback".to_owned(), "ogden".to_owned()]
    );
    assert!(store.cached_keys().is_empty());
}

#[rstest]
fn missing_key_uses_fallback_dataset(source: MemorySource) {
    let config = StoreConfig::default().with_fallback_key("fallback");
    let store = store_over(&source, config);
    let dataset = store.load("unknown").expect("fallback load");
    assert_eq!(
        dataset.origin(),
        &DatasetOrigin::Fallback {
            key: "fallback".to_owned()
        }
    );
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.key(), "unknown");
}

#[rstest]
fn missing_key_without_fallback_serves_sample(source: MemorySource) {
    let store = store_over(&source, StoreConfig::default());
    let dataset = store.load("unknown").expect("sample load");
    assert_eq!(
        dataset.origin(),
        &DatasetOrigin::BuiltInSample {
            reason: SampleReason::Missing
        }
    );
    assert_eq!(dataset.points(), IncidentStore::builtin_sample().as_slice());
    assert!(!dataset.is_empty());
}

#[rstest]
fn missing_key_with_sample_disabled_is_not_found(source: MemorySource) {
    let config = StoreConfig::default().with_sample_policy(SamplePolicy::Disabled);
    let store = store_over(&source, config);
    let err = store.load("unknown").expect_err("missing dataset should fail");
    assert!(matches!(err, StoreError::NotFound { key } if key == "unknown"));
}

#[rstest]
fn unavailable_source_is_surfaced() {
    let source = MemorySource::default().unavailable();
    let store = store_over(&source, StoreConfig::default());
    let err = store.load("ogden").expect_err("unavailable source should fail");
    assert!(matches!(err, StoreError::DataSourceUnavailable { .. }));
    assert!(store.cached_keys().is_empty());
}

#[rstest]
fn schema_without_required_fields_is_fatal() {
    let raw = RawDataset::new(
        vec!["latitude".to_owned(), "lng".to_owned()],
        vec![incident_record(1.0, 2.0, 3.0)],
    );
    let source = MemorySource::default().with_raw("odd", raw);
    let store = store_over(&source, StoreConfig::default());
    let err = store.load("odd").expect_err("schema error expected");
    match err {
        StoreError::Schema { key, missing } => {
            assert_eq!(key, "odd");
            assert_eq!(missing, vec![LAT_FIELD, WEIGHT_FIELD]);
        }
        other => panic!("expected Schema, found {other:?}"),
    }
}

#[rstest]
fn malformed_records_are_skipped_and_counted() {
    let bad = json!({"lat": "n/a", "lng": -111.9, "weight": 1});
    let raw = RawDataset::from_records(vec![
        incident_record(41.2, -111.9, 2.0),
        bad.as_object().cloned().unwrap_or_default(),
    ]);
    let source = MemorySource::default().with_raw("mixed", raw);
    let store = store_over(&source, StoreConfig::default());
    let dataset = store.load("mixed").expect("partial load");
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.skipped_records(), 1);
}

#[rstest]
fn slow_source_degrades_to_uncached_sample(source: MemorySource) {
    let stalled = StalledSource::new(source, Duration::from_millis(500));
    let config = StoreConfig::default().with_load_timeout(Duration::from_millis(20));
    let store = IncidentStore::new(Arc::new(stalled), config);
    let dataset = store.load("ogden").expect("timeout should degrade");
    assert_eq!(
        dataset.origin(),
        &DatasetOrigin::BuiltInSample {
            reason: SampleReason::TimedOut
        }
    );
    assert!(store.cached_keys().is_empty());
}

#[rstest]
fn stalled_key_runs_one_fetch_at_a_time(source: MemorySource) {
    let stalled = StalledSource::new(source, Duration::from_millis(200));
    let config = StoreConfig::default().with_load_timeout(Duration::from_millis(20));
    let store = IncidentStore::new(Arc::new(stalled.clone()), config);

    for _ in 0..3 {
        let dataset = store.load("ogden").expect("timeout should degrade");
        assert_eq!(
            dataset.origin(),
            &DatasetOrigin::BuiltInSample {
                reason: SampleReason::TimedOut
            }
        );
    }
    assert_eq!(stalled.fetch_count(), 1);
    assert!(store.cached_keys().is_empty());

    // Once the abandoned fetch finishes the next miss asks the source again.
    thread::sleep(Duration::from_millis(400));
    store.load("ogden").expect("timeout should degrade");
    assert_eq!(stalled.fetch_count(), 2);
}

#[rstest]
fn stalled_key_does_not_block_other_keys(source: MemorySource) {
    let stalled = StalledSource::new(source, Duration::from_millis(200));
    let config = StoreConfig::default().with_load_timeout(Duration::from_millis(20));
    let store = IncidentStore::new(Arc::new(stalled.clone()), config);

    store.load("ogden").expect("timeout should degrade");
    store.load("fallback").expect("timeout should degrade");
    assert_eq!(stalled.fetch_count(), 2);
}

#[rstest]
fn slow_source_with_sample_disabled_is_unavailable(source: MemorySource) {
    let stalled = StalledSource::new(source, Duration::from_millis(500));
    let config = StoreConfig::default()
        .with_load_timeout(Duration::from_millis(20))
        .with_sample_policy(SamplePolicy::Disabled);
    let store = IncidentStore::new(Arc::new(stalled), config);
    let err = store.load("ogden").expect_err("timeout should fail");
    assert!(matches!(err, StoreError::DataSourceUnavailable { .. }));
}

#[rstest]
fn list_available_is_sorted(source: MemorySource) {
    let store = store_over(&source, StoreConfig::default());
    assert_eq!(
        store.list_available().expect("list keys"),
        vec!["fallback".to_owned(), "ogden".to_owned()]
    );
}

#[rstest]
fn describe_summarises_loaded_dataset(source: MemorySource) {
    let store = store_over(&source, StoreConfig::default());
    let summary = store.describe("ogden").expect("describe");
    assert_eq!(summary.count, 2);
    assert_eq!(summary.weight_max, 245.0);
    assert_eq!(summary.origin, DatasetOrigin::Source);
}

#[rstest]
fn describe_empty_dataset_is_not_found() {
    let source = MemorySource::default().with_dataset("empty", &[]);
    let store = store_over(&source, StoreConfig::default());
    let err = store.describe("empty").expect_err("empty dataset has no summary");
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[rstest]
fn concurrent_readers_share_one_dataset(source: MemorySource) {
    let store = Arc::new(store_over(&source, StoreConfig::default()));
    store.load("ogden").expect("warm cache");
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || store.load("ogden").map(|d| d.len()))
        })
        .collect();
    for handle in handles {
        let len = handle.join().expect("reader thread").expect("cached load");
        assert_eq!(len, 2);
    }
    assert_eq!(source.fetch_count(), 1);
}
