#![expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]

//! Behavioural coverage for CSV-backed incident datasets.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::sync::Arc;

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use saferoute_core::{Dataset, IncidentStore, SamplePolicy, StoreConfig, StoreError};
use saferoute_data::CsvDirectorySource;
use tempfile::TempDir;

/// World state for CSV dataset scenarios.
#[derive(Debug, Default)]
struct CsvWorld {
    dir: RefCell<Option<TempDir>>,
    loaded: RefCell<Option<Result<Arc<Dataset>, StoreError>>>,
    listed: RefCell<Vec<String>>,
}

impl CsvWorld {
    fn root(&self) -> Utf8PathBuf {
        let dir = self.dir.borrow();
        let dir = dir.as_ref().expect("dataset directory created");
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp path")
    }

    fn write(&self, key: &str, contents: &str) {
        std::fs::write(self.root().join(format!("{key}.csv")), contents).expect("write dataset");
    }

    fn store(&self) -> IncidentStore {
        let source = CsvDirectorySource::open(self.root()).expect("open dataset directory");
        let config = StoreConfig::default().with_sample_policy(SamplePolicy::Disabled);
        IncidentStore::new(Arc::new(source), config)
    }

    fn dataset(&self) -> Arc<Dataset> {
        let loaded = self.loaded.borrow();
        match loaded.as_ref().expect("a dataset should have been loaded") {
            Ok(dataset) => Arc::clone(dataset),
            Err(err) => panic!("expected a dataset, found error: {err}"),
        }
    }
}

#[fixture]
fn world() -> CsvWorld {
    CsvWorld::default()
}

#[given("a dataset directory")]
fn given_directory(world: &CsvWorld) {
    world
        .dir
        .replace(Some(TempDir::new().expect("create temporary directory")));
}

#[given("a dataset file {key:word} with {valid} valid rows and {bad} malformed row")]
fn given_mixed_file(world: &CsvWorld, key: String, valid: usize, bad: usize) {
    let mut contents = String::from("lat,lng,weight\n");
    for _ in 0..valid {
        contents.push_str("41.2214,-111.9725,245\n");
    }
    for row in 0..bad {
        writeln!(contents, "not-a-latitude-{row},-111.9725,245").expect("format row");
    }
    world.write(&key, &contents);
}

#[given("a dataset file {key:word} without a weight column")]
fn given_file_without_weight(world: &CsvWorld, key: String) {
    world.write(&key, "lat,lng,severity\n41.2214,-111.9725,high\n");
}

#[when("I load dataset {key:word} through the incident store")]
fn when_load(world: &CsvWorld, key: String) {
    let result = world.store().load(&key);
    world.loaded.replace(Some(result));
}

#[when("I list the available datasets")]
fn when_list(world: &CsvWorld) {
    let keys = world.store().list_available().expect("list datasets");
    world.listed.replace(keys);
}

#[then("the dataset holds {count} incidents")]
fn then_count(world: &CsvWorld, count: usize) {
    assert_eq!(world.dataset().len(), count);
}

#[then("{count} record was skipped")]
fn then_skipped(world: &CsvWorld, count: usize) {
    assert_eq!(world.dataset().skipped_records(), count);
}

#[then("loading fails because {field:word} is missing")]
fn then_schema_error(world: &CsvWorld, field: String) {
    let loaded = world.loaded.borrow();
    match loaded.as_ref().expect("a load should have been attempted") {
        Err(StoreError::Schema { missing, .. }) => {
            assert!(missing.iter().any(|m| *m == field), "{missing:?}");
        }
        other => panic!("expected a schema error, found {other:?}"),
    }
}

#[then("the datasets are {keys}")]
fn then_listed(world: &CsvWorld, keys: String) {
    let expected: Vec<String> = keys.split(',').map(str::to_owned).collect();
    assert_eq!(*world.listed.borrow(), expected);
}

#[scenario(path = "tests/features/csv_dataset.feature", index = 0)]
fn malformed_rows_skipped(world: CsvWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/csv_dataset.feature", index = 1)]
fn missing_weight_column(world: CsvWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/csv_dataset.feature", index = 2)]
fn datasets_listed(world: CsvWorld) {
    let _ = world;
}
