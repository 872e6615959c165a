//! Unit coverage for the CSV directory source.

use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use saferoute_core::{DataSourceError, DatasetSource};
use serde_json::Value;
use tempfile::TempDir;

use crate::{CsvDirectorySource, CsvSourceError};

/// Temporary dataset directory for each test.
#[fixture]
fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("create temporary directory: {err}"),
    }
}

fn root(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp path")
}

fn write(dir: &TempDir, name: &str, contents: &str) {
    std::fs::write(dir.path().join(name), contents).expect("write fixture");
}

#[rstest]
fn reads_header_and_trimmed_cells(temp_dir: TempDir) {
    write(
        &temp_dir,
        "ogden.csv",
        "lat, lng ,weight\n41.2214, -111.9725 ,245\n41.23,-111.98,5\n",
    );
    let source = CsvDirectorySource::open(root(&temp_dir)).expect("open");
    let raw = source
        .read_dataset("ogden")
        .expect("read")
        .expect("dataset present");
    assert_eq!(raw.columns, vec!["lat", "lng", "weight"]);
    assert_eq!(raw.records.len(), 2);
    let first = raw.records.first().expect("first record");
    assert_eq!(first.get("lng"), Some(&Value::String("-111.9725".to_owned())));
}

#[rstest]
fn missing_file_is_none(temp_dir: TempDir) {
    let source = CsvDirectorySource::open(root(&temp_dir)).expect("open");
    assert!(source.read_dataset("absent").expect("read").is_none());
}

#[rstest]
#[case("../escape")]
#[case("nested/data")]
#[case("..")]
#[case("")]
fn rejects_keys_outside_root(temp_dir: TempDir, #[case] key: &str) {
    let source = CsvDirectorySource::open(root(&temp_dir)).expect("open");
    let err = source.fetch(key).expect_err("key should be rejected");
    assert!(matches!(err, DataSourceError::InvalidKey { .. }));
}

#[rstest]
fn short_rows_keep_present_cells(temp_dir: TempDir) {
    write(&temp_dir, "short.csv", "lat,lng,weight\n41.2,-111.9\n");
    let source = CsvDirectorySource::open(root(&temp_dir)).expect("open");
    let raw = source
        .read_dataset("short")
        .expect("read")
        .expect("dataset present");
    let record = raw.records.first().expect("record");
    assert!(record.get("weight").is_none());
    assert_eq!(record.len(), 2);
}

#[rstest]
fn custom_delimiter(temp_dir: TempDir) {
    write(&temp_dir, "semi.csv", "lat;lng;weight\n1;2;3\n");
    let source = CsvDirectorySource::open(root(&temp_dir))
        .expect("open")
        .with_delimiter(b';');
    let raw = source
        .read_dataset("semi")
        .expect("read")
        .expect("dataset present");
    assert_eq!(raw.columns.len(), 3);
}

#[rstest]
fn lists_csv_stems_sorted(temp_dir: TempDir) {
    write(&temp_dir, "zeta.csv", "lat,lng,weight\n");
    write(&temp_dir, "alpha.csv", "lat,lng,weight\n");
    write(&temp_dir, "readme.md", "# datasets\n");
    let source = CsvDirectorySource::open(root(&temp_dir)).expect("open");
    assert_eq!(
        source.list_keys().expect("list"),
        vec!["alpha".to_owned(), "zeta".to_owned()]
    );
}

#[rstest]
fn missing_root_fails_to_open(temp_dir: TempDir) {
    let missing = root(&temp_dir).join("nowhere");
    let err = CsvDirectorySource::open(missing).expect_err("missing directory");
    assert!(matches!(err, CsvSourceError::OpenRoot { .. }));
}

#[rstest]
fn io_failures_map_to_unavailable() {
    let err = DataSourceError::from(CsvSourceError::List {
        path: Utf8PathBuf::from("data"),
        source: std::io::Error::other("disk gone"),
    });
    assert!(matches!(err, DataSourceError::Unavailable { source: Some(_), .. }));
}
