//! Temporary dataset directories and request files for CLI tests.

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// Route used across CLI tests: a short north-east leg in Ogden.
pub(super) const ROUTE_JSON: &str = r#"[
    {"lat": 41.22, "lng": -111.98},
    {"lat": 41.23, "lng": -111.97}
]"#;

/// One incident at the route midpoint and one well away from it.
pub(super) const OGDEN_CSV: &str = "lat,lng,weight\n\
    41.225,-111.975,245\n\
    41.30,-111.90,500\n";

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path, contents).expect("write fixture file");
}

/// A temporary workspace holding a `data/` directory and request files.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        std::fs::create_dir(root.join("data")).expect("create data directory");
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn data_dir(&self) -> Utf8PathBuf {
        self.root.join("data")
    }

    pub(super) fn write_dataset(&self, key: &str, contents: &str) {
        write_utf8(
            &self.data_dir().join(format!("{key}.csv")),
            contents.as_bytes(),
        );
    }

    pub(super) fn write_request(&self, name: &str, body: &str) -> Utf8PathBuf {
        let path = self.root.join(name);
        write_utf8(&path, body.as_bytes());
        path
    }

    /// Request scoring [`ROUTE_JSON`] against `dataset`.
    pub(super) fn route_request(&self, dataset: &str) -> Utf8PathBuf {
        self.write_request(
            "request.json",
            &format!(r#"{{"route": {ROUTE_JSON}, "dataset": "{dataset}"}}"#),
        )
    }
}
