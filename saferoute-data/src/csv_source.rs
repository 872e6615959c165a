//! `DatasetSource` reading `<key>.csv` files from one directory.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8;
use log::{debug, trace};
use saferoute_core::{DataSourceError, DatasetSource, RawDataset, RawRecord};
use saferoute_fs::{dir_has_file, is_single_component, list_file_stems, open_ambient_dir};
use serde_json::Value;
use thiserror::Error;

/// File extension of dataset files.
pub const CSV_EXTENSION: &str = "csv";

/// Errors raised by [`CsvDirectorySource`].
#[derive(Debug, Error)]
pub enum CsvSourceError {
    /// The dataset directory could not be opened.
    #[error("failed to open dataset directory {path}")]
    OpenRoot {
        /// Requested directory.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: io::Error,
    },
    /// The key does not name a plain file inside the directory.
    #[error("dataset key {key:?} must be a bare file stem")]
    InvalidKey {
        /// Rejected key.
        key: String,
    },
    /// Listing the directory failed.
    #[error("failed to list datasets in {path}")]
    List {
        /// Dataset directory.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: io::Error,
    },
    /// Opening or inspecting a dataset file failed.
    #[error("failed to read dataset file {path}")]
    Read {
        /// Dataset file.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: io::Error,
    },
    /// The header row could not be parsed.
    #[error("failed to parse CSV header in {path}")]
    Header {
        /// Dataset file.
        path: Utf8PathBuf,
        /// Source error from `csv`.
        #[source]
        source: csv::Error,
    },
}

impl From<CsvSourceError> for DataSourceError {
    fn from(err: CsvSourceError) -> Self {
        match err {
            CsvSourceError::InvalidKey { key } => Self::InvalidKey { key },
            other => Self::unavailable(other.to_string(), other),
        }
    }
}

/// Reads datasets stored as `<root>/<key>.csv` with a header row.
///
/// Every cell is handed over as a trimmed string; numeric conversion and
/// per-record validation happen in the incident store. A row the CSV parser
/// cannot decode is passed on as an empty record, so the store counts it as
/// skipped.
///
/// # Examples
///
/// ```no_run
/// use saferoute_core::DatasetSource;
/// use saferoute_data::CsvDirectorySource;
///
/// let source = CsvDirectorySource::open("data")?;
/// for key in source.list_keys()? {
///     println!("{key}");
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct CsvDirectorySource {
    root: Utf8PathBuf,
    dir: fs_utf8::Dir,
    delimiter: u8,
}

impl CsvDirectorySource {
    /// Open `root` as a dataset directory.
    ///
    /// # Errors
    /// Returns [`CsvSourceError::OpenRoot`] when the directory cannot be
    /// opened.
    pub fn open(root: impl Into<Utf8PathBuf>) -> Result<Self, CsvSourceError> {
        let root = root.into();
        let dir = open_ambient_dir(&root).map_err(|source| CsvSourceError::OpenRoot {
            path: root.clone(),
            source,
        })?;
        Ok(Self {
            root,
            dir,
            delimiter: b',',
        })
    }

    /// Use `delimiter` instead of a comma.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Dataset directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// File name backing `key`.
    ///
    /// # Errors
    /// Returns [`CsvSourceError::InvalidKey`] unless `key` is a bare stem.
    pub fn file_name(key: &str) -> Result<String, CsvSourceError> {
        let name = format!("{key}.{CSV_EXTENSION}");
        if !is_single_component(key) || !is_single_component(&name) {
            return Err(CsvSourceError::InvalidKey {
                key: key.to_owned(),
            });
        }
        Ok(name)
    }

    /// Read the dataset under `key`, or `None` when no file exists.
    ///
    /// # Errors
    /// Returns [`CsvSourceError`] for invalid keys, unreadable files and
    /// malformed header rows.
    pub fn read_dataset(&self, key: &str) -> Result<Option<RawDataset>, CsvSourceError> {
        let name = Self::file_name(key)?;
        let path = self.root.join(&name);
        let read_error = |source: io::Error| CsvSourceError::Read {
            path: path.clone(),
            source,
        };
        if !dir_has_file(&self.dir, &name).map_err(read_error)? {
            debug!("no dataset file at {path}");
            return Ok(None);
        }
        let file = self.dir.open(&name).map_err(read_error)?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(file);
        let columns: Vec<String> = reader
            .headers()
            .map_err(|source| CsvSourceError::Header {
                path: path.clone(),
                source,
            })?
            .iter()
            .map(|header| header.trim().to_owned())
            .collect();

        let records = reader
            .records()
            .enumerate()
            .map(|(row, result)| match result {
                Ok(record) => columns
                    .iter()
                    .zip(record.iter())
                    .map(|(column, cell)| (column.clone(), Value::String(cell.trim().to_owned())))
                    .collect::<RawRecord>(),
                Err(err) => {
                    trace!("unreadable row {row} in {path}: {err}");
                    RawRecord::new()
                }
            })
            .collect();
        Ok(Some(RawDataset::new(columns, records)))
    }

    /// Stems of every `*.csv` file in the directory, sorted.
    ///
    /// # Errors
    /// Returns [`CsvSourceError::List`] when the directory cannot be read.
    pub fn dataset_keys(&self) -> Result<Vec<String>, CsvSourceError> {
        list_file_stems(&self.dir, CSV_EXTENSION).map_err(|source| CsvSourceError::List {
            path: self.root.clone(),
            source,
        })
    }
}

impl DatasetSource for CsvDirectorySource {
    fn fetch(&self, key: &str) -> Result<Option<RawDataset>, DataSourceError> {
        Ok(self.read_dataset(key)?)
    }

    fn list_keys(&self) -> Result<Vec<String>, DataSourceError> {
        Ok(self.dataset_keys()?)
    }
}
