//! Dataset source adapters for the SafeRoute engine.
//!
//! Responsibilities:
//! - Implement [`DatasetSource`](saferoute_core::DatasetSource) over
//!   concrete storage.
//! - Hand records over untyped; validation and conversion live in
//!   `saferoute-core`.
//!
//! Invariants:
//! - A dataset key only ever addresses a file directly inside the
//!   configured root.
//! - Sources are thread-safe and hold no global state.

#![forbid(unsafe_code)]

mod csv_source;

pub use csv_source::{CSV_EXTENSION, CsvDirectorySource, CsvSourceError};

#[cfg(test)]
mod tests;
