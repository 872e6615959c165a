//! Shared filesystem helpers built on `cap-std` and `camino`.
#![forbid(unsafe_code)]

use camino::{Utf8Component, Utf8Path};
use cap_std::{ambient_authority, fs_utf8};
use std::io;

/// Open a UTF-8 file path using ambient authority.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Open a directory capability for `path` using ambient authority.
pub fn open_ambient_dir(path: &Utf8Path) -> io::Result<fs_utf8::Dir> {
    fs_utf8::Dir::open_ambient_dir(path, ambient_authority())
}

/// Return whether `path` exists and is a regular file.
///
/// The parent directory is opened with ambient authority and the entry is
/// inspected through that capability.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other("path should end in a file name"))?;
    let dir = open_ambient_dir(parent)?;
    dir.metadata(name).map(|meta| meta.is_file())
}

/// Report whether `name` is exactly one normal path component.
///
/// Rejects empty names, separators, `.` and `..`, so the name can only
/// address an entry directly inside a directory.
///
/// ```
/// use saferoute_fs::is_single_component;
///
/// assert!(is_single_component("crime_2024"));
/// assert!(!is_single_component("../etc/passwd"));
/// assert!(!is_single_component("a/b"));
/// assert!(!is_single_component(""));
/// ```
#[must_use]
pub fn is_single_component(name: &str) -> bool {
    let mut components = Utf8Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Utf8Component::Normal(part)), None) if part == name
    )
}

/// Return whether `name` exists inside `dir` and is a regular file.
pub fn dir_has_file(dir: &fs_utf8::Dir, name: &str) -> io::Result<bool> {
    match dir.metadata(name) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// List the stems of regular files in `dir` with the given extension,
/// sorted.
pub fn list_file_stems(dir: &fs_utf8::Dir, extension: &str) -> io::Result<Vec<String>> {
    let mut stems = Vec::new();
    for entry in dir.entries()? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name()?;
        let path = Utf8Path::new(&name);
        if path.extension() == Some(extension)
            && let Some(stem) = path.file_stem()
        {
            stems.push(stem.to_owned());
        }
    }
    stems.sort();
    Ok(stems)
}
