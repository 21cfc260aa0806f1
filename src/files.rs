use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{Error, Result};

/// open_request opens a request (or response) file for line reading.
pub fn open_request(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| Error::FileOpen {
            path: path.to_path_buf(),
            source,
        })
}

/// create_response creates or truncates `path`, creating missing parent
/// directories first.
pub fn create_response(path: &Path) -> Result<BufWriter<File>> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| Error::FileCreate {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| Error::FileCreate {
            path: path.to_path_buf(),
            source,
        })
}

/// replace_extension swaps a trailing `old` suffix of `name` for `new`.
/// Names without that suffix are returned unchanged.
pub fn replace_extension(name: &str, old: &str, new: &str) -> String {
    match name.strip_suffix(old) {
        Some(stem) if !stem.is_empty() => format!("{}{}", stem, new),
        _ => name.to_string(),
    }
}
