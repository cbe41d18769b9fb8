// ABOUTME: Whole-file JSON persistence with atomic replace semantics.
// ABOUTME: Writes go to a sibling .tmp file, are fsynced, then renamed over the target.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors that can occur while reading or writing store files.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Path of the temporary file used while replacing `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `data` as pretty JSON to the temp file next to `path` and fsync it.
/// The target itself is untouched until [`commit`].
pub fn stage<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<PathBuf, StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path);
    let json = serde_json::to_vec_pretty(data)?;

    let mut file = File::create(&tmp_path)?;
    file.write_all(&json)?;
    file.sync_all()?;

    Ok(tmp_path)
}

/// Atomically rename a staged file over `path`.
pub fn commit(tmp_path: &Path, path: &Path) -> Result<(), StoreError> {
    fs::rename(tmp_path, path)?;

    // Best-effort: the rename already succeeded, so a failed directory fsync
    // cannot leave a torn file.
    if let Some(parent) = path.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}

/// Replace `path` with `data` so readers see either the old or the new
/// contents, never a partial file.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), StoreError> {
    let tmp_path = stage(path, data)?;
    commit(&tmp_path, path)
}

/// Read and parse a JSON file. Returns None if the file does not exist or
/// is empty.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(serde_json::from_str(&contents)?))
}
