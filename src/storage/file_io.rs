//! JSON data files
//!
//! Repositories keep their whole state in one pretty-printed JSON file each.
//! A save serializes in memory first, writes and syncs a sibling `.tmp`
//! file, then renames it over the target, so a failed save leaves the
//! previous contents in place.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::TallyError;

fn storage_error(action: &str, path: &Path, err: impl fmt::Display) -> TallyError {
    TallyError::Storage(format!("Failed to {} {}: {}", action, path.display(), err))
}

fn temp_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

/// Load a data file; a file that does not exist yet loads as `T::default()`
pub fn read_json<T, P>(path: P) -> Result<T, TallyError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(err) => return Err(storage_error("open", path, err)),
    };

    serde_json::from_reader(BufReader::new(file)).map_err(|e| storage_error("parse", path, e))
}

/// Replace a data file with `data`, creating parent directories as needed
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), TallyError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let contents =
        serde_json::to_vec_pretty(data).map_err(|e| storage_error("serialize", path, e))?;

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| storage_error("create directory", dir, e))?;
    }

    // Same directory as the target, or the rename is not atomic
    let temp = temp_path(path);
    write_synced(&temp, &contents)
        .and_then(|()| fs::rename(&temp, path))
        .map_err(|e| {
            let _ = fs::remove_file(&temp);
            storage_error("write", path, e)
        })
}

fn write_synced(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}
