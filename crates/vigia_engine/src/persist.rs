//! Atomic file persistence for daemon state.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("could not prepare directory {dir}: {source}")]
    Directory {
        dir: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Replace the contents of `path` atomically: write a sibling temp file,
/// sync it, then rename it over the target. Readers either see the old
/// contents or the new ones, never a torn write.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), PersistError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|source| PersistError::Directory {
        dir: dir.display().to_string(),
        source,
    })?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.flush()?;
    temp.as_file().sync_all()?;

    // Drop a stale target first so the rename succeeds on every platform.
    if path.exists() {
        fs::remove_file(path)?;
    }
    temp.persist(path).map_err(|err| PersistError::Io(err.error))?;
    Ok(())
}
