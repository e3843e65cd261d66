use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("output path {0:?} does not name a file")]
    NotAFile(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Write `target` through a temp file in the same directory, then rename it
/// over the destination. A failing `fill` leaves the destination untouched.
pub fn write_atomically<E, F>(target: &Path, fill: F) -> Result<PathBuf, E>
where
    E: From<PersistError>,
    F: FnOnce(&mut NamedTempFile) -> Result<(), E>,
{
    if target.file_name().is_none() || target.is_dir() {
        return Err(PersistError::NotAFile(target.to_path_buf()).into());
    }
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_output_dir(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)
        .map_err(|e| PersistError::OutputDir(format!("{}: {e}", dir.display())))?;
    fill(&mut tmp)?;
    tmp.flush().map_err(PersistError::from)?;
    tmp.as_file_mut().sync_all().map_err(PersistError::from)?;

    tmp.persist(target)
        .map_err(|e| PersistError::Io(e.error))?;
    Ok(target.to_path_buf())
}
