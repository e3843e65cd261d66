use std::path::{Path, PathBuf};

use contacts_core::Record;
use engine_logging::engine_info;
use thiserror::Error;

use crate::persist::{write_atomically, PersistError};

/// Header row of every export.
pub const CSV_HEADER: [&str; 2] = ["name", "email"];

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot write output: {0}")]
    Persist(#[from] PersistError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Write `records` as `name,email` CSV to `path`, replacing any existing file.
///
/// The header row is written even when there are no records.
pub fn write_csv(path: &Path, records: &[Record]) -> Result<PathBuf, WriteError> {
    let written = write_atomically(path, |file| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(CSV_HEADER)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush().map_err(PersistError::from)?;
        Ok::<(), WriteError>(())
    })?;

    engine_info!("Wrote {} records to {:?}", records.len(), written);
    Ok(written)
}
