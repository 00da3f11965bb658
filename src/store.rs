//! Append-only JSON log of predictions.

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;

use crate::error::PersistenceError;
use crate::models::PredictionRecord;

/// The log is rewritten as a whole on each append. Appends from this process
/// are serialized, and every rewrite lands through an atomic rename.
pub struct PredictionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl PredictionStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record in insertion order. A missing or blank file is an
    /// empty log.
    pub fn load(&self) -> Result<Vec<PredictionRecord>, PersistenceError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn append(&self, record: PredictionRecord) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock();

        let mut records = self.load()?;
        records.push(record);
        self.write_all(&records)?;

        log::debug!(
            "Prediction log {} now holds {} records",
            self.path.display(),
            records.len()
        );
        Ok(())
    }

    fn write_all(&self, records: &[PredictionRecord]) -> Result<(), PersistenceError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, records)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;

        // keep the mode of the log being replaced
        match fs::metadata(&self.path) {
            Ok(existing) => tmp.as_file().set_permissions(existing.permissions())?,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tmp.persist(&self.path)?;
        Ok(())
    }
}
