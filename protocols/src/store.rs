//! History blob persisted as a single JSON file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use subtrack_common::error::PersistenceError;
use subtrack_common::models::HistorySnapshot;
use subtrack_common::ports::HistoryPersistence;

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }
}

impl HistoryPersistence for JsonFileStore {
    /// Writes next to the target and renames over it, so a crash mid-write
    /// leaves the previous blob intact.
    fn save(&self, snapshot: &HistorySnapshot) -> Result<(), PersistenceError> {
        let blob: Vec<u8> = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| PersistenceError::Corrupt(e.to_string()))?;

        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(PersistenceError::Write)?;
        }

        let staging: PathBuf = self.staging_path();
        fs::write(&staging, blob).map_err(PersistenceError::Write)?;
        fs::rename(&staging, &self.path).map_err(PersistenceError::Write)
    }

    fn load(&self) -> Result<Option<HistorySnapshot>, PersistenceError> {
        let blob: Vec<u8> = match fs::read(&self.path) {
            Ok(blob) => blob,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(PersistenceError::Read(err)),
        };

        serde_json::from_slice(&blob)
            .map(Some)
            .map_err(|e| PersistenceError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(PersistenceError::Write(err)),
        }
    }
}
