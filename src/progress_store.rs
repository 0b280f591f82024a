/*!
 * Persistent translation checkpoints.
 *
 * Maps a file path to the number of its rows already committed to the work
 * file. The record is a pretty-printed JSON object rewritten as a whole on
 * every save.
 */

use log::{debug, error, warn};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Checkpoint map: file path to committed row count
pub type ProgressRecord = BTreeMap<String, usize>;

/// Checkpoint file with its in-memory copy
#[derive(Debug, Clone)]
pub struct ProgressStore {
    /// Location of the JSON record
    path: PathBuf,
    /// Current checkpoints
    records: ProgressRecord,
}

impl ProgressStore {
    /// Open the store at `path`, loading whatever it already holds
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = Self::load(&path);
        debug!("Loaded {} checkpoints from {}", records.len(), path.display());
        Self { path, records }
    }

    /// Load the record at `path`; missing or unreadable files yield an empty map
    pub fn load(path: &Path) -> ProgressRecord {
        if !path.exists() {
            return ProgressRecord::new();
        }

        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_json::from_str::<ProgressRecord>(&content).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(records) => records,
            Err(e) => {
                error!("Failed to load progress file {}: {}", path.display(), e);
                ProgressRecord::new()
            }
        }
    }

    /// Write `records` to `path`, replacing the previous content in one rename
    pub fn save_to(path: &Path, records: &ProgressRecord) -> io::Result<()> {
        let json = serde_json::to_string_pretty(records).map_err(io::Error::other)?;

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Persist the in-memory checkpoints
    pub fn save(&self) -> io::Result<()> {
        Self::save_to(&self.path, &self.records)
    }

    /// Checkpoint key for `file`: its absolute path when it can be resolved
    pub fn key_for(file: &Path) -> String {
        fs::canonicalize(file)
            .unwrap_or_else(|_| file.to_path_buf())
            .to_string_lossy()
            .into_owned()
    }

    /// Committed rows for `file`, 0 when none
    pub fn get(&self, file: &Path) -> usize {
        self.records.get(&Self::key_for(file)).copied().unwrap_or(0)
    }

    /// Record `rows` committed rows for `file` and persist
    pub fn set(&mut self, file: &Path, rows: usize) -> io::Result<()> {
        self.records.insert(Self::key_for(file), rows);
        self.save()
    }

    /// Forget `file` and persist; no write when it had no entry
    pub fn remove(&mut self, file: &Path) -> io::Result<()> {
        if self.records.remove(&Self::key_for(file)).is_some() {
            self.save()?;
        }
        Ok(())
    }

    /// Current checkpoints
    pub fn records(&self) -> &ProgressRecord {
        &self.records
    }

    /// Location of the record
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Record a checkpoint, logging a failed save instead of returning it
pub fn save_or_warn(store: &mut ProgressStore, file: &Path, rows: usize) {
    if let Err(e) = store.set(file, rows) {
        warn!(
            "Failed to save progress for {} at row {}: {}",
            file.display(),
            rows,
            e
        );
    }
}
