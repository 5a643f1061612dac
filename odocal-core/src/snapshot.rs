//! Durable snapshot of the last fully fetched event list.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{OdooError, OdooResult};
use crate::event::CalendarEvent;

const SNAPSHOT_FILE: &str = "events.json";

/// Overwrite-only cache of the last successful fetch pass.
///
/// `save` replaces the whole blob atomically (temp file + rename), so
/// a failed pass never leaves a partial snapshot behind. Callers only
/// save after a fully successful fetch; partial results are never
/// persisted.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotStore { path: path.into() }
    }

    /// Store at the platform data directory, `<data_dir>/odocal/events.json`.
    pub fn default_location() -> OdooResult<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| OdooError::Snapshot("could not determine data directory".into()))?
            .join("odocal");
        Ok(SnapshotStore::new(dir.join(SNAPSHOT_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the full event list, replacing any previous snapshot.
    pub fn save(&self, events: &[CalendarEvent]) -> OdooResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let blob = serde_json::to_vec_pretty(events)
            .map_err(|e| OdooError::Snapshot(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &self.path)?;

        debug!(count = events.len(), path = %self.path.display(), "snapshot saved");
        Ok(())
    }

    /// Load the most recent snapshot, or an empty list when none
    /// exists. A corrupt blob is treated as absent (logged).
    pub fn load(&self) -> Vec<CalendarEvent> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                warn!(%err, "could not read snapshot");
                return Vec::new();
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(events) => events,
            Err(err) => {
                warn!(%err, "snapshot is corrupt, ignoring it");
                Vec::new()
            }
        }
    }

    /// Remove the snapshot (logout). Missing file is fine.
    pub fn clear(&self) -> OdooResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
