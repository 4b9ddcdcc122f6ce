use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use tracing::{debug, warn};
use vessel_core::{ShipId, VesselMetadata};

use crate::error::{
    Result,
    error::{SerializeSnafu, WriteSnapshotSnafu},
};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub(crate) struct SnapshotEntry {
    pub ship_id: ShipId,
    pub metadata: VesselMetadata,
}

/// On-disk copy of the cache, a JSON array ordered from least to most recently used.
#[derive(Debug)]
pub(crate) struct SnapshotFile {
    path: PathBuf,
    temp_path: PathBuf,
}

impl SnapshotFile {
    pub fn new(directory: &Path, name: &str) -> Self {
        Self {
            path: directory.join(format!("{name}.json")),
            temp_path: directory.join(format!("{name}.json.tmp")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the snapshot, a missing or unreadable file yields an empty cache.
    pub async fn load(&self) -> Vec<SnapshotEntry> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no cache snapshot at '{}'", self.path.display());
                return vec![];
            }
            Err(e) => {
                warn!("failed to read cache snapshot '{}': {e}", self.path.display());
                return vec![];
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(e) => {
                warn!("discarding corrupt cache snapshot '{}': {e}", self.path.display());
                vec![]
            }
        }
    }

    pub async fn store(&self, entries: &[SnapshotEntry]) -> Result<()> {
        let bytes = serde_json::to_vec(entries).context(SerializeSnafu)?;

        tokio::fs::write(&self.temp_path, bytes)
            .await
            .context(WriteSnapshotSnafu {
                path: self.temp_path.clone(),
            })?;
        tokio::fs::rename(&self.temp_path, &self.path)
            .await
            .context(WriteSnapshotSnafu {
                path: self.path.clone(),
            })
    }
}
