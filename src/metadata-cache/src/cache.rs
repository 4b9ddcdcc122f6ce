use std::{
    collections::HashMap,
    future::Future,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use snafu::ResultExt;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument};
use vessel_core::{ShipId, VesselMetadata};

use crate::{
    error::{Result, error::CreateDirectorySnafu},
    lru::Lru,
    snapshot::{SnapshotEntry, SnapshotFile},
};

type InFlight = Arc<OnceCell<VesselMetadata>>;

/// Cache-aside store of [VesselMetadata] keyed by ship id.
///
/// The working set is bounded by `max_entries` with least-recently-used eviction and is
/// written to `<directory>/<name>.json` after every insertion so it survives restarts.
/// Concurrent [MetadataCache::resolve] calls for the same missing ship id share a single
/// fetch.
#[derive(Debug)]
pub struct MetadataCache {
    entries: Mutex<Lru<ShipId, VesselMetadata>>,
    in_flight: Mutex<HashMap<ShipId, InFlight>>,
    snapshot: SnapshotFile,
    write_lock: tokio::sync::Mutex<()>,
}

impl MetadataCache {
    pub async fn open(
        directory: impl AsRef<Path>,
        name: &str,
        max_entries: usize,
    ) -> Result<MetadataCache> {
        let directory = directory.as_ref();
        tokio::fs::create_dir_all(directory)
            .await
            .context(CreateDirectorySnafu {
                path: directory.to_path_buf(),
            })?;

        let snapshot = SnapshotFile::new(directory, name);

        let mut entries = Lru::new(max_entries);
        for entry in snapshot.load().await {
            entries.insert(entry.ship_id, entry.metadata);
        }

        info!(
            "opened metadata cache '{}' with {} entries",
            snapshot.path().display(),
            entries.len()
        );

        Ok(MetadataCache {
            entries: Mutex::new(entries),
            in_flight: Mutex::new(HashMap::new()),
            snapshot,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn contains(&self, ship_id: &ShipId) -> bool {
        self.entries().contains(ship_id)
    }

    pub fn get(&self, ship_id: &ShipId) -> Option<VesselMetadata> {
        self.entries().get(ship_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores `metadata` and rewrites the on-disk snapshot.
    pub async fn insert(&self, ship_id: ShipId, metadata: VesselMetadata) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let snapshot: Vec<SnapshotEntry> = {
            let mut entries = self.entries();
            if let Some((evicted, _)) = entries.insert(ship_id, metadata) {
                debug!("evicted ship_id: {evicted}");
            }
            entries
                .iter()
                .map(|(ship_id, metadata)| SnapshotEntry {
                    ship_id: ship_id.clone(),
                    metadata: metadata.clone(),
                })
                .collect()
        };

        self.snapshot.store(&snapshot).await
    }

    /// Returns the cached metadata for `ship_id`, calling `fetcher` on a miss.
    ///
    /// A failed fetch leaves the cache untouched and is returned to the caller, a
    /// snapshot write failure is logged and the fetched value is still returned.
    #[instrument(skip_all, fields(app.ship_id = %ship_id))]
    pub async fn resolve<F, Fut, E>(
        &self,
        ship_id: &ShipId,
        fetcher: F,
    ) -> std::result::Result<VesselMetadata, E>
    where
        F: FnOnce(ShipId) -> Fut,
        Fut: Future<Output = std::result::Result<VesselMetadata, E>>,
    {
        if let Some(metadata) = self.get(ship_id) {
            return Ok(metadata);
        }

        let cell = self
            .in_flight()
            .entry(ship_id.clone())
            .or_default()
            .clone();

        let result = cell
            .get_or_try_init(|| async {
                // Another task may have completed the fetch after our first lookup.
                if let Some(metadata) = self.get(ship_id) {
                    return Ok(metadata);
                }

                let metadata = fetcher(ship_id.clone()).await?;
                if let Err(e) = self.insert(ship_id.clone(), metadata.clone()).await {
                    error!("failed to persist metadata cache: {e:?}");
                }
                Ok::<_, E>(metadata)
            })
            .await
            .cloned();

        let mut in_flight = self.in_flight();
        if in_flight
            .get(ship_id)
            .is_some_and(|current| Arc::ptr_eq(current, &cell))
        {
            in_flight.remove(ship_id);
        }

        result
    }

    fn entries(&self) -> MutexGuard<'_, Lru<ShipId, VesselMetadata>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn in_flight(&self) -> MutexGuard<'_, HashMap<ShipId, InFlight>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }
}
