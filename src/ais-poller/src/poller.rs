use std::sync::Arc;

use chrono::Utc;
use metadata_cache::MetadataCache;
use tokio::{sync::watch, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{Span, debug, error, instrument, warn};
use vessel_core::{
    BoundingBox, Delta, DeltaInbound, SelfPositionOutbound, TILE_ZOOM, TileCoordinate,
    VesselSource, normalize,
};

use crate::settings::BoundingBoxSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Tiling,
    Fetching,
    Normalizing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No self position was available, nothing was fetched.
    NoPosition,
    /// Bounding box search is disabled.
    Disabled,
    /// Stopped before or while the cycle ran.
    Cancelled,
    Completed(CycleReport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    pub tiles: usize,
    pub failed_tiles: usize,
    pub emitted: usize,
}

/// Runs poll cycles: self position -> bounding box -> tiles -> vessels -> deltas.
pub struct Poller {
    self_context: Arc<str>,
    bounding_box: BoundingBoxSettings,
    position: Arc<dyn SelfPositionOutbound>,
    shared: Shared,
    state: Arc<watch::Sender<CycleState>>,
}

/// Collaborators every tile task needs.
#[derive(Clone)]
struct Shared {
    source: Arc<dyn VesselSource>,
    cache: Arc<MetadataCache>,
    sink: Arc<dyn DeltaInbound>,
}

/// Fetches and normalizes the vessels of a single tile.
struct TileTask {
    tile: TileCoordinate,
    self_context: Arc<str>,
    shared: Shared,
    state: Arc<watch::Sender<CycleState>>,
    cancellation: CancellationToken,
}

impl Poller {
    pub fn new(
        self_context: impl Into<String>,
        bounding_box: BoundingBoxSettings,
        position: Arc<dyn SelfPositionOutbound>,
        source: Arc<dyn VesselSource>,
        cache: Arc<MetadataCache>,
        sink: Arc<dyn DeltaInbound>,
    ) -> Poller {
        let self_context: String = self_context.into();
        let (state, _) = watch::channel(CycleState::Idle);

        Poller {
            self_context: self_context.into(),
            bounding_box,
            position,
            shared: Shared {
                source,
                cache,
                sink,
            },
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> CycleState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<CycleState> {
        self.state.subscribe()
    }

    /// Runs one cycle to completion, returning once every tile task has finished.
    ///
    /// Fetch failures only drop the affected tile or vessel, the cycle itself fails only
    /// when the self position cannot be read or is invalid.
    #[instrument(skip_all, fields(app.tiles, app.failed_tiles, app.emitted))]
    pub async fn run_cycle(
        &self,
        cancellation: &CancellationToken,
    ) -> vessel_core::Result<CycleOutcome> {
        let outcome = self.run_cycle_inner(cancellation).await;
        self.set_state(CycleState::Idle);

        if let Ok(CycleOutcome::Completed(report)) = &outcome {
            let span = Span::current();
            span.record("app.tiles", report.tiles);
            span.record("app.failed_tiles", report.failed_tiles);
            span.record("app.emitted", report.emitted);
        }

        outcome
    }

    async fn run_cycle_inner(
        &self,
        cancellation: &CancellationToken,
    ) -> vessel_core::Result<CycleOutcome> {
        if cancellation.is_cancelled() {
            return Ok(CycleOutcome::Cancelled);
        }
        if !self.bounding_box.enabled {
            debug!("bounding box search disabled");
            return Ok(CycleOutcome::Disabled);
        }

        self.set_state(CycleState::Tiling);

        let Some(position) = self.position.self_position().await? else {
            debug!("no self position available");
            return Ok(CycleOutcome::NoPosition);
        };

        let bbox = BoundingBox::around(position, self.bounding_box.size_km)?;
        let tiles = bbox.tiles(TILE_ZOOM)?;

        if cancellation.is_cancelled() {
            return Ok(CycleOutcome::Cancelled);
        }
        if let Err(e) = self
            .shared
            .sink
            .emit(Delta::bounding_box(self.self_context.as_ref(), &bbox))
            .await
        {
            error!("failed to emit bounding box: {e:?}");
        }

        self.set_state(CycleState::Fetching);

        let mut set = JoinSet::new();
        for tile in tiles.iter().copied() {
            let task = TileTask {
                tile,
                self_context: self.self_context.clone(),
                shared: self.shared.clone(),
                state: self.state.clone(),
                cancellation: cancellation.clone(),
            };
            set.spawn(task.run());
        }

        let mut report = CycleReport {
            tiles: tiles.len(),
            ..Default::default()
        };
        while let Some(result) = set.join_next().await {
            match result {
                Ok(Ok(emitted)) => report.emitted += emitted,
                Ok(Err(e)) => {
                    warn!("failed to fetch tile: {e:?}");
                    report.failed_tiles += 1;
                }
                Err(e) => {
                    error!("tile task failed: {e:?}");
                    report.failed_tiles += 1;
                }
            }
        }

        if cancellation.is_cancelled() {
            return Ok(CycleOutcome::Cancelled);
        }

        Ok(CycleOutcome::Completed(report))
    }

    fn set_state(&self, state: CycleState) {
        self.state.send_if_modified(|current| {
            let modified = *current != state;
            *current = state;
            modified
        });
    }
}

impl TileTask {
    #[instrument(skip_all, fields(app.tile = %self.tile, app.vessels, app.emitted))]
    async fn run(self) -> vessel_core::Result<usize> {
        let Shared {
            source,
            cache,
            sink,
        } = &self.shared;

        let vessels = tokio::select! {
            _ = self.cancellation.cancelled() => return Ok(0),
            vessels = source.tile_vessels(self.tile) => vessels?,
        };
        let report_time = Utc::now();

        Span::current().record("app.vessels", vessels.len());
        self.state.send_if_modified(|current| {
            let modified = *current != CycleState::Normalizing;
            *current = CycleState::Normalizing;
            modified
        });

        let mut emitted = 0;
        for raw in vessels {
            let metadata = match cache
                .resolve(&raw.ship_id, |ship_id| async move {
                    source.ship_detail(&ship_id).await
                })
                .await
            {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("failed to resolve ship details: {e:?}");
                    None
                }
            };

            let Some(delta) = normalize(&raw, metadata.as_ref(), report_time, &self.self_context)
            else {
                continue;
            };

            if self.cancellation.is_cancelled() {
                debug!("stopped, discarding remaining vessels of tile {}", self.tile);
                break;
            }

            match sink.emit(delta).await {
                Ok(()) => emitted += 1,
                Err(e) => error!("failed to emit vessel delta: {e:?}"),
            }
        }

        Span::current().record("app.emitted", emitted);

        Ok(emitted)
    }
}
