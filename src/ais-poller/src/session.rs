use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::poller::{CycleOutcome, Poller};

/// A running poll loop, cycles run back to back on `interval` until [Session::stop].
pub struct Session {
    cancellation: CancellationToken,
    handle: JoinHandle<()>,
}

impl Session {
    /// Runs the first cycle immediately, then one per interval tick.
    pub fn start(poller: Arc<Poller>, interval: Duration) -> Session {
        let cancellation = CancellationToken::new();
        let token = cancellation.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }
                run_cycle(&poller, &token).await;
            }
        });

        Session {
            cancellation,
            handle,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Stops the timer, results of in-flight fetches are discarded.
    pub async fn stop(self) {
        self.cancellation.cancel();
        if let Err(e) = self.handle.await {
            error!("poll session exited abnormally: {e:?}");
        }
        info!("poll session stopped");
    }
}

#[instrument(skip_all)]
async fn run_cycle(poller: &Poller, cancellation: &CancellationToken) {
    match poller.run_cycle(cancellation).await {
        Ok(CycleOutcome::Completed(report)) => info!(
            "cycle completed, tiles: {}, failed tiles: {}, emitted: {}",
            report.tiles, report.failed_tiles, report.emitted
        ),
        Ok(outcome) => info!("cycle skipped: {outcome:?}"),
        Err(e) => error!("cycle failed: {e:?}"),
    }
}
