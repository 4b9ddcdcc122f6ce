use std::{sync::Arc, time::Duration};

use async_channel::Receiver;
use http_client::HttpClient;
use metadata_cache::MetadataCache;
use snafu::ResultExt;
use tokio::{io::Stdout, task::JoinSet};
use tracing::{error, info};
use vessel_core::{Delta, Position, SelfPositionOutbound};

use crate::{
    error::{
        Result,
        error::{CacheSnafu, HttpClientSnafu, PositionSnafu},
    },
    marine_traffic::MarineTrafficClient,
    poller::Poller,
    position::{FixedPosition, SignalKPosition},
    session::Session,
    settings::{PositionSettings, Settings},
    sink::{ChannelSink, DeltaWriter},
};

pub struct App {
    poller: Arc<Poller>,
    update_interval: Duration,
    receiver: Receiver<Delta>,
}

impl App {
    pub async fn build(settings: Settings) -> Result<App> {
        let (sender, receiver) = async_channel::bounded::<Delta>(settings.sink.buffer_size);

        let cache = MetadataCache::open(
            &settings.cache.directory,
            &settings.cache.name,
            settings.cache.max_entries,
        )
        .await
        .context(CacheSnafu)?;

        let position: Arc<dyn SelfPositionOutbound> = match &settings.position {
            PositionSettings::Fixed {
                latitude,
                longitude,
            } => Arc::new(FixedPosition::new(
                Position::new(*latitude, *longitude).context(PositionSnafu)?,
            )),
            PositionSettings::SignalK { url } => {
                let client = HttpClient::builder()
                    .timeout(settings.marine_traffic.timeout)
                    .build()
                    .context(HttpClientSnafu)?;
                Arc::new(SignalKPosition::new(client, url))
            }
        };

        if settings.mmsi_list.enabled {
            let mmsis = settings.mmsi_list.mmsis();
            info!(
                "mmsi list configured with {} vessels, lookups by mmsi are not performed",
                mmsis.len()
            );
        }

        let poller = Poller::new(
            settings.self_context.clone(),
            settings.bounding_box,
            position,
            Arc::new(MarineTrafficClient::new(&settings.marine_traffic)?),
            Arc::new(cache),
            Arc::new(ChannelSink::new(sender)),
        );

        Ok(App {
            poller: Arc::new(poller),
            update_interval: settings.effective_update_interval(),
            receiver,
        })
    }

    pub async fn run(self) {
        let writer: DeltaWriter<Stdout> = DeltaWriter::new(self.receiver, tokio::io::stdout());

        let mut set = JoinSet::new();
        set.spawn(async move { writer.run().await.map(|_| ()) });

        info!(
            "starting poll session with update interval {:?}",
            self.update_interval
        );
        let session = Session::start(self.poller, self.update_interval);

        tokio::select! {
            out = set.join_next() => error!("delta writer exited unexpectedly: {out:?}"),
            _ = tokio::signal::ctrl_c() => info!("received shutdown signal"),
        }

        session.stop().await;
    }
}
