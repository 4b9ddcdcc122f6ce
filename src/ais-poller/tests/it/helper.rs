use std::{future::Future, panic, sync::Arc, time::Duration};

use ais_poller::{
    marine_traffic::MarineTrafficClient,
    poller::Poller,
    position::{FixedPosition, SignalKPosition},
    settings::{BoundingBoxSettings, MarineTrafficSettings},
    sink::ChannelSink,
};
use async_channel::{Receiver, Sender};
use http_client::HttpClient;
use metadata_cache::MetadataCache;
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};
use vessel_core::{
    Delta, Mmsi, Position, RawVesselRecord, SelfPositionOutbound, ShipId, VesselMetadata,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, path_regex},
};

pub const SELF_MMSI: u32 = 987654321;
pub const SELF_CONTEXT: &str = "vessels.urn:mrn:imo:mmsi:987654321";

/// Self position used by most tests, its 10 km box is covered by tiles x 284..=285,
/// y 241..=242 at zoom 10.
pub const SELF_POSITION: (f64, f64) = (10.0, 20.0);
pub const TILES: [(u32, u32); 4] = [(284, 241), (284, 242), (285, 241), (285, 242)];

pub struct TestHelper {
    pub mock_server: MockServer,
    pub temp_dir: TempDir,
    pub receiver: Receiver<Delta>,
    sender: Sender<Delta>,
}

impl TestHelper {
    pub async fn cache(&self) -> Arc<MetadataCache> {
        Arc::new(
            MetadataCache::open(self.temp_dir.path(), "ships", 1000)
                .await
                .unwrap(),
        )
    }

    pub fn fixed_position(&self) -> Arc<dyn SelfPositionOutbound> {
        let (latitude, longitude) = SELF_POSITION;
        Arc::new(FixedPosition::new(Position::new(latitude, longitude).unwrap()))
    }

    pub fn signal_k_position(&self) -> Arc<dyn SelfPositionOutbound> {
        Arc::new(SignalKPosition::new(HttpClient::new(), &self.mock_server.uri()))
    }

    pub fn marine_traffic(&self) -> MarineTrafficClient {
        let uri = self.mock_server.uri();
        MarineTrafficClient::new(&MarineTrafficSettings {
            tile_url: format!("{uri}/getData/get_data_json_4/z:{{zoom}}/X:{{x}}/Y:{{y}}/station:0"),
            ship_detail_url: format!("{uri}/en/vessels/{{ship_id}}/general"),
            timeout: Duration::from_secs(5),
            referer: format!("{uri}/en/ais/home"),
        })
        .unwrap()
    }

    pub async fn poller(&self) -> Arc<Poller> {
        self.poller_with(self.fixed_position(), BoundingBoxSettings::default())
            .await
    }

    pub async fn poller_with(
        &self,
        position: Arc<dyn SelfPositionOutbound>,
        bounding_box: BoundingBoxSettings,
    ) -> Arc<Poller> {
        Arc::new(Poller::new(
            SELF_CONTEXT,
            bounding_box,
            position,
            Arc::new(self.marine_traffic()),
            self.cache().await,
            Arc::new(ChannelSink::new(self.sender.clone())),
        ))
    }

    pub async fn mock_tile(&self, (x, y): (u32, u32), rows: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path(tile_path(x, y)))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "rows": rows } })),
            )
            .mount(&self.mock_server)
            .await;
    }

    /// Mounts a tile that answers after `delay`.
    pub async fn mock_slow_tile(&self, (x, y): (u32, u32), rows: Vec<Value>, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(tile_path(x, y)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": { "rows": rows } }))
                    .set_delay(delay),
            )
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_tile_status(&self, (x, y): (u32, u32), status: u16) {
        Mock::given(method("GET"))
            .and(path(tile_path(x, y)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.mock_server)
            .await;
    }

    /// Mounts a ship detail response for `ship_id`, `expected_calls` is verified when the
    /// mock server is dropped.
    pub async fn mock_ship_detail(&self, ship_id: &str, mmsi: u32, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/en/vessels/{ship_id}/general")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(VesselMetadata::test_default(Some(Mmsi::test_new(mmsi)))),
            )
            .expect(expected_calls)
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_ship_detail_status(&self, ship_id: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/en/vessels/{ship_id}/general")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.mock_server)
            .await;
    }

    pub async fn tile_requests(&self) -> usize {
        self.mock_server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path().starts_with("/getData/"))
            .count()
    }

    /// Every delta emitted so far.
    pub fn drain(&self) -> Vec<Delta> {
        let mut deltas = Vec::new();
        while let Ok(delta) = self.receiver.try_recv() {
            deltas.push(delta);
        }
        deltas
    }
}

pub fn vessel_row(ship_id: &str) -> Value {
    serde_json::to_value(RawVesselRecord::test_default(Some(ShipId::new(ship_id)))).unwrap()
}

pub fn vessel_context(mmsi: u32) -> String {
    format!("vessels.urn:mrn:imo:mmsi:{mmsi:09}")
}

fn tile_path(x: u32, y: u32) -> String {
    format!("/getData/get_data_json_4/z:10/X:{x}/Y:{y}/station:0")
}

pub async fn test<T, Fut>(test: T)
where
    T: FnOnce(TestHelper) -> Fut + panic::UnwindSafe + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mock_server = MockServer::start().await;

    // Tiles without an explicit mock are empty.
    Mock::given(method("GET"))
        .and(path_regex(r"^/getData/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "rows": [] } })))
        .with_priority(10)
        .mount(&mock_server)
        .await;

    let (sender, receiver) = async_channel::bounded(100);

    let helper = TestHelper {
        mock_server,
        temp_dir: tempdir().unwrap(),
        receiver,
        sender,
    };

    test(helper).await;
}
