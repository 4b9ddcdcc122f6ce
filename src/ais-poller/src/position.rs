use async_trait::async_trait;
use http_client::{HttpClient, StatusCode};
use serde::Deserialize;
use snafu::ResultExt;
use tracing::debug;
use vessel_core::{Position, SelfPositionOutbound, error::error::FetchPositionSnafu};

const SELF_POSITION_PATH: &str = "/signalk/v1/api/vessels/self/navigation/position";

/// A self position that never changes, used for stationary installations.
pub struct FixedPosition(Position);

/// Reads the observing vessel's position from a Signal K server's REST api.
pub struct SignalKPosition {
    client: HttpClient,
    url: String,
}

/// Signal K returns either the full leaf (`{"value": {...}, "timestamp": ...}`) or the bare
/// position object depending on server version.
#[derive(Debug, Deserialize)]
struct PositionResponse {
    value: Option<PartialPosition>,
    #[serde(flatten)]
    bare: PartialPosition,
}

#[derive(Debug, Deserialize)]
struct PartialPosition {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl FixedPosition {
    pub fn new(position: Position) -> FixedPosition {
        FixedPosition(position)
    }
}

impl SignalKPosition {
    pub fn new(client: HttpClient, base_url: &str) -> SignalKPosition {
        SignalKPosition {
            client,
            url: format!("{}{SELF_POSITION_PATH}", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl SelfPositionOutbound for FixedPosition {
    async fn self_position(&self) -> vessel_core::Result<Option<Position>> {
        Ok(Some(self.0))
    }
}

#[async_trait]
impl SelfPositionOutbound for SignalKPosition {
    async fn self_position(&self) -> vessel_core::Result<Option<Position>> {
        let response = match self.client.get(self.url.as_str()).send().await {
            Ok(v) => v,
            Err(e) if e.status() == Some(StatusCode::NOT_FOUND) => {
                debug!("signal k server has no self position");
                return Ok(None);
            }
            Err(e) => return Err(e).boxed().context(FetchPositionSnafu),
        };

        let response: PositionResponse = response
            .json()
            .await
            .boxed()
            .context(FetchPositionSnafu)?;

        let position = response.value.unwrap_or(response.bare);
        match (position.latitude, position.longitude) {
            (Some(latitude), Some(longitude)) => Position::new(latitude, longitude).map(Some),
            _ => Ok(None),
        }
    }
}
