use async_trait::async_trait;

use crate::{Position, RawVesselRecord, Result, ShipId, TileCoordinate, VesselMetadata};

#[async_trait]
pub trait SelfPositionOutbound: Send + Sync {
    /// Current position of the observing vessel, `None` until a fix is available.
    async fn self_position(&self) -> Result<Option<Position>>;
}

#[async_trait]
pub trait VesselTileOutbound: Send + Sync {
    async fn tile_vessels(&self, tile: TileCoordinate) -> Result<Vec<RawVesselRecord>>;
}

#[async_trait]
pub trait ShipDetailOutbound: Send + Sync {
    async fn ship_detail(&self, ship_id: &ShipId) -> Result<VesselMetadata>;
}

pub trait VesselSource: VesselTileOutbound + ShipDetailOutbound {}
impl<T> VesselSource for T where T: VesselTileOutbound + ShipDetailOutbound {}
