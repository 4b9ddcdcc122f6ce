use snafu::{Location, Snafu};

use crate::{ShipId, TileCoordinate};

pub type Result<T> = std::result::Result<T, Error>;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Invalid position, latitude: '{latitude}', longitude: '{longitude}'"))]
    InvalidPosition {
        #[snafu(implicit)]
        location: Location,
        latitude: f64,
        longitude: f64,
    },
    #[snafu(display("Unsupported tile zoom level '{zoom}'"))]
    InvalidZoom {
        #[snafu(implicit)]
        location: Location,
        zoom: u8,
    },
    #[snafu(display("Failed to fetch vessels for tile '{tile}'"))]
    FetchTile {
        #[snafu(implicit)]
        location: Location,
        tile: TileCoordinate,
        source: BoxedError,
    },
    #[snafu(display("Failed to fetch ship details for ship_id '{ship_id}'"))]
    FetchShipDetail {
        #[snafu(implicit)]
        location: Location,
        ship_id: ShipId,
        source: BoxedError,
    },
    #[snafu(display("Failed to fetch self position"))]
    FetchPosition {
        #[snafu(implicit)]
        location: Location,
        source: BoxedError,
    },
    #[snafu(display("Failed to emit delta for context '{context}'"))]
    EmitDelta {
        #[snafu(implicit)]
        location: Location,
        context: String,
        source: BoxedError,
    },
}
