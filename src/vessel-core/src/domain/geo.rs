use std::f64::consts::PI;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    error::error::{InvalidPositionSnafu, InvalidZoomSnafu},
};

/// Zoom level of the MarineTraffic tile grid queried each cycle.
pub const TILE_ZOOM: u8 = 10;

/// Deepest zoom whose grid size fits in a `u32`.
pub const MAX_TILE_ZOOM: u8 = 32;

/// Radius used when the configured bounding box size is missing or not positive.
pub const DEFAULT_BOX_SIZE_KM: f64 = 10.0;

/// Beyond this latitude the Mercator projection diverges, positions are clamped to it.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

// Headings (radians) used to project the four edges of the bounding box.
const NORTH: f64 = 0.0;
const EAST: f64 = 1.5;
const SOUTH: f64 = 3.0;
const WEST: f64 = 4.5;

const METERS_PER_NAUTICAL_MILE: f64 = 1852.0;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct BoundingBox {
    #[serde(rename = "latmin")]
    pub lat_min: f64,
    #[serde(rename = "latmax")]
    pub lat_max: f64,
    #[serde(rename = "lonmin")]
    pub lon_min: f64,
    #[serde(rename = "lonmax")]
    pub lon_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoordinate {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl Position {
    /// Creates a validated position, non-finite or out of range coordinates are rejected.
    pub fn new(latitude: f64, longitude: f64) -> Result<Position> {
        let position = Position {
            latitude,
            longitude,
        };
        position.validate()?;
        Ok(position)
    }

    pub fn validate(&self) -> Result<()> {
        let Self {
            latitude,
            longitude,
        } = *self;

        if !latitude.is_finite()
            || !longitude.is_finite()
            || !(-90.0..=90.0).contains(&latitude)
            || !(-180.0..=180.0).contains(&longitude)
        {
            return InvalidPositionSnafu {
                latitude,
                longitude,
            }
            .fail();
        }

        Ok(())
    }

    /// Projects a new position `distance_m` meters away along `heading` (radians), assuming a
    /// spherical earth where one nautical mile is one arc minute.
    pub fn project(&self, heading: f64, distance_m: f64) -> Position {
        let distance = (distance_m / METERS_PER_NAUTICAL_MILE) / (180.0 * 60.0 / PI);
        let heading = (PI * 2.0) - heading;

        let lat1 = self.latitude.to_radians();
        let lon1 = self.longitude.to_radians();

        let lat2 = (lat1.sin() * distance.cos() + lat1.cos() * distance.sin() * heading.cos())
            .asin();
        let dlon = (heading.sin() * distance.sin() * lat1.cos())
            .atan2(distance.cos() - lat1.sin() * lat2.sin());
        let lon2 = (lon1 - dlon + PI).rem_euclid(2.0 * PI) - PI;

        Position {
            latitude: lat2.to_degrees(),
            longitude: lon2.to_degrees(),
        }
    }
}

impl BoundingBox {
    /// Computes the box spanned by projecting `size_km / 2` from `center` in the four
    /// cardinal directions.
    ///
    /// The center latitude is clamped to the Mercator limit, a box around a pole would
    /// otherwise fold over it and collapse to `lat_min == lat_max`.
    pub fn around(center: Position, size_km: f64) -> Result<BoundingBox> {
        center.validate()?;

        let center = Position {
            latitude: center
                .latitude
                .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE),
            longitude: center.longitude,
        };

        let size_km = if size_km.is_finite() && size_km > 0.0 {
            size_km
        } else {
            DEFAULT_BOX_SIZE_KM
        };
        let distance_m = (size_km / 2.0) * 1000.0;

        let north = center.project(NORTH, distance_m);
        let east = center.project(EAST, distance_m);
        let south = center.project(SOUTH, distance_m);
        let west = center.project(WEST, distance_m);

        Ok(BoundingBox {
            lat_min: south.latitude,
            lat_max: north.latitude,
            lon_min: west.longitude,
            lon_max: east.longitude,
        })
    }

    pub fn south_west(&self) -> Position {
        Position {
            latitude: self.lat_min,
            longitude: self.lon_min,
        }
    }

    pub fn north_east(&self) -> Position {
        Position {
            latitude: self.lat_max,
            longitude: self.lon_max,
        }
    }

    pub fn center(&self) -> Position {
        Position {
            latitude: (self.lat_min + self.lat_max) / 2.0,
            longitude: (self.lon_min + self.lon_max) / 2.0,
        }
    }

    /// Enumerates the tiles covering this box at `zoom`.
    ///
    /// The range spans the south-west and north-east corner tiles plus one extra column east
    /// of the north-east tile and one extra row south of the south-west tile.
    ///
    /// Boxes crossing the antimeridian (`lon_min > lon_max`) produce an empty range.
    pub fn tiles(&self, zoom: u8) -> Result<Vec<TileCoordinate>> {
        let south_west = TileCoordinate::from_position(self.south_west(), zoom)?;
        let north_east = TileCoordinate::from_position(self.north_east(), zoom)?;

        // Tile rows grow southwards, so the north-east row is the smallest y.
        let y_start = north_east.y;
        let y_end = south_west.y + 1;

        let tiles = (south_west.x..=north_east.x + 1)
            .flat_map(|x| (y_start..=y_end).map(move |y| TileCoordinate { x, y, zoom }))
            .collect();

        Ok(tiles)
    }
}

impl TileCoordinate {
    /// Number of tiles along each axis at `zoom`. MarineTraffic serves 512x512 tiles, which
    /// halves the count of a standard 256x256 slippy map grid.
    ///
    /// Zoom levels above [MAX_TILE_ZOOM] are rejected.
    pub fn grid_size(zoom: u8) -> Result<u32> {
        match 1u32.checked_shl(u32::from(zoom.saturating_sub(1))) {
            Some(n) => Ok(n),
            None => InvalidZoomSnafu { zoom }.fail(),
        }
    }

    /// Web-Mercator tile containing `position`. Latitudes beyond the Mercator limit are
    /// clamped so the poles map to the first/last row.
    pub fn from_position(position: Position, zoom: u8) -> Result<TileCoordinate> {
        position.validate()?;

        let n = TileCoordinate::grid_size(zoom)?;
        let n_f = n as f64;

        let latitude = position
            .latitude
            .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
        let lat_rad = latitude.to_radians();

        let x = (((position.longitude + 180.0) / 360.0) * n_f).floor();
        let y = ((1.0 - (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() / PI) / 2.0 * n_f).floor();

        Ok(TileCoordinate {
            x: (x.max(0.0) as u32).min(n - 1),
            y: (y.max(0.0) as u32).min(n - 1),
            zoom,
        })
    }
}

impl Display for TileCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "z:{}/x:{}/y:{}", self.zoom, self.x, self.y)
    }
}
