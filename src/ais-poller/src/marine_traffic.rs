use async_trait::async_trait;
use http_client::{
    HeaderMap, HeaderValue, HttpClient,
    header::{self, HeaderName},
};
use serde::Deserialize;
use serde_json::Value;
use snafu::ResultExt;
use tracing::{debug, instrument, warn};
use vessel_core::{
    RawVesselRecord, ShipDetailOutbound, ShipId, TileCoordinate, VesselMetadata,
    VesselTileOutbound,
    error::error::{FetchShipDetailSnafu, FetchTileSnafu},
};

use crate::{
    error::{
        Result,
        error::{HttpClientSnafu, InvalidHeaderSnafu},
    },
    settings::MarineTrafficSettings,
};

// The public map endpoints only answer requests that look like they originate from the
// MarineTraffic web page.
static BROWSER_HEADERS: &[(&str, &str)] = &[
    ("accept", "*/*"),
    ("accept-language", "en-US,en;q=0.9"),
    ("cache-control", "no-cache"),
    ("pragma", "no-cache"),
    ("priority", "u=1, i"),
    (
        "sec-ch-ua",
        r#""Not(A:Brand";v="8", "Chromium";v="144", "Google Chrome";v="144""#,
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", r#""Linux""#),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "same-origin"),
    ("x-requested-with", "XMLHttpRequest"),
];

/// Client for the MarineTraffic map tile and ship detail endpoints.
pub struct MarineTrafficClient {
    client: HttpClient,
    tile_url: String,
    ship_detail_url: String,
}

#[derive(Debug, Deserialize)]
struct TileResponse {
    data: TileData,
}

#[derive(Debug, Deserialize)]
struct TileData {
    #[serde(default)]
    rows: Vec<Value>,
}

impl MarineTrafficClient {
    pub fn new(settings: &MarineTrafficSettings) -> Result<MarineTrafficClient> {
        let mut headers = HeaderMap::new();
        for &(name, value) in BROWSER_HEADERS {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        headers.insert(
            header::REFERER,
            HeaderValue::from_str(&settings.referer).context(InvalidHeaderSnafu {
                value: settings.referer.clone(),
            })?,
        );

        let client = HttpClient::builder()
            .timeout(settings.timeout)
            .gzip(true)
            .default_headers(headers)
            .build()
            .context(HttpClientSnafu)?;

        Ok(MarineTrafficClient {
            client,
            tile_url: settings.tile_url.clone(),
            ship_detail_url: settings.ship_detail_url.clone(),
        })
    }

    fn tile_url(&self, tile: TileCoordinate) -> String {
        self.tile_url
            .replace("{zoom}", &tile.zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }

    fn ship_detail_url(&self, ship_id: &ShipId) -> String {
        self.ship_detail_url.replace("{ship_id}", ship_id.as_ref())
    }
}

#[async_trait]
impl VesselTileOutbound for MarineTrafficClient {
    #[instrument(skip(self), fields(app.rows))]
    async fn tile_vessels(
        &self,
        tile: TileCoordinate,
    ) -> vessel_core::Result<Vec<RawVesselRecord>> {
        let url = self.tile_url(tile);
        debug!("fetching tile: {url}");

        let response: TileResponse = self
            .client
            .download(url)
            .await
            .boxed()
            .context(FetchTileSnafu { tile })?;

        tracing::Span::current().record("app.rows", response.data.rows.len());

        let vessels = response
            .data
            .rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<RawVesselRecord>(row) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("skipping malformed vessel row in tile {tile}: {e}");
                    None
                }
            })
            .collect();

        Ok(vessels)
    }
}

#[async_trait]
impl ShipDetailOutbound for MarineTrafficClient {
    #[instrument(skip(self))]
    async fn ship_detail(&self, ship_id: &ShipId) -> vessel_core::Result<VesselMetadata> {
        let url = self.ship_detail_url(ship_id);
        debug!("fetching ship detail: {url}");

        self.client
            .download(url)
            .await
            .boxed()
            .context(FetchShipDetailSnafu {
                ship_id: ship_id.clone(),
            })
    }
}
