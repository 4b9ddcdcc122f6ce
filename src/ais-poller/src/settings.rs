use std::{path::PathBuf, time::Duration};

use config::{Config, ConfigError, File};
use serde::Deserialize;
use strum::{AsRefStr, EnumString};
use tracing::warn;
use vessel_core::{DEFAULT_BOX_SIZE_KM, Mmsi};

/// Update intervals at or below this are replaced by [FALLBACK_UPDATE_INTERVAL].
pub const MIN_UPDATE_INTERVAL: Duration = Duration::from_secs(60);
pub const FALLBACK_UPDATE_INTERVAL: Duration = Duration::from_secs(61);

const ENV_PREFIX: &str = "AIS_POLLER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, EnumString, AsRefStr)]
pub enum Environment {
    Local,
    Development,
    Production,
    Test,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub environment: Environment,
    /// Signal K context of the observing vessel, its own reports are never emitted.
    pub self_context: String,
    #[serde(default, with = "humantime_serde")]
    pub update_interval: Option<Duration>,
    #[serde(default)]
    pub bounding_box: BoundingBoxSettings,
    #[serde(default)]
    pub mmsi_list: MmsiListSettings,
    pub marine_traffic: MarineTrafficSettings,
    pub cache: CacheSettings,
    pub position: PositionSettings,
    #[serde(default)]
    pub sink: SinkSettings,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BoundingBoxSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_box_size_km")]
    pub size_km: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MmsiListSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub mmsis: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarineTrafficSettings {
    /// Tile endpoint with `{zoom}`, `{x}` and `{y}` placeholders.
    pub tile_url: String,
    /// Ship detail endpoint with a `{ship_id}` placeholder.
    pub ship_detail_url: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub referer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub directory: PathBuf,
    #[serde(default = "default_cache_name")]
    pub name: String,
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSettings {
    Fixed { latitude: f64, longitude: f64 },
    SignalK { url: String },
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SinkSettings {
    pub buffer_size: usize,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| Environment::Local.as_ref().to_string())
            .parse()
            .map_err(|_| ConfigError::Message("failed to parse APP_ENVIRONMENT".into()))?;

        let environment_file = format!("config/{}", environment.as_ref().to_lowercase());

        Config::builder()
            .add_source(File::with_name(&environment_file).required(true))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .set_override("environment", environment.as_ref())?
            .build()?
            .try_deserialize()
    }

    /// The polling interval with the minimum floor applied.
    pub fn effective_update_interval(&self) -> Duration {
        match self.update_interval {
            Some(v) if v > MIN_UPDATE_INTERVAL => v,
            _ => FALLBACK_UPDATE_INTERVAL,
        }
    }
}

impl MmsiListSettings {
    /// Parsed list entries, invalid entries are logged and skipped.
    pub fn mmsis(&self) -> Vec<Mmsi> {
        self.mmsis
            .iter()
            .filter_map(|v| match v.parse() {
                Ok(mmsi) => Some(mmsi),
                Err(e) => {
                    warn!("ignoring invalid mmsi '{v}' in mmsi list: {e}");
                    None
                }
            })
            .collect()
    }
}

impl Default for BoundingBoxSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            size_km: DEFAULT_BOX_SIZE_KM,
        }
    }
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self { buffer_size: 1000 }
    }
}

fn default_true() -> bool {
    true
}

fn default_box_size_km() -> f64 {
    DEFAULT_BOX_SIZE_KM
}

fn default_cache_name() -> String {
    "ships".into()
}

fn default_cache_max_entries() -> usize {
    1000
}
