use std::{fmt::Display, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use serde_with::{DefaultOnError, DisplayFromStr, PickFirst, serde_as};

/// MarineTraffic's internal vessel identifier, the key used for ship detail lookups.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ShipId(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct Mmsi(u32);

/// One vessel row of a MarineTraffic tile response.
///
/// Numeric fields are delivered as either JSON numbers or strings depending on the
/// endpoint revision, values that fail to parse are treated as missing.
#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawVesselRecord {
    #[serde(rename = "SHIP_ID")]
    pub ship_id: ShipId,
    #[serde(rename = "SHIPNAME", default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(rename = "LAT", default)]
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    pub latitude: Option<f64>,
    #[serde(rename = "LON", default)]
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    pub longitude: Option<f64>,
    /// Tenths of a knot.
    #[serde(rename = "SPEED", default)]
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    pub speed: Option<f64>,
    /// Degrees.
    #[serde(rename = "COURSE", default)]
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    pub course: Option<f64>,
    /// Degrees.
    #[serde(rename = "HEADING", default)]
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    pub heading: Option<f64>,
    /// Minutes since the position was reported.
    #[serde(rename = "ELAPSED", default)]
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    pub elapsed: Option<f64>,
    #[serde(rename = "DESTINATION", default, deserialize_with = "lenient_string")]
    pub destination: Option<String>,
    #[serde(rename = "LENGTH", default)]
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    pub length: Option<f64>,
    #[serde(rename = "WIDTH", default)]
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    pub width: Option<f64>,
    /// Distance from the bow to the AIS antenna.
    #[serde(rename = "L_FORE", default)]
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    pub l_fore: Option<f64>,
    /// Distance from the port side to the AIS antenna.
    #[serde(rename = "W_LEFT", default)]
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    pub w_left: Option<f64>,
}

/// Slowly changing vessel attributes from the MarineTraffic ship detail endpoint.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselMetadata {
    #[serde(default)]
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    pub mmsi: Option<Mmsi>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub imo: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub callsign: Option<String>,
    #[serde(default)]
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    pub type_id: Option<i32>,
}

impl ShipId {
    pub fn new(value: impl Into<String>) -> ShipId {
        ShipId(value.into())
    }
}

impl AsRef<str> for ShipId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ShipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ShipId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(v) => Ok(ShipId(v)),
            Value::Number(v) => Ok(ShipId(v.to_string())),
            v => Err(serde::de::Error::custom(format!(
                "expected a string or number ship id, got '{v}'"
            ))),
        }
    }
}

impl Mmsi {
    /// Signal K context of the vessel with this mmsi.
    pub fn context(&self) -> String {
        format!("vessels.urn:mrn:imo:mmsi:{self}")
    }

    #[cfg(feature = "test")]
    pub fn test_new(value: u32) -> Mmsi {
        Mmsi(value)
    }
}

impl Display for Mmsi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:09}", self.0)
    }
}

impl FromStr for Mmsi {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Mmsi)
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(v)) => Some(v),
        Some(Value::Number(v)) => Some(v.to_string()),
        _ => None,
    })
}

#[cfg(feature = "test")]
mod test {
    use rand::{Rng, random};

    use super::*;

    impl RawVesselRecord {
        pub fn test_default(ship_id: Option<ShipId>) -> RawVesselRecord {
            RawVesselRecord {
                ship_id: ship_id.unwrap_or_else(|| ShipId(random::<u32>().to_string())),
                name: Some("SJARKEN".to_string()),
                latitude: Some(10.01),
                longitude: Some(20.02),
                speed: Some(123.0),
                course: Some(180.0),
                heading: Some(179.0),
                elapsed: Some(3.0),
                destination: Some("BERGEN".to_string()),
                length: Some(23.0),
                width: Some(8.0),
                l_fore: Some(10.0),
                w_left: Some(4.0),
            }
        }
    }

    impl VesselMetadata {
        pub fn test_default(mmsi: Option<Mmsi>) -> VesselMetadata {
            VesselMetadata {
                mmsi: Some(mmsi.unwrap_or_else(|| {
                    Mmsi(rand::rng().random_range(200_000_000..800_000_000))
                })),
                imo: Some("9876543".to_string()),
                callsign: Some("LK45".to_string()),
                type_id: Some(30),
            }
        }
    }
}
