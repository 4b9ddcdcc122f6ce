use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::{Delta, RawVesselRecord, VesselMetadata, ais_ship_type_name};

/// Placeholder MarineTraffic reports as the destination of class B transponders.
pub const CLASS_B_DESTINATION: &str = "CLASS B";

pub const KNOTS_TO_METERS_PER_SECOND: f64 = 0.514444;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AisShipType {
    pub id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'static str>,
}

/// Maps a vendor vessel row and its metadata to a Signal K delta.
///
/// Returns `None` for vessels without metadata or mmsi, and for the observing vessel
/// itself (`self_context`). Attributes whose source field is missing or unparsable are
/// left out of the delta.
pub fn normalize(
    raw: &RawVesselRecord,
    meta: Option<&VesselMetadata>,
    report_time: DateTime<Utc>,
    self_context: &str,
) -> Option<Delta> {
    let Some(meta) = meta else {
        debug!("no metadata for ship_id: {}", raw.ship_id);
        return None;
    };
    let Some(mmsi) = meta.mmsi else {
        debug!("no mmsi for ship_id: {}", raw.ship_id);
        return None;
    };

    let context = mmsi.context();
    if context == self_context {
        debug!("ignoring self vessel: {context}");
        return None;
    }

    let timestamp = raw
        .elapsed
        .and_then(parse_int)
        .and_then(TimeDelta::try_minutes)
        .and_then(|elapsed| report_time.checked_sub_signed(elapsed))
        .unwrap_or(report_time);

    let mut delta = Delta::new(context, Some(timestamp));

    delta.add_value("", Some(json!({ "mmsi": mmsi.to_string() })));
    delta.add_value("", meta.imo.as_ref().map(|v| json!({ "imo": v })));
    delta.add_value("", meta.callsign.as_ref().map(|v| json!({ "callsign": v })));
    delta.add_value("", raw.name.as_ref().map(|v| json!({ "name": v })));

    delta.add_value(
        "navigation.courseOverGroundTrue",
        raw.course.and_then(parse_int).map(degrees_to_radians),
    );
    delta.add_value(
        "navigation.headingTrue",
        raw.heading.and_then(parse_int).map(degrees_to_radians),
    );

    if let (Some(latitude), Some(longitude)) = (finite(raw.latitude), finite(raw.longitude)) {
        delta.add_value(
            "navigation.position",
            Some(json!({ "latitude": latitude, "longitude": longitude })),
        );
    }

    delta.add_value(
        "navigation.destination.commonName",
        raw.destination
            .as_ref()
            .filter(|v| v.as_str() != CLASS_B_DESTINATION)
            .map(|v| json!(v)),
    );

    delta.add_value(
        "navigation.speedOverGround",
        raw.speed.and_then(parse_int).map(speed_over_ground),
    );

    delta.add_value("design.beam", raw.width.and_then(parse_int).map(Value::from));
    delta.add_value(
        "design.length",
        raw.length
            .and_then(parse_int)
            .map(|v| json!({ "overall": v })),
    );
    delta.add_value(
        "sensors.ais.fromCenter",
        raw.w_left.and_then(parse_int).map(Value::from),
    );
    delta.add_value(
        "sensors.ais.fromBow",
        raw.l_fore.and_then(parse_int).map(Value::from),
    );

    delta.add_value(
        "design.aisShipType",
        meta.type_id
            .map(|id| AisShipType {
                id,
                name: ais_ship_type_name(id),
            })
            .and_then(|v| serde_json::to_value(v).ok()),
    );

    Some(delta)
}

fn degrees_to_radians(degrees: i64) -> Value {
    json!((degrees as f64).to_radians())
}

/// MarineTraffic reports speed in tenths of a knot.
fn speed_over_ground(tenths_of_knot: i64) -> Value {
    json!((tenths_of_knot as f64 / 10.0) * KNOTS_TO_METERS_PER_SECOND)
}

/// Integer part of a vendor value.
fn parse_int(value: f64) -> Option<i64> {
    value.is_finite().then(|| value.trunc() as i64)
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
