use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::BoundingBox;

/// Label attached to every update produced by this service.
pub const SOURCE_LABEL: &str = "marinetraffic";

pub const BOUNDING_BOX_PATH: &str = "sensors.ais.boundingBox";

/// A Signal K delta message, the unit handed to the downstream sink.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Delta {
    pub context: String,
    pub updates: Vec<Update>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Update {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub source: Source,
    pub values: Vec<PathValue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Source {
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PathValue {
    pub path: String,
    pub value: Value,
}

impl Delta {
    pub fn new(context: impl Into<String>, timestamp: Option<DateTime<Utc>>) -> Delta {
        Delta {
            context: context.into(),
            updates: vec![Update {
                timestamp,
                source: Source {
                    label: SOURCE_LABEL.to_string(),
                },
                values: vec![],
            }],
        }
    }

    /// The diagnostic record describing the area searched during a cycle.
    pub fn bounding_box(self_context: impl Into<String>, bbox: &BoundingBox) -> Delta {
        let mut delta = Delta::new(self_context, None);
        delta.add_value(BOUNDING_BOX_PATH, serde_json::to_value(bbox).ok());
        delta
    }

    /// Appends `value` under `path`, missing and null values are never emitted.
    pub fn add_value(&mut self, path: &str, value: Option<Value>) {
        let Some(value) = value else {
            return;
        };
        if value.is_null() {
            return;
        }
        if let Some(update) = self.updates.first_mut() {
            update.values.push(PathValue {
                path: path.to_string(),
                value,
            });
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &PathValue> {
        self.updates.iter().flat_map(|u| u.values.iter())
    }

    pub fn value(&self, path: &str) -> Option<&Value> {
        self.values().find(|v| v.path == path).map(|v| &v.value)
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.updates.first().and_then(|u| u.timestamp)
    }

    pub fn is_bounding_box(&self) -> bool {
        self.value(BOUNDING_BOX_PATH).is_some()
    }
}
