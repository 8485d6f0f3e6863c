//! Stored entity rows.
//!
//! Relations are held as identifiers and resolved through the store when
//! needed. To-many relations are kept on the side that owns the link:
//! a Thing lists its Locations, a Datastream names its Thing, and so on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sta_common::{EntityId, Geometry, TimeInterval, TimeValue};
use std::collections::BTreeSet;

use crate::observation::{ObservationType, ObservationValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thing {
    #[serde(rename = "@iot.id")]
    pub id: EntityId,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    /// Current locations, oldest association first.
    #[serde(default)]
    pub locations: Vec<EntityId>,
}

impl Thing {
    /// The location associated most recently.
    pub fn current_location(&self) -> Option<&EntityId> {
        self.locations.last()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(rename = "@iot.id")]
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub encoding_type: String,
    pub location: Geometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(default)]
    pub historical_locations: BTreeSet<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalLocation {
    #[serde(rename = "@iot.id")]
    pub id: EntityId,
    pub time: DateTime<Utc>,
    pub thing_id: EntityId,
    pub location_ids: BTreeSet<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    #[serde(rename = "@iot.id")]
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub encoding_type: String,
    pub metadata: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedProperty {
    #[serde(rename = "@iot.id")]
    pub id: EntityId,
    pub name: String,
    pub definition: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
}

/// Unit record shared by Datastreams with the same symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitOfMeasurement {
    #[serde(rename = "@iot.id")]
    pub id: EntityId,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub definition: Option<String>,
}

/// Observation-type format record, one per distinct type URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Format {
    #[serde(rename = "@iot.id")]
    pub id: EntityId,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datastream {
    #[serde(rename = "@iot.id")]
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub observation_type: ObservationType,
    pub unit_id: EntityId,
    pub format_id: EntityId,
    pub thing_id: EntityId,
    pub sensor_id: EntityId,
    pub observed_property_id: EntityId,
    /// Min/max sampling time across the Datastream's observations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phenomenon_time: Option<TimeInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_time: Option<TimeInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureOfInterest {
    #[serde(rename = "@iot.id")]
    pub id: EntityId,
    pub name: String,
    pub description: String,
    /// Exposed to clients as `encodingType`.
    pub feature_type: String,
    pub feature: Geometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    /// Derived from a Thing's location rather than supplied by a client.
    #[serde(default)]
    pub auto_generated: bool,
}

/// First or last observation of a Dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationPointer {
    pub observation_id: EntityId,
    pub time: DateTime<Utc>,
    pub value: ObservationValue,
}

/// Internal grouping of a Datastream's observations by feature.
///
/// The procedure, phenomenon and offering follow from the Datastream, so a
/// Dataset is unique per (Datastream, FeatureOfInterest).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(rename = "@iot.id")]
    pub id: EntityId,
    pub datastream_id: EntityId,
    pub procedure_id: EntityId,
    pub phenomenon_id: EntityId,
    pub feature_id: EntityId,
    pub offering_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_observation: Option<ObservationPointer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_observation: Option<ObservationPointer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(rename = "@iot.id")]
    pub id: EntityId,
    pub datastream_id: EntityId,
    pub dataset_id: EntityId,
    pub feature_id: EntityId,
    pub phenomenon_time: TimeValue,
    pub result_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_time: Option<TimeInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    pub result: ObservationValue,
}

impl Observation {
    pub fn sampling_start(&self) -> DateTime<Utc> {
        self.phenomenon_time.start()
    }

    pub fn sampling_end(&self) -> DateTime<Utc> {
        self.phenomenon_time.end()
    }
}
