//! Entity graphs received on create and patch.
//!
//! Every field is optional so the same types serve deep inserts, references
//! (`{"@iot.id": ...}` only) and partial updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sta_common::{EntityId, GeoJson, TimeInterval, TimeValue};

/// Shared behaviour of entity payloads.
pub trait Payload {
    fn id(&self) -> Option<&EntityId>;

    /// True if any settable field other than the identifier is present.
    fn has_fields(&self) -> bool;

    /// True if any nested related entity is more than a reference.
    fn has_nested_bodies(&self) -> bool;

    /// An identifier with nothing else refers to an existing entity.
    fn is_reference(&self) -> bool {
        self.id().is_some() && !self.has_fields()
    }
}

fn any_body<P: Payload>(items: &Option<Vec<P>>) -> bool {
    items
        .as_ref()
        .map(|v| v.iter().any(|p| !p.is_reference()))
        .unwrap_or(false)
}

fn boxed_body<P: Payload>(item: &Option<Box<P>>) -> bool {
    item.as_ref().map(|p| !p.is_reference()).unwrap_or(false)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThingPayload {
    #[serde(rename = "@iot.id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(rename = "Locations", default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<LocationPayload>>,
    #[serde(rename = "Datastreams", default, skip_serializing_if = "Option::is_none")]
    pub datastreams: Option<Vec<DatastreamPayload>>,
    #[serde(rename = "HistoricalLocations", default, skip_serializing_if = "Option::is_none")]
    pub historical_locations: Option<Vec<HistoricalLocationPayload>>,
}

impl Payload for ThingPayload {
    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn has_fields(&self) -> bool {
        self.name.is_some()
            || self.description.is_some()
            || self.properties.is_some()
            || self.locations.is_some()
            || self.datastreams.is_some()
            || self.historical_locations.is_some()
    }

    fn has_nested_bodies(&self) -> bool {
        any_body(&self.locations)
            || any_body(&self.datastreams)
            || any_body(&self.historical_locations)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPayload {
    #[serde(rename = "@iot.id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(rename = "Things", default, skip_serializing_if = "Option::is_none")]
    pub things: Option<Vec<ThingPayload>>,
    #[serde(rename = "HistoricalLocations", default, skip_serializing_if = "Option::is_none")]
    pub historical_locations: Option<Vec<HistoricalLocationPayload>>,
}

impl Payload for LocationPayload {
    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn has_fields(&self) -> bool {
        self.name.is_some()
            || self.description.is_some()
            || self.encoding_type.is_some()
            || self.location.is_some()
            || self.properties.is_some()
            || self.things.is_some()
            || self.historical_locations.is_some()
    }

    fn has_nested_bodies(&self) -> bool {
        any_body(&self.things) || any_body(&self.historical_locations)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalLocationPayload {
    #[serde(rename = "@iot.id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(rename = "Thing", default, skip_serializing_if = "Option::is_none")]
    pub thing: Option<Box<ThingPayload>>,
    #[serde(rename = "Locations", default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<LocationPayload>>,
}

impl Payload for HistoricalLocationPayload {
    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn has_fields(&self) -> bool {
        self.time.is_some() || self.thing.is_some() || self.locations.is_some()
    }

    fn has_nested_bodies(&self) -> bool {
        boxed_body(&self.thing) || any_body(&self.locations)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorPayload {
    #[serde(rename = "@iot.id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(rename = "Datastreams", default, skip_serializing_if = "Option::is_none")]
    pub datastreams: Option<Vec<DatastreamPayload>>,
}

impl Payload for SensorPayload {
    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn has_fields(&self) -> bool {
        self.name.is_some()
            || self.description.is_some()
            || self.encoding_type.is_some()
            || self.metadata.is_some()
            || self.properties.is_some()
            || self.datastreams.is_some()
    }

    fn has_nested_bodies(&self) -> bool {
        any_body(&self.datastreams)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedPropertyPayload {
    #[serde(rename = "@iot.id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(rename = "Datastreams", default, skip_serializing_if = "Option::is_none")]
    pub datastreams: Option<Vec<DatastreamPayload>>,
}

impl Payload for ObservedPropertyPayload {
    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn has_fields(&self) -> bool {
        self.name.is_some()
            || self.definition.is_some()
            || self.description.is_some()
            || self.properties.is_some()
            || self.datastreams.is_some()
    }

    fn has_nested_bodies(&self) -> bool {
        any_body(&self.datastreams)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitOfMeasurementPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatastreamPayload {
    #[serde(rename = "@iot.id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<UnitOfMeasurementPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(rename = "Thing", default, skip_serializing_if = "Option::is_none")]
    pub thing: Option<Box<ThingPayload>>,
    #[serde(rename = "Sensor", default, skip_serializing_if = "Option::is_none")]
    pub sensor: Option<Box<SensorPayload>>,
    #[serde(rename = "ObservedProperty", default, skip_serializing_if = "Option::is_none")]
    pub observed_property: Option<Box<ObservedPropertyPayload>>,
    #[serde(rename = "Observations", default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<Vec<ObservationPayload>>,
}

impl Payload for DatastreamPayload {
    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn has_fields(&self) -> bool {
        self.name.is_some()
            || self.description.is_some()
            || self.unit_of_measurement.is_some()
            || self.observation_type.is_some()
            || self.properties.is_some()
            || self.thing.is_some()
            || self.sensor.is_some()
            || self.observed_property.is_some()
            || self.observations.is_some()
    }

    fn has_nested_bodies(&self) -> bool {
        boxed_body(&self.thing)
            || boxed_body(&self.sensor)
            || boxed_body(&self.observed_property)
            || any_body(&self.observations)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureOfInterestPayload {
    #[serde(rename = "@iot.id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<GeoJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(rename = "Observations", default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<Vec<ObservationPayload>>,
}

impl Payload for FeatureOfInterestPayload {
    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn has_fields(&self) -> bool {
        self.name.is_some()
            || self.description.is_some()
            || self.encoding_type.is_some()
            || self.feature.is_some()
            || self.properties.is_some()
            || self.observations.is_some()
    }

    fn has_nested_bodies(&self) -> bool {
        any_body(&self.observations)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationPayload {
    #[serde(rename = "@iot.id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phenomenon_time: Option<TimeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_time: Option<TimeInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(rename = "Datastream", default, skip_serializing_if = "Option::is_none")]
    pub datastream: Option<Box<DatastreamPayload>>,
    #[serde(rename = "FeatureOfInterest", default, skip_serializing_if = "Option::is_none")]
    pub feature_of_interest: Option<Box<FeatureOfInterestPayload>>,
}

impl Payload for ObservationPayload {
    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn has_fields(&self) -> bool {
        self.phenomenon_time.is_some()
            || self.result_time.is_some()
            || self.valid_time.is_some()
            || self.parameters.is_some()
            || self.result.is_some()
            || self.datastream.is_some()
            || self.feature_of_interest.is_some()
    }

    fn has_nested_bodies(&self) -> bool {
        boxed_body(&self.datastream) || boxed_body(&self.feature_of_interest)
    }
}

impl ThingPayload {
    pub fn reference(id: impl Into<EntityId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }
}

impl LocationPayload {
    pub fn reference(id: impl Into<EntityId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }
}

impl SensorPayload {
    pub fn reference(id: impl Into<EntityId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }
}

impl ObservedPropertyPayload {
    pub fn reference(id: impl Into<EntityId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }
}

impl DatastreamPayload {
    pub fn reference(id: impl Into<EntityId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }
}

impl FeatureOfInterestPayload {
    pub fn reference(id: impl Into<EntityId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }
}
