//! JSON representation of stored entities.
//!
//! Internal fields (relation ids, auto-generation flags, Dataset links) are
//! dropped. Relations appear as `<Relation>@iot.navigationLink` entries.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use sta_common::{EntityId, StaError, StaResult};
use sta_model::{
    Datastream, EntityKind, FeatureOfInterest, HistoricalLocation, Location, Observation,
    ObservedProperty, Sensor, Thing, UnitOfMeasurement,
};
use storage::Tables;

/// Canonical URL of one entity.
pub fn self_link(base_url: &str, kind: EntityKind, id: &EntityId) -> String {
    let set = kind.collection().unwrap_or(kind.name());
    if id.as_str().parse::<i64>().is_ok() {
        format!("{}/{}({})", base_url, set, id)
    } else {
        format!("{}/{}('{}')", base_url, set, id)
    }
}

fn instant(time: &DateTime<Utc>) -> Value {
    Value::String(time.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn geometry(g: &sta_common::Geometry) -> StaResult<Value> {
    serde_json::to_value(g).map_err(|e| StaError::InternalError(e.to_string()))
}

struct Builder {
    link: String,
    map: Map<String, Value>,
}

impl Builder {
    fn new(base_url: &str, kind: EntityKind, id: &EntityId) -> Self {
        let link = self_link(base_url, kind, id);
        let mut map = Map::new();
        map.insert("@iot.id".to_string(), Value::String(id.to_string()));
        map.insert("@iot.selfLink".to_string(), Value::String(link.clone()));
        Self { link, map }
    }

    fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.map.insert(name.to_string(), value.into());
        self
    }

    fn optional(self, name: &str, value: Option<Value>) -> Self {
        match value {
            Some(value) => self.field(name, value),
            None => self,
        }
    }

    fn navigation(mut self, relations: &[&str]) -> Self {
        for relation in relations {
            self.map.insert(
                format!("{}@iot.navigationLink", relation),
                Value::String(format!("{}/{}", self.link, relation)),
            );
        }
        self
    }

    fn build(self) -> Value {
        Value::Object(self.map)
    }
}

fn thing(base_url: &str, t: &Thing) -> Value {
    Builder::new(base_url, EntityKind::Thing, &t.id)
        .field("name", t.name.as_str())
        .field("description", t.description.as_str())
        .optional("properties", t.properties.clone())
        .navigation(&["Locations", "HistoricalLocations", "Datastreams"])
        .build()
}

fn location(base_url: &str, l: &Location) -> StaResult<Value> {
    Ok(Builder::new(base_url, EntityKind::Location, &l.id)
        .field("name", l.name.as_str())
        .field("description", l.description.as_str())
        .field("encodingType", l.encoding_type.as_str())
        .field("location", geometry(&l.location)?)
        .optional("properties", l.properties.clone())
        .navigation(&["Things", "HistoricalLocations"])
        .build())
}

fn historical_location(base_url: &str, h: &HistoricalLocation) -> Value {
    Builder::new(base_url, EntityKind::HistoricalLocation, &h.id)
        .field("time", instant(&h.time))
        .navigation(&["Thing", "Locations"])
        .build()
}

fn sensor(base_url: &str, s: &Sensor) -> Value {
    Builder::new(base_url, EntityKind::Sensor, &s.id)
        .field("name", s.name.as_str())
        .field("description", s.description.as_str())
        .field("encodingType", s.encoding_type.as_str())
        .field("metadata", s.metadata.as_str())
        .optional("properties", s.properties.clone())
        .navigation(&["Datastreams"])
        .build()
}

fn observed_property(base_url: &str, p: &ObservedProperty) -> Value {
    Builder::new(base_url, EntityKind::ObservedProperty, &p.id)
        .field("name", p.name.as_str())
        .field("definition", p.definition.as_str())
        .field("description", p.description.as_str())
        .optional("properties", p.properties.clone())
        .navigation(&["Datastreams"])
        .build()
}

fn unit(u: Option<&UnitOfMeasurement>) -> Value {
    let mut map = Map::new();
    if let Some(u) = u {
        map.insert("name".to_string(), u.name.clone().into());
        map.insert("symbol".to_string(), u.symbol.clone().into());
        map.insert("definition".to_string(), u.definition.clone().into());
    }
    Value::Object(map)
}

fn datastream(base_url: &str, tables: &Tables, d: &Datastream) -> Value {
    Builder::new(base_url, EntityKind::Datastream, &d.id)
        .field("name", d.name.as_str())
        .field("description", d.description.as_str())
        .field("unitOfMeasurement", unit(tables.find(&d.unit_id)))
        .field("observationType", d.observation_type.uri())
        .optional(
            "phenomenonTime",
            d.phenomenon_time.map(|t| Value::String(t.to_string())),
        )
        .optional(
            "resultTime",
            d.result_time.map(|t| Value::String(t.to_string())),
        )
        .optional("properties", d.properties.clone())
        .navigation(&["Thing", "Sensor", "ObservedProperty", "Observations"])
        .build()
}

fn feature_of_interest(base_url: &str, f: &FeatureOfInterest) -> StaResult<Value> {
    Ok(Builder::new(base_url, EntityKind::FeatureOfInterest, &f.id)
        .field("name", f.name.as_str())
        .field("description", f.description.as_str())
        .field("encodingType", f.feature_type.as_str())
        .field("feature", geometry(&f.feature)?)
        .optional("properties", f.properties.clone())
        .navigation(&["Observations"])
        .build())
}

fn observation(base_url: &str, o: &Observation) -> Value {
    Builder::new(base_url, EntityKind::Observation, &o.id)
        .field("phenomenonTime", o.phenomenon_time.to_string())
        .field("resultTime", instant(&o.result_time))
        .optional(
            "validTime",
            o.valid_time.map(|t| Value::String(t.to_string())),
        )
        .field("result", o.result.to_json())
        .optional("parameters", o.parameters.clone())
        .navigation(&["Datastream", "FeatureOfInterest"])
        .build()
}

/// Render one entity.
pub fn render(tables: &Tables, base_url: &str, kind: EntityKind, id: &EntityId) -> StaResult<Value> {
    Ok(match kind {
        EntityKind::Thing => thing(base_url, tables.get(id)?),
        EntityKind::Location => location(base_url, tables.get(id)?)?,
        EntityKind::HistoricalLocation => historical_location(base_url, tables.get(id)?),
        EntityKind::Sensor => sensor(base_url, tables.get(id)?),
        EntityKind::ObservedProperty => observed_property(base_url, tables.get(id)?),
        EntityKind::Datastream => datastream(base_url, tables, tables.get(id)?),
        EntityKind::FeatureOfInterest => feature_of_interest(base_url, tables.get(id)?)?,
        EntityKind::Observation => observation(base_url, tables.get(id)?),
        EntityKind::Dataset | EntityKind::UnitOfMeasurement | EntityKind::Format => {
            return Err(StaError::unsupported(format!("{} is not an entity set", kind)))
        }
    })
}

/// Keep only the selected properties of a rendered entity.
pub fn select(entity: Value, properties: &[String]) -> Value {
    match entity {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| properties.iter().any(|p| p == key))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sta_common::{Geometry, TimeValue};
    use sta_model::{ObservationType, ObservationValue};
    use storage::EntityStore;

    const BASE: &str = "http://localhost/v1.1";

    #[test]
    fn test_self_link_quoting() {
        assert_eq!(
            self_link(BASE, EntityKind::Thing, &EntityId::new("12")),
            "http://localhost/v1.1/Things(12)"
        );
        assert_eq!(
            self_link(BASE, EntityKind::FeatureOfInterest, &EntityId::new("f-1")),
            "http://localhost/v1.1/FeaturesOfInterest('f-1')"
        );
    }

    #[test]
    fn test_datastream_and_observation_rendering() {
        let mut store = EntityStore::new();
        let mut tx = store.begin();
        tx.save(UnitOfMeasurement {
            id: EntityId::new("u1"),
            name: Some("degree Celsius".to_string()),
            symbol: Some("degC".to_string()),
            definition: None,
        });
        tx.save(Datastream {
            id: EntityId::new("1"),
            name: "temp".to_string(),
            description: "air".to_string(),
            observation_type: ObservationType::Measurement,
            unit_id: EntityId::new("u1"),
            format_id: EntityId::new("fmt"),
            thing_id: EntityId::new("t"),
            sensor_id: EntityId::new("s"),
            observed_property_id: EntityId::new("p"),
            phenomenon_time: None,
            result_time: None,
            properties: None,
        });
        let at = test_utils::epoch();
        tx.save(Observation {
            id: EntityId::new("2"),
            datastream_id: EntityId::new("1"),
            dataset_id: EntityId::new("ds"),
            feature_id: EntityId::new("f"),
            phenomenon_time: TimeValue::Instant(at),
            result_time: at,
            valid_time: None,
            parameters: None,
            result: ObservationValue::Quantity(Some(21.5)),
        });
        tx.save(FeatureOfInterest {
            id: EntityId::new("f"),
            name: "spot".to_string(),
            description: "d".to_string(),
            feature_type: "application/geo+json".to_string(),
            feature: Geometry::point(7.0, 51.0),
            properties: None,
            auto_generated: true,
        });
        tx.commit().unwrap();
        let tables = store.tables();

        let ds = render(tables, BASE, EntityKind::Datastream, &EntityId::new("1")).unwrap();
        assert_eq!(ds["unitOfMeasurement"]["symbol"], "degC");
        assert_eq!(ds["observationType"], ObservationType::Measurement.uri());
        assert!(ds.get("thingId").is_none());
        assert_eq!(
            ds["Observations@iot.navigationLink"],
            "http://localhost/v1.1/Datastreams(1)/Observations"
        );

        let obs = render(tables, BASE, EntityKind::Observation, &EntityId::new("2")).unwrap();
        assert_eq!(obs["result"], 21.5);
        assert_eq!(obs["resultTime"], "2023-01-01T00:00:00Z");
        assert!(obs.get("datasetId").is_none());

        let foi = render(tables, BASE, EntityKind::FeatureOfInterest, &EntityId::new("f")).unwrap();
        assert_eq!(foi["encodingType"], "application/geo+json");
        assert_eq!(foi["feature"]["type"], "Point");
        assert!(foi.get("autoGenerated").is_none());

        let selected = select(ds, &["name".to_string()]);
        assert_eq!(selected.as_object().unwrap().len(), 1);
    }
}
