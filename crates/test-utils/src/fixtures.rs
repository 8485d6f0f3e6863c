//! Common JSON payloads for SensorThings tests.
//!
//! Every builder returns a complete, valid body. Tests remove or override
//! fields to exercise validation.

use serde_json::{json, Value};

/// Observation type URIs.
pub mod observation_type {
    pub const MEASUREMENT: &str =
        "http://www.opengis.net/def/observationType/OGC-OM/2.0/OM_Measurement";
    pub const CATEGORY: &str =
        "http://www.opengis.net/def/observationType/OGC-OM/2.0/OM_CategoryObservation";
    pub const COUNT: &str =
        "http://www.opengis.net/def/observationType/OGC-OM/2.0/OM_CountObservation";
    pub const TRUTH: &str =
        "http://www.opengis.net/def/observationType/OGC-OM/2.0/OM_TruthObservation";
    pub const TEXT: &str =
        "http://www.opengis.net/def/observationType/OGC-OM/2.0/OM_TextObservation";
}

pub const GEOJSON: &str = "application/geo+json";
pub const SENSOR_ML: &str = "http://www.opengis.net/doc/IS/SensorML/2.0";

/// A reference-only payload.
pub fn reference(id: &str) -> Value {
    json!({ "@iot.id": id })
}

pub fn thing(name: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{} description", name),
        "properties": { "owner": "test suite" }
    })
}

pub fn point(lon: f64, lat: f64) -> Value {
    json!({ "type": "Point", "coordinates": [lon, lat] })
}

pub fn location(name: &str, lon: f64, lat: f64) -> Value {
    json!({
        "name": name,
        "description": format!("{} description", name),
        "encodingType": GEOJSON,
        "location": point(lon, lat)
    })
}

pub fn sensor(name: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{} description", name),
        "encodingType": SENSOR_ML,
        "metadata": format!("http://example.org/sensors/{}.xml", name)
    })
}

pub fn observed_property(name: &str) -> Value {
    json!({
        "name": name,
        "definition": format!("http://example.org/properties/{}", name),
        "description": format!("{} description", name)
    })
}

pub fn unit(symbol: &str) -> Value {
    json!({
        "name": format!("unit {}", symbol),
        "symbol": symbol,
        "definition": format!("http://unitsofmeasure.org/ucum.html#{}", symbol)
    })
}

/// A Datastream body linking existing or nested Thing, Sensor and
/// ObservedProperty payloads.
pub fn datastream(name: &str, thing: Value, sensor: Value, observed_property: Value) -> Value {
    json!({
        "name": name,
        "description": format!("{} description", name),
        "observationType": observation_type::MEASUREMENT,
        "unitOfMeasurement": unit("degC"),
        "Thing": thing,
        "Sensor": sensor,
        "ObservedProperty": observed_property
    })
}

/// An Observation at an instant, for an existing Datastream.
pub fn observation(datastream_id: &str, time: &str, result: Value) -> Value {
    json!({
        "phenomenonTime": time,
        "result": result,
        "Datastream": reference(datastream_id)
    })
}

pub fn feature_of_interest(name: &str, lon: f64, lat: f64) -> Value {
    json!({
        "name": name,
        "description": format!("{} description", name),
        "encodingType": GEOJSON,
        "feature": point(lon, lat)
    })
}

/// Remove a top-level member from an object payload.
pub fn without(mut body: Value, field: &str) -> Value {
    if let Some(map) = body.as_object_mut() {
        map.remove(field);
    }
    body
}

/// Set a top-level member on an object payload.
pub fn with(mut body: Value, field: &str, value: Value) -> Value {
    if let Some(map) = body.as_object_mut() {
        map.insert(field.to_string(), value);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_and_with() {
        let body = without(sensor("s"), "encodingType");
        assert!(body.get("encodingType").is_none());
        let body = with(body, "encodingType", json!("x"));
        assert_eq!(body["encodingType"], "x");
    }

    #[test]
    fn test_datastream_links() {
        let body = datastream("d", reference("t1"), sensor("s"), reference("op1"));
        assert_eq!(body["Thing"]["@iot.id"], "t1");
        assert_eq!(body["Sensor"]["name"], "s");
    }
}
