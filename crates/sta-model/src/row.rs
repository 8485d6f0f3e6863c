//! Column access for filter evaluation.

use sta_common::EntityId;
use sta_filter::{Row, Scalar};

use crate::entities::*;

fn json(value: &Option<serde_json::Value>) -> Scalar {
    value.clone().map(Scalar::Json).unwrap_or(Scalar::Null)
}

impl Row for Thing {
    fn field(&self, column: &str) -> Scalar {
        match column {
            "id" => self.id.as_str().into(),
            "name" => self.name.as_str().into(),
            "description" => self.description.as_str().into(),
            "properties" => json(&self.properties),
            _ => Scalar::Null,
        }
    }

    fn related_id(&self, _relation: &str) -> Option<EntityId> {
        None
    }
}

impl Row for Location {
    fn field(&self, column: &str) -> Scalar {
        match column {
            "id" => self.id.as_str().into(),
            "name" => self.name.as_str().into(),
            "description" => self.description.as_str().into(),
            "encodingType" => self.encoding_type.as_str().into(),
            "location" => Scalar::Geometry(self.location.clone()),
            "properties" => json(&self.properties),
            _ => Scalar::Null,
        }
    }

    fn related_id(&self, _relation: &str) -> Option<EntityId> {
        None
    }
}

impl Row for HistoricalLocation {
    fn field(&self, column: &str) -> Scalar {
        match column {
            "id" => self.id.as_str().into(),
            "time" => Scalar::DateTime(self.time),
            _ => Scalar::Null,
        }
    }

    fn related_id(&self, relation: &str) -> Option<EntityId> {
        match relation {
            "Thing" => Some(self.thing_id.clone()),
            _ => None,
        }
    }
}

impl Row for Sensor {
    fn field(&self, column: &str) -> Scalar {
        match column {
            "id" => self.id.as_str().into(),
            "name" => self.name.as_str().into(),
            "description" => self.description.as_str().into(),
            "encodingType" => self.encoding_type.as_str().into(),
            "metadata" => self.metadata.as_str().into(),
            "properties" => json(&self.properties),
            _ => Scalar::Null,
        }
    }

    fn related_id(&self, _relation: &str) -> Option<EntityId> {
        None
    }
}

impl Row for ObservedProperty {
    fn field(&self, column: &str) -> Scalar {
        match column {
            "id" => self.id.as_str().into(),
            "name" => self.name.as_str().into(),
            "definition" => self.definition.as_str().into(),
            "description" => self.description.as_str().into(),
            "properties" => json(&self.properties),
            _ => Scalar::Null,
        }
    }

    fn related_id(&self, _relation: &str) -> Option<EntityId> {
        None
    }
}

impl Row for Datastream {
    fn field(&self, column: &str) -> Scalar {
        match column {
            "id" => self.id.as_str().into(),
            "name" => self.name.as_str().into(),
            "description" => self.description.as_str().into(),
            "observationType" => self.observation_type.uri().into(),
            "phenomenonTimeStart" => self.phenomenon_time.map(|t| t.start).into(),
            "phenomenonTimeEnd" => self.phenomenon_time.map(|t| t.end).into(),
            "resultTimeStart" => self.result_time.map(|t| t.start).into(),
            "resultTimeEnd" => self.result_time.map(|t| t.end).into(),
            "properties" => json(&self.properties),
            _ => Scalar::Null,
        }
    }

    fn related_id(&self, relation: &str) -> Option<EntityId> {
        match relation {
            "Thing" => Some(self.thing_id.clone()),
            "Sensor" => Some(self.sensor_id.clone()),
            "ObservedProperty" => Some(self.observed_property_id.clone()),
            _ => None,
        }
    }
}

impl Row for FeatureOfInterest {
    fn field(&self, column: &str) -> Scalar {
        match column {
            "id" => self.id.as_str().into(),
            "name" => self.name.as_str().into(),
            "description" => self.description.as_str().into(),
            "featureType" => self.feature_type.as_str().into(),
            "feature" => Scalar::Geometry(self.feature.clone()),
            "properties" => json(&self.properties),
            _ => Scalar::Null,
        }
    }

    fn related_id(&self, _relation: &str) -> Option<EntityId> {
        None
    }
}

impl Row for Observation {
    fn field(&self, column: &str) -> Scalar {
        match column {
            "id" => self.id.as_str().into(),
            "samplingTimeStart" => Scalar::DateTime(self.sampling_start()),
            "samplingTimeEnd" => Scalar::DateTime(self.sampling_end()),
            "resultTime" => Scalar::DateTime(self.result_time),
            "validTimeStart" => self.valid_time.map(|t| t.start).into(),
            "validTimeEnd" => self.valid_time.map(|t| t.end).into(),
            "result" => self.result.to_scalar(),
            "parameters" => json(&self.parameters),
            _ => Scalar::Null,
        }
    }

    fn related_id(&self, relation: &str) -> Option<EntityId> {
        match relation {
            "Datastream" => Some(self.datastream_id.clone()),
            "FeatureOfInterest" => Some(self.feature_id.clone()),
            _ => None,
        }
    }
}

impl Row for Dataset {
    fn field(&self, column: &str) -> Scalar {
        match column {
            "id" => self.id.as_str().into(),
            "datastreamId" => self.datastream_id.as_str().into(),
            "featureId" => self.feature_id.as_str().into(),
            _ => Scalar::Null,
        }
    }

    fn related_id(&self, relation: &str) -> Option<EntityId> {
        match relation {
            "Datastream" => Some(self.datastream_id.clone()),
            "FeatureOfInterest" => Some(self.feature_id.clone()),
            _ => None,
        }
    }
}

impl Row for UnitOfMeasurement {
    fn field(&self, column: &str) -> Scalar {
        match column {
            "id" => self.id.as_str().into(),
            "name" => self.name.clone().into(),
            "symbol" => self.symbol.clone().into(),
            "definition" => self.definition.clone().into(),
            _ => Scalar::Null,
        }
    }

    fn related_id(&self, _relation: &str) -> Option<EntityId> {
        None
    }
}

impl Row for Format {
    fn field(&self, column: &str) -> Scalar {
        match column {
            "id" => self.id.as_str().into(),
            "format" => self.format.as_str().into(),
            _ => Scalar::Null,
        }
    }

    fn related_id(&self, _relation: &str) -> Option<EntityId> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::{ObservationType, ObservationValue};
    use chrono::{TimeZone, Utc};
    use sta_common::{TimeInterval, TimeValue};

    #[test]
    fn test_observation_columns() {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2023, 1, 1, 1, 0, 0).unwrap();
        let obs = Observation {
            id: EntityId::new("o1"),
            datastream_id: EntityId::new("d1"),
            dataset_id: EntityId::new("ds1"),
            feature_id: EntityId::new("f1"),
            phenomenon_time: TimeValue::Interval(TimeInterval::new(start, end).unwrap()),
            result_time: end,
            valid_time: None,
            parameters: None,
            result: ObservationValue::Quantity(Some(6.0)),
        };
        assert_eq!(obs.field("samplingTimeStart"), Scalar::DateTime(start));
        assert_eq!(obs.field("samplingTimeEnd"), Scalar::DateTime(end));
        assert_eq!(obs.field("validTimeStart"), Scalar::Null);
        assert_eq!(obs.field("result"), Scalar::Float(6.0));
        assert_eq!(obs.related_id("Datastream"), Some(EntityId::new("d1")));
    }

    #[test]
    fn test_datastream_unset_bounds_are_null() {
        let ds = Datastream {
            id: EntityId::new("d1"),
            name: "temp".to_string(),
            description: "air".to_string(),
            observation_type: ObservationType::Measurement,
            unit_id: EntityId::new("u1"),
            format_id: EntityId::new("fmt1"),
            thing_id: EntityId::new("t1"),
            sensor_id: EntityId::new("s1"),
            observed_property_id: EntityId::new("op1"),
            phenomenon_time: None,
            result_time: None,
            properties: None,
        };
        assert_eq!(ds.field("phenomenonTimeStart"), Scalar::Null);
        assert_eq!(
            ds.field("observationType"),
            Scalar::from(ObservationType::Measurement.uri())
        );
        assert_eq!(ds.related_id("Sensor"), Some(EntityId::new("s1")));
    }
}
