//! Queryable property maps per entity type.
//!
//! Client-visible names map onto the column names the [`Row`](sta_filter::Row)
//! impls in [`crate::row`] expose. Remapped properties:
//!
//! | Entity | Property | Columns |
//! |---|---|---|
//! | Observation | `phenomenonTime` | `samplingTimeStart`, `samplingTimeEnd` |
//! | Observation | `validTime` | `validTimeStart`, `validTimeEnd` |
//! | Datastream | `phenomenonTime` | `phenomenonTimeStart`, `phenomenonTimeEnd` |
//! | Datastream | `resultTime` | `resultTimeStart`, `resultTimeEnd` |
//! | FeatureOfInterest | `encodingType` | `featureType` |

use sta_filter::{Property, PropertyMap, SchemaRegistry, ValueType};

use crate::kind::EntityKind;

const fn col(name: &'static str, ty: ValueType) -> Property {
    Property::Column { name, ty }
}

const ID: (&str, Property) = ("id", col("id", ValueType::String));
const NAME: (&str, Property) = ("name", col("name", ValueType::String));
const DESCRIPTION: (&str, Property) = ("description", col("description", ValueType::String));
const PROPERTIES: (&str, Property) = ("properties", Property::Json { name: "properties" });

pub static THING: PropertyMap = PropertyMap {
    entity: "Thing",
    properties: &[ID, NAME, DESCRIPTION, PROPERTIES],
};

pub static LOCATION: PropertyMap = PropertyMap {
    entity: "Location",
    properties: &[
        ID,
        NAME,
        DESCRIPTION,
        ("encodingType", col("encodingType", ValueType::String)),
        ("location", col("location", ValueType::Geometry)),
        PROPERTIES,
    ],
};

pub static HISTORICAL_LOCATION: PropertyMap = PropertyMap {
    entity: "HistoricalLocation",
    properties: &[
        ID,
        ("time", col("time", ValueType::DateTime)),
        ("Thing", Property::Relation { target: "Thing" }),
    ],
};

pub static SENSOR: PropertyMap = PropertyMap {
    entity: "Sensor",
    properties: &[
        ID,
        NAME,
        DESCRIPTION,
        ("encodingType", col("encodingType", ValueType::String)),
        ("metadata", col("metadata", ValueType::String)),
        PROPERTIES,
    ],
};

pub static OBSERVED_PROPERTY: PropertyMap = PropertyMap {
    entity: "ObservedProperty",
    properties: &[
        ID,
        NAME,
        ("definition", col("definition", ValueType::String)),
        DESCRIPTION,
        PROPERTIES,
    ],
};

pub static DATASTREAM: PropertyMap = PropertyMap {
    entity: "Datastream",
    properties: &[
        ID,
        NAME,
        DESCRIPTION,
        ("observationType", col("observationType", ValueType::String)),
        (
            "phenomenonTime",
            Property::Span {
                start: "phenomenonTimeStart",
                end: "phenomenonTimeEnd",
            },
        ),
        (
            "resultTime",
            Property::Span {
                start: "resultTimeStart",
                end: "resultTimeEnd",
            },
        ),
        PROPERTIES,
        ("Thing", Property::Relation { target: "Thing" }),
        ("Sensor", Property::Relation { target: "Sensor" }),
        ("ObservedProperty", Property::Relation { target: "ObservedProperty" }),
    ],
};

pub static FEATURE_OF_INTEREST: PropertyMap = PropertyMap {
    entity: "FeatureOfInterest",
    properties: &[
        ID,
        NAME,
        DESCRIPTION,
        ("encodingType", col("featureType", ValueType::String)),
        ("feature", col("feature", ValueType::Geometry)),
        PROPERTIES,
    ],
};

pub static OBSERVATION: PropertyMap = PropertyMap {
    entity: "Observation",
    properties: &[
        ID,
        (
            "phenomenonTime",
            Property::Span {
                start: "samplingTimeStart",
                end: "samplingTimeEnd",
            },
        ),
        ("resultTime", col("resultTime", ValueType::DateTime)),
        (
            "validTime",
            Property::Span {
                start: "validTimeStart",
                end: "validTimeEnd",
            },
        ),
        ("result", col("result", ValueType::Any)),
        ("parameters", Property::Json { name: "parameters" }),
        ("Datastream", Property::Relation { target: "Datastream" }),
        ("FeatureOfInterest", Property::Relation { target: "FeatureOfInterest" }),
    ],
};

/// Property map of a public entity type.
pub fn property_map(kind: EntityKind) -> Option<&'static PropertyMap> {
    Some(match kind {
        EntityKind::Thing => &THING,
        EntityKind::Location => &LOCATION,
        EntityKind::HistoricalLocation => &HISTORICAL_LOCATION,
        EntityKind::Sensor => &SENSOR,
        EntityKind::ObservedProperty => &OBSERVED_PROPERTY,
        EntityKind::Datastream => &DATASTREAM,
        EntityKind::FeatureOfInterest => &FEATURE_OF_INTEREST,
        EntityKind::Observation => &OBSERVATION,
        EntityKind::Dataset | EntityKind::UnitOfMeasurement | EntityKind::Format => return None,
    })
}

/// Registry over the static property maps.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelSchema;

impl SchemaRegistry for ModelSchema {
    fn property_map(&self, entity: &str) -> Option<&'static PropertyMap> {
        EntityKind::from_name(entity).and_then(property_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_public_map_has_id() {
        for kind in EntityKind::ALL {
            if let Some(map) = property_map(kind) {
                assert!(map.contains("id"), "{} lacks id", kind);
                assert_eq!(map.entity, kind.name());
            }
        }
    }

    #[test]
    fn test_relations_resolve() {
        for kind in EntityKind::ALL {
            let Some(map) = property_map(kind) else { continue };
            for (_, property) in map.properties {
                if let Property::Relation { target } = property {
                    assert!(ModelSchema.property_map(target).is_some(), "{}", target);
                }
            }
        }
    }

    #[test]
    fn test_feature_encoding_type_remapped() {
        assert_eq!(
            FEATURE_OF_INTEREST.entry("encodingType"),
            Some(("encodingType", col("featureType", ValueType::String)))
        );
    }
}
