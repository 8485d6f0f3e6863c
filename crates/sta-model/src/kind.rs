//! Entity type tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every stored entity type, including internal ones not exposed as
/// collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Thing,
    Location,
    HistoricalLocation,
    Sensor,
    ObservedProperty,
    Datastream,
    FeatureOfInterest,
    Observation,
    Dataset,
    UnitOfMeasurement,
    Format,
}

impl EntityKind {
    pub const ALL: [EntityKind; 11] = [
        EntityKind::Thing,
        EntityKind::Location,
        EntityKind::HistoricalLocation,
        EntityKind::Sensor,
        EntityKind::ObservedProperty,
        EntityKind::Datastream,
        EntityKind::FeatureOfInterest,
        EntityKind::Observation,
        EntityKind::Dataset,
        EntityKind::UnitOfMeasurement,
        EntityKind::Format,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Thing => "Thing",
            EntityKind::Location => "Location",
            EntityKind::HistoricalLocation => "HistoricalLocation",
            EntityKind::Sensor => "Sensor",
            EntityKind::ObservedProperty => "ObservedProperty",
            EntityKind::Datastream => "Datastream",
            EntityKind::FeatureOfInterest => "FeatureOfInterest",
            EntityKind::Observation => "Observation",
            EntityKind::Dataset => "Dataset",
            EntityKind::UnitOfMeasurement => "UnitOfMeasurement",
            EntityKind::Format => "Format",
        }
    }

    /// Collection name in resource paths, for the public entity sets.
    pub fn collection(&self) -> Option<&'static str> {
        Some(match self {
            EntityKind::Thing => "Things",
            EntityKind::Location => "Locations",
            EntityKind::HistoricalLocation => "HistoricalLocations",
            EntityKind::Sensor => "Sensors",
            EntityKind::ObservedProperty => "ObservedProperties",
            EntityKind::Datastream => "Datastreams",
            EntityKind::FeatureOfInterest => "FeaturesOfInterest",
            EntityKind::Observation => "Observations",
            EntityKind::Dataset | EntityKind::UnitOfMeasurement | EntityKind::Format => {
                return None
            }
        })
    }

    pub fn from_collection(name: &str) -> Option<EntityKind> {
        EntityKind::ALL
            .into_iter()
            .find(|k| k.collection() == Some(name))
    }

    pub fn from_name(name: &str) -> Option<EntityKind> {
        EntityKind::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_names() {
        assert_eq!(
            EntityKind::from_collection("FeaturesOfInterest"),
            Some(EntityKind::FeatureOfInterest)
        );
        assert_eq!(EntityKind::from_collection("Datasets"), None);
        assert_eq!(EntityKind::ObservedProperty.collection(), Some("ObservedProperties"));
        assert_eq!(EntityKind::from_name("Format"), Some(EntityKind::Format));
    }
}
