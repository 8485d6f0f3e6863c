//! Binding between model rows and their tables.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sta_common::EntityId;
use sta_filter::Row;
use sta_model::{
    Dataset, Datastream, EntityKind, FeatureOfInterest, Format, HistoricalLocation, Location,
    Observation, ObservedProperty, Sensor, Thing, UnitOfMeasurement,
};

use crate::store::{Table, Tables};

/// A row type with its own table in [`Tables`].
pub trait Entity: Row + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &EntityId;

    fn table(tables: &Tables) -> &Table<Self>;

    fn table_mut(tables: &mut Tables) -> &mut Table<Self>;
}

macro_rules! entity {
    ($ty:ty, $kind:ident, $field:ident) => {
        impl Entity for $ty {
            const KIND: EntityKind = EntityKind::$kind;

            fn id(&self) -> &EntityId {
                &self.id
            }

            fn table(tables: &Tables) -> &Table<Self> {
                &tables.$field
            }

            fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
                &mut tables.$field
            }
        }
    };
}

entity!(Thing, Thing, things);
entity!(Location, Location, locations);
entity!(HistoricalLocation, HistoricalLocation, historical_locations);
entity!(Sensor, Sensor, sensors);
entity!(ObservedProperty, ObservedProperty, observed_properties);
entity!(Datastream, Datastream, datastreams);
entity!(FeatureOfInterest, FeatureOfInterest, features);
entity!(Observation, Observation, observations);
entity!(Dataset, Dataset, datasets);
entity!(UnitOfMeasurement, UnitOfMeasurement, units);
entity!(Format, Format, formats);
