//! SensorThings entity model.
//!
//! - [`entities`]: stored rows, one struct per entity type
//! - [`payload`]: deep-insert and patch graphs as received from clients
//! - [`observation`]: observation types and typed result values
//! - [`schema`]: queryable property maps used by `$filter` and `$orderby`

pub mod entities;
pub mod kind;
pub mod observation;
pub mod payload;
pub mod row;
pub mod schema;

pub use entities::{
    Dataset, Datastream, FeatureOfInterest, Format, HistoricalLocation, Location, Observation,
    ObservationPointer, ObservedProperty, Sensor, Thing, UnitOfMeasurement,
};
pub use kind::EntityKind;
pub use observation::{ObservationType, ObservationValue};
pub use payload::{
    DatastreamPayload, FeatureOfInterestPayload, HistoricalLocationPayload, LocationPayload,
    ObservationPayload, ObservedPropertyPayload, Payload, SensorPayload, ThingPayload,
    UnitOfMeasurementPayload,
};
pub use schema::ModelSchema;
