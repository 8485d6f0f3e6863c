//! One consistency service per SensorThings entity type.

pub mod datastream;
pub mod feature_of_interest;
pub mod historical_location;
pub mod location;
pub mod observation;
pub mod observed_property;
pub mod sensor;
pub mod thing;

pub use datastream::DatastreamService;
pub use feature_of_interest::FeatureOfInterestService;
pub use historical_location::HistoricalLocationService;
pub use location::LocationService;
pub use observation::ObservationService;
pub use observed_property::ObservedPropertyService;
pub use sensor::SensorService;
pub use thing::ThingService;
