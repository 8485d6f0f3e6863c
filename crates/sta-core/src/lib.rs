//! Entity consistency engine for SensorThings.
//!
//! Each entity type has a service ([`services`]) implementing create with
//! deep insert, partial update and cascading delete. All writes of one
//! operation go to a single [`storage::Transaction`]; a failure at any depth
//! drops the transaction, so nothing partial is committed.
//!
//! ```text
//! ServiceRegistry ─▶ EntityService (8) ─▶ cascade / dispatcher ─▶ Transaction
//! ```

pub mod cascade;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod navigation;
pub mod registry;
pub mod service;
pub mod services;

pub use config::CoreConfig;
pub use context::Context;
pub use registry::{QueryResult, ServiceRegistry};
pub use service::EntityService;
pub use services::{
    DatastreamService, FeatureOfInterestService, HistoricalLocationService, LocationService,
    ObservationService, ObservedPropertyService, SensorService, ThingService,
};
