//! Common types and utilities shared across the SensorThings crates.

pub mod error;
pub mod geometry;
pub mod id;
pub mod time;

pub use error::{ErrorKind, StaError, StaResult};
pub use geometry::{GeoJson, Geometry, GeometryParseError};
pub use id::EntityId;
pub use time::{parse_instant, TimeInterval, TimeParseError, TimeValue};
