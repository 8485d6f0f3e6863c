//! Storage for the SensorThings server.
//!
//! Provides:
//! - An in-memory entity store with snapshot transactions
//! - Query plan execution with relation navigation
//! - PostgreSQL persistence of committed change sets

pub mod catalog;
pub mod entity;
pub mod query;
pub mod store;

pub use catalog::Catalog;
pub use entity::Entity;
pub use query::{Page, RowContext};
pub use store::{ChangeSet, EntityStore, PendingWrite, Table, Tables, Transaction};
