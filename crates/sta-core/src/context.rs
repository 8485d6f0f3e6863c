//! Per-operation state handed to every entity service.

use chrono::{DateTime, Utc};
use storage::Transaction;

use crate::config::CoreConfig;
use crate::registry::ServiceRegistry;

/// One logical operation: a transaction, the services that may write to it,
/// and the instant used for defaulted timestamps.
pub struct Context<'a> {
    pub tx: Transaction<'a>,
    pub services: &'a ServiceRegistry,
    pub now: DateTime<Utc>,
}

impl<'a> Context<'a> {
    pub fn new(tx: Transaction<'a>, services: &'a ServiceRegistry, now: DateTime<Utc>) -> Self {
        Self { tx, services, now }
    }

    pub fn config(&self) -> &CoreConfig {
        self.services.config()
    }

    /// Hand the transaction back to be persisted and committed. Dropping
    /// the context instead rolls it back.
    pub fn into_transaction(self) -> Transaction<'a> {
        self.tx
    }
}
