//! Application state for the SensorThings API.

use anyhow::{Context as _, Result};
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use sta_common::StaResult;
use sta_core::{Context, ServiceRegistry};
use storage::{Catalog, EntityStore, Tables};
use tokio::sync::RwLock;
use tracing::info;

use crate::config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// Committed entity tables. Writers hold the write lock for a whole
    /// operation, so writes are serialized; reads share the read lock.
    store: RwLock<EntityStore>,

    /// Entity services, configured from `config.core`.
    pub services: ServiceRegistry,

    /// Database catalog, when persistence is configured.
    pub catalog: Option<Catalog>,

    pub config: ServerConfig,

    /// Renders `/metrics`; absent when no recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// State over an empty, unpersisted store.
    pub fn in_memory(config: ServerConfig) -> Self {
        Self {
            store: RwLock::new(EntityStore::new()),
            services: ServiceRegistry::new(config.core),
            catalog: None,
            config,
            prometheus: None,
        }
    }

    /// Connect to the catalog, if a database URL is given, and load its rows.
    pub async fn new(config: ServerConfig, database_url: Option<&str>) -> Result<Self> {
        let Some(url) = database_url else {
            info!("No database configured, entities are kept in memory only");
            return Ok(Self::in_memory(config));
        };

        let catalog = Catalog::connect(url)
            .await
            .context("Failed to connect to the catalog database")?;
        catalog.migrate().await.context("Failed to migrate catalog")?;
        let tables = catalog.load().await.context("Failed to load entities")?;
        info!(counts = ?tables.counts(), "Loaded entities from catalog");

        Ok(Self {
            store: RwLock::new(EntityStore::from_tables(tables)),
            services: ServiceRegistry::new(config.core),
            catalog: Some(catalog),
            config,
            prometheus: None,
        })
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Run one write operation as a transaction.
    ///
    /// The change set is persisted to the catalog before the in-memory
    /// commit. Any failure drops the transaction.
    pub async fn write<R: Send>(
        &self,
        op: impl FnOnce(&ServiceRegistry, &mut Context<'_>) -> StaResult<R> + Send,
    ) -> StaResult<R> {
        let mut store = self.store.write().await;
        let mut ctx = self.services.context(store.begin(), Utc::now());
        let value = op(&self.services, &mut ctx)?;
        let tx = ctx.into_transaction();
        if let Some(catalog) = &self.catalog {
            catalog.persist(&tx.pending_writes()?).await?;
        }
        tx.commit()?;
        Ok(value)
    }

    /// Run a read against the committed tables.
    pub async fn read<R>(&self, op: impl FnOnce(&Tables) -> StaResult<R>) -> StaResult<R> {
        let store = self.store.read().await;
        op(store.tables())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sta_model::EntityKind;
    use std::time::Duration;

    #[tokio::test]
    async fn test_reads_do_not_wait_for_each_other() {
        let state = AppState::in_memory(ServerConfig::default());
        let held = state.store.read().await;
        let things = tokio::time::timeout(
            Duration::from_secs(1),
            state.read(|tables| Ok(tables.things.len())),
        )
        .await
        .expect("read blocked behind another reader");
        assert_eq!(things.unwrap(), 0);
        drop(held);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_rows() {
        let state = AppState::in_memory(ServerConfig::default());
        let result = state
            .write(|services, ctx| {
                services.create(
                    ctx,
                    EntityKind::Thing,
                    json!({
                        "name": "station",
                        "description": "roof",
                        "Locations": [{ "name": "home" }]
                    }),
                )
            })
            .await;
        assert!(result.is_err());

        let rows: usize = state
            .read(|tables| Ok(tables.counts().values().sum()))
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }
}
