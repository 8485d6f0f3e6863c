//! Entity persistence using PostgreSQL.
//!
//! Each row is stored as a JSONB document keyed by (kind, id). The in-memory
//! [`Tables`] are rebuilt from these documents at startup.

use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use sta_common::{StaError, StaResult};
use sta_model::EntityKind;
use tracing::{debug, info};

use crate::store::{PendingWrite, Tables};

/// Database connection pool and catalog operations.
pub struct Catalog {
    pool: PgPool,
}

impl Catalog {
    /// Create a new catalog connection from database URL.
    pub async fn connect(database_url: &str) -> StaResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StaError::DatabaseError(format!("Connection failed: {}", e)))?;

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> StaResult<()> {
        for statement in SCHEMA_SQL.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| StaError::DatabaseError(format!("Migration failed: {}", e)))?;
            }
        }

        Ok(())
    }

    /// Load every stored entity.
    pub async fn load(&self) -> StaResult<Tables> {
        let rows = sqlx::query_as::<_, EntityRow>("SELECT kind, id, document FROM entities")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StaError::DatabaseError(format!("Query failed: {}", e)))?;

        let mut tables = Tables::default();
        for row in rows {
            let kind = EntityKind::from_name(&row.kind).ok_or_else(|| {
                StaError::DatabaseError(format!("Unknown entity kind '{}' for {}", row.kind, row.id))
            })?;
            tables.load_document(kind, row.document.0)?;
        }

        info!(rows = ?tables.counts(), "Loaded entities from catalog");
        Ok(tables)
    }

    /// Apply a transaction's writes atomically.
    pub async fn persist(&self, writes: &[PendingWrite]) -> StaResult<()> {
        if writes.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StaError::DatabaseError(format!("Begin failed: {}", e)))?;

        for write in writes {
            match &write.document {
                Some(document) => {
                    sqlx::query(
                        r#"
                        INSERT INTO entities (kind, id, document, updated_at)
                        VALUES ($1, $2, $3, NOW())
                        ON CONFLICT (kind, id)
                        DO UPDATE SET
                            document = EXCLUDED.document,
                            updated_at = EXCLUDED.updated_at
                        "#,
                    )
                    .bind(write.kind.name())
                    .bind(write.id.as_str())
                    .bind(Json(document))
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| StaError::DatabaseError(format!("Upsert failed: {}", e)))?;
                }
                None => {
                    sqlx::query("DELETE FROM entities WHERE kind = $1 AND id = $2")
                        .bind(write.kind.name())
                        .bind(write.id.as_str())
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| StaError::DatabaseError(format!("Delete failed: {}", e)))?;
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| StaError::DatabaseError(format!("Commit failed: {}", e)))?;

        debug!(rows = writes.len(), "Persisted change set");
        Ok(())
    }

    /// Check the connection is usable.
    pub async fn ping(&self) -> StaResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StaError::DatabaseError(format!("Ping failed: {}", e)))?;
        Ok(())
    }
}

/// Internal row type for database queries.
#[derive(FromRow)]
struct EntityRow {
    kind: String,
    id: String,
    document: Json<Value>,
}

/// Database schema SQL.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS entities (
    kind VARCHAR(40) NOT NULL,
    id TEXT NOT NULL,
    document JSONB NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    PRIMARY KEY(kind, id)
);

CREATE INDEX IF NOT EXISTS idx_entities_kind ON entities(kind);
"#;
