//! Postgres-backed entity store.

use super::{
    EntityQuery, EntityRow, EntityStore, BACKGROUND_COLUMN, BUILDING_TYPE_COLUMN,
    CHARACTER_COLUMN,
};
use crate::config::StoreConfig;
use crate::entity::EntityKind;
use crate::error::SeedError;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

const BUILDINGS_SQL: &str = "SELECT id::text AS id, name, simulation_id::text AS owning_context_id, building_type \
     FROM buildings \
     WHERE deleted_at IS NULL AND building_type = $1 AND ($2::text[] IS NULL OR name = ANY($2)) \
     ORDER BY simulation_id, name";

const AGENTS_SQL: &str = "SELECT id::text AS id, name, simulation_id::text AS owning_context_id, character, background \
     FROM agents \
     WHERE deleted_at IS NULL AND ($1::text[] IS NULL OR name = ANY($1)) \
     ORDER BY simulation_id, name";

/// Entity store reading the `buildings` and `agents` tables.
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    /// Create a store with a lazily connected pool. No connection is made
    /// until the first query.
    pub fn connect_lazy(config: &StoreConfig) -> Result<Self, SeedError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy(&config.database_url)
            .map_err(|e| {
                SeedError::EntityResolution(format!("Invalid database URL: {}", e))
            })?;
        Ok(Self { pool })
    }
}

fn text_value(row: &PgRow, column: &str) -> Result<Value, SeedError> {
    let value: Option<String> = row.try_get(column)?;
    Ok(value.map(Value::String).unwrap_or(Value::Null))
}

fn decode_row(row: &PgRow, kind: EntityKind) -> Result<EntityRow, SeedError> {
    let mut columns = BTreeMap::new();
    let extra_columns: &[&str] = match kind {
        EntityKind::Building => &[BUILDING_TYPE_COLUMN],
        EntityKind::Agent => &[CHARACTER_COLUMN, BACKGROUND_COLUMN],
    };
    for column in extra_columns {
        columns.insert(column.to_string(), text_value(row, column)?);
    }
    Ok(EntityRow {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        owning_context_id: row.try_get("owning_context_id")?,
        columns,
    })
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn query(&self, query: &EntityQuery) -> Result<Vec<EntityRow>, SeedError> {
        debug!(kind = %query.kind, category = ?query.category, "Querying entities");
        let rows = match query.kind {
            EntityKind::Building => {
                let category = query.category.as_deref().ok_or_else(|| {
                    SeedError::EntityResolution("building query requires a category".to_string())
                })?;
                sqlx::query(BUILDINGS_SQL)
                    .bind(category)
                    .bind(query.names.clone())
                    .fetch_all(&self.pool)
                    .await?
            }
            EntityKind::Agent => {
                sqlx::query(AGENTS_SQL)
                    .bind(query.names.clone())
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(|row| decode_row(row, query.kind)).collect()
    }
}
