//! Entity Store and Locator
//!
//! `EntityStore` is the read-only query capability over the persistent store.
//! `EntityLocator` turns raw rows into resolved building and agent snapshots,
//! ordered by (owning context, name) so every run enumerates entities in the
//! same order.

pub mod memory;
pub mod postgres;

pub use memory::{MemoryEntityStore, StoredEntity};
pub use postgres::PgEntityStore;

use crate::entity::{AgentAttributes, EntityKind, ResolvedAgentEntity, ResolvedBuildingEntity};
use crate::error::SeedError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Column carrying a building's category marker.
pub const BUILDING_TYPE_COLUMN: &str = "building_type";
pub const CHARACTER_COLUMN: &str = "character";
pub const BACKGROUND_COLUMN: &str = "background";

/// Selection criteria. Soft-deleted rows are always excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
    pub kind: EntityKind,
    /// Building category marker to match (ignored for agents).
    pub category: Option<String>,
    /// Restrict to these display names.
    pub names: Option<Vec<String>>,
}

impl EntityQuery {
    pub fn buildings(category: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Building,
            category: Some(category.into()),
            names: None,
        }
    }

    pub fn agents_named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: EntityKind::Agent,
            category: None,
            names: Some(names.into_iter().map(Into::into).collect()),
        }
    }
}

/// One raw row: the common columns plus type-specific ones.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRow {
    pub id: String,
    pub name: String,
    pub owning_context_id: String,
    pub columns: BTreeMap<String, Value>,
}

/// Read-only query capability over the persistent store.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn query(&self, query: &EntityQuery) -> Result<Vec<EntityRow>, SeedError>;
}

/// Resolves the batch's targets from an `EntityStore`.
pub struct EntityLocator<'a> {
    store: &'a dyn EntityStore,
}

impl<'a> EntityLocator<'a> {
    pub fn new(store: &'a dyn EntityStore) -> Self {
        Self { store }
    }

    /// Non-deleted buildings whose category marker equals `category`.
    pub async fn buildings(&self, category: &str) -> Result<Vec<ResolvedBuildingEntity>, SeedError> {
        let rows = self.store.query(&EntityQuery::buildings(category)).await?;
        let mut resolved = rows
            .into_iter()
            .map(building_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        resolved.sort_by(|a, b| {
            (&a.owning_context_id, &a.name).cmp(&(&b.owning_context_id, &b.name))
        });
        debug!(category, count = resolved.len(), "Resolved buildings");
        Ok(resolved)
    }

    /// Non-deleted agents whose display name is in `names`.
    pub async fn agents<I, S>(&self, names: I) -> Result<Vec<ResolvedAgentEntity>, SeedError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let query = EntityQuery::agents_named(names);
        if query.names.as_ref().is_some_and(|n| n.is_empty()) {
            return Ok(Vec::new());
        }
        let rows = self.store.query(&query).await?;
        let mut resolved = rows
            .into_iter()
            .map(agent_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        resolved.sort_by(|a, b| {
            (&a.owning_context_id, &a.name).cmp(&(&b.owning_context_id, &b.name))
        });
        debug!(count = resolved.len(), "Resolved agents");
        Ok(resolved)
    }
}

fn check_identity(row: &EntityRow) -> Result<(), SeedError> {
    if row.id.is_empty() || row.name.is_empty() || row.owning_context_id.is_empty() {
        return Err(SeedError::EntityResolution(format!(
            "row is missing id, name or owning context: {:?}",
            row
        )));
    }
    Ok(())
}

/// Read a text column. `None` when absent or null, error when not a string.
fn text_column(row: &EntityRow, column: &str) -> Result<Option<String>, SeedError> {
    match row.columns.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(SeedError::EntityResolution(format!(
            "column '{}' of '{}' is not text: {}",
            column, row.name, other
        ))),
    }
}

fn building_from_row(row: EntityRow) -> Result<ResolvedBuildingEntity, SeedError> {
    check_identity(&row)?;
    let type_tag = text_column(&row, BUILDING_TYPE_COLUMN)?.ok_or_else(|| {
        SeedError::EntityResolution(format!("building '{}' has no {}", row.name, BUILDING_TYPE_COLUMN))
    })?;
    Ok(ResolvedBuildingEntity {
        id: row.id,
        name: row.name,
        owning_context_id: row.owning_context_id,
        type_tag,
    })
}

fn agent_from_row(row: EntityRow) -> Result<ResolvedAgentEntity, SeedError> {
    check_identity(&row)?;
    let attributes = AgentAttributes {
        character: text_column(&row, CHARACTER_COLUMN)?.unwrap_or_default(),
        background: text_column(&row, BACKGROUND_COLUMN)?.unwrap_or_default(),
    };
    Ok(ResolvedAgentEntity {
        id: row.id,
        name: row.name,
        owning_context_id: row.owning_context_id,
        attributes,
    })
}
