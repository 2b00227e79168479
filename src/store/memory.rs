//! In-memory entity store.
//!
//! Applies the same selection rules as the Postgres queries: kind, soft-delete
//! flag, building category and name set.

use super::{
    EntityQuery, EntityRow, EntityStore, BACKGROUND_COLUMN, BUILDING_TYPE_COLUMN, CHARACTER_COLUMN,
};
use crate::entity::EntityKind;
use crate::error::SeedError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A stored row with its kind and soft-delete flag.
#[derive(Debug, Clone)]
pub struct StoredEntity {
    pub kind: EntityKind,
    pub deleted: bool,
    pub row: EntityRow,
}

impl StoredEntity {
    pub fn building(id: &str, name: &str, owning_context_id: &str, building_type: &str) -> Self {
        let mut columns = BTreeMap::new();
        columns.insert(
            BUILDING_TYPE_COLUMN.to_string(),
            Value::String(building_type.to_string()),
        );
        Self {
            kind: EntityKind::Building,
            deleted: false,
            row: EntityRow {
                id: id.to_string(),
                name: name.to_string(),
                owning_context_id: owning_context_id.to_string(),
                columns,
            },
        }
    }

    pub fn agent(
        id: &str,
        name: &str,
        owning_context_id: &str,
        character: Option<&str>,
        background: Option<&str>,
    ) -> Self {
        let mut columns = BTreeMap::new();
        if let Some(character) = character {
            columns.insert(CHARACTER_COLUMN.to_string(), Value::String(character.to_string()));
        }
        if let Some(background) = background {
            columns.insert(BACKGROUND_COLUMN.to_string(), Value::String(background.to_string()));
        }
        Self {
            kind: EntityKind::Agent,
            deleted: false,
            row: EntityRow {
                id: id.to_string(),
                name: name.to_string(),
                owning_context_id: owning_context_id.to_string(),
                columns,
            },
        }
    }

    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    fn matches(&self, query: &EntityQuery) -> bool {
        if self.deleted || self.kind != query.kind {
            return false;
        }
        if query.kind == EntityKind::Building {
            if let Some(category) = &query.category {
                let tag = self.row.columns.get(BUILDING_TYPE_COLUMN);
                if tag.and_then(Value::as_str) != Some(category.as_str()) {
                    return false;
                }
            }
        }
        match &query.names {
            Some(names) => names.iter().any(|n| n == &self.row.name),
            None => true,
        }
    }
}

/// Entity store backed by a vector of rows.
#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    entities: Vec<StoredEntity>,
    queries: AtomicUsize,
}

impl MemoryEntityStore {
    pub fn new(entities: Vec<StoredEntity>) -> Self {
        Self {
            entities,
            queries: AtomicUsize::new(0),
        }
    }

    /// Number of queries served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn query(&self, query: &EntityQuery) -> Result<Vec<EntityRow>, SeedError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .entities
            .iter()
            .filter(|e| e.matches(query))
            .map(|e| e.row.clone())
            .collect())
    }
}
