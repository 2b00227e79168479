//! Prompt Catalog
//!
//! Hand-authored prompt overrides keyed by entity display name. Two disjoint
//! catalogs exist, one for buildings and one for agents. Both are loaded once
//! at startup from TOML (embedded defaults or configured files) and never
//! mutated afterwards.

use crate::config::CatalogConfig;
use crate::error::SeedError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const DEFAULT_BUILDING_PROMPTS: &str = include_str!("../catalog/buildings.toml");
const DEFAULT_AGENT_PROMPTS: &str = include_str!("../catalog/agents.toml");

/// Result of a catalog lookup. A miss is an ordinary outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptLookup<'a> {
    Found(&'a str),
    Missing,
}

/// Immutable name -> prompt text mapping for one entity kind.
#[derive(Debug, Clone, Default)]
pub struct PromptCatalog {
    entries: BTreeMap<String, String>,
}

impl PromptCatalog {
    /// Build a catalog from (name, prompt) pairs. Later duplicates are rejected.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, SeedError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (name, prompt) in entries {
            let name = name.into();
            let prompt = prompt.into().trim().to_string();
            if name.trim().is_empty() {
                return Err(SeedError::Catalog("prompt key cannot be empty".to_string()));
            }
            if prompt.is_empty() {
                return Err(SeedError::Catalog(format!("prompt for '{}' is empty", name)));
            }
            if map.contains_key(&name) {
                return Err(SeedError::Catalog(format!("duplicate prompt key '{}'", name)));
            }
            map.insert(name, prompt);
        }
        Ok(Self { entries: map })
    }

    /// Parse a flat TOML table of `"Entity Name" = """prompt"""` entries.
    pub fn from_toml_str(source: &str) -> Result<Self, SeedError> {
        let table: BTreeMap<String, String> = toml::from_str(source)
            .map_err(|e| SeedError::Catalog(format!("invalid prompt table: {}", e)))?;
        Self::from_entries(table)
    }

    pub fn from_file(path: &Path) -> Result<Self, SeedError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            SeedError::Catalog(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }

    pub fn lookup(&self, name: &str) -> PromptLookup<'_> {
        match self.entries.get(name) {
            Some(prompt) => PromptLookup::Found(prompt.as_str()),
            None => PromptLookup::Missing,
        }
    }

    /// Catalog keys in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compare catalog keys with the names of resolved entities.
    pub fn coverage<'a, I>(&self, entity_names: I) -> CatalogCoverage
    where
        I: IntoIterator<Item = &'a str>,
    {
        let resolved: BTreeSet<&str> = entity_names.into_iter().collect();
        let unmatched_entities = resolved
            .iter()
            .filter(|name| !self.entries.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        let unused_prompts = self
            .names()
            .filter(|name| !resolved.contains(name))
            .map(str::to_string)
            .collect();
        CatalogCoverage {
            unmatched_entities,
            unused_prompts,
        }
    }
}

/// Disagreement between a catalog and the resolved entity set. Advisory only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCoverage {
    /// Resolved entities with no prompt, sorted.
    pub unmatched_entities: Vec<String>,
    /// Prompts with no resolved entity, sorted.
    pub unused_prompts: Vec<String>,
}

/// The building and agent catalogs.
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    pub buildings: PromptCatalog,
    pub agents: PromptCatalog,
}

impl Catalogs {
    /// The catalogs compiled into the binary.
    pub fn embedded() -> Result<Self, SeedError> {
        Ok(Self {
            buildings: PromptCatalog::from_toml_str(DEFAULT_BUILDING_PROMPTS)?,
            agents: PromptCatalog::from_toml_str(DEFAULT_AGENT_PROMPTS)?,
        })
    }

    /// Load catalogs, replacing either embedded table with a configured file.
    pub fn load(config: &CatalogConfig) -> Result<Self, SeedError> {
        let mut catalogs = Self::embedded()?;
        if let Some(path) = &config.buildings {
            catalogs.buildings = PromptCatalog::from_file(path)?;
        }
        if let Some(path) = &config.agents {
            catalogs.agents = PromptCatalog::from_file(path)?;
        }
        Ok(catalogs)
    }
}
