//! Resolved entities: immutable snapshots of store rows taken once per run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity type marker, as sent to the generation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Building,
    Agent,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Building => "building",
            EntityKind::Agent => "agent",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A building row selected for image generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedBuildingEntity {
    pub id: String,
    pub name: String,
    pub owning_context_id: String,
    pub type_tag: String,
}

/// Character and background text of an agent. Absent fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentAttributes {
    #[serde(default)]
    pub character: String,
    #[serde(default)]
    pub background: String,
}

/// An agent row selected for portrait generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAgentEntity {
    pub id: String,
    pub name: String,
    pub owning_context_id: String,
    pub attributes: AgentAttributes,
}
