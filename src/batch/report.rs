//! Batch outcomes: per-entity dispositions, catalog warnings, and the run report.

use crate::client::ArtifactLocation;
use crate::entity::EntityKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoPrompt,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoPrompt => f.write_str("no prompt"),
        }
    }
}

/// What happened to one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Disposition {
    Generated { image_url: ArtifactLocation },
    Skipped { reason: SkipReason },
    Failed { cause: String },
    /// Dry run: a request would have been issued.
    Planned,
}

impl Disposition {
    pub fn is_failure(&self) -> bool {
        matches!(self, Disposition::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityOutcome {
    pub kind: EntityKind,
    pub entity_id: String,
    pub name: String,
    pub owning_context_id: String,
    #[serde(flatten)]
    pub disposition: Disposition,
}

impl fmt::Display for EntityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.disposition {
            Disposition::Generated { image_url } => write!(f, "{} -> {}", self.name, image_url),
            Disposition::Skipped { reason } => {
                write!(f, "{} -> SKIPPED ({})", self.name, reason)
            }
            Disposition::Failed { cause } => write!(f, "{} -> ERROR: {}", self.name, cause),
            Disposition::Planned => write!(f, "{} -> would generate", self.name),
        }
    }
}

/// Advisory mismatch between a catalog and the resolved entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum CatalogWarning {
    EntityWithoutPrompt { kind: EntityKind, name: String },
    PromptWithoutEntity { kind: EntityKind, name: String },
}

impl fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogWarning::EntityWithoutPrompt { kind, name } => {
                write!(f, "{} \"{}\" has no prompt in the catalog", kind, name)
            }
            CatalogWarning::PromptWithoutEntity { kind, name } => {
                write!(f, "prompt \"{}\" has no matching {}", name, kind)
            }
        }
    }
}

/// Counts for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub generated: usize,
    pub missing_url: usize,
    pub skipped: usize,
    pub failed: usize,
    pub planned: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub kind: EntityKind,
    pub outcomes: Vec<EntityOutcome>,
}

impl PassReport {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            outcomes: Vec::new(),
        }
    }

    pub fn summary(&self) -> PassSummary {
        let mut summary = PassSummary::default();
        for outcome in &self.outcomes {
            match &outcome.disposition {
                Disposition::Generated {
                    image_url: ArtifactLocation::Url(_),
                } => summary.generated += 1,
                Disposition::Generated {
                    image_url: ArtifactLocation::Missing,
                } => summary.missing_url += 1,
                Disposition::Skipped { .. } => summary.skipped += 1,
                Disposition::Failed { .. } => summary.failed += 1,
                Disposition::Planned => summary.planned += 1,
            }
        }
        summary
    }
}

/// Full result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub warnings: Vec<CatalogWarning>,
    pub passes: Vec<PassReport>,
}

impl BatchReport {
    pub fn outcomes(&self) -> impl Iterator<Item = &EntityOutcome> {
        self.passes.iter().flat_map(|p| p.outcomes.iter())
    }

    pub fn pass(&self, kind: EntityKind) -> Option<&PassReport> {
        self.passes.iter().find(|p| p.kind == kind)
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes()
            .filter(|o| o.disposition.is_failure())
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }
}
