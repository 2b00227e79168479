//! Batch Orchestrator
//!
//! Drives the building pass and the agent pass. Entities are resolved once,
//! compared against the catalogs for advisory warnings, then processed strictly
//! one at a time with a fixed pause between consecutive generation requests.
//! Per-entity failures become outcomes; only authentication and entity
//! resolution failures abort the run.

pub mod report;

pub use report::{
    BatchReport, CatalogWarning, Disposition, EntityOutcome, PassReport, PassSummary, SkipReason,
};

use crate::auth::{AccessToken, SessionAuthenticator};
use crate::catalog::{Catalogs, PromptCatalog, PromptLookup};
use crate::client::{GenerationRequest, ImageRequestClient};
use crate::config::SeedConfig;
use crate::entity::EntityKind;
use crate::error::SeedError;
use crate::store::{EntityLocator, EntityStore};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Which passes to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSelection {
    pub buildings: bool,
    pub agents: bool,
}

impl PassSelection {
    pub fn all() -> Self {
        Self {
            buildings: true,
            agents: true,
        }
    }

    /// Each flag restricts the run to its own pass; both or neither run everything.
    pub fn from_flags(portraits_only: bool, buildings_only: bool) -> Self {
        match (portraits_only, buildings_only) {
            (true, false) => Self {
                buildings: false,
                agents: true,
            },
            (false, true) => Self {
                buildings: true,
                agents: false,
            },
            _ => Self::all(),
        }
    }
}

impl Default for PassSelection {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Execute,
    /// Resolve and plan only; no authentication, no generation requests.
    DryRun,
}

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSettings {
    /// Pause between consecutive generation requests.
    pub pacing: Duration,
    /// Category marker of the buildings to seed.
    pub building_category: String,
}

impl BatchSettings {
    pub fn from_config(config: &SeedConfig) -> Self {
        Self {
            pacing: config.batch.pacing(),
            building_category: config.store.building_category.clone(),
        }
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self::from_config(&SeedConfig::default())
    }
}

struct Pacer {
    delay: Duration,
    issued: bool,
}

impl Pacer {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            issued: false,
        }
    }

    async fn wait_turn(&mut self) {
        if self.issued && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.issued = true;
    }
}

/// Receives catalog warnings after resolution and before authentication.
pub type WarningSink = dyn Fn(&[CatalogWarning]) + Send + Sync;

pub struct BatchRunner {
    store: Arc<dyn EntityStore>,
    catalogs: Arc<Catalogs>,
    authenticator: Arc<dyn SessionAuthenticator>,
    client: Arc<dyn ImageRequestClient>,
    settings: BatchSettings,
    warning_sink: Option<Arc<WarningSink>>,
}

impl BatchRunner {
    pub fn new(
        store: Arc<dyn EntityStore>,
        catalogs: Arc<Catalogs>,
        authenticator: Arc<dyn SessionAuthenticator>,
        client: Arc<dyn ImageRequestClient>,
        settings: BatchSettings,
    ) -> Self {
        Self {
            store,
            catalogs,
            authenticator,
            client,
            settings,
            warning_sink: None,
        }
    }

    /// Hand pre-flight warnings to `sink` as soon as they are known.
    pub fn with_warning_sink(mut self, sink: Arc<WarningSink>) -> Self {
        self.warning_sink = Some(sink);
        self
    }

    pub async fn run(&self, selection: PassSelection, mode: RunMode) -> Result<BatchReport, SeedError> {
        let started_at = Utc::now();
        info!(?selection, ?mode, "Batch starting");

        let locator = EntityLocator::new(self.store.as_ref());
        let buildings = if selection.buildings {
            locator.buildings(&self.settings.building_category).await?
        } else {
            Vec::new()
        };
        let agents = if selection.agents {
            locator.agents(self.catalogs.agents.names()).await?
        } else {
            Vec::new()
        };

        let mut warnings = Vec::new();
        if selection.buildings {
            warnings.extend(catalog_warnings(
                EntityKind::Building,
                &self.catalogs.buildings,
                buildings.iter().map(|b| b.name.as_str()),
            ));
        }
        if selection.agents {
            warnings.extend(catalog_warnings(
                EntityKind::Agent,
                &self.catalogs.agents,
                agents.iter().map(|a| a.name.as_str()),
            ));
        }
        for warning in &warnings {
            warn!(%warning, "Catalog mismatch");
        }
        if let Some(sink) = &self.warning_sink {
            if !warnings.is_empty() {
                sink(warnings.as_slice());
            }
        }

        let token = match mode {
            RunMode::Execute => Some(self.authenticator.authenticate().await?),
            RunMode::DryRun => None,
        };

        let mut pacer = Pacer::new(self.settings.pacing);
        let mut passes = Vec::new();

        if selection.buildings {
            let mut pass = PassReport::new(EntityKind::Building);
            for building in &buildings {
                let disposition = match self.catalogs.buildings.lookup(&building.name) {
                    PromptLookup::Found(prompt) => {
                        let request = GenerationRequest::for_building(building, prompt);
                        self.dispatch(token.as_ref(), &mut pacer, &request).await
                    }
                    PromptLookup::Missing => Disposition::Skipped {
                        reason: SkipReason::NoPrompt,
                    },
                };
                pass.outcomes.push(record(
                    EntityKind::Building,
                    &building.id,
                    &building.name,
                    &building.owning_context_id,
                    disposition,
                ));
            }
            passes.push(pass);
        }

        if selection.agents {
            let mut pass = PassReport::new(EntityKind::Agent);
            for agent in &agents {
                let disposition = match self.catalogs.agents.lookup(&agent.name) {
                    PromptLookup::Found(prompt) => {
                        let request = GenerationRequest::for_agent(agent, prompt);
                        self.dispatch(token.as_ref(), &mut pacer, &request).await
                    }
                    PromptLookup::Missing => Disposition::Skipped {
                        reason: SkipReason::NoPrompt,
                    },
                };
                pass.outcomes.push(record(
                    EntityKind::Agent,
                    &agent.id,
                    &agent.name,
                    &agent.owning_context_id,
                    disposition,
                ));
            }
            passes.push(pass);
        }

        let report = BatchReport {
            started_at,
            finished_at: Utc::now(),
            dry_run: mode == RunMode::DryRun,
            warnings,
            passes,
        };
        info!(
            entities = report.outcomes().count(),
            failures = report.failure_count(),
            "Batch finished"
        );
        Ok(report)
    }

    /// Issue one request. Never fails: errors become a `Failed` disposition.
    async fn dispatch(
        &self,
        token: Option<&AccessToken>,
        pacer: &mut Pacer,
        request: &GenerationRequest,
    ) -> Disposition {
        let Some(token) = token else {
            return Disposition::Planned;
        };
        pacer.wait_turn().await;
        match self.client.generate(token, request).await {
            Ok(image_url) => Disposition::Generated { image_url },
            Err(failure) => {
                warn!(
                    entity_type = %request.entity_type,
                    entity = %request.entity_name,
                    error = %failure,
                    "Image generation failed"
                );
                Disposition::Failed {
                    cause: failure.to_string(),
                }
            }
        }
    }
}

fn record(
    kind: EntityKind,
    id: &str,
    name: &str,
    owning_context_id: &str,
    disposition: Disposition,
) -> EntityOutcome {
    let outcome = EntityOutcome {
        kind,
        entity_id: id.to_string(),
        name: name.to_string(),
        owning_context_id: owning_context_id.to_string(),
        disposition,
    };
    info!(kind = %kind, outcome = %outcome, "Entity processed");
    outcome
}

fn catalog_warnings<'a>(
    kind: EntityKind,
    catalog: &PromptCatalog,
    names: impl Iterator<Item = &'a str>,
) -> Vec<CatalogWarning> {
    let coverage = catalog.coverage(names);
    let missing = coverage
        .unmatched_entities
        .into_iter()
        .map(|name| CatalogWarning::EntityWithoutPrompt { kind, name });
    let unused = coverage
        .unused_prompts
        .into_iter()
        .map(|name| CatalogWarning::PromptWithoutEntity { kind, name });
    missing.chain(unused).collect()
}
