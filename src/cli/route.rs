//! CLI route: run context. Builds collaborators from configuration and hands
//! off to the batch runner.

use crate::auth::HttpAuthenticator;
use crate::batch::{
    BatchReport, BatchRunner, BatchSettings, CatalogWarning, PassSelection, RunMode,
};
use crate::catalog::Catalogs;
use crate::cli::parse::{Cli, ReportFormat};
use crate::cli::presentation::{format_report_json, format_report_text, format_warnings_text};
use crate::client::HttpImageClient;
use crate::config::{ConfigLoader, SeedConfig};
use crate::error::SeedError;
use crate::store::PgEntityStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Runtime context for one CLI invocation.
pub struct RunContext {
    config: SeedConfig,
}

impl RunContext {
    /// Load configuration from `config_path` or the layered defaults rooted at `work_dir`.
    pub fn new(work_dir: &Path, config_path: Option<PathBuf>) -> Result<Self, SeedError> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(&path)?,
            None => ConfigLoader::load(work_dir)?,
        };
        Ok(Self { config })
    }

    pub fn from_config(config: SeedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    /// Validate configuration and build the runner with live collaborators.
    pub fn build_runner(&self, mode: RunMode) -> Result<BatchRunner, SeedError> {
        self.config
            .validate(mode == RunMode::Execute)
            .map_err(|errors| {
                let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                SeedError::Config(format!(
                    "Configuration validation failed:\n{}",
                    msgs.join("\n")
                ))
            })?;

        let catalogs = Catalogs::load(&self.config.catalog)?;
        info!(
            buildings = catalogs.buildings.len(),
            agents = catalogs.agents.len(),
            "Prompt catalogs loaded"
        );

        let store = PgEntityStore::connect_lazy(&self.config.store)?;
        let authenticator = HttpAuthenticator::new(self.config.auth.clone(), &self.config.service)?;
        let client = HttpImageClient::new(&self.config.service)?;

        Ok(BatchRunner::new(
            Arc::new(store),
            Arc::new(catalogs),
            Arc::new(authenticator),
            Arc::new(client),
            BatchSettings::from_config(&self.config),
        ))
    }

    /// Run the batch selected by the CLI flags. Catalog warnings go to stderr
    /// before any request, independent of the logging configuration.
    pub async fn execute(&self, cli: &Cli) -> Result<BatchReport, SeedError> {
        let mode = run_mode(cli);
        let runner = self
            .build_runner(mode)?
            .with_warning_sink(Arc::new(|warnings: &[CatalogWarning]| {
                eprint!("{}", format_warnings_text(warnings, false));
            }));
        execute_with(&runner, cli).await
    }
}

pub fn run_mode(cli: &Cli) -> RunMode {
    if cli.dry_run {
        RunMode::DryRun
    } else {
        RunMode::Execute
    }
}

/// Run an already-built runner with the CLI's pass selection and mode.
pub async fn execute_with(runner: &BatchRunner, cli: &Cli) -> Result<BatchReport, SeedError> {
    let selection = PassSelection::from_flags(cli.portraits_only, cli.buildings_only);
    runner.run(selection, run_mode(cli)).await
}

/// Render the report in the requested format.
pub fn render(report: &BatchReport, format: ReportFormat, color: bool) -> Result<String, SeedError> {
    match format {
        ReportFormat::Text => Ok(format_report_text(report, color)),
        ReportFormat::Json => format_report_json(report),
    }
}
