//! Config loader: builds `SeedConfig` from layered sources.

use super::sources::{env, global_file, workspace_file};
use super::SeedConfig;
use config::{Config, ConfigError, File};
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a run started in `work_dir`.
    ///
    /// Precedence (lowest to highest): defaults, global file, `config/config.toml`,
    /// `config/{IMAGESEED_ENV}.toml`, `IMAGESEED__*` environment variables.
    pub fn load(work_dir: &Path) -> Result<SeedConfig, ConfigError> {
        let builder = Config::builder();
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, work_dir)?;
        let builder = env::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Load from an explicit file, skipping the global and working-directory
    /// files. Environment variables still apply on top.
    pub fn load_from_file(path: &Path) -> Result<SeedConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let builder = Config::builder().add_source(File::from(path).required(true));
        let builder = env::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }
}
