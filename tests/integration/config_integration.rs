//! Configuration loading feeding the run context.

use imageseed::batch::{BatchSettings, RunMode};
use imageseed::cli::RunContext;
use imageseed::config::SeedConfig;
use imageseed::error::SeedError;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_run_context_loads_explicit_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("imageseed.toml");
    std::fs::write(
        &path,
        r#"
[auth]
identity = "seeder@example.org"
secret = "s3cret"
api_key = "anon"

[store]
building_category = "consulate"

[batch]
pacing_secs = 0.1
"#,
    )
    .unwrap();

    let context = RunContext::new(dir.path(), Some(path)).unwrap();
    let settings = BatchSettings::from_config(context.config());
    assert_eq!(settings.building_category, "consulate");
    assert_eq!(settings.pacing, Duration::from_millis(100));
}

#[test]
fn test_missing_credentials_fail_before_any_network_access() {
    let context = RunContext::from_config(SeedConfig::default());
    let result = context.build_runner(RunMode::Execute);
    assert!(matches!(result, Err(SeedError::Config(msg)) if msg.contains("secret is not set")));
}

#[tokio::test]
async fn test_dry_run_does_not_require_credentials() {
    let context = RunContext::from_config(SeedConfig::default());
    assert!(context.build_runner(RunMode::DryRun).is_ok());
}

#[test]
fn test_configured_catalog_file_must_parse() {
    let dir = TempDir::new().unwrap();
    let bad = dir.path().join("buildings.toml");
    std::fs::write(&bad, "not = [valid").unwrap();

    let mut config = SeedConfig::default();
    config.catalog.buildings = Some(bad);
    let context = RunContext::from_config(config);
    assert!(matches!(
        context.build_runner(RunMode::DryRun),
        Err(SeedError::Catalog(_))
    ));
}
