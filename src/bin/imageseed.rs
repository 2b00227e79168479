//! Imageseed CLI Binary
//!
//! One-shot batch: resolve buildings and agents, authenticate once, request one
//! image per entity with its catalog prompt, print the report.

use clap::Parser;
use imageseed::cli::{exit_code, map_error, render, Cli, RunContext, EXIT_FATAL};
use imageseed::config::ConfigLoader;
use imageseed::logging::{init_logging, LoggingConfig};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let work_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let logging_config = build_logging_config(&cli, &work_dir);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(EXIT_FATAL);
    }

    info!("Imageseed starting");

    let context = match RunContext::new(&work_dir, cli.config.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(EXIT_FATAL);
        }
    };

    let report = match context.execute(&cli).await {
        Ok(report) => report,
        Err(e) => {
            error!("Batch aborted: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(EXIT_FATAL);
        }
    };

    let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    match render(&report, cli.format, color) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", map_error(&e));
            process::exit(EXIT_FATAL);
        }
    }

    let code = exit_code(&report, cli.fail_on_error);
    info!(exit_code = code, "Imageseed finished");
    process::exit(code);
}

/// Build logging configuration from CLI args and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli, work_dir: &Path) -> LoggingConfig {
    let mut config = match cli.config {
        Some(ref config_path) => ConfigLoader::load_from_file(config_path)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default(),
        None => ConfigLoader::load(work_dir)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default(),
    };

    if cli.quiet {
        config.enabled = false;
    }
    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
    }

    config
}
