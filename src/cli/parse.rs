//! CLI parse: clap types for imageseed. No behavior; definitions only.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Seed building and agent images from hand-authored prompt overrides
#[derive(Parser, Debug)]
#[command(name = "imageseed")]
#[command(about = "Generate images for known buildings and agents using catalog prompts")]
pub struct Cli {
    /// Only run the agent portrait pass
    #[arg(long)]
    pub portraits_only: bool,

    /// Only run the building pass
    #[arg(long)]
    pub buildings_only: bool,

    /// Resolve entities and print the plan without authenticating or generating
    #[arg(long)]
    pub dry_run: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Exit with status 2 when any entity failed
    #[arg(long)]
    pub fail_on_error: bool,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}
