//! CLI domain: parse, route, output, and presentation only.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::{exit_code, map_error, EXIT_ENTITY_FAILURES, EXIT_FATAL, EXIT_OK};
pub use parse::{Cli, ReportFormat};
pub use presentation::{format_report_json, format_report_text, format_warnings_text};
pub use route::{execute_with, render, run_mode, RunContext};
