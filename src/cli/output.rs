//! CLI output: error mapping and exit status.

use crate::batch::BatchReport;
use crate::error::SeedError;

/// Completed batch.
pub const EXIT_OK: i32 = 0;
/// Fatal error: configuration, authentication or entity resolution.
pub const EXIT_FATAL: i32 = 1;
/// Completed batch with per-entity failures, only with `--fail-on-error`.
pub const EXIT_ENTITY_FAILURES: i32 = 2;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &SeedError) -> String {
    match e {
        SeedError::Authentication(_) => format!("{}\nNo generation requests were made.", e),
        SeedError::EntityResolution(_) => {
            format!("{}\nCould not determine which entities to process.", e)
        }
        _ => e.to_string(),
    }
}

/// Exit status for a completed batch.
pub fn exit_code(report: &BatchReport, fail_on_error: bool) -> i32 {
    if fail_on_error && report.has_failures() {
        EXIT_ENTITY_FAILURES
    } else {
        EXIT_OK
    }
}
