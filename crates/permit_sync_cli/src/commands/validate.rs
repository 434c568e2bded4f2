//! Validate command implementation.

use super::{CliError, CliResult};
use permit_sync_protocol::{filter_valid_permits, FilteredPermits, ValidationError};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Outcome of auditing a payload file.
#[derive(Debug, Serialize)]
pub struct ValidateReport {
    /// Entries that passed validation.
    pub kept: usize,
    /// Positions of dropped entries.
    pub dropped: Vec<usize>,
    /// Entries in the payload.
    pub total: usize,
}

impl From<FilteredPermits> for ValidateReport {
    fn from(filtered: FilteredPermits) -> Self {
        Self {
            kept: filtered.permits.len(),
            dropped: filtered.dropped,
            total: filtered.total,
        }
    }
}

/// Runs the validation gate over a payload.
///
/// With a `key`, the payload must be an object and the list is read from
/// that field.
pub fn audit(document: &Value, key: Option<&str>) -> CliResult<ValidateReport> {
    let payload = match key {
        Some(key) => document
            .get(key)
            .ok_or(ValidationError::MalformedEnvelope)?,
        None => document,
    };
    Ok(filter_valid_permits(payload)?.into())
}

/// Runs the validate command.
pub fn run(path: &Path, key: Option<&str>, format: &str) -> CliResult<()> {
    let document: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    let report = audit(&document, key)?;
    if report.dropped.is_empty() {
        info!(path = %path.display(), kept = report.kept, "payload audited");
    } else {
        warn!(
            path = %path.display(),
            kept = report.kept,
            dropped = report.dropped.len(),
            "payload has invalid entries"
        );
    }

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => {
            println!("Payload: {}", path.display());
            println!("  Entries: {}", report.total);
            println!("  Kept:    {}", report.kept);
            println!("  Dropped: {}", report.dropped.len());
            if !report.dropped.is_empty() {
                let positions: Vec<String> =
                    report.dropped.iter().map(ToString::to_string).collect();
                println!("  Dropped positions: {}", positions.join(", "));
            }
        }
        other => return Err(CliError::InvalidArgument(format!("unknown format {other}"))),
    }
    Ok(())
}
