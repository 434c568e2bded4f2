//! Generate command implementation.

use super::{CliError, CliResult};
use permit_sync_protocol::{Permit, PermitStatus};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;
use uuid::Builder;

/// Permit categories used for sample data.
pub const PERMIT_TYPES: [&str; 5] = ["Building", "Electrical", "Plumbing", "Occupancy", "Zoning"];

/// Statuses used for sample data.
pub const SAMPLE_STATUSES: [PermitStatus; 4] = [
    PermitStatus::Submitted,
    PermitStatus::Approved,
    PermitStatus::Rejected,
    PermitStatus::UnderReview,
];

const PLACES: [&str; 8] = [
    "Riverside", "Oak Street", "Harbor", "Hillcrest", "Maple Avenue", "Northgate", "Cedar Park",
    "Lakeview",
];

const WORKS: [&str; 8] = [
    "Deck Extension",
    "Panel Upgrade",
    "Water Heater",
    "Change of Use",
    "Garage Conversion",
    "Solar Array",
    "Sewer Lateral",
    "Rezoning",
];

const FIRST_NAMES: [&str; 8] = [
    "Avery", "Jordan", "Morgan", "Riley", "Casey", "Taylor", "Quinn", "Rowan",
];

const LAST_NAMES: [&str; 8] = [
    "Nakamura", "Okafor", "Lindqvist", "Moreno", "Haddad", "Kowalski", "Brennan", "Achebe",
];

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

/// Generates `count` sample permits. The same seed yields the same permits.
pub fn generate_permits(count: usize, seed: u64) -> Vec<Permit> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let id = Builder::from_random_bytes(rng.gen()).into_uuid().to_string();
            let name = format!("{} {}", pick(&mut rng, &PLACES), pick(&mut rng, &WORKS));
            let applicant = format!(
                "{} {}",
                pick(&mut rng, &FIRST_NAMES),
                pick(&mut rng, &LAST_NAMES)
            );
            let permit_type = pick(&mut rng, &PERMIT_TYPES);
            let status = SAMPLE_STATUSES[rng.gen_range(0..SAMPLE_STATUSES.len())];
            Permit::with_id(id, name, applicant, permit_type, status)
        })
        .collect()
}

/// Renders permits as a bare array, or as `{"permits": [...]}` when wrapped.
pub fn render(permits: &[Permit], wrap: bool) -> CliResult<String> {
    let list = serde_json::to_value(permits)?;
    let document: Value = if wrap { json!({ "permits": list }) } else { list };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Runs the generate command.
pub fn run(count: usize, seed: u64, output: Option<&Path>, wrap: bool) -> CliResult<()> {
    if count == 0 {
        return Err(CliError::InvalidArgument("count must be at least 1".into()));
    }

    let rendered = render(&generate_permits(count, seed), wrap)?;
    match output {
        Some(path) => {
            fs::write(path, rendered)?;
            info!(count, seed, path = %path.display(), "sample permits written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{rendered}")?;
        }
    }
    Ok(())
}
