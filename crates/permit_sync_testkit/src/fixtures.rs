//! Test fixtures.
//!
//! Named permits, malformed records and a helper for a seeded reference
//! server.

use permit_sync_protocol::{Permit, PermitStatus};
use permit_sync_server::{PermitServer, ServerConfig};
use serde_json::{json, Value};
use std::sync::Arc;

/// Permit "A" with id `1`.
pub fn permit_a() -> Permit {
    Permit::with_id("1", "A", "Avery Quinn", "Building", PermitStatus::Submitted)
}

/// Permit "B" with id `2`.
pub fn permit_b() -> Permit {
    Permit::with_id("2", "B", "Blake Moreno", "Electrical", PermitStatus::UnderReview)
}

/// A permit with a numbered id and name.
pub fn numbered_permit(n: usize) -> Permit {
    let status = PermitStatus::ALL[n % PermitStatus::ALL.len()];
    Permit::with_id(
        format!("permit-{n}"),
        format!("Permit {n}"),
        format!("Applicant {n}"),
        "Plumbing",
        status,
    )
}

/// `count` numbered permits.
pub fn sample_permits(count: usize) -> Vec<Permit> {
    (1..=count).map(numbered_permit).collect()
}

/// Records that fail validation, one per kind of defect.
pub fn malformed_records() -> Vec<Value> {
    vec![
        json!({"invalid": "data"}),
        json!(null),
        json!("permit"),
        json!(42),
        json!({"id": "x1", "permitName": "", "applicantName": "N", "permitType": "T", "status": "SUBMITTED"}),
        json!({"id": "x2", "permitName": "   ", "applicantName": "N", "permitType": "T", "status": "SUBMITTED"}),
        json!({"id": "x3", "permitName": "N", "applicantName": 5, "permitType": "T", "status": "SUBMITTED"}),
        json!({"id": "x4", "permitName": "N", "applicantName": "N", "status": "SUBMITTED"}),
        json!({"id": "x5", "permitName": "N", "applicantName": "N", "permitType": "T", "status": "LOST"}),
        json!({"permitName": "N", "applicantName": "N", "permitType": "T", "status": "SUBMITTED"}),
    ]
}

/// Interleaves valid permits with malformed records.
///
/// Returns the payload and the permits a validating reader should keep.
pub fn mixed_payload(valid: &[Permit], invalid: &[Value]) -> (Value, Vec<Permit>) {
    let mut items = Vec::with_capacity(valid.len() + invalid.len());
    let mut bad = invalid.iter();
    for permit in valid {
        items.push(json!(permit));
        if let Some(record) = bad.next() {
            items.push(record.clone());
        }
    }
    items.extend(bad.cloned());
    (Value::Array(items), valid.to_vec())
}

/// A reference server holding `permits`.
pub fn seeded_server(permits: &[Permit]) -> Arc<PermitServer> {
    let server = PermitServer::new(ServerConfig::default());
    server.seed(permits);
    Arc::new(server)
}
