//! Simulate command implementation.
//!
//! Drives a permit board against the in-process reference server through a
//! short session: initial fetch, a create, failed deletes during an outage,
//! a refresh during the outage, then recovery.

use super::generate::generate_permits;
use super::CliResult;
use permit_sync_engine::{
    CollectionTransport, DeleteOutcome, LoopbackClient, PermitBoard, RestTransport, SyncConfig,
    SyncEngine,
};
use permit_sync_protocol::{HttpRequest, Permit, PermitStatus};
use permit_sync_server::PermitServer;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;

/// Rows printed per board snapshot.
const PREVIEW_ROWS: usize = 5;

/// What the session ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSummary {
    /// Permits on the board at the end.
    pub final_count: usize,
    /// Permits the server holds at the end.
    pub server_count: usize,
    /// Error on display at the end.
    pub final_error: String,
}

/// Runs the simulate command.
pub fn run(count: usize, seed: u64) -> CliResult<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let mut stdout = std::io::stdout().lock();
    let summary = runtime.block_on(simulate(count, seed, &mut stdout))?;
    writeln!(
        stdout,
        "Session finished: {} permits on the board, {} on the server",
        summary.final_count, summary.server_count
    )?;
    Ok(())
}

/// Plays the session, writing a board snapshot after each step.
pub async fn simulate(count: usize, seed: u64, out: &mut impl Write) -> CliResult<SimulationSummary> {
    let server = Arc::new(PermitServer::default());
    server.seed(&generate_permits(count, seed));
    server.seed_raw([
        json!({"invalid": "data"}),
        json!({"id": "broken", "permitName": "   ", "applicantName": "N", "permitType": "Zoning", "status": "SUBMITTED"}),
    ]);

    let handle = Arc::clone(&server);
    let client = LoopbackClient::new(move |request: &HttpRequest| handle.handle(request));
    let transport = RestTransport::new(SyncConfig::default(), client);
    let board = PermitBoard::new(Arc::new(SyncEngine::new(SyncConfig::default(), transport)));

    let summary = board.refresh().await?;
    writeln!(
        out,
        "Fetched {} of {} records ({} dropped)",
        summary.kept, summary.total, summary.dropped
    )?;
    print_board(out, "after initial fetch", &board)?;

    let new_permit = Permit::new("Harbor Seawall Repair", "Port Authority", "Building", PermitStatus::Submitted);
    let created = board.create(new_permit).await?;
    writeln!(out, "Created {}", created.display_name())?;
    print_board(out, "after create", &board)?;

    let targets: Vec<String> = board.permits().iter().take(2).map(|p| p.id.clone()).collect();

    server.set_available(false);
    writeln!(out, "Server outage started")?;
    for id in &targets {
        let outcome = board.delete(id).await?;
        writeln!(out, "Delete {id}: {}", describe(outcome))?;
    }
    print_board(out, "after failed deletes", &board)?;

    if let Err(e) = board.refresh().await {
        writeln!(out, "Refresh failed: {e}")?;
    }
    print_board(out, "after refresh during outage", &board)?;

    server.set_available(true);
    writeln!(out, "Server outage ended")?;
    board.refresh().await?;
    if let Some(id) = targets.first() {
        let outcome = board.delete(id).await?;
        writeln!(out, "Delete {id}: {}", describe(outcome))?;
    }
    print_board(out, "after recovery", &board)?;

    let stats = board.engine().stats();
    writeln!(
        out,
        "Stats: {} fetches, {} creates, {} deletes, {} failed deletes, {} dropped entries",
        stats.fetches, stats.creates, stats.deletes, stats.failed_deletes, stats.dropped_entries
    )?;

    Ok(SimulationSummary {
        final_count: board.permits().len(),
        server_count: server.permits().len(),
        final_error: board.error_message(),
    })
}

fn describe(outcome: DeleteOutcome) -> &'static str {
    match outcome {
        DeleteOutcome::Deleted => "deleted",
        DeleteOutcome::Failed => "failed",
        DeleteOutcome::AlreadyInFlight => "already in flight",
    }
}

fn print_board<T: CollectionTransport>(
    out: &mut impl Write,
    title: &str,
    board: &PermitBoard<T>,
) -> CliResult<()> {
    let permits = board.permits();
    writeln!(out, "== {title} ==")?;
    writeln!(out, "  {} permits", permits.len())?;
    for (i, permit) in permits.iter().take(PREVIEW_ROWS).enumerate() {
        writeln!(
            out,
            "  {:>2}. {:<28} {:<20} {:<11} {}",
            i + 1,
            permit.permit_name,
            permit.applicant_name,
            permit.permit_type,
            permit.status.label()
        )?;
    }
    if permits.len() > PREVIEW_ROWS {
        writeln!(out, "      ... {} more", permits.len() - PREVIEW_ROWS)?;
    }
    let error = board.error_message();
    if error.is_empty() {
        writeln!(out, "  error: none")?;
    } else {
        writeln!(out, "  error: {error}")?;
    }
    Ok(())
}
