//! Sync command for pulling reports from the remote ledger.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;

use xing_core::Status;
use xing_sync::{RemoteLedger, SyncFailure, SyncReport, Tracker};

/// Runs a single sync round.
pub async fn run<W: Write, L: RemoteLedger>(
    writer: &mut W,
    tracker: &mut Tracker<L>,
) -> Result<()> {
    let report = tracker.sync().await.context("failed to sync")?;
    render(writer, &report)
}

/// Syncs every `interval` until Ctrl-C.
///
/// An interrupted round is dropped before it commits anything.
pub async fn watch<W: Write, L: RemoteLedger>(
    writer: &mut W,
    tracker: &mut Tracker<L>,
    interval: Duration,
) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(interval_secs = interval.as_secs(), "watching remote ledger");

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        tokio::select! {
            report = tracker.sync() => {
                let report = report.context("failed to sync")?;
                render(writer, &report)?;
                writer.flush()?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    writeln!(writer, "Stopped.")?;
    Ok(())
}

pub fn render<W: Write>(writer: &mut W, report: &SyncReport) -> Result<()> {
    if report.failure == Some(SyncFailure::Offline) {
        writeln!(writer, "Offline mode: no remote ledger configured.")?;
        writeln!(writer, "Barrier: {}", label(report.current_status))?;
        return Ok(());
    }

    let changed = report.new_events > 0 || report.resent > 0;
    if report.new_events > 0 {
        writeln!(writer, "Merged {} new report(s).", report.new_events)?;
    }
    if report.resent > 0 {
        writeln!(writer, "Uploaded {} unsynced report(s).", report.resent)?;
    }
    match report.failure {
        Some(failure) if changed => writeln!(writer, "Sync incomplete ({failure}).")?,
        Some(failure) => writeln!(writer, "Sync failed ({failure}); local data unchanged.")?,
        None if !changed => writeln!(writer, "Up to date.")?,
        None => {}
    }
    writeln!(writer, "Barrier: {}", label(report.current_status))?;
    Ok(())
}

fn label(status: Option<Status>) -> String {
    status.map_or_else(|| "unknown".to_string(), |s| s.as_str().to_uppercase())
}
