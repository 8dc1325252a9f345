//! Record command: store a report locally, then push it.

use std::io::Write;

use anyhow::{Context, Result};

use xing_core::{Status, timestamp};
use xing_sync::{PushOutcome, Recorded, RemoteLedger, SyncFailure, Tracker};

pub async fn run<W: Write, L: RemoteLedger>(
    writer: &mut W,
    tracker: &mut Tracker<L>,
    status: Status,
) -> Result<()> {
    let recorded = tracker
        .record(status)
        .await
        .with_context(|| format!("failed to record {status}"))?;
    render(writer, &recorded)
}

pub fn render<W: Write>(writer: &mut W, recorded: &Recorded) -> Result<()> {
    let event = &recorded.event;
    writeln!(
        writer,
        "Recorded {} at {}",
        event.status.as_str().to_uppercase(),
        timestamp::format(&event.timestamp)
    )?;
    match recorded.push {
        PushOutcome::Pushed => writeln!(writer, "Shared with other devices.")?,
        PushOutcome::StatusStale(failure) => writeln!(
            writer,
            "Shared with other devices, but the shared status was not updated ({failure})."
        )?,
        PushOutcome::Failed(SyncFailure::Offline) => {
            writeln!(writer, "Offline mode: saved locally only.")?;
        }
        PushOutcome::Failed(failure) => {
            writeln!(writer, "Saved locally; not shared ({failure}).")?;
        }
    }
    Ok(())
}
