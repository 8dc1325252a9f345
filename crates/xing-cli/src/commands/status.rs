//! Status command for showing the barrier state and the last report.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDateTime;

use xing_core::{Status, time, timestamp};
use xing_store::EventStore;
use xing_sync::{RemoteLedger, SyncEngine, SyncFailure};

pub async fn run<W: Write, L: RemoteLedger>(
    writer: &mut W,
    store: &EventStore,
    engine: Option<&SyncEngine<L>>,
) -> Result<()> {
    render_local(writer, store, time::now())?;
    if let Some(engine) = engine {
        match engine.remote_status().await {
            Ok(Some(remote)) => {
                let updated = remote
                    .last_update
                    .map_or_else(|| "unknown".to_string(), |ts| timestamp::format(&ts));
                writeln!(
                    writer,
                    "Shared status: {} (updated {updated})",
                    label(Some(remote.status))
                )?;
            }
            Ok(None) => writeln!(writer, "Shared status: not set")?,
            Err(SyncFailure::Offline) => {
                writeln!(writer, "Shared status: unavailable (offline mode)")?;
            }
            Err(failure) => writeln!(writer, "Shared status: unavailable ({failure})")?,
        }
    }
    Ok(())
}

/// Writes the locally known status relative to `now`.
pub fn render_local<W: Write>(
    writer: &mut W,
    store: &EventStore,
    now: NaiveDateTime,
) -> Result<()> {
    writeln!(writer, "Barrier: {}", label(store.current_status()))?;

    let Some(last) = store.log().last() else {
        writeln!(writer, "No reports yet.")?;
        return Ok(());
    };
    writeln!(
        writer,
        "Last report: {} by {}, {} ({})",
        last.status,
        last.origin,
        time::format_age(now - last.timestamp),
        timestamp::format(&last.timestamp)
    )?;
    writeln!(writer, "Reports stored: {}", store.log().len())?;
    Ok(())
}

fn label(status: Option<Status>) -> String {
    status.map_or_else(|| "unknown".to_string(), |s| s.as_str().to_uppercase())
}
