//! Stats command for summarizing stored reports.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDateTime;

use xing_core::{EventLog, summarize};

pub fn run<W: Write>(
    writer: &mut W,
    log: &EventLog,
    now: NaiveDateTime,
    window_days: u32,
    json: bool,
) -> Result<()> {
    let stats = summarize(log, now, window_days);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&stats)?)?;
        return Ok(());
    }

    let Some(stats) = stats else {
        writeln!(writer, "No reports recorded.")?;
        return Ok(());
    };

    writeln!(writer, "Reports: {} open, {} closed", stats.total_open, stats.total_closed)?;
    writeln!(writer, "Last {window_days} days: {} reports", stats.recent_events)?;
    if stats.peak_closure_hours.is_empty() {
        writeln!(writer, "Peak closure hours: none")?;
    } else {
        writeln!(writer, "Peak closure hours:")?;
        for peak in &stats.peak_closure_hours {
            writeln!(writer, "- {:02}:00 ({})", peak.hour, peak.count)?;
        }
    }
    Ok(())
}
