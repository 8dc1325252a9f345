//! Display statistics over the event history.

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::log::EventLog;
use crate::status::Status;

/// How many peak closure hours are reported.
pub const PEAK_HOURS: usize = 3;

/// Configuration for [`summarize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Trailing window for recent counts and peak hours. Default: 7.
    pub window_days: u32,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self { window_days: 7 }
    }
}

/// Number of closures observed during one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourCount {
    pub hour: u32,
    pub count: usize,
}

/// Summary of the event history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Open reports over the whole history.
    pub total_open: usize,
    /// Closed reports over the whole history.
    pub total_closed: usize,
    /// Reports inside the trailing window.
    pub recent_events: usize,
    /// Most frequent closure hours inside the window, busiest first.
    pub peak_closure_hours: Vec<HourCount>,
}

/// Summarizes `log` relative to `now`.
///
/// Returns `None` for an empty log. Peak hours with equal counts keep the
/// order in which the hour was first seen.
pub fn summarize(log: &EventLog, now: NaiveDateTime, window_days: u32) -> Option<Stats> {
    if log.is_empty() {
        return None;
    }

    let total_closed = log.iter().filter(|event| event.status.is_closed()).count();
    let total_open = log.len() - total_closed;

    let recent = log.after(now - Duration::days(i64::from(window_days)));

    let mut hours: Vec<HourCount> = Vec::new();
    for event in recent.iter().filter(|event| event.status == Status::Closed) {
        let hour = event.timestamp.hour();
        match hours.iter_mut().find(|entry| entry.hour == hour) {
            Some(entry) => entry.count += 1,
            None => hours.push(HourCount { hour, count: 1 }),
        }
    }
    // stable sort keeps first-seen order among equal counts
    hours.sort_by(|a, b| b.count.cmp(&a.count));
    hours.truncate(PEAK_HOURS);

    Some(Stats {
        total_open,
        total_closed,
        recent_events: recent.len(),
        peak_closure_hours: hours,
    })
}
