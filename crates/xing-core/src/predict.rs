//! Short-horizon barrier prediction from time-of-day history.
//!
//! # Algorithm Summary
//!
//! 1. Reduce `now + lookahead` to its minute of day (the target).
//! 2. Keep events newer than `now - window_days`.
//! 3. Of those, keep events whose minute of day is within `tolerance_minutes`
//!    of the target on the 24h clock face.
//! 4. Below `min_support` samples the outcome is [`Prediction::InsufficientData`].
//! 5. Otherwise the majority status wins, with ties going to open. Confidence
//!    is the majority share in percent, rounded half up.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::log::EventLog;
use crate::status::Status;
use crate::time::{circular_distance, minute_of_day};

/// Tuning knobs for [`predict`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Maximum clock-face distance between an event and the target.
    /// Default: 15.
    pub tolerance_minutes: u32,

    /// Smallest number of matching events an estimate is based on.
    /// Default: 3.
    pub min_support: usize,

    /// How far back history is considered.
    /// Default: 7.
    pub window_days: u32,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            tolerance_minutes: 15,
            min_support: 3,
            window_days: 7,
        }
    }
}

/// Outcome of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Prediction {
    /// Enough history matched the target time.
    Estimate {
        status: Status,
        confidence_percent: u32,
        samples: usize,
    },
    /// Too few matching events to say anything.
    InsufficientData { samples: usize },
}

impl Prediction {
    pub const fn sufficient_data(&self) -> bool {
        matches!(self, Self::Estimate { .. })
    }

    pub const fn status(&self) -> Option<Status> {
        match self {
            Self::Estimate { status, .. } => Some(*status),
            Self::InsufficientData { .. } => None,
        }
    }

    pub const fn confidence_percent(&self) -> Option<u32> {
        match self {
            Self::Estimate {
                confidence_percent, ..
            } => Some(*confidence_percent),
            Self::InsufficientData { .. } => None,
        }
    }

    pub const fn samples(&self) -> usize {
        match self {
            Self::Estimate { samples, .. } | Self::InsufficientData { samples } => *samples,
        }
    }
}

/// Estimates the barrier status `lookahead_minutes` after `now`.
pub fn predict(
    log: &EventLog,
    now: NaiveDateTime,
    lookahead_minutes: u32,
    config: &PredictionConfig,
) -> Prediction {
    let target = minute_of_day(now + Duration::minutes(i64::from(lookahead_minutes)));
    let cutoff = now - Duration::days(i64::from(config.window_days));

    let (closed, total) = log
        .after(cutoff)
        .iter()
        .filter(|event| {
            circular_distance(minute_of_day(event.timestamp), target) <= config.tolerance_minutes
        })
        .fold((0_usize, 0_usize), |(closed, total), event| {
            (closed + usize::from(event.status.is_closed()), total + 1)
        });

    if total == 0 || total < config.min_support {
        tracing::debug!(samples = total, target, "not enough history for a prediction");
        return Prediction::InsufficientData { samples: total };
    }

    let open = total - closed;
    let (status, majority) = if closed > open {
        (Status::Closed, closed)
    } else {
        (Status::Open, open)
    };

    Prediction::Estimate {
        status,
        confidence_percent: rounded_percent(majority, total),
        samples: total,
    }
}

/// `part / total` in percent, rounded half up. `total` must be non-zero.
fn rounded_percent(part: usize, total: usize) -> u32 {
    let percent = (part * 200 + total) / (2 * total);
    u32::try_from(percent).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    use crate::event::Event;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn log(events: &[(Status, NaiveDateTime)]) -> EventLog {
        EventLog::from_events(
            events
                .iter()
                .map(|(status, ts)| Event::new(*status, *ts, "test"))
                .collect(),
        )
    }

    fn config(tolerance_minutes: u32, min_support: usize) -> PredictionConfig {
        PredictionConfig {
            tolerance_minutes,
            min_support,
            window_days: 7,
        }
    }

    #[test]
    fn weekly_pattern_predicts_closed() {
        let history = log(&[
            (Status::Closed, at(1, 8, 0)),
            (Status::Open, at(1, 8, 10)),
            (Status::Closed, at(8, 8, 2)),
        ]);
        // 07:31 + 30 minutes targets 08:01
        let prediction = predict(&history, at(8, 7, 31), 30, &config(15, 3));

        assert_eq!(
            prediction,
            Prediction::Estimate {
                status: Status::Closed,
                confidence_percent: 67,
                samples: 3,
            }
        );
    }

    #[test]
    fn tie_resolves_to_open() {
        let history = log(&[(Status::Open, at(2, 12, 0)), (Status::Closed, at(3, 12, 5))]);
        let prediction = predict(&history, at(4, 12, 0), 0, &config(15, 2));

        assert_eq!(prediction.status(), Some(Status::Open));
        assert_eq!(prediction.confidence_percent(), Some(50));
    }

    #[test]
    fn below_min_support_is_insufficient_regardless_of_status() {
        let closed_only = log(&[(Status::Closed, at(2, 12, 0)), (Status::Closed, at(3, 12, 1))]);
        let prediction = predict(&closed_only, at(4, 12, 0), 0, &config(15, 3));

        assert!(!prediction.sufficient_data());
        assert_eq!(prediction, Prediction::InsufficientData { samples: 2 });
        assert_eq!(prediction.status(), None);
    }

    #[test]
    fn zero_min_support_still_needs_a_sample() {
        let prediction = predict(&EventLog::new(), at(4, 12, 0), 0, &config(15, 0));
        assert_eq!(prediction, Prediction::InsufficientData { samples: 0 });
    }

    #[test]
    fn tolerance_wraps_around_midnight() {
        let history = log(&[(Status::Closed, at(3, 23, 59))]);
        // 23:50 + 11 minutes targets 00:01 on the next day
        let prediction = predict(&history, at(4, 23, 50), 11, &config(2, 1));

        assert_eq!(
            prediction,
            Prediction::Estimate {
                status: Status::Closed,
                confidence_percent: 100,
                samples: 1,
            }
        );
    }

    #[test]
    fn tolerance_bound_is_inclusive() {
        let history = log(&[(Status::Closed, at(3, 8, 15)), (Status::Closed, at(3, 8, 16))]);
        let prediction = predict(&history, at(4, 8, 0), 0, &config(15, 1));
        assert_eq!(prediction.samples(), 1);
    }

    #[test]
    fn history_older_than_window_is_ignored() {
        let history = log(&[
            (Status::Closed, at(1, 8, 0)),
            (Status::Closed, at(2, 8, 0)),
            (Status::Open, at(9, 8, 0)),
        ]);
        // window starts 2024-01-02T08:00 exclusive
        let prediction = predict(&history, at(9, 8, 0), 0, &config(15, 1));

        assert_eq!(prediction.samples(), 1);
        assert_eq!(prediction.status(), Some(Status::Open));
    }

    #[test]
    fn confidence_rounds_half_up() {
        assert_eq!(rounded_percent(2, 3), 67);
        assert_eq!(rounded_percent(1, 3), 33);
        assert_eq!(rounded_percent(5, 8), 63);
        assert_eq!(rounded_percent(4, 4), 100);
    }
}
