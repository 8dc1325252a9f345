//! Core domain logic for the level-crossing tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Events: timestamped open/closed barrier reports
//! - Event logs: ordered history and timestamp-keyed merge
//! - Prediction: time-of-day based barrier forecasts
//! - Statistics: counts and peak closure hours

mod event;
mod log;
pub mod predict;
pub mod stats;
mod status;
pub mod time;

pub use event::{Event, timestamp};
pub use log::EventLog;
pub use predict::{Prediction, PredictionConfig, predict};
pub use stats::{HourCount, Stats, StatisticsConfig, summarize};
pub use status::{Status, UnknownStatus};
