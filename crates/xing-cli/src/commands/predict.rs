//! Predict command for estimating the barrier status ahead of time.

use std::io::Write;

use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use xing_core::{EventLog, Prediction, PredictionConfig, predict};

#[derive(Debug, Serialize)]
struct PredictionOutput {
    target: String,
    lookahead_minutes: u32,
    #[serde(flatten)]
    prediction: Prediction,
}

pub fn run<W: Write>(
    writer: &mut W,
    log: &EventLog,
    now: NaiveDateTime,
    lookahead_minutes: u32,
    config: &PredictionConfig,
    json: bool,
) -> Result<()> {
    let prediction = predict(log, now, lookahead_minutes, config);
    let target = (now + Duration::minutes(i64::from(lookahead_minutes)))
        .format("%H:%M")
        .to_string();

    if json {
        let output = PredictionOutput {
            target,
            lookahead_minutes,
            prediction,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
        return Ok(());
    }

    let when = if lookahead_minutes == 0 {
        format!("Prediction for {target}")
    } else {
        format!("Prediction for {target} (in {lookahead_minutes} min)")
    };
    match prediction {
        Prediction::Estimate {
            status,
            confidence_percent,
            samples,
        } => writeln!(
            writer,
            "{when}: likely {} ({confidence_percent}% of {samples} reports)",
            status.as_str().to_uppercase()
        )?,
        Prediction::InsufficientData { samples } => writeln!(
            writer,
            "{when}: not enough data ({samples} of {} reports needed)",
            config.min_support
        )?,
    }
    Ok(())
}
