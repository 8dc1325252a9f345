//! Events command for printing stored reports as JSON Lines.

use std::io::Write;

use anyhow::Result;

use xing_core::EventLog;

pub fn run<W: Write>(writer: &mut W, log: &EventLog, limit: Option<usize>) -> Result<()> {
    let events = log.events();
    let skip = limit.map_or(0, |limit| events.len().saturating_sub(limit));
    for event in &events[skip..] {
        writeln!(writer, "{}", serde_json::to_string(event)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use xing_core::{Event, Status};

    use crate::commands::testing::at;

    #[test]
    fn limit_keeps_newest_reports() {
        let log = EventLog::from_events(vec![
            Event::new(Status::Closed, at(1, 8, 0), "phone"),
            Event::new(Status::Open, at(1, 8, 5), "tablet"),
            Event::new(Status::Closed, at(2, 8, 0), "phone"),
        ]);

        let mut output = Vec::new();
        run(&mut output, &log, Some(2)).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r#"
        {"status":"open","timestamp":"2024-01-01T08:05:00","user":"tablet"}
        {"status":"closed","timestamp":"2024-01-02T08:00:00","user":"phone"}
        "#);
    }
}
