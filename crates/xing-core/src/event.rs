//! Barrier reports as recorded by a device.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::status::Status;

/// A single timestamped report of the barrier state.
///
/// The timestamp is the identity of an event: two events with equal
/// timestamps are the same event, whatever their other fields say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Reported barrier state.
    pub status: Status,
    /// Local wall-clock time of the report.
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    /// Device or user that made the report.
    #[serde(rename = "user", default = "default_origin")]
    pub origin: String,
}

fn default_origin() -> String {
    "unknown".to_string()
}

impl Event {
    pub fn new(status: Status, timestamp: NaiveDateTime, origin: impl Into<String>) -> Self {
        Self {
            status,
            timestamp,
            origin: origin.into(),
        }
    }
}

/// ISO 8601 local datetime encoding shared by storage and the remote ledger.
///
/// Whole seconds are written without a fraction, anything finer with exactly
/// six fractional digits. Peers compare timestamps as strings, so the output
/// must not vary for the same instant.
pub mod timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    const SECONDS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
    const MICROS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

    pub fn format(ts: &NaiveDateTime) -> String {
        if ts.nanosecond() == 0 {
            ts.format(SECONDS_FORMAT).to_string()
        } else {
            ts.format(MICROS_FORMAT).to_string()
        }
    }

    /// Parses a naive local datetime, falling back to RFC 3339 with an
    /// offset (converted to local time).
    pub fn parse(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        s.parse::<NaiveDateTime>().or_else(|err| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Local).naive_local())
                .map_err(|_| err)
        })
    }

    pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    /// Same encoding for optional fields.
    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        #[allow(clippy::ref_option)]
        pub fn serialize<S>(ts: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match ts {
                Some(ts) => serializer.serialize_str(&super::format(ts)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|s| super::parse(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
