//! REST-backed ledger speaking the realtime-database JSON layout.
//!
//! - `{base}/events.json`: `POST` appends an event under a generated key,
//!   `GET` returns `{key: event, ...}` or `null`.
//! - `{base}/barrier_status.json`: `PUT`/`GET` of `{"status", "last_update"}`
//!   or `null`.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use reqwest::{Response, Url};

use xing_core::Event;

use crate::ledger::{LedgerError, LedgerResult, RemoteLedger, RemoteStatus};

/// Default request timeout for ledger calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const EVENTS_DOCUMENT: &str = "events.json";
const STATUS_DOCUMENT: &str = "barrier_status.json";

/// HTTP ledger client.
///
/// Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct HttpLedger {
    http: reqwest::Client,
    events_url: Url,
    status_url: Url,
}

impl fmt::Debug for HttpLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // URLs may carry credentials in their query string
        f.debug_struct("HttpLedger")
            .field("host", &self.events_url.host_str())
            .finish_non_exhaustive()
    }
}

impl HttpLedger {
    /// Creates a client for the ledger rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> LedgerResult<Self> {
        let base = parse_base_url(base_url)?;
        let events_url = join(&base, EVENTS_DOCUMENT)?;
        let status_url = join(&base, STATUS_DOCUMENT)?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LedgerError::ClientBuild)?;

        Ok(Self {
            http,
            events_url,
            status_url,
        })
    }

    pub const fn events_url(&self) -> &Url {
        &self.events_url
    }

    pub const fn status_url(&self) -> &Url {
        &self.status_url
    }
}

impl RemoteLedger for HttpLedger {
    async fn append_event(&self, event: &Event) -> LedgerResult<()> {
        let response = self
            .http
            .post(self.events_url.clone())
            .json(event)
            .send()
            .await?;
        ensure_success(&response)?;
        Ok(())
    }

    async fn put_status(&self, status: &RemoteStatus) -> LedgerResult<()> {
        let response = self
            .http
            .put(self.status_url.clone())
            .json(status)
            .send()
            .await?;
        ensure_success(&response)?;
        Ok(())
    }

    async fn get_status(&self) -> LedgerResult<Option<RemoteStatus>> {
        let response = self.http.get(self.status_url.clone()).send().await?;
        ensure_success(&response)?;
        let body = response.text().await?;
        parse_status_payload(&body)
    }

    async fn fetch_events(&self) -> LedgerResult<Vec<Event>> {
        let response = self.http.get(self.events_url.clone()).send().await?;
        ensure_success(&response)?;
        let body = response.text().await?;
        parse_events_payload(&body)
    }
}

fn ensure_success(response: &Response) -> LedgerResult<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(LedgerError::Status {
            status: status.as_u16(),
        })
    }
}

fn parse_base_url(raw: &str) -> LedgerResult<Url> {
    let invalid = |reason: String| LedgerError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    // a trailing slash makes `join` append instead of replacing the last segment
    let normalized = format!("{}/", raw.trim().trim_end_matches('/'));
    let url = Url::parse(&normalized).map_err(|err| invalid(err.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme {other}"))),
    }
}

fn join(base: &Url, document: &str) -> LedgerResult<Url> {
    base.join(document)
        .map_err(|err| LedgerError::InvalidUrl {
            url: base.to_string(),
            reason: err.to_string(),
        })
}

/// Parses the events collection. `null` is an empty collection; a single
/// malformed entry rejects the whole payload.
fn parse_events_payload(body: &str) -> LedgerResult<Vec<Event>> {
    let payload: Option<BTreeMap<String, Event>> = serde_json::from_str(body)
        .map_err(|err| LedgerError::MalformedPayload(err.to_string()))?;
    Ok(payload.unwrap_or_default().into_values().collect())
}

fn parse_status_payload(body: &str) -> LedgerResult<Option<RemoteStatus>> {
    serde_json::from_str(body).map_err(|err| LedgerError::MalformedPayload(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use xing_core::Status;

    #[test]
    fn document_urls_are_joined_under_base() {
        let ledger = HttpLedger::new("https://crossing.example.com", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            ledger.events_url().as_str(),
            "https://crossing.example.com/events.json"
        );
        assert_eq!(
            ledger.status_url().as_str(),
            "https://crossing.example.com/barrier_status.json"
        );
    }

    #[test]
    fn base_path_is_preserved() {
        let ledger =
            HttpLedger::new("https://db.example.com/crossings/lx-42/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            ledger.events_url().as_str(),
            "https://db.example.com/crossings/lx-42/events.json"
        );
    }

    #[test]
    fn rejects_invalid_urls() {
        assert!(matches!(
            HttpLedger::new("not a url", DEFAULT_TIMEOUT),
            Err(LedgerError::InvalidUrl { .. })
        ));
        assert!(matches!(
            HttpLedger::new("ftp://crossing.example.com", DEFAULT_TIMEOUT),
            Err(LedgerError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn debug_hides_full_url() {
        let ledger = HttpLedger::new(
            "https://crossing.example.com/?auth=secret-token",
            DEFAULT_TIMEOUT,
        )
        .unwrap();
        let debug = format!("{ledger:?}");
        assert!(debug.contains("crossing.example.com"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn events_payload_drops_keys() {
        let body = r#"{
            "-NqA1": {"status": "closed", "timestamp": "2024-01-01T08:00:00.123456", "user": "user"},
            "-NqA2": {"status": "offen", "timestamp": "2024-01-01T08:10:00", "user": "local"}
        }"#;
        let events = parse_events_payload(body).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].status, Status::Closed);
        assert_eq!(events[1].status, Status::Open);
    }

    #[test]
    fn null_events_payload_is_empty() {
        assert!(parse_events_payload("null").unwrap().is_empty());
    }

    #[test]
    fn one_bad_event_rejects_payload() {
        let body = r#"{
            "-NqA1": {"status": "closed", "timestamp": "2024-01-01T08:00:00", "user": "user"},
            "-NqA2": {"status": "closed", "user": "user"}
        }"#;
        assert!(matches!(
            parse_events_payload(body),
            Err(LedgerError::MalformedPayload(_))
        ));
    }

    #[test]
    fn status_payload_may_be_null() {
        assert_eq!(parse_status_payload("null").unwrap(), None);
        let status = parse_status_payload(
            r#"{"status": "geschlossen", "last_update": "2024-01-01T08:00:00"}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(status.status, Status::Closed);
    }
}
