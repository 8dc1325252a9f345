//! The remote event collection and its implementations.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use xing_core::{Event, Status, timestamp};

use crate::http::HttpLedger;

/// Remote ledger errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The configured base URL is unusable.
    #[error("invalid ledger URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed (connect, timeout, body read).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The ledger answered with a non-2xx status.
    #[error("ledger returned status {status}")]
    Status { status: u16 },
    /// The response body did not have the expected shape.
    #[error("malformed ledger payload: {0}")]
    MalformedPayload(String),
    /// No remote ledger is configured.
    #[error("no remote ledger configured")]
    Offline,
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// The shared "current status" document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStatus {
    pub status: Status,
    #[serde(default, with = "timestamp::option")]
    pub last_update: Option<NaiveDateTime>,
}

/// A remote, shared collection of events plus a singleton status document.
///
/// Implementations report failures through [`LedgerError`]; deciding what a
/// failure means for the device is left to [`SyncEngine`](crate::SyncEngine).
pub trait RemoteLedger {
    /// Appends one event document (`POST events`).
    fn append_event(&self, event: &Event) -> impl Future<Output = LedgerResult<()>> + Send;

    /// Overwrites the status document (`PUT status`).
    fn put_status(&self, status: &RemoteStatus)
    -> impl Future<Output = LedgerResult<()>> + Send;

    /// Reads the status document (`GET status`); `None` when it does not exist.
    fn get_status(&self) -> impl Future<Output = LedgerResult<Option<RemoteStatus>>> + Send;

    /// Reads every event document (`GET events`). Document keys are dropped.
    fn fetch_events(&self) -> impl Future<Output = LedgerResult<Vec<Event>>> + Send;
}

impl<T: RemoteLedger + Send + Sync> RemoteLedger for Arc<T> {
    fn append_event(&self, event: &Event) -> impl Future<Output = LedgerResult<()>> + Send {
        self.as_ref().append_event(event)
    }

    fn put_status(
        &self,
        status: &RemoteStatus,
    ) -> impl Future<Output = LedgerResult<()>> + Send {
        self.as_ref().put_status(status)
    }

    fn get_status(&self) -> impl Future<Output = LedgerResult<Option<RemoteStatus>>> + Send {
        self.as_ref().get_status()
    }

    fn fetch_events(&self) -> impl Future<Output = LedgerResult<Vec<Event>>> + Send {
        self.as_ref().fetch_events()
    }
}

/// Ledger used when no remote is configured. Every call fails with
/// [`LedgerError::Offline`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLedger;

impl RemoteLedger for NullLedger {
    async fn append_event(&self, _event: &Event) -> LedgerResult<()> {
        Err(LedgerError::Offline)
    }

    async fn put_status(&self, _status: &RemoteStatus) -> LedgerResult<()> {
        Err(LedgerError::Offline)
    }

    async fn get_status(&self) -> LedgerResult<Option<RemoteStatus>> {
        Err(LedgerError::Offline)
    }

    async fn fetch_events(&self) -> LedgerResult<Vec<Event>> {
        Err(LedgerError::Offline)
    }
}

/// The ledger variant chosen once at startup.
#[derive(Debug)]
pub enum Ledger {
    Http(HttpLedger),
    Offline(NullLedger),
}

impl Ledger {
    /// HTTP ledger when `url` is set and non-blank, offline otherwise.
    pub fn from_url(url: Option<&str>, timeout: Duration) -> LedgerResult<Self> {
        match url.map(str::trim).filter(|url| !url.is_empty()) {
            Some(url) => Ok(Self::Http(HttpLedger::new(url, timeout)?)),
            None => Ok(Self::Offline(NullLedger)),
        }
    }

    pub const fn is_offline(&self) -> bool {
        matches!(self, Self::Offline(_))
    }
}

impl RemoteLedger for Ledger {
    async fn append_event(&self, event: &Event) -> LedgerResult<()> {
        match self {
            Self::Http(ledger) => ledger.append_event(event).await,
            Self::Offline(ledger) => ledger.append_event(event).await,
        }
    }

    async fn put_status(&self, status: &RemoteStatus) -> LedgerResult<()> {
        match self {
            Self::Http(ledger) => ledger.put_status(status).await,
            Self::Offline(ledger) => ledger.put_status(status).await,
        }
    }

    async fn get_status(&self) -> LedgerResult<Option<RemoteStatus>> {
        match self {
            Self::Http(ledger) => ledger.get_status().await,
            Self::Offline(ledger) => ledger.get_status().await,
        }
    }

    async fn fetch_events(&self) -> LedgerResult<Vec<Event>> {
        match self {
            Self::Http(ledger) => ledger.fetch_events().await,
            Self::Offline(ledger) => ledger.fetch_events().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_url_selects_offline_ledger() {
        let timeout = Duration::from_secs(1);
        assert!(Ledger::from_url(None, timeout).unwrap().is_offline());
        assert!(Ledger::from_url(Some("   "), timeout).unwrap().is_offline());
    }

    #[test]
    fn url_selects_http_ledger() {
        let ledger = Ledger::from_url(
            Some("https://crossing.example.com/"),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(matches!(ledger, Ledger::Http(_)));
    }

    #[test]
    fn remote_status_uses_wire_field_names() {
        let status: RemoteStatus =
            serde_json::from_str(r#"{"status":"offen","last_update":"2024-01-01T08:00:00.500000"}"#)
                .unwrap();
        assert_eq!(status.status, Status::Open);
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            serde_json::json!({"status": "open", "last_update": "2024-01-01T08:00:00.500000"})
        );
    }

    #[test]
    fn remote_status_tolerates_missing_last_update() {
        let status: RemoteStatus = serde_json::from_str(r#"{"status":"closed"}"#).unwrap();
        assert_eq!(status.last_update, None);
    }

    #[tokio::test]
    async fn null_ledger_is_always_offline() {
        let ledger = NullLedger;
        assert!(matches!(
            ledger.fetch_events().await,
            Err(LedgerError::Offline)
        ));
        assert!(matches!(ledger.get_status().await, Err(LedgerError::Offline)));
    }
}
