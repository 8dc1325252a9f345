//! Reconciles the local log with the remote ledger.
//!
//! Remote failures never escape this module: each operation returns its
//! outcome together with a [`SyncFailure`] reason code, and on failure the
//! caller's data comes back untouched.

use std::collections::HashSet;
use std::fmt;

use xing_core::{Event, EventLog};

use crate::ledger::{LedgerError, RemoteLedger, RemoteStatus};

/// Why a remote operation did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncFailure {
    /// No remote ledger is configured.
    Offline,
    /// The ledger could not be reached (connect error, timeout, bad URL).
    Unreachable,
    /// The ledger answered with a non-2xx status.
    HttpStatus(u16),
    /// The ledger answered with something that is not a valid payload.
    MalformedPayload,
}

impl From<&LedgerError> for SyncFailure {
    fn from(err: &LedgerError) -> Self {
        match err {
            LedgerError::Offline => Self::Offline,
            LedgerError::Status { status } => Self::HttpStatus(*status),
            LedgerError::MalformedPayload(_) => Self::MalformedPayload,
            LedgerError::InvalidUrl { .. }
            | LedgerError::ClientBuild(_)
            | LedgerError::Request(_) => Self::Unreachable,
        }
    }
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offline => f.write_str("offline"),
            Self::Unreachable => f.write_str("remote unreachable"),
            Self::HttpStatus(status) => write!(f, "remote returned status {status}"),
            Self::MalformedPayload => f.write_str("malformed remote payload"),
        }
    }
}

/// Result of [`SyncEngine::pull`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullOutcome {
    /// The merged log, or the unchanged local log on failure.
    pub log: EventLog,
    /// Remote events that were not in the local log.
    pub new_events: usize,
    /// Local events the remote collection does not have, oldest first.
    /// Empty on failure.
    pub unsent: Vec<Event>,
    pub failure: Option<SyncFailure>,
}

impl PullOutcome {
    pub const fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Result of [`SyncEngine::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Event appended and status document updated.
    Pushed,
    /// Event appended but the status document was not updated. The remote
    /// status stays stale until the next successful push.
    StatusStale(SyncFailure),
    /// Event not appended.
    Failed(SyncFailure),
}

impl PushOutcome {
    /// Whether the event reached the remote collection.
    pub const fn is_success(self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Result of [`SyncEngine::resend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResendOutcome {
    /// Events appended before the first failure.
    pub sent: usize,
    pub failure: Option<SyncFailure>,
}

/// Pulls and pushes events through a [`RemoteLedger`].
#[derive(Debug)]
pub struct SyncEngine<L> {
    ledger: L,
    fetch_limit: Option<usize>,
}

impl<L: RemoteLedger> SyncEngine<L> {
    pub const fn new(ledger: L) -> Self {
        Self {
            ledger,
            fetch_limit: None,
        }
    }

    /// Keeps only the `limit` newest remote events on each pull.
    #[must_use]
    pub fn with_fetch_limit(mut self, limit: Option<usize>) -> Self {
        self.fetch_limit = limit;
        self
    }

    pub const fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Fetches the whole remote collection and unions it into `local`.
    pub async fn pull(&self, local: &EventLog) -> PullOutcome {
        let remote = match self.ledger.fetch_events().await {
            Ok(remote) => remote,
            Err(err) => {
                report(&err, "pull");
                return PullOutcome {
                    log: local.clone(),
                    new_events: 0,
                    unsent: Vec::new(),
                    failure: Some(SyncFailure::from(&err)),
                };
            }
        };

        let fetched = remote.len();
        let unsent = missing_from(local, &remote);
        let remote = self.limit(remote);
        let (log, new_events) = local.union(remote);
        tracing::debug!(fetched, new_events, unsent = unsent.len(), "pulled remote events");

        PullOutcome {
            log,
            new_events,
            unsent,
            failure: None,
        }
    }

    /// Appends `event` remotely, then points the status document at it.
    ///
    /// The two writes are independent; see [`PushOutcome::StatusStale`].
    pub async fn push(&self, event: &Event) -> PushOutcome {
        if let Err(err) = self.ledger.append_event(event).await {
            report(&err, "push");
            return PushOutcome::Failed(SyncFailure::from(&err));
        }

        match self.publish_status(event).await {
            Ok(()) => {
                tracing::info!(
                    status = %event.status,
                    timestamp = %event.timestamp,
                    "pushed event"
                );
                PushOutcome::Pushed
            }
            Err(failure) => PushOutcome::StatusStale(failure),
        }
    }

    /// Appends events the remote collection is missing, in order, stopping
    /// at the first failure. The status document is left alone.
    pub async fn resend(&self, events: &[Event]) -> ResendOutcome {
        let mut sent = 0;
        for event in events {
            if let Err(err) = self.ledger.append_event(event).await {
                report(&err, "resend");
                return ResendOutcome {
                    sent,
                    failure: Some(SyncFailure::from(&err)),
                };
            }
            sent += 1;
        }
        if sent > 0 {
            tracing::info!(sent, "resent local events");
        }
        ResendOutcome {
            sent,
            failure: None,
        }
    }

    /// Points the shared status document at `event`.
    pub async fn publish_status(&self, event: &Event) -> Result<(), SyncFailure> {
        let status = RemoteStatus {
            status: event.status,
            last_update: Some(xing_core::time::now()),
        };
        self.ledger.put_status(&status).await.map_err(|err| {
            report(&err, "publish status");
            SyncFailure::from(&err)
        })
    }

    /// Best-effort read of the shared status document.
    pub async fn remote_status(&self) -> Result<Option<RemoteStatus>, SyncFailure> {
        self.ledger.get_status().await.map_err(|err| {
            report(&err, "remote status");
            SyncFailure::from(&err)
        })
    }

    fn limit(&self, mut remote: Vec<Event>) -> Vec<Event> {
        if let Some(limit) = self.fetch_limit {
            if remote.len() > limit {
                remote.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                remote.truncate(limit);
            }
        }
        remote
    }
}

/// Local events whose timestamp is absent from `remote`.
fn missing_from(local: &EventLog, remote: &[Event]) -> Vec<Event> {
    let remote: HashSet<_> = remote.iter().map(|event| event.timestamp).collect();
    local
        .iter()
        .filter(|event| !remote.contains(&event.timestamp))
        .cloned()
        .collect()
}

fn report(err: &LedgerError, operation: &'static str) {
    if matches!(err, LedgerError::Offline) {
        tracing::debug!(operation, "skipping remote operation in offline mode");
    } else {
        tracing::warn!(operation, error = %err, "remote operation failed, continuing locally");
    }
}
