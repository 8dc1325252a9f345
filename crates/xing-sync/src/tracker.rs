//! The controller that owns the device's state.
//!
//! A [`Tracker`] owns the [`EventStore`] and the [`SyncEngine`]; the
//! presentation layer drives it and renders what it returns.

use xing_core::{Event, EventLog, Status};
use xing_store::{EventStore, StoreError};

use crate::engine::{PushOutcome, ResendOutcome, SyncEngine, SyncFailure};
use crate::ledger::{RemoteLedger, RemoteStatus};

/// A locally recorded event and what happened when it was pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub event: Event,
    pub push: PushOutcome,
}

/// Summary of one sync round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Remote events committed to the local log.
    pub new_events: usize,
    /// The shared status document, if it could be read.
    pub remote_status: Option<RemoteStatus>,
    /// Local events uploaded because the remote collection lacked them.
    pub resent: usize,
    /// First failure encountered, if any.
    pub failure: Option<SyncFailure>,
    /// Local current status after the round.
    pub current_status: Option<Status>,
}

/// Single owner of the local store and the sync engine.
#[derive(Debug)]
pub struct Tracker<L> {
    store: EventStore,
    engine: SyncEngine<L>,
    origin: String,
}

impl<L: RemoteLedger> Tracker<L> {
    pub fn new(store: EventStore, engine: SyncEngine<L>, origin: impl Into<String>) -> Self {
        Self {
            store,
            engine,
            origin: origin.into(),
        }
    }

    pub const fn store(&self) -> &EventStore {
        &self.store
    }

    pub const fn engine(&self) -> &SyncEngine<L> {
        &self.engine
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Records a report locally, then pushes it.
    ///
    /// The local write is committed before any network call, so a failed
    /// push never loses the report. The next [`sync`](Self::sync) uploads it.
    pub async fn record(&mut self, status: Status) -> Result<Recorded, StoreError> {
        let event = self.store.append(status, &self.origin)?;
        let push = self.engine.push(&event).await;
        Ok(Recorded { event, push })
    }

    /// Pulls remote events into the local store, then uploads local events
    /// the remote collection is missing.
    ///
    /// Nothing is written locally unless the pull brought new events.
    /// Dropping the returned future before the pull completes leaves the
    /// store untouched.
    pub async fn sync(&mut self) -> Result<SyncReport, StoreError> {
        self.store.load();

        let remote_status = self.engine.remote_status().await;
        let pull = self.engine.pull(self.store.log()).await;

        let mut failure = pull
            .failure
            .or_else(|| remote_status.as_ref().err().copied());
        let remote_status = remote_status.ok().flatten();

        if pull.new_events > 0 {
            let status = trusted_status(remote_status.as_ref(), &pull.log);
            self.store.commit_merge(&pull.log, status)?;
            tracing::info!(new_events = pull.new_events, "merged remote events");
        } else {
            tracing::debug!("no new remote events");
        }

        let mut resent = 0;
        if pull.is_success() {
            let outcome = self.upload(&pull.unsent, remote_status.as_ref()).await;
            resent = outcome.sent;
            failure = failure.or(outcome.failure);
        }

        Ok(SyncReport {
            new_events: pull.new_events,
            remote_status,
            resent,
            failure,
            current_status: self.store.current_status(),
        })
    }

    /// Resends `unsent` and, when the newest local event was among them and
    /// the shared status predates it, points the status document at it.
    async fn upload(&self, unsent: &[Event], remote: Option<&RemoteStatus>) -> ResendOutcome {
        if unsent.is_empty() {
            return ResendOutcome {
                sent: 0,
                failure: None,
            };
        }

        let mut outcome = self.engine.resend(unsent).await;
        if outcome.failure.is_some() {
            return outcome;
        }

        let Some(newest) = self.store.log().last() else {
            return outcome;
        };
        let newest_was_unsent =
            unsent.last().map(|event| event.timestamp) == Some(newest.timestamp);
        let status_is_older = remote
            .and_then(|remote| remote.last_update)
            .is_none_or(|updated| updated < newest.timestamp);
        if newest_was_unsent && status_is_older {
            outcome.failure = self.engine.publish_status(newest).await.err();
        }
        outcome
    }
}

/// The remote status, if it is at least as recent as the newest merged event.
///
/// A status document older than the newest event was left behind by an
/// interrupted push; the log is the better source then.
fn trusted_status(remote: Option<&RemoteStatus>, merged: &EventLog) -> Option<Status> {
    let remote = remote?;
    let newest = merged.last()?.timestamp;
    match remote.last_update {
        Some(updated) if updated >= newest => Some(remote.status),
        _ => {
            tracing::warn!(
                remote_status = %remote.status,
                last_update = ?remote.last_update,
                newest_event = %newest,
                "remote status is older than the newest event, deriving status from the log"
            );
            None
        }
    }
}
