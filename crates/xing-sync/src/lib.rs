//! Remote synchronization for the level-crossing tracker.
//!
//! Provides:
//! - [`RemoteLedger`]: the shared event collection, with an HTTP-backed
//!   implementation and an offline one
//! - [`SyncEngine`]: timestamp-keyed pull/merge and push with explicit
//!   failure reasons
//! - [`Tracker`]: the controller owning the local store and the engine

mod engine;
pub mod http;
mod ledger;
mod tracker;

#[cfg(test)]
mod testing;

pub use engine::{PullOutcome, PushOutcome, ResendOutcome, SyncEngine, SyncFailure};
pub use http::HttpLedger;
pub use ledger::{Ledger, LedgerError, LedgerResult, NullLedger, RemoteLedger, RemoteStatus};
pub use tracker::{Recorded, SyncReport, Tracker};
