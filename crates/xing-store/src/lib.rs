//! Storage layer for the level-crossing tracker.
//!
//! Persists the event log and the cached current status as a single JSON
//! document:
//!
//! ```json
//! {
//!   "events": [{"status": "closed", "timestamp": "2024-01-01T08:00:00", "user": "pixel-7"}],
//!   "current_status": "closed"
//! }
//! ```
//!
//! # Durability
//!
//! Every write goes to a temporary file in the same directory which is then
//! renamed over the document, so an interrupted write leaves the previous
//! version intact.
//!
//! # Concurrency
//!
//! Mutations take an exclusive lock on `<path>.lock`, re-read the document,
//! apply the change and write it back before releasing the lock. Two
//! processes sharing a data file therefore never lose each other's events.
//! Within a process, [`EventStore`] mutation requires `&mut self`.
//!
//! # Corruption
//!
//! A document that fails to parse is moved aside to `<path>.corrupt` and the
//! store starts from an empty log.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use xing_core::{Event, EventLog, Status};

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the document failed.
    #[error("I/O error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Could not take the store lock.
    #[error("failed to lock {}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Failed to encode the document.
    #[error("failed to encode event store: {0}")]
    Encode(#[from] serde_json::Error),
    /// A merge would have dropped local events.
    #[error("merge invariant violated: {0}")]
    Invariant(String),
}

/// On-disk document shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct StoredState {
    #[serde(default)]
    events: EventLog,
    #[serde(default)]
    current_status: Option<Status>,
}

/// Append-only, file-backed event log with a cached current status.
#[derive(Debug)]
pub struct EventStore {
    path: PathBuf,
    state: StoredState,
}

impl EventStore {
    /// Opens the store at `path`, loading whatever is there.
    ///
    /// Never fails: a missing or unreadable document yields an empty log.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = read_state(&path);
        tracing::debug!(path = %path.display(), events = state.events.len(), "opened event store");
        Self { path, state }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn log(&self) -> &EventLog {
        &self.state.events
    }

    /// Cached status, `None` while unknown.
    pub const fn current_status(&self) -> Option<Status> {
        self.state.current_status
    }

    /// Re-reads the document, picking up changes made by other processes.
    pub fn load(&mut self) -> &EventLog {
        self.state = read_state(&self.path);
        &self.state.events
    }

    /// Records a new report stamped with the current local time.
    pub fn append(&mut self, status: Status, origin: &str) -> Result<Event, StoreError> {
        self.append_at(status, origin, xing_core::time::now())
    }

    /// Records a report with an explicit timestamp.
    ///
    /// A timestamp already taken by another event is moved forward one
    /// microsecond at a time until it is unique.
    pub fn append_at(
        &mut self,
        status: Status,
        origin: &str,
        timestamp: NaiveDateTime,
    ) -> Result<Event, StoreError> {
        let event = self.mutate(|state| {
            let mut event = Event::new(status, timestamp, origin);
            while state.events.contains(event.timestamp) {
                event.timestamp += Duration::microseconds(1);
            }
            state.events.insert(event.clone());
            state.current_status = Some(status);
            Ok(event)
        })?;

        tracing::info!(
            status = %event.status,
            timestamp = %event.timestamp,
            origin = %event.origin,
            "recorded event"
        );
        Ok(event)
    }

    /// Commits a merged log produced from this store's log.
    ///
    /// `merged` must contain every event currently held; anything else is a
    /// logic error and is rejected without touching the document. Events
    /// appended by other processes since the merge was computed are kept.
    /// `current_status` overrides the cached status; `None` derives it from
    /// the merged log. Returns the number of events added to the document.
    pub fn commit_merge(
        &mut self,
        merged: &EventLog,
        current_status: Option<Status>,
    ) -> Result<usize, StoreError> {
        if !merged.covers(&self.state.events) {
            let missing = self
                .state
                .events
                .iter()
                .filter(|event| !merged.contains(event.timestamp))
                .count();
            return Err(StoreError::Invariant(format!(
                "merged log is missing {missing} local events"
            )));
        }

        let added = self.mutate(|state| {
            let (events, added) = state.events.union(merged.iter().cloned());
            state.current_status = current_status.or_else(|| events.current_status());
            state.events = events;
            Ok(added)
        })?;

        tracing::info!(added, total = self.state.events.len(), "committed merged log");
        Ok(added)
    }

    /// Runs `apply` on the freshest on-disk state under the store lock and
    /// writes the result. The in-memory state only changes if the write
    /// succeeds.
    fn mutate<T>(
        &mut self,
        apply: impl FnOnce(&mut StoredState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _lock = self.lock()?;

        let mut state = read_state(&self.path);
        if !state.events.covers(&self.state.events) {
            // the document lost events we hold (deleted or quarantined meanwhile)
            let (events, restored) = state.events.union(self.state.events.iter().cloned());
            tracing::warn!(restored, "restoring events missing from the event store");
            state.events = events;
        }

        let value = apply(&mut state)?;
        write_state(&self.path, &state)?;
        self.state = state;
        Ok(value)
    }

    fn lock(&self) -> Result<File, StoreError> {
        let lock_path = sibling(&self.path, "lock");
        fs::create_dir_all(parent_dir(&self.path)).map_err(|source| StoreError::Io {
            path: parent_dir(&self.path).to_path_buf(),
            source,
        })?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|source| StoreError::Lock {
                path: lock_path.clone(),
                source,
            })?;
        file.lock_exclusive()
            .map_err(|source| StoreError::Lock {
                path: lock_path,
                source,
            })?;
        Ok(file)
    }
}

fn read_state(path: &Path) -> StoredState {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return StoredState::default(),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to read event store, starting fresh"
            );
            quarantine(path);
            return StoredState::default();
        }
    };

    match serde_json::from_slice::<StoredState>(&contents) {
        Ok(mut state) => {
            if state.current_status.is_none() {
                state.current_status = state.events.current_status();
            }
            state
        }
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "event store is corrupt, starting fresh"
            );
            quarantine(path);
            StoredState::default()
        }
    }
}

fn write_state(path: &Path, state: &StoredState) -> Result<(), StoreError> {
    let dir = parent_dir(path);
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_vec_pretty(state)?;
    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(&json).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;
    file.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}

/// Moves a corrupt document out of the way so it is not overwritten.
///
/// An earlier quarantined document is never replaced; later ones get a
/// timestamp suffix.
fn quarantine(path: &Path) {
    let mut target = sibling(path, "corrupt");
    if target.exists() {
        let stamp = xing_core::time::now().format("%Y%m%dT%H%M%S%.6f").to_string();
        target = sibling(&target, &stamp);
    }
    match fs::rename(path, &target) {
        Ok(()) => tracing::warn!(target = %target.display(), "moved corrupt event store aside"),
        Err(err) => tracing::warn!(error = %err, "failed to move corrupt event store aside"),
    }
}

/// `<path>.<suffix>`, e.g. `barrier_data.json.lock`.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
