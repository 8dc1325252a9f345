//! The ordered event history and its timestamp-keyed merge.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::status::Status;

/// Ordered history of barrier reports.
///
/// Events are kept in ascending timestamp order with at most one event per
/// timestamp. Every constructor canonicalizes, so the invariant holds for
/// any value of this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Event>", into = "Vec<Event>")]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Builds a log from events in any order.
    ///
    /// When several events share a timestamp the first one encountered wins.
    pub fn from_events(mut events: Vec<Event>) -> Self {
        events.sort_by_key(|event| event.timestamp);
        events.dedup_by_key(|event| event.timestamp);
        Self { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The chronologically last event.
    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Status of the chronologically last event.
    pub fn current_status(&self) -> Option<Status> {
        self.last().map(|event| event.status)
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.position(timestamp).is_ok()
    }

    /// Events strictly newer than `cutoff`.
    pub fn after(&self, cutoff: NaiveDateTime) -> &[Event] {
        let start = self
            .events
            .partition_point(|event| event.timestamp <= cutoff);
        &self.events[start..]
    }

    /// Inserts an event at its ordered position.
    ///
    /// Returns `false` (and leaves the log untouched) if an event with the
    /// same timestamp already exists.
    pub fn insert(&mut self, event: Event) -> bool {
        match self.position(event.timestamp) {
            Ok(_) => false,
            Err(idx) => {
                self.events.insert(idx, event);
                true
            }
        }
    }

    /// Timestamp-keyed union with `incoming`.
    ///
    /// Returns the merged log and the number of incoming events that were not
    /// already present. Local events win over incoming ones with the same
    /// timestamp; duplicates within `incoming` count once.
    pub fn union(&self, incoming: impl IntoIterator<Item = Event>) -> (Self, usize) {
        let mut seen: HashSet<NaiveDateTime> =
            self.events.iter().map(|event| event.timestamp).collect();
        let fresh: Vec<Event> = incoming
            .into_iter()
            .filter(|event| seen.insert(event.timestamp))
            .collect();

        let new_events = fresh.len();
        let mut events = self.events.clone();
        if new_events > 0 {
            events.extend(fresh);
            events.sort_by_key(|event| event.timestamp);
        }
        (Self { events }, new_events)
    }

    /// Whether every event of `other` is present here (by timestamp).
    pub fn covers(&self, other: &Self) -> bool {
        other.iter().all(|event| self.contains(event.timestamp))
    }

    fn position(&self, timestamp: NaiveDateTime) -> Result<usize, usize> {
        self.events
            .binary_search_by_key(&timestamp, |event| event.timestamp)
    }
}

impl From<Vec<Event>> for EventLog {
    fn from(events: Vec<Event>) -> Self {
        Self::from_events(events)
    }
}

impl From<EventLog> for Vec<Event> {
    fn from(log: EventLog) -> Self {
        log.events
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
