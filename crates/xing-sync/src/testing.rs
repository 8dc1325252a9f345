//! In-memory ledger and fixtures for tests.

use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};

use xing_core::{Event, Status};

use crate::ledger::{LedgerError, LedgerResult, RemoteLedger, RemoteStatus};

/// Ledger backed by in-memory collections, with switchable failures.
#[derive(Debug, Default)]
pub struct FakeLedger {
    events: Mutex<Vec<Event>>,
    status: Mutex<Option<RemoteStatus>>,
    /// Fail `GET events` with this HTTP status.
    pub fail_fetch: Option<u16>,
    /// Fail `POST events` with 502.
    pub fail_append: bool,
    /// Fail `PUT status` with 500.
    pub fail_put_status: bool,
    /// Fail `GET status` with this HTTP status.
    pub fail_get_status: Option<u16>,
}

impl FakeLedger {
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            events: Mutex::new(events),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn status(&self) -> Option<RemoteStatus> {
        self.status.lock().unwrap().clone()
    }

    pub fn set_status(&self, status: Option<RemoteStatus>) {
        *self.status.lock().unwrap() = status;
    }
}

impl RemoteLedger for FakeLedger {
    async fn append_event(&self, event: &Event) -> LedgerResult<()> {
        if self.fail_append {
            return Err(LedgerError::Status { status: 502 });
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn put_status(&self, status: &RemoteStatus) -> LedgerResult<()> {
        if self.fail_put_status {
            return Err(LedgerError::Status { status: 500 });
        }
        self.set_status(Some(status.clone()));
        Ok(())
    }

    async fn get_status(&self) -> LedgerResult<Option<RemoteStatus>> {
        if let Some(status) = self.fail_get_status {
            return Err(LedgerError::Status { status });
        }
        Ok(self.status())
    }

    async fn fetch_events(&self) -> LedgerResult<Vec<Event>> {
        if let Some(status) = self.fail_fetch {
            return Err(LedgerError::Status { status });
        }
        Ok(self.events())
    }
}

pub fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

pub fn event(status: Status, timestamp: NaiveDateTime, origin: &str) -> Event {
    Event::new(status, timestamp, origin)
}
