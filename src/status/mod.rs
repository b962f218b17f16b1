//! Run status reporting.
//!
//! This module defines the externally visible status contract:
//!
//! - [`TaskStatus`] - The status enum as shown to users (`42%`, `Done`, ...)
//! - [`StatusUpdate`] - A single write issued at a step boundary
//! - [`StatusRecord`] - The full persisted record, including the process id
//! - [`StatusSink`] - The persistence trait implemented by external stores
//! - [`MemorySink`] - A shared-handle in-memory sink for tests and demos
//!
//! The orchestration core reads the status once at run entry (for the
//! cooperative cancellation check) and writes an update at every step
//! boundary and at run completion or failure. All writes are funneled
//! through a single writer so concurrent lanes never race on the record;
//! see [`reporter`].

pub mod reporter;

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use reporter::{Reporter, StatusUpdate};

/// Externally visible status of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TaskStatus {
    /// Fractional progress, rendered as a percentage.
    Progress(u8),
    /// All steps completed.
    Done,
    /// A step failed; the record's message carries the error text.
    Failed,
    /// An external actor requested cancellation.
    Canceling,
    /// The run acknowledged the cancellation request without executing.
    Cancelled,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Progress(pct) => write!(f, "{}%", pct),
            TaskStatus::Done => write!(f, "Done"),
            TaskStatus::Failed => write!(f, "Failed"),
            TaskStatus::Canceling => write!(f, "Canceling"),
            TaskStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Done" => Ok(TaskStatus::Done),
            "Failed" => Ok(TaskStatus::Failed),
            "Canceling" => Ok(TaskStatus::Canceling),
            "Cancelled" => Ok(TaskStatus::Cancelled),
            other => other
                .strip_suffix('%')
                .and_then(|pct| pct.parse::<u8>().ok())
                .map(TaskStatus::Progress)
                .ok_or_else(|| format!("Unknown task status: {}", other)),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.to_string()
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// The full persisted status record.
///
/// The orchestration core only ever touches `status`, `message`, and
/// `finished`; `process_id` is set and cleared by the process bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: TaskStatus,
    pub message: String,
    pub finished: Option<DateTime<Utc>>,
    pub process_id: Option<u32>,
}

impl StatusRecord {
    /// A fresh record at 0% with no message.
    pub fn running() -> Self {
        Self {
            status: TaskStatus::Progress(0),
            message: String::new(),
            finished: None,
            process_id: None,
        }
    }

    /// Apply a single update, leaving `process_id` untouched.
    pub fn apply(&mut self, update: &StatusUpdate) {
        self.status = update.status.clone();
        self.message = update.message.clone();
        self.finished = update.finished;
    }
}

/// Persistence contract for run status.
///
/// Implementations live outside the orchestration core (a database row, an
/// HTTP endpoint, ...). The core consults `status` exactly once, at run
/// entry, and calls `update` from a single writer thread.
pub trait StatusSink: Send {
    /// Read the current status, or `None` when no record exists.
    fn status(&mut self) -> Result<Option<TaskStatus>>;

    /// Persist one update.
    fn update(&mut self, update: &StatusUpdate) -> Result<()>;
}

/// In-memory sink with a cloneable inspection handle.
///
/// Every clone shares the same record, so a test can hand one clone to the
/// registry and keep another to assert on what was written.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    record: Arc<Mutex<Option<StatusRecord>>>,
    updates: Arc<Mutex<Vec<StatusUpdate>>>,
}

impl MemorySink {
    /// An empty sink with no record yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose record starts in the given status.
    pub fn with_status(status: TaskStatus) -> Self {
        let sink = Self::new();
        let mut record = StatusRecord::running();
        record.status = status;
        *sink.record.lock().unwrap() = Some(record);
        sink
    }

    /// Snapshot of the current record.
    pub fn record(&self) -> Option<StatusRecord> {
        self.record.lock().unwrap().clone()
    }

    /// Every update applied so far, in write order.
    pub fn updates(&self) -> Vec<StatusUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

impl StatusSink for MemorySink {
    fn status(&mut self) -> Result<Option<TaskStatus>> {
        Ok(self
            .record
            .lock()
            .unwrap()
            .as_ref()
            .map(|record| record.status.clone()))
    }

    fn update(&mut self, update: &StatusUpdate) -> Result<()> {
        let mut record = self.record.lock().unwrap();
        record
            .get_or_insert_with(StatusRecord::running)
            .apply(update);
        self.updates.lock().unwrap().push(update.clone());
        Ok(())
    }
}
