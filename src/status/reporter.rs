//! Serialized status reporting.
//!
//! Concurrent lanes all report progress against the same status record. To
//! keep those writes ordered, groups never touch the [`StatusSink`]
//! directly: they send [`StatusUpdate`]s through a cloneable [`Reporter`]
//! and a single writer loop owns the sink for the duration of the run.

use std::sync::mpsc::{channel, Receiver, Sender};

use chrono::{DateTime, Utc};
use tracing::warn;

use super::{StatusSink, TaskStatus};

/// One status write: status, progress message, and optional completion time.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: TaskStatus,
    pub message: String,
    pub finished: Option<DateTime<Utc>>,
}

impl StatusUpdate {
    /// Progress at a step boundary, issued before the step executes.
    pub fn progress(percent: u8, message: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Progress(percent),
            message: message.into(),
            finished: None,
        }
    }

    /// Completion of a group: empty message, completion time recorded.
    pub fn done() -> Self {
        Self {
            status: TaskStatus::Done,
            message: String::new(),
            finished: Some(Utc::now()),
        }
    }

    /// Failure of a group: the error text becomes the visible message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Failed,
            message: message.into(),
            finished: Some(Utc::now()),
        }
    }

    /// Acknowledgement of a cancellation request.
    pub fn cancelled() -> Self {
        Self {
            status: TaskStatus::Cancelled,
            message: String::new(),
            finished: None,
        }
    }
}

/// Cloneable handle that groups use to report status.
///
/// A disabled reporter (no sink attached to the run) swallows every update.
#[derive(Debug, Clone)]
pub struct Reporter {
    tx: Option<Sender<StatusUpdate>>,
}

impl Reporter {
    /// A reporter wired to a writer loop, plus the receiving end to drain.
    pub fn channel() -> (Self, Receiver<StatusUpdate>) {
        let (tx, rx) = channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A reporter that discards every update.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Send one update. Updates sent after the writer loop has stopped are
    /// dropped silently.
    pub fn send(&self, update: StatusUpdate) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(update);
        }
    }

    /// Report progress before a step executes.
    pub fn progress(&self, percent: u8, message: &str) {
        self.send(StatusUpdate::progress(percent, message));
    }
}

/// Writer loop: apply every received update to the sink, in arrival order.
///
/// Runs until every `Reporter` clone is dropped. Sink failures are logged
/// and skipped so a flaky status store cannot abort the run itself.
pub fn drain(rx: Receiver<StatusUpdate>, sink: &mut dyn StatusSink) {
    for update in rx {
        if let Err(e) = sink.update(&update) {
            warn!("Dropping status update '{}': {}", update.status, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CadenceError;
    use crate::status::MemorySink;

    #[test]
    fn progress_update_has_no_finish_time() {
        let update = StatusUpdate::progress(25, "loading items");
        assert_eq!(update.status, TaskStatus::Progress(25));
        assert_eq!(update.message, "loading items");
        assert!(update.finished.is_none());
    }

    #[test]
    fn done_update_records_finish_time_and_clears_message() {
        let update = StatusUpdate::done();
        assert_eq!(update.status, TaskStatus::Done);
        assert!(update.message.is_empty());
        assert!(update.finished.is_some());
    }

    #[test]
    fn failed_update_carries_error_text() {
        let update = StatusUpdate::failed("disk full");
        assert_eq!(update.status, TaskStatus::Failed);
        assert_eq!(update.message, "disk full");
        assert!(update.finished.is_some());
    }

    #[test]
    fn disabled_reporter_swallows_updates() {
        let reporter = Reporter::disabled();
        reporter.progress(10, "nothing listens");
    }

    #[test]
    fn drain_applies_updates_in_send_order() {
        let (reporter, rx) = Reporter::channel();
        let mut sink = MemorySink::new();
        let inspect = sink.clone();

        reporter.progress(0, "a");
        reporter.progress(50, "b");
        reporter.send(StatusUpdate::done());
        drop(reporter);

        drain(rx, &mut sink);

        let messages: Vec<_> = inspect
            .updates()
            .into_iter()
            .map(|u| u.message)
            .collect();
        assert_eq!(messages, vec!["a", "b", ""]);
    }

    #[test]
    fn drain_survives_sink_failures() {
        struct FailingSink;
        impl StatusSink for FailingSink {
            fn status(&mut self) -> crate::error::Result<Option<TaskStatus>> {
                Ok(None)
            }
            fn update(&mut self, _update: &StatusUpdate) -> crate::error::Result<()> {
                Err(CadenceError::StatusSink {
                    message: "write refused".into(),
                })
            }
        }

        let (reporter, rx) = Reporter::channel();
        reporter.progress(10, "a");
        reporter.progress(20, "b");
        drop(reporter);

        // Must not panic or stop early.
        drain(rx, &mut FailingSink);
    }

    #[test]
    fn clones_share_the_same_channel() {
        let (reporter, rx) = Reporter::channel();
        let clone = reporter.clone();
        let mut sink = MemorySink::new();
        let inspect = sink.clone();

        reporter.progress(1, "from original");
        clone.progress(2, "from clone");
        drop(reporter);
        drop(clone);

        drain(rx, &mut sink);
        assert_eq!(inspect.updates().len(), 2);
    }
}
