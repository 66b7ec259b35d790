//! Failure callback dispatch: forward job errors to a user handler, with a
//! default implementation that writes to standard error.

use byplay_core::{Ack, JobRow};
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Passed to `on_fail` when a job raises an error.
pub struct FailureEvent<'a> {
    pub error: &'a anyhow::Error,
    pub row: &'a JobRow,
}

/// Passed to `on_ack` after every execution cycle, including empty ones.
pub struct AckEvent<'a> {
    pub ack: &'a Ack,
    task_token: &'a CancellationToken,
}

impl<'a> AckEvent<'a> {
    pub(crate) fn new(ack: &'a Ack, task_token: &'a CancellationToken) -> Self {
        Self { ack, task_token }
    }

    /// Stop polling in just this task; other tasks owned by the same
    /// worker are unaffected.
    pub fn interrupt_this_task(&self) {
        self.task_token.cancel();
    }
}

pub type OnFail = Arc<dyn Fn(&FailureEvent<'_>) + Send + Sync>;
pub type OnAck = Arc<dyn Fn(&AckEvent<'_>) + Send + Sync>;

/// Writes one line to standard error via a single locked write so
/// concurrent tasks' messages never interleave mid-line.
pub fn default_on_fail() -> OnFail {
    Arc::new(|event: &FailureEvent<'_>| {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "Job failed: {:?}\nException: {:?}\n", event.row, event.error);
    })
}

/// Does nothing.
pub fn default_on_ack() -> OnAck {
    Arc::new(|_event: &AckEvent<'_>| {})
}
