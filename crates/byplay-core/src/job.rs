//! The persisted job row and its lifecycle states.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`JobRow`]. The numeric values are part of the
/// on-disk contract (see the `byplay` table's `state` column) and must not
/// be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum JobState {
    /// Eligible for reservation.
    New = 0,
    /// Terminal: the job ran to completion and committed.
    Done = 1,
    /// Terminal: the job raised an error; its own SQL was rolled back.
    Failed = 2,
}

impl JobState {
    pub fn as_i16(self) -> i16 {
        self as i16
    }
}

impl TryFrom<i16> for JobState {
    type Error = i16;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(JobState::New),
            1 => Ok(JobState::Done),
            2 => Ok(JobState::Failed),
            other => Err(other),
        }
    }
}

/// One row of the `byplay` table.
///
/// `id` is a server-assigned identity column and defines FIFO order: it is
/// strictly increasing with insertion time.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct JobRow {
    pub id: i64,
    pub job: String,
    pub args: String,
    pub state: i16,
    pub queue: String,
}

impl JobRow {
    /// The row's lifecycle state, decoded from the raw `state` column.
    ///
    /// Panics if `state` holds a value outside `{0, 1, 2}`, which would mean
    /// the on-disk `CHECK (state IN (0, 1, 2))` constraint was bypassed.
    pub fn state(&self) -> JobState {
        JobState::try_from(self.state)
            .unwrap_or_else(|raw| panic!("byplay row {} has out-of-range state {raw}", self.id))
    }
}

/// The outcome of one [`crate::Job`] execution cycle.
#[derive(Debug)]
pub enum Ack {
    /// No eligible row was found; nothing ran.
    Absent,
    /// The job ran to completion; the row is now [`JobState::Done`].
    Done(JobRow),
    /// The job raised an error; the row is now [`JobState::Failed`].
    Failed(anyhow::Error, JobRow),
}

impl Ack {
    pub fn is_absent(&self) -> bool {
        matches!(self, Ack::Absent)
    }

    pub fn row(&self) -> Option<&JobRow> {
        match self {
            Ack::Absent => None,
            Ack::Done(row) | Ack::Failed(_, row) => Some(row),
        }
    }
}
