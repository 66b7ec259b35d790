//! Error types for byplay.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("queue tag must not contain a namespace separator: {0}")]
    NamespacedQueue(String),

    #[error("queue tag must not be empty")]
    EmptyQueue,

    #[error("no job registered under the name {0}")]
    UnknownJob(String),

    #[error("worker already started; restart is not permitted")]
    AlreadyStarted,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to decode job arguments: {0}")]
    ArgsDecode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
