//! Scheduler API: insert a new job row, optionally inside a caller-supplied
//! transaction.

use byplay_core::{Error, JobRegistry, JobRow, QueueTag, Result, encode_args};
use serde_json::Value;
use sqlx::{Executor, Postgres};

const INSERT_JOB: &str = r#"
    INSERT INTO byplay (job, args, state, queue)
    VALUES ($1, $2, 0, $3)
    RETURNING id, job, args, state, queue
"#;

/// Insert one row for `job`, on `queue` (or the default queue if `None`).
///
/// Participates in whatever transaction `executor` is already part of: if
/// the caller later rolls that transaction back, the scheduled row goes
/// with it. This function never opens a transaction of its own.
pub async fn schedule_to<'e, E>(
    executor: E,
    queue: Option<&QueueTag>,
    job: &str,
    args: &[Value],
) -> Result<JobRow>
where
    E: Executor<'e, Database = Postgres>,
{
    let default = QueueTag::default_queue();
    let tag = queue.unwrap_or(&default);

    let row = sqlx::query_as(INSERT_JOB)
        .bind(job)
        .bind(encode_args(args))
        .bind(byplay_core::queue::encode(tag))
        .fetch_one(executor)
        .await
        .map_err(Error::Database)?;

    Ok(row)
}

/// Convenience that reads `job`'s queue annotation from `registry` and
/// delegates to [`schedule_to`].
pub async fn schedule<'e, E>(
    executor: E,
    registry: &dyn JobRegistry,
    job: &str,
    args: &[Value],
) -> Result<JobRow>
where
    E: Executor<'e, Database = Postgres>,
{
    let queue = registry.queue_for(job);
    schedule_to(executor, queue.as_ref(), job, args).await
}
