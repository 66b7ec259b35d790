//! Job executor: run one claimed job inside a savepoint, mark it done or
//! failed, and return an ack.

use byplay_core::{Ack, Error, JobContext, JobRegistry, QueueTag, Result, decode_args};
use sqlx::PgConnection;
use tracing::{info, warn};

use crate::reserve::reserve;

const MARK_DONE: &str = "UPDATE byplay SET state = 1 WHERE id = $1 RETURNING id, job, args, state, queue";
const MARK_FAILED: &str = "UPDATE byplay SET state = 2 WHERE id = $1 RETURNING id, job, args, state, queue";

/// Run one full execution cycle on `conn`.
///
/// `conn` must not already be inside a transaction the caller wants to
/// preserve: this function issues `BEGIN`/`COMMIT` as literal SQL, and
/// PostgreSQL treats a nested `BEGIN` as a no-op, so the matching `COMMIT`
/// then commits whatever transaction the caller already had open.
pub async fn execute_once(
    conn: &mut PgConnection,
    queues: &[QueueTag],
    registry: &dyn JobRegistry,
) -> Result<Ack> {
    sqlx::query("BEGIN").execute(&mut *conn).await?;

    let row = match reserve(conn, queues).await? {
        Some(row) => row,
        None => {
            sqlx::query("COMMIT").execute(&mut *conn).await?;
            return Ok(Ack::Absent);
        }
    };

    sqlx::query("SAVEPOINT before").execute(&mut *conn).await?;

    let job = match registry.resolve(&row.job) {
        Some(job) => job,
        None => {
            // Lock release via rollback; code/data has drifted, this is fatal.
            sqlx::query("ROLLBACK").execute(&mut *conn).await.ok();
            return Err(Error::UnknownJob(row.job));
        }
    };

    let args = match decode_args(&row.args) {
        Ok(args) => args,
        Err(error) => {
            // Lock release via rollback; malformed args mean data has drifted.
            sqlx::query("ROLLBACK").execute(&mut *conn).await.ok();
            return Err(error);
        }
    };
    let outcome = {
        let mut ctx = JobContext::new(conn);
        job.call(&mut ctx, args).await
    };

    let ack = match outcome {
        Ok(()) => {
            let done: byplay_core::JobRow = sqlx::query_as(MARK_DONE)
                .bind(row.id)
                .fetch_one(&mut *conn)
                .await?;
            info!(job_id = done.id, job = %done.job, "job done");
            Ack::Done(done)
        }
        Err(error) => {
            sqlx::query("ROLLBACK TO SAVEPOINT before")
                .execute(&mut *conn)
                .await?;
            let failed: byplay_core::JobRow = sqlx::query_as(MARK_FAILED)
                .bind(row.id)
                .fetch_one(&mut *conn)
                .await?;
            warn!(job_id = failed.id, job = %failed.job, error = %error, "job failed");
            Ack::Failed(error, failed)
        }
    };

    sqlx::query("COMMIT").execute(&mut *conn).await?;
    Ok(ack)
}
