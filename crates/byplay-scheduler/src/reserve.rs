//! Reservation protocol: atomically claim one pending job from a
//! prioritised list of queues.

use byplay_core::{JobRow, QueueTag};
use sqlx::PgConnection;

const RESERVE_IN_QUEUE: &str = r#"
    SELECT id, job, args, state, queue
    FROM byplay
    WHERE state = 0 AND queue = $1
    ORDER BY id
    FOR UPDATE SKIP LOCKED
    LIMIT 1
"#;

const RESERVE_ANY_QUEUE: &str = r#"
    SELECT id, job, args, state, queue
    FROM byplay
    WHERE state = 0
    ORDER BY id
    FOR UPDATE SKIP LOCKED
    LIMIT 1
"#;

async fn reserve_in_queue(conn: &mut PgConnection, tag: &QueueTag) -> sqlx::Result<Option<JobRow>> {
    sqlx::query_as(RESERVE_IN_QUEUE)
        .bind(byplay_core::queue::encode(tag))
        .fetch_optional(&mut *conn)
        .await
}

async fn reserve_any_queue(conn: &mut PgConnection) -> sqlx::Result<Option<JobRow>> {
    sqlx::query_as(RESERVE_ANY_QUEUE).fetch_optional(&mut *conn).await
}

/// Lock and return the oldest `New` row eligible under `queues`.
///
/// An empty `queues` list reserves globally, ordered by `id` across every
/// queue. A non-empty list is tried in order: the first queue with an
/// eligible row wins, giving strict priority across queues and FIFO within
/// one. The row is locked only; its state is left untouched until the
/// caller marks it done or failed.
pub async fn reserve(conn: &mut PgConnection, queues: &[QueueTag]) -> sqlx::Result<Option<JobRow>> {
    if queues.is_empty() {
        return reserve_any_queue(conn).await;
    }

    for tag in queues {
        if let Some(row) = reserve_in_queue(conn, tag).await? {
            return Ok(Some(row));
        }
    }

    Ok(None)
}
