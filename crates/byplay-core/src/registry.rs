//! The job registry: a string-keyed lookup from job identifier to callable.
//!
//! Discovering callables (scanning a crate for annotated functions, reading
//! a plugin manifest, etc.) is a host concern; this module only defines the
//! trait the engine consumes and a minimal in-memory implementation hosts
//! may use directly.

use crate::queue::QueueTag;
use async_trait::async_trait;
use sqlx::PgConnection;
use std::collections::HashMap;
use std::sync::Arc;

/// The in-transaction connection handed to a running job.
///
/// A job callable sees two views of the connection it runs on: a "raw"
/// driver handle and a "wrapped" high-level one, both required to be the
/// same underlying connection. With `sqlx` there is only one connection
/// object, so [`JobContext::raw`] and [`JobContext::conn`] both return the
/// same `&mut PgConnection`; the two views are identical by construction
/// rather than by runtime check.
pub struct JobContext<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> JobContext<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }

    /// The high-level connection wrapper a job body is expected to use.
    pub fn conn(&mut self) -> &mut PgConnection {
        self.conn
    }

    /// The raw driver connection; identical to [`JobContext::conn`] here.
    pub fn raw(&mut self) -> &mut PgConnection {
        self.conn
    }
}

/// A registered job callable.
#[async_trait]
pub trait Job: Send + Sync {
    /// Run the job body against the reserved row's decoded arguments.
    ///
    /// Returning `Err` marks the row `Failed` and rolls back everything the
    /// job did via `ctx`; returning `Ok` marks it `Done` and commits it.
    async fn call(&self, ctx: &mut JobContext<'_>, args: Vec<serde_json::Value>) -> anyhow::Result<()>;
}

/// Resolves a job's string identifier to a callable, and (optionally) to
/// the queue new invocations of that job should land on.
pub trait JobRegistry: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Job>>;

    /// The queue annotation associated with a job identifier, used by
    /// [`crate::args`]-adjacent scheduling convenience that omits an
    /// explicit queue. `None` means "no annotation; use the default queue".
    fn queue_for(&self, name: &str) -> Option<QueueTag>;
}

/// A `HashMap`-backed [`JobRegistry`] a host populates at startup.
#[derive(Default)]
pub struct InMemoryRegistry {
    entries: HashMap<String, (Arc<dyn Job>, Option<QueueTag>)>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job under `name`, optionally annotating it with the queue
    /// [`crate::schedule`]-style convenience calls should default to.
    pub fn register(
        mut self,
        name: impl Into<String>,
        job: Arc<dyn Job>,
        queue: Option<QueueTag>,
    ) -> Self {
        self.entries.insert(name.into(), (job, queue));
        self
    }
}

impl JobRegistry for InMemoryRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Job>> {
        self.entries.get(name).map(|(job, _)| job.clone())
    }

    fn queue_for(&self, name: &str) -> Option<QueueTag> {
        self.entries.get(name).and_then(|(_, queue)| queue.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl Job for Noop {
        async fn call(&self, _ctx: &mut JobContext<'_>, _args: Vec<serde_json::Value>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn resolves_registered_jobs_and_their_queue_annotation() {
        let registry = InMemoryRegistry::new().register(
            "send-email",
            Arc::new(Noop),
            Some(QueueTag::new("mailers").unwrap()),
        );

        assert!(registry.resolve("send-email").is_some());
        assert!(registry.resolve("unknown").is_none());
        assert_eq!(
            registry.queue_for("send-email"),
            Some(QueueTag::new("mailers").unwrap())
        );
        assert_eq!(registry.queue_for("unknown"), None);
    }
}
