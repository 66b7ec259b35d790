//! End-to-end tests of the `Worker` lifecycle and callback dispatch,
//! against a real PostgreSQL instance.
//!
//! Skip cleanly (rather than fail) when neither `TEST_DATABASE_URL` nor
//! `DATABASE_URL` is set, so `cargo test` stays green in environments with
//! no database available.

use async_trait::async_trait;
use byplay_core::{Error, InMemoryRegistry, Job, JobContext, JobRegistry, QueueTag};
use byplay_scheduler::{AckEvent, FailureEvent, Worker, WorkerConfig, WorkerState, schedule_to};
use sqlx::PgPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn test_database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}

fn init_test_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn fresh_pool() -> Option<PgPool> {
    init_test_tracing();
    let url = test_database_url()?;
    let pool = PgPool::connect(&url).await.expect("connect to test database");
    byplay_db::schema::install(&pool).await.expect("install schema");
    Some(pool)
}

fn unique_tag(label: &str) -> String {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    format!("{label}-{}-{}", std::process::id(), COUNTER.fetch_add(1, Ordering::Relaxed))
}

struct Noop;

#[async_trait]
impl Job for Noop {
    async fn call(&self, _ctx: &mut JobContext<'_>, _args: Vec<serde_json::Value>) -> anyhow::Result<()> {
        Ok(())
    }
}

struct AlwaysFails;

#[async_trait]
impl Job for AlwaysFails {
    async fn call(&self, _ctx: &mut JobContext<'_>, _args: Vec<serde_json::Value>) -> anyhow::Result<()> {
        anyhow::bail!("intentional failure")
    }
}

#[tokio::test]
async fn worker_state_transitions_from_new_through_running_to_terminated() {
    let Some(pool) = fresh_pool().await else {
        eprintln!("skipping: no TEST_DATABASE_URL/DATABASE_URL set");
        return;
    };

    let registry: Arc<dyn JobRegistry> =
        Arc::new(InMemoryRegistry::new().register("noop", Arc::new(Noop), None));
    let config = WorkerConfig {
        queues: vec![QueueTag::new(unique_tag("worker-state")).unwrap()],
        polling_interval: Duration::from_millis(20),
        ..WorkerConfig::default()
    };
    let mut worker = Worker::new(pool, registry, config);

    assert_eq!(worker.state(), WorkerState::New);

    worker.start().expect("first start succeeds");
    assert_eq!(worker.state(), WorkerState::Running);

    worker.interrupt();
    worker.join().await;
    assert_eq!(worker.state(), WorkerState::Terminated);
}

#[tokio::test]
async fn double_start_is_rejected_with_already_started() {
    let Some(pool) = fresh_pool().await else {
        eprintln!("skipping: no TEST_DATABASE_URL/DATABASE_URL set");
        return;
    };

    let registry: Arc<dyn JobRegistry> =
        Arc::new(InMemoryRegistry::new().register("noop", Arc::new(Noop), None));
    let config = WorkerConfig {
        queues: vec![QueueTag::new(unique_tag("worker-double-start")).unwrap()],
        polling_interval: Duration::from_millis(20),
        ..WorkerConfig::default()
    };
    let mut worker = Worker::new(pool, registry, config);

    worker.start().expect("first start succeeds");
    assert!(matches!(worker.start(), Err(Error::AlreadyStarted)));

    worker.interrupt();
    worker.join().await;
}

#[tokio::test]
async fn on_fail_runs_before_on_ack_for_a_failed_job() {
    let Some(pool) = fresh_pool().await else {
        eprintln!("skipping: no TEST_DATABASE_URL/DATABASE_URL set");
        return;
    };

    let queue = QueueTag::new(unique_tag("worker-fail-order")).unwrap();
    let registry: Arc<dyn JobRegistry> =
        Arc::new(InMemoryRegistry::new().register("always-fails", Arc::new(AlwaysFails), None));
    schedule_to(&pool, Some(&queue), "always-fails", &[]).await.unwrap();

    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let on_fail_order = order.clone();
    let on_fail = Arc::new(move |_event: &FailureEvent<'_>| {
        on_fail_order.lock().unwrap().push("fail");
    });

    let on_ack_order = order.clone();
    let on_ack = Arc::new(move |event: &AckEvent<'_>| {
        on_ack_order.lock().unwrap().push("ack");
        // One cycle is enough; stop this task so `join` returns promptly.
        event.interrupt_this_task();
    });

    let config = WorkerConfig {
        queues: vec![queue],
        threads_num: 1,
        polling_interval: Duration::from_secs(60),
        on_fail,
        on_ack,
    };
    let mut worker = Worker::new(pool, registry, config);
    worker.start().expect("start");
    worker.join().await;

    assert_eq!(*order.lock().unwrap(), vec!["fail", "ack"]);
}

#[tokio::test]
async fn ack_event_interrupt_this_task_stops_only_that_polling_task() {
    let Some(pool) = fresh_pool().await else {
        eprintln!("skipping: no TEST_DATABASE_URL/DATABASE_URL set");
        return;
    };

    let queue = QueueTag::new(unique_tag("worker-self-interrupt")).unwrap();
    let registry: Arc<dyn JobRegistry> =
        Arc::new(InMemoryRegistry::new().register("noop", Arc::new(Noop), None));

    let cycles = Arc::new(AtomicUsize::new(0));
    let cycles_counter = cycles.clone();
    let on_ack = Arc::new(move |event: &AckEvent<'_>| {
        cycles_counter.fetch_add(1, Ordering::SeqCst);
        event.interrupt_this_task();
    });

    let config = WorkerConfig {
        queues: vec![queue],
        threads_num: 1,
        // Long enough that if `interrupt_this_task` did nothing, `join`
        // below would hang until the test times out.
        polling_interval: Duration::from_secs(60),
        on_ack,
        ..WorkerConfig::default()
    };
    let mut worker = Worker::new(pool, registry, config);
    worker.start().expect("start");
    worker.join().await;

    assert_eq!(worker.state(), WorkerState::Terminated);
    assert_eq!(cycles.load(Ordering::SeqCst), 1, "task must exit after its first cycle");
}
