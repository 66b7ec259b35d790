//! Worker: spawns N polling tasks, distributes interruption, joins on
//! shutdown.

use byplay_core::{Ack, Error, JobRegistry, QueueTag, Result};
use sqlx::PgPool;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::callback::{AckEvent, FailureEvent, OnAck, OnFail, default_on_ack, default_on_fail};
use crate::executor::execute_once;

/// Tunables for a [`Worker`].
pub struct WorkerConfig {
    /// Ordered priority list of queues to poll; empty means "any queue".
    pub queues: Vec<QueueTag>,
    /// Number of parallel polling tasks.
    pub threads_num: usize,
    /// Sleep between cycles within one polling task.
    pub polling_interval: Duration,
    /// Called on a failed job, before `on_ack`.
    pub on_fail: OnFail,
    /// Called after every execution cycle, including empty ones.
    pub on_ack: OnAck,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queues: Vec::new(),
            threads_num: 1,
            polling_interval: Duration::from_millis(5000),
            on_fail: default_on_fail(),
            on_ack: default_on_ack(),
        }
    }
}

/// Runtime state of a [`Worker`]'s master task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed but not yet started.
    New,
    /// `start` has been called and the master task has not exited.
    Running,
    /// The master task and all of its polling tasks have exited.
    Terminated,
}

const STATE_NEW: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_TERMINATED: u8 = 2;

/// Owns a pool of polling tasks and their lifecycle: `New → Running →
/// Terminated`. Restarting after `interrupt` is rejected.
pub struct Worker {
    pool: PgPool,
    registry: Arc<dyn JobRegistry>,
    config: Arc<WorkerConfig>,
    state: Arc<AtomicU8>,
    token: CancellationToken,
    master: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn new(pool: PgPool, registry: Arc<dyn JobRegistry>, config: WorkerConfig) -> Self {
        Self {
            pool,
            registry,
            config: Arc::new(config),
            state: Arc::new(AtomicU8::new(STATE_NEW)),
            token: CancellationToken::new(),
            master: None,
        }
    }

    pub fn state(&self) -> WorkerState {
        match self.state.load(Ordering::SeqCst) {
            STATE_NEW => WorkerState::New,
            STATE_RUNNING => WorkerState::Running,
            _ => WorkerState::Terminated,
        }
    }

    /// Begin background polling across `config.threads_num` tasks.
    ///
    /// Rejects a second call (or a call after `interrupt`) with
    /// `Error::AlreadyStarted`; the single-shot lifecycle is enforced by a
    /// compare-and-swap on the state atomic, not by convention.
    pub fn start(&mut self) -> Result<()> {
        self.state
            .compare_exchange(STATE_NEW, STATE_RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| Error::AlreadyStarted)?;

        let mut tasks = Vec::with_capacity(self.config.threads_num);
        for idx in 0..self.config.threads_num {
            tasks.push(tokio::spawn(poll_loop(
                idx,
                self.pool.clone(),
                self.registry.clone(),
                self.config.clone(),
                self.token.child_token(),
            )));
        }

        let state = self.state.clone();
        self.master = Some(tokio::spawn(async move {
            for task in tasks {
                let _ = task.await;
            }
            state.store(STATE_TERMINATED, Ordering::SeqCst);
            info!("worker terminated");
        }));

        Ok(())
    }

    /// Request graceful shutdown: no new jobs are reserved after this call,
    /// but a job already running finishes its transaction uninterrupted.
    pub fn interrupt(&self) {
        self.token.cancel();
    }

    /// Block until the worker reaches [`WorkerState::Terminated`].
    pub async fn join(&mut self) {
        if let Some(master) = self.master.take() {
            let _ = master.await;
        }
    }
}

async fn poll_loop(
    idx: usize,
    pool: PgPool,
    registry: Arc<dyn JobRegistry>,
    config: Arc<WorkerConfig>,
    task_token: CancellationToken,
) {
    info!(task = idx, "starting polling task");

    while !task_token.is_cancelled() {
        match run_one_cycle(&pool, &config.queues, &*registry).await {
            Ok(ack) => {
                if let Ack::Failed(error, row) = &ack {
                    (config.on_fail)(&FailureEvent { error, row });
                }
                (config.on_ack)(&AckEvent::new(&ack, &task_token));
            }
            Err(error) => {
                warn!(task = idx, %error, "execution cycle failed");
            }
        }

        tokio::select! {
            _ = task_token.cancelled() => break,
            _ = tokio::time::sleep(config.polling_interval) => {}
        }
    }

    info!(task = idx, "polling task exiting");
}

async fn run_one_cycle(pool: &PgPool, queues: &[QueueTag], registry: &dyn JobRegistry) -> Result<Ack> {
    let mut conn = pool.acquire().await?;
    execute_once(&mut conn, queues, registry).await
}
