//! Background expiry of abandoned sessions.
//!
//! # Responsibilities
//! - Periodically sweep the registry for idle sessions
//! - Stop promptly on shutdown or an explicit stop
//!
//! # Design Decisions
//! - A non-positive timeout means no loop is ever spawned
//! - The first sweep happens one period after start, not immediately
//! - `stop` is idempotent and safe to call before (or without) `start`

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::config::SessionConfig;

use super::SessionRegistry;

pub struct SessionReaper {
    registry: SessionRegistry,
    timeout: Option<Duration>,
    period: Duration,
    stop_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionReaper {
    pub fn new(registry: SessionRegistry, config: &SessionConfig) -> Self {
        let (stop_tx, _) = watch::channel(false);
        let timeout = config.timeout();
        Self {
            registry,
            timeout,
            period: config.reap_interval().unwrap_or(Duration::ZERO),
            stop_tx,
            task: Mutex::new(None),
        }
    }

    /// True when a timeout is configured.
    pub fn is_enabled(&self) -> bool {
        self.timeout.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Spawn the sweep loop. Returns false if reaping is disabled, already
    /// started, or already stopped.
    pub fn start(&self, shutdown: broadcast::Receiver<()>) -> bool {
        let Some(timeout) = self.timeout else {
            tracing::info!("Session reaper disabled");
            return false;
        };
        if *self.stop_tx.borrow() {
            return false;
        }
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if task.is_some() {
            return false;
        }
        let Some(first_sweep) = Instant::now().checked_add(self.period) else {
            tracing::warn!(
                interval_secs = self.period.as_secs(),
                "Session reaper interval out of range, reaper not started"
            );
            return false;
        };

        tracing::info!(
            timeout_secs = timeout.as_secs(),
            interval_secs = self.period.as_secs(),
            "Session reaper starting"
        );
        *task = Some(tokio::spawn(run(
            self.registry.clone(),
            timeout,
            first_sweep,
            self.period,
            self.stop_tx.subscribe(),
            shutdown,
        )));
        true
    }

    /// Stop the loop and wait for it to exit.
    pub async fn stop(&self) {
        self.stop_tx.send_replace(true);
        let task = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Session reaper task failed");
            }
            tracing::info!("Session reaper stopped");
        }
    }

    /// One sweep, outside the loop.
    pub async fn sweep(&self) -> Vec<String> {
        match self.timeout {
            Some(timeout) => self.registry.expire_inactive(timeout).await,
            None => Vec::new(),
        }
    }
}

async fn run(
    registry: SessionRegistry,
    timeout: Duration,
    first_sweep: Instant,
    period: Duration,
    mut stop: watch::Receiver<bool>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = time::interval_at(first_sweep, period);

    loop {
        tokio::select! {
            biased;
            _ = stop.changed() => break,
            _ = shutdown.recv() => {
                tracing::info!("Session reaper received shutdown signal, exiting loop");
                break;
            }
            _ = ticker.tick() => {
                let expired = registry.expire_inactive(timeout).await;
                if !expired.is_empty() {
                    tracing::info!(count = expired.len(), "Reaped idle sessions");
                }
            }
        }
    }
}
