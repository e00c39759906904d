//! Process-level lifecycle for the reconcile loop and its workloads.
//!
//! The polling task and every workload task run on a shared [`TaskTracker`].
//! All workload tokens descend from one root token: cancelling the root is the
//! drain signal, waiting on the tracker is the join barrier.
mod fatal;
mod spawner;

use std::{sync::Arc, time::Duration};

use tester_model::{BackoffStrategy, DesiredSet, SupervisorState, WorkloadName};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, error, info, warn};

use crate::{
    error::CoreError,
    health::Health,
    metrics::{MetricsHandle, noop},
    reconciler::{ActiveSet, reconcile},
    registry::WorkloadRegistry,
    source::{DesiredSetSource, SourceError},
    workload::WorkloadError,
};

use fatal::Fatal;
use spawner::TrackedSpawner;

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Pause between the end of one reconcile tick and the next fetch.
    pub poll_interval: Duration,
    /// Retry policy for a failed fetch within a tick. Default: no retries.
    pub fetch_retry: BackoffStrategy,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            fetch_retry: BackoffStrategy::fail_fast(),
        }
    }
}

impl SupervisorConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.poll_interval.is_zero() {
            return Err(CoreError::InvalidConfig(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        self.fetch_retry.validate()?;
        Ok(())
    }
}

/// First fatal condition observed by the supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("workload {name} failed: {source}")]
    Workload {
        name: WorkloadName,
        #[source]
        source: WorkloadError,
    },
    #[error("desired-set fetch failed: {0}")]
    Source(#[from] SourceError),
}

pub struct Supervisor {
    cfg: SupervisorConfig,
    registry: WorkloadRegistry,
    source: Arc<dyn DesiredSetSource>,
    health: Arc<Health>,
    metrics: MetricsHandle,
    state: watch::Sender<SupervisorState>,
}

impl Supervisor {
    pub fn new(
        cfg: SupervisorConfig,
        registry: WorkloadRegistry,
        source: Arc<dyn DesiredSetSource>,
    ) -> Result<Self, CoreError> {
        cfg.validate()?;
        let (state, _) = watch::channel(SupervisorState::Running);
        Ok(Self {
            cfg,
            registry,
            source,
            health: Arc::new(Health::new()),
            metrics: noop(),
            state,
        })
    }

    pub fn with_health(mut self, health: Arc<Health>) -> Self {
        self.health = health;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn health(&self) -> Arc<Health> {
        Arc::clone(&self.health)
    }

    /// Observe lifecycle transitions.
    pub fn state(&self) -> watch::Receiver<SupervisorState> {
        self.state.subscribe()
    }

    /// Runs until `shutdown` fires or a fatal error occurs,
    /// then cancels all workloads and waits for every task to return.
    ///
    /// Returns `Ok(Stopped)` on a clean exit and the first fatal error otherwise.
    pub async fn run(self, shutdown: CancellationToken) -> Result<SupervisorState, SupervisorError> {
        let Supervisor {
            cfg,
            registry,
            source,
            health,
            metrics,
            state,
        } = self;

        let interval_ms = cfg.poll_interval.as_millis() as u64;
        let tracker = TaskTracker::new();
        let fatal = Arc::new(Fatal::new());

        let poller = Poller {
            cfg,
            registry,
            source,
            health: Arc::clone(&health),
            metrics,
            fatal: Arc::clone(&fatal),
            tracker: tracker.clone(),
        };
        tracker.spawn(poller.run());
        tracker.close();

        state.send_replace(SupervisorState::Running);
        info!(interval_ms, "supervisor running");

        // The poller exits only after the root token is cancelled.
        tokio::select! {
            _ = shutdown.cancelled() => info!("shutdown requested"),
            _ = fatal.cancelled() => {}
        }

        state.send_replace(SupervisorState::Draining);
        health.mark_not_ready();
        fatal.drain();
        debug!(tasks = tracker.len(), "draining, waiting for tasks");
        tracker.wait().await;

        match fatal.take() {
            None => {
                info!("supervisor stopped");
                state.send_replace(SupervisorState::Stopped);
                Ok(SupervisorState::Stopped)
            }
            Some(err) => {
                error!(error = %err, "supervisor failed");
                health.mark_not_live();
                state.send_replace(SupervisorState::Failed);
                Err(err)
            }
        }
    }
}

struct Poller {
    cfg: SupervisorConfig,
    registry: WorkloadRegistry,
    source: Arc<dyn DesiredSetSource>,
    health: Arc<Health>,
    metrics: MetricsHandle,
    fatal: Arc<Fatal>,
    tracker: TaskTracker,
}

impl Poller {
    async fn run(self) {
        let root = self.fatal.token();
        let mut active = ActiveSet::with_parent(root.clone());
        let mut spawner = TrackedSpawner::new(
            self.tracker.clone(),
            Arc::clone(&self.fatal),
            Arc::clone(&self.metrics),
        );

        loop {
            let fetched = tokio::select! {
                biased;
                _ = root.cancelled() => break,
                res = self.fetch() => res,
            };

            match fetched {
                Ok(desired) => {
                    let report = reconcile(&desired, &mut active, &self.registry, &mut spawner);
                    self.metrics.reconcile_tick();
                    self.health.mark_ready();
                    if report.is_noop() {
                        debug!(active = active.len(), "reconcile tick, nothing to change");
                    } else {
                        info!(
                            started = report.started.len(),
                            stopped = report.stopped.len(),
                            active = active.len(),
                            "reconcile tick applied"
                        );
                    }
                }
                Err(e) => {
                    error!(error = %e, "failed to fetch desired workloads");
                    self.fatal.fail(SupervisorError::Source(e));
                    break;
                }
            }

            tokio::select! {
                biased;
                _ = root.cancelled() => break,
                _ = tokio::time::sleep(self.cfg.poll_interval) => {}
            }
        }

        let stopped = active.stop_all();
        debug!(count = stopped.len(), "polling stopped, active workloads cancelled");
    }

    async fn fetch(&self) -> Result<DesiredSet, SourceError> {
        let retry = &self.cfg.fetch_retry;
        let mut attempt = 0u32;
        loop {
            match self.source.fetch().await {
                Ok(set) => return Ok(set),
                Err(e) => {
                    self.metrics.source_error();
                    if attempt >= retry.attempts {
                        return Err(e);
                    }
                    attempt += 1;
                    let delay = retry.delay_for(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        max_attempts = retry.attempts,
                        delay_ms = delay.as_millis() as u64,
                        "fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
