use std::sync::Arc;

use tester_model::WorkloadName;
use tokio::task::JoinError;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, error, info, warn};

use super::{SupervisorError, fatal::Fatal};
use crate::{
    metrics::MetricsHandle,
    reconciler::{Spawn, TaskHandle},
    workload::{Workload, WorkloadError},
};

/// Spawns workloads onto the supervisor's tracker and reports their outcome.
pub(super) struct TrackedSpawner {
    tracker: TaskTracker,
    fatal: Arc<Fatal>,
    metrics: MetricsHandle,
}

impl TrackedSpawner {
    pub(super) fn new(tracker: TaskTracker, fatal: Arc<Fatal>, metrics: MetricsHandle) -> Self {
        Self {
            tracker,
            fatal,
            metrics,
        }
    }
}

impl Spawn for TrackedSpawner {
    fn spawn(
        &mut self,
        name: &WorkloadName,
        workload: Arc<dyn Workload>,
        cancel: CancellationToken,
    ) -> TaskHandle {
        let tracker = self.tracker.clone();
        let fatal = Arc::clone(&self.fatal);
        let metrics = Arc::clone(&self.metrics);
        let name = name.clone();

        self.tracker.spawn(async move {
            info!(workload = %name, "starting workload");
            metrics.workload_started(&name);

            // Inner task so a panic surfaces as a JoinError instead of tearing down this one.
            let run = {
                let cancel = cancel.clone();
                tracker.spawn(async move { workload.run(cancel).await })
            };
            let outcome = match run.await {
                Ok(res) => res,
                Err(e) => Err(WorkloadError::Panicked(panic_message(e))),
            };

            match outcome {
                Ok(()) | Err(WorkloadError::Cancelled) => {
                    if !cancel.is_cancelled() {
                        warn!(workload = %name, "workload returned before it was cancelled");
                    }
                    debug!(workload = %name, "workload stopped");
                    metrics.workload_stopped(&name);
                }
                Err(e) => {
                    error!(workload = %name, error = %e, "workload failed");
                    metrics.workload_failed(&name);
                    fatal.fail(SupervisorError::Workload { name, source: e });
                }
            }
        })
    }
}

fn panic_message(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string()),
        Err(err) => err.to_string(),
    }
}
