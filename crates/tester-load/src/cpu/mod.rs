use std::{
    hint::black_box,
    num::NonZeroUsize,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tester_core::{Workload, WorkloadError};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace};

use crate::config::CpuConfig;

/// Keeps every available core busy.
///
/// One blocking worker per core spins for `busy_slice`, then checks cancellation.
/// The workload returns only after all workers have exited. A failing worker
/// stops its siblings and the first failure is returned.
pub struct CpuLoad {
    cfg: CpuConfig,
    busy: Arc<AtomicUsize>,
}

impl CpuLoad {
    pub fn new(cfg: CpuConfig) -> Self {
        Self {
            cfg,
            busy: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Worker threads currently spinning.
    pub fn busy_workers(&self) -> usize {
        self.busy.load(Ordering::Relaxed)
    }

    pub fn worker_count(&self) -> usize {
        self.cfg
            .workers
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(NonZeroUsize::get)
                    .unwrap_or(1)
            })
            .max(1)
    }
}

#[async_trait]
impl Workload for CpuLoad {
    async fn run(&self, cancel: CancellationToken) -> Result<(), WorkloadError> {
        let workers = self.worker_count();
        info!(workers, "starting cpu load");

        let local = cancel.child_token();
        // Blocking workers outlive an aborted JoinSet; dropping this future must stop them.
        let _stop_workers = local.clone().drop_guard();
        let mut set = JoinSet::new();
        for _ in 0..workers {
            let token = local.clone();
            let slice = self.cfg.busy_slice;
            let busy = Arc::clone(&self.busy);
            set.spawn_blocking(move || {
                busy.fetch_add(1, Ordering::Relaxed);
                let rounds = spin(&token, slice);
                busy.fetch_sub(1, Ordering::Relaxed);
                rounds
            });
        }

        let mut failure = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(rounds) => trace!(rounds, "cpu worker exited"),
                Err(e) => {
                    error!(error = %e, "cpu worker failed");
                    local.cancel();
                    if failure.is_none() {
                        failure = Some(WorkloadError::Worker(e.to_string()));
                    }
                }
            }
        }

        info!("stopping cpu load");
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn spin(cancel: &CancellationToken, slice: Duration) -> u64 {
    let mut acc = 0.0f64;
    let mut rounds = 0u64;
    while !cancel.is_cancelled() {
        let until = Instant::now() + slice;
        while Instant::now() < until {
            acc = black_box(acc.sin() + 1.0);
        }
        rounds += 1;
    }
    rounds
}
