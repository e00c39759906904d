use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tester_core::{Workload, WorkloadError};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::MemoryConfig;

/// Written into every grown byte so the pages are actually resident.
const FILL: u8 = 0xA5;

/// Grows a single buffer by `chunk_bytes` every `interval` until cancelled.
///
/// The buffer never shrinks while running. Reservation is fallible, so running out
/// of memory surfaces as [`WorkloadError::Allocation`] rather than an abort.
pub struct MemoryLoad {
    cfg: MemoryConfig,
    held: Arc<AtomicUsize>,
}

impl MemoryLoad {
    pub fn new(cfg: MemoryConfig) -> Self {
        Self {
            cfg,
            held: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bytes currently held, summed over every run still alive.
    pub fn held_bytes(&self) -> usize {
        self.held.load(Ordering::Relaxed)
    }

    fn next_len(&self, current: usize) -> usize {
        let grown = current.saturating_add(self.cfg.chunk_bytes);
        match self.cfg.max_bytes {
            Some(cap) => grown.min(cap.max(current)),
            None => grown,
        }
    }
}

#[async_trait]
impl Workload for MemoryLoad {
    async fn run(&self, cancel: CancellationToken) -> Result<(), WorkloadError> {
        info!(chunk_bytes = self.cfg.chunk_bytes, "starting memory load");

        let mut buf: Vec<u8> = Vec::new();
        let mut held = Held::new(&self.held);
        let mut ticker = tokio::time::interval(self.cfg.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let result = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Ok(()),
                _ = ticker.tick() => {}
            }

            let target = self.next_len(buf.len());
            if target == buf.len() {
                continue;
            }
            if buf.try_reserve_exact(target - buf.len()).is_err() {
                break Err(WorkloadError::Allocation { bytes: target });
            }
            held.grow(target - buf.len());
            buf.resize(target, FILL);
            debug!(bytes = buf.len(), "memory grown");
        };

        info!(bytes = buf.len(), "stopping memory load");
        result
    }
}

/// This run's share of the shared `held` counter; given back on drop.
struct Held<'a> {
    total: &'a AtomicUsize,
    mine: usize,
}

impl<'a> Held<'a> {
    fn new(total: &'a AtomicUsize) -> Self {
        Self { total, mine: 0 }
    }

    fn grow(&mut self, bytes: usize) {
        self.mine += bytes;
        self.total.fetch_add(bytes, Ordering::Relaxed);
    }
}

impl Drop for Held<'_> {
    fn drop(&mut self) {
        self.total.fetch_sub(self.mine, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn load(max_bytes: Option<usize>) -> Arc<MemoryLoad> {
        Arc::new(MemoryLoad::new(MemoryConfig {
            chunk_bytes: 1024,
            interval: Duration::from_millis(5),
            max_bytes,
        }))
    }

    #[test]
    fn next_len_respects_cap() {
        let mem = load(Some(2500));
        assert_eq!(mem.next_len(0), 1024);
        assert_eq!(mem.next_len(2048), 2500);
        assert_eq!(mem.next_len(2500), 2500);

        let unbounded = load(None);
        assert_eq!(unbounded.next_len(2048), 3072);
    }

    #[tokio::test]
    async fn grows_monotonically_until_cancelled() {
        let mem = load(Some(8 * 1024));
        let cancel = CancellationToken::new();

        let run = {
            let mem = Arc::clone(&mem);
            let cancel = cancel.clone();
            tokio::spawn(async move { mem.run(cancel).await })
        };

        let mut last = 0;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let now = mem.held_bytes();
            assert!(now >= last, "buffer shrank from {last} to {now}");
            assert!(now <= 8 * 1024);
            last = now;
        }
        assert!(last > 0);

        cancel.cancel();
        let res = tokio::time::timeout(Duration::from_secs(1), run).await;
        assert!(matches!(res, Ok(Ok(Ok(())))));
        assert_eq!(mem.held_bytes(), 0);
    }

    #[tokio::test]
    async fn overlapping_runs_keep_separate_accounts() {
        let mem = load(Some(4 * 1024));
        let spawn_run = |cancel: CancellationToken| {
            let mem = Arc::clone(&mem);
            tokio::spawn(async move { mem.run(cancel).await })
        };

        let old = CancellationToken::new();
        let new = CancellationToken::new();
        let old_run = spawn_run(old.clone());
        let new_run = spawn_run(new.clone());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(mem.held_bytes(), 8 * 1024);

        old.cancel();
        let res = tokio::time::timeout(Duration::from_secs(1), old_run).await;
        assert!(matches!(res, Ok(Ok(Ok(())))));
        assert_eq!(mem.held_bytes(), 4 * 1024);

        new.cancel();
        let res = tokio::time::timeout(Duration::from_secs(1), new_run).await;
        assert!(matches!(res, Ok(Ok(Ok(())))));
        assert_eq!(mem.held_bytes(), 0);
    }
}
