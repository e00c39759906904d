use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use tester_core::{Workload, WorkloadError};
use tokio::{fs, io::AsyncWriteExt, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::DiskConfig;

const FILL: u8 = 0x5A;

/// Appends `chunk_bytes` to a private file every `interval` until cancelled.
///
/// The file is never truncated while running and is removed once the workload stops.
pub struct DiskLoad {
    cfg: DiskConfig,
    written: Arc<AtomicU64>,
}

impl DiskLoad {
    pub fn new(cfg: DiskConfig) -> Self {
        Self {
            cfg,
            written: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Bytes written by the current (or last) run.
    pub fn written_bytes(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    async fn fill(&self, path: &Path, cancel: &CancellationToken) -> Result<(), WorkloadError> {
        let mut file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(path)
            .await?;
        let chunk = vec![FILL; self.cfg.chunk_bytes];

        let mut ticker = tokio::time::interval(self.cfg.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                _ = ticker.tick() => {}
            }
            file.write_all(&chunk).await?;
            file.flush().await?;
            let total = self
                .written
                .fetch_add(chunk.len() as u64, Ordering::Relaxed)
                + chunk.len() as u64;
            debug!(bytes = total, "disk file grown");
        }
    }
}

#[async_trait]
impl Workload for DiskLoad {
    async fn run(&self, cancel: CancellationToken) -> Result<(), WorkloadError> {
        fs::create_dir_all(&self.cfg.dir).await?;
        let path: PathBuf = self
            .cfg
            .dir
            .join(format!("tester-disk-{}.fill", Uuid::new_v4()));
        self.written.store(0, Ordering::Relaxed);
        info!(path = %path.display(), "starting disk load");

        let result = self.fill(&path, &cancel).await;

        if let Err(e) = fs::remove_file(&path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %path.display(), error = %e, "failed to remove disk fill file");
        }
        info!(bytes = self.written_bytes(), "stopping disk load");
        result
    }
}
