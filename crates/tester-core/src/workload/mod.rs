use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// A named, cancellable unit of simulated load.
///
/// Implementations must start loading promptly, check `cancel` at least once per second
/// and return soon after it fires. Returning after cancellation is graceful completion:
/// either `Ok(())` or [`WorkloadError::Cancelled`].
#[async_trait]
pub trait Workload: Send + Sync + 'static {
    async fn run(&self, cancel: CancellationToken) -> Result<(), WorkloadError>;
}

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("failed to allocate {bytes} bytes")]
    Allocation { bytes: usize },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("worker failed: {0}")]
    Worker(String),
    #[error("workload panicked: {0}")]
    Panicked(String),
    #[error("cancelled")]
    Cancelled,
}

impl WorkloadError {
    /// `true` for the variant that signals a graceful stop rather than a failure.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkloadError::Cancelled)
    }
}
