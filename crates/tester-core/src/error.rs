use thiserror::Error;

use tester_model::{BackoffError, WorkloadName};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("workload already registered: {0}")]
    DuplicateWorkload(WorkloadName),

    #[error("invalid supervisor config: {0}")]
    InvalidConfig(String),

    #[error("invalid fetch retry policy: {0}")]
    InvalidRetry(#[from] BackoffError),
}
