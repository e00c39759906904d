use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid {workload} config: {reason}")]
    InvalidConfig {
        workload: &'static str,
        reason: String,
    },
    #[error("registry error: {0}")]
    Registry(#[from] tester_core::CoreError),
}
