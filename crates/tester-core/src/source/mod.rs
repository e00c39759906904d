use async_trait::async_trait;
use thiserror::Error;

use tester_model::DesiredSet;

/// Supplies the set of workloads that should run for this tester right now.
///
/// A successful empty set means "stop everything".
#[async_trait]
pub trait DesiredSetSource: Send + Sync + 'static {
    async fn fetch(&self) -> Result<DesiredSet, SourceError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("desired-set source unavailable ({operation}): {reason}")]
    Unavailable {
        operation: &'static str,
        reason: String,
    },
}

impl SourceError {
    pub fn unavailable(operation: &'static str, reason: impl Into<String>) -> Self {
        SourceError::Unavailable {
            operation,
            reason: reason.into(),
        }
    }
}
