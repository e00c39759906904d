use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BackoffError {
    #[error("backoff factor must be >= 1.0, got {0}")]
    InvalidFactor(f64),
    #[error("backoff max_ms ({max_ms}) is lower than first_ms ({first_ms})")]
    InvalidBounds { first_ms: u64, max_ms: u64 },
}

/// Bounded exponential retry policy.
///
/// `attempts` counts retries after the first failure, so `0` means fail on the first error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackoffStrategy {
    pub attempts: u32,
    pub first_ms: u64,
    pub max_ms: u64,
    pub factor: f64,
}

impl BackoffStrategy {
    /// No retries at all.
    pub fn fail_fast() -> Self {
        Self {
            attempts: 0,
            first_ms: 0,
            max_ms: 0,
            factor: 1.0,
        }
    }

    pub fn validate(&self) -> Result<(), BackoffError> {
        if self.factor.is_nan() || self.factor < 1.0 {
            return Err(BackoffError::InvalidFactor(self.factor));
        }
        if self.max_ms < self.first_ms {
            return Err(BackoffError::InvalidBounds {
                first_ms: self.first_ms,
                max_ms: self.max_ms,
            });
        }
        Ok(())
    }

    /// Delay before retry number `retry` (1-based), capped at `max_ms`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(63) as i32;
        let raw = self.first_ms as f64 * self.factor.powi(exp);
        let ms = if raw.is_finite() {
            (raw as u64).min(self.max_ms)
        } else {
            self.max_ms
        };
        Duration::from_millis(ms)
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::fail_fast()
    }
}
