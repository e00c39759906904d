use std::{path::PathBuf, time::Duration};

use tester_model::names;

use crate::error::LoadError;

const MIB: usize = 1024 * 1024;
/// Longest allowed gap between two cancellation checks.
pub const MAX_OBSERVE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct CpuConfig {
    /// Busy workers to run. `None` means one per available CPU.
    pub workers: Option<usize>,
    /// Uninterrupted spin time between cancellation checks.
    pub busy_slice: Duration,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            workers: None,
            busy_slice: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Bytes added to the buffer on every tick.
    pub chunk_bytes: usize,
    pub interval: Duration,
    /// Stop growing (but keep holding) once the buffer reaches this size.
    pub max_bytes: Option<usize>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            chunk_bytes: 100 * MIB,
            interval: Duration::from_secs(1),
            max_bytes: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiskConfig {
    /// Directory for the fill file.
    pub dir: PathBuf,
    /// Bytes appended on every tick.
    pub chunk_bytes: usize,
    pub interval: Duration,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir(),
            chunk_bytes: MIB,
            interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadConfig {
    pub cpu: CpuConfig,
    pub memory: MemoryConfig,
    pub disk: DiskConfig,
}

impl LoadConfig {
    pub fn validate(&self) -> Result<(), LoadError> {
        check_cadence(names::CPU, "busy_slice", self.cpu.busy_slice)?;
        if self.cpu.workers == Some(0) {
            return Err(invalid(names::CPU, "workers must be at least 1"));
        }

        check_cadence(names::MEMORY, "interval", self.memory.interval)?;
        if self.memory.chunk_bytes == 0 {
            return Err(invalid(names::MEMORY, "chunk_bytes must be greater than zero"));
        }

        check_cadence(names::DISK, "interval", self.disk.interval)?;
        if self.disk.chunk_bytes == 0 {
            return Err(invalid(names::DISK, "chunk_bytes must be greater than zero"));
        }
        Ok(())
    }
}

fn check_cadence(
    workload: &'static str,
    field: &str,
    value: Duration,
) -> Result<(), LoadError> {
    if value.is_zero() || value > MAX_OBSERVE_INTERVAL {
        return Err(invalid(
            workload,
            format!("{field} must be within (0, {}ms]", MAX_OBSERVE_INTERVAL.as_millis()),
        ));
    }
    Ok(())
}

fn invalid(workload: &'static str, reason: impl Into<String>) -> LoadError {
    LoadError::InvalidConfig {
        workload,
        reason: reason.into(),
    }
}
