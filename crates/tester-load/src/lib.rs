//! Reference workloads: busy CPU, growing memory, growing file.
//!
//! Each one runs until its cancellation token fires and checks the token at least
//! once per configured cadence, which [`LoadConfig::validate`] bounds to one second.

mod error;
pub use error::LoadError;

mod config;
pub use config::{CpuConfig, DiskConfig, LoadConfig, MemoryConfig};

pub mod cpu;
pub use cpu::CpuLoad;

pub mod memory;
pub use memory::MemoryLoad;

pub mod disk;
pub use disk::DiskLoad;

use std::sync::Arc;

use tester_core::WorkloadRegistry;
use tester_model::names;
use tracing::debug;

/// Registers `cpu`, `memory` and `disk`.
pub fn register_builtin_workloads(
    registry: &mut WorkloadRegistry,
    cfg: &LoadConfig,
) -> Result<(), LoadError> {
    cfg.validate()?;

    registry.register(names::CPU, Arc::new(CpuLoad::new(cfg.cpu.clone())))?;
    registry.register(names::MEMORY, Arc::new(MemoryLoad::new(cfg.memory.clone())))?;
    registry.register(names::DISK, Arc::new(DiskLoad::new(cfg.disk.clone())))?;

    debug!(workloads = ?registry.names(), "builtin workloads registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered_and_network_is_not() {
        let mut registry = WorkloadRegistry::new();
        register_builtin_workloads(&mut registry, &LoadConfig::default()).unwrap();

        assert!(registry.contains(names::CPU));
        assert!(registry.contains(names::MEMORY));
        assert!(registry.contains(names::DISK));
        assert!(!registry.contains(names::NETWORK));
    }

    #[test]
    fn registering_twice_fails() {
        let mut registry = WorkloadRegistry::new();
        register_builtin_workloads(&mut registry, &LoadConfig::default()).unwrap();

        let err = register_builtin_workloads(&mut registry, &LoadConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::Registry(_)));
    }
}
