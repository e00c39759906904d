use std::{collections::HashMap, sync::Arc};

use tester_model::WorkloadName;
use tracing::trace;

use crate::{error::CoreError, workload::Workload};

/// Maps workload names to their implementations.
///
/// The registered names are exactly the names a tester recognizes;
/// anything else in a desired set is ignored by the reconciler.
#[derive(Default, Clone)]
pub struct WorkloadRegistry {
    workloads: HashMap<WorkloadName, Arc<dyn Workload>>,
}

impl WorkloadRegistry {
    #[inline]
    pub fn new() -> Self {
        Self {
            workloads: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        name: impl Into<WorkloadName>,
        workload: Arc<dyn Workload>,
    ) -> Result<(), CoreError> {
        let name = name.into();
        if self.workloads.contains_key(&name) {
            return Err(CoreError::DuplicateWorkload(name));
        }
        trace!(workload = %name, "workload registered");
        self.workloads.insert(name, workload);
        Ok(())
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Workload>> {
        self.workloads.get(name).cloned()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.workloads.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<WorkloadName> {
        let mut names: Vec<_> = self.workloads.keys().cloned().collect();
        names.sort();
        names
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.workloads.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.workloads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::WorkloadError;
    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    struct Idle;

    #[async_trait]
    impl Workload for Idle {
        async fn run(&self, cancel: CancellationToken) -> Result<(), WorkloadError> {
            cancel.cancelled().await;
            Ok(())
        }
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = WorkloadRegistry::new();
        registry.register("cpu", Arc::new(Idle)).unwrap();
        registry.register("memory", Arc::new(Idle)).unwrap();

        assert!(registry.contains("cpu"));
        assert!(registry.get("memory").is_some());
        assert!(registry.get("disk").is_none());
        assert_eq!(
            registry.names(),
            vec![WorkloadName::from("cpu"), WorkloadName::from("memory")]
        );
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = WorkloadRegistry::new();
        registry.register("cpu", Arc::new(Idle)).unwrap();

        let err = registry.register("cpu", Arc::new(Idle)).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateWorkload(name) if name.as_str() == "cpu"));
        assert_eq!(registry.len(), 1);
    }
}
