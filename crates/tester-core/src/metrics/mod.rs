use std::sync::Arc;

use tester_model::WorkloadName;

/// Sink for supervisor and workload lifecycle counters.
pub trait MetricsBackend: Send + Sync {
    fn workload_started(&self, name: &WorkloadName);
    fn workload_stopped(&self, name: &WorkloadName);
    fn workload_failed(&self, name: &WorkloadName);
    fn reconcile_tick(&self);
    fn source_error(&self);
}

pub type MetricsHandle = Arc<dyn MetricsBackend>;

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsBackend for NoopMetrics {
    fn workload_started(&self, _name: &WorkloadName) {}
    fn workload_stopped(&self, _name: &WorkloadName) {}
    fn workload_failed(&self, _name: &WorkloadName) {}
    fn reconcile_tick(&self) {}
    fn source_error(&self) {}
}

pub fn noop() -> MetricsHandle {
    Arc::new(NoopMetrics)
}
