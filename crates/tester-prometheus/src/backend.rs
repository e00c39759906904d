use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};
use tester_core::MetricsBackend;
use tester_model::WorkloadName;

#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    started: IntCounterVec,
    stopped: IntCounterVec,
    failed: IntCounterVec,
    active: IntGaugeVec,
    ticks: IntCounter,
    source_errors: IntCounter,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let started = IntCounterVec::new(
            Opts::new("tester_workloads_started_total", "Workloads started"),
            &["workload"],
        )?;
        let stopped = IntCounterVec::new(
            Opts::new("tester_workloads_stopped_total", "Workloads stopped cleanly"),
            &["workload"],
        )?;
        let failed = IntCounterVec::new(
            Opts::new("tester_workload_failures_total", "Workloads that returned an error"),
            &["workload"],
        )?;
        let active = IntGaugeVec::new(
            Opts::new("tester_workloads_active", "Workloads currently running"),
            &["workload"],
        )?;
        let ticks = IntCounter::new("tester_reconcile_ticks_total", "Reconcile ticks applied")?;
        let source_errors =
            IntCounter::new("tester_source_errors_total", "Failed desired-set fetches")?;

        registry.register(Box::new(started.clone()))?;
        registry.register(Box::new(stopped.clone()))?;
        registry.register(Box::new(failed.clone()))?;
        registry.register(Box::new(active.clone()))?;
        registry.register(Box::new(ticks.clone()))?;
        registry.register(Box::new(source_errors.clone()))?;

        Ok(Self {
            registry,
            started,
            stopped,
            failed,
            active,
            ticks,
            source_errors,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<prometheus::proto::MetricFamily> {
        self.registry.gather()
    }

    /// Text exposition format, ready to serve.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn workload_started(&self, name: &WorkloadName) {
        self.started.with_label_values(&[name.as_str()]).inc();
        self.active.with_label_values(&[name.as_str()]).inc();
    }

    fn workload_stopped(&self, name: &WorkloadName) {
        self.stopped.with_label_values(&[name.as_str()]).inc();
        self.active.with_label_values(&[name.as_str()]).dec();
    }

    fn workload_failed(&self, name: &WorkloadName) {
        self.failed.with_label_values(&[name.as_str()]).inc();
        self.active.with_label_values(&[name.as_str()]).dec();
    }

    fn reconcile_tick(&self) {
        self.ticks.inc();
    }

    fn source_error(&self) {
        self.source_errors.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_updates_counters_and_gauge() {
        let metrics = PrometheusMetrics::new().unwrap();
        let cpu = WorkloadName::from("cpu");

        metrics.workload_started(&cpu);
        metrics.workload_started(&WorkloadName::from("memory"));
        metrics.workload_stopped(&cpu);
        metrics.reconcile_tick();
        metrics.source_error();

        assert_eq!(metrics.started.with_label_values(&["cpu"]).get(), 1);
        assert_eq!(metrics.active.with_label_values(&["cpu"]).get(), 0);
        assert_eq!(metrics.active.with_label_values(&["memory"]).get(), 1);
        assert_eq!(metrics.ticks.get(), 1);
        assert_eq!(metrics.source_errors.get(), 1);
    }

    #[test]
    fn render_contains_metric_names() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.workload_failed(&WorkloadName::from("disk"));
        metrics.reconcile_tick();

        let text = metrics.render().unwrap();
        assert!(text.contains("tester_workload_failures_total{workload=\"disk\"} 1"));
        assert!(text.contains("tester_reconcile_ticks_total 1"));
    }

    #[test]
    fn double_registration_fails() {
        let registry = Registry::new();
        assert!(PrometheusMetrics::with_registry(registry.clone()).is_ok());
        assert!(PrometheusMetrics::with_registry(registry).is_err());
    }
}
