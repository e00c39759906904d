//! Prometheus metrics backend for the tester supervisor.
//!
//! [`PrometheusMetrics`] implements [`tester_core::MetricsBackend`].
//!
//! ## Metrics
//! - `tester_workloads_started_total{workload}` - Counter
//! - `tester_workloads_stopped_total{workload}` - Counter
//! - `tester_workload_failures_total{workload}` - Counter
//! - `tester_workloads_active{workload}` - Gauge
//! - `tester_reconcile_ticks_total` - Counter
//! - `tester_source_errors_total` - Counter
//!
//! This crate does not serve `/metrics`; render with [`PrometheusMetrics::render`]
//! from whatever HTTP surface the binary already runs.

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
