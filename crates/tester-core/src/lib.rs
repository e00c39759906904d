pub mod error;
pub use error::CoreError;

pub mod health;
pub use health::Health;

pub mod metrics;
pub use metrics::{MetricsBackend, MetricsHandle, NoopMetrics};

pub mod workload;
pub use workload::{Workload, WorkloadError};

pub mod registry;
pub use registry::WorkloadRegistry;

pub mod source;
pub use source::{DesiredSetSource, SourceError};

pub mod reconciler;
pub use reconciler::{ActiveSet, ActiveWorkload, ReconcileReport, Spawn, TaskHandle, reconcile};

pub mod supervisor;
pub use supervisor::{Supervisor, SupervisorConfig, SupervisorError};
