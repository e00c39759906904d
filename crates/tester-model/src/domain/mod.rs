mod workload_name;
pub use workload_name::WorkloadName;

mod desired_set;
pub use desired_set::DesiredSet;

mod supervisor_state;
pub use supervisor_state::SupervisorState;

mod backoff;
pub use backoff::{BackoffError, BackoffStrategy};

/// Well-known workload names.
///
/// The set of names a tester actually runs is decided by what is registered,
/// these constants only keep the spelling in one place.
pub mod names {
    pub const CPU: &str = "cpu";
    pub const MEMORY: &str = "memory";
    pub const DISK: &str = "disk";
    pub const NETWORK: &str = "network";
}
