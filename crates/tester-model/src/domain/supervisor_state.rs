use serde::{Deserialize, Serialize};

/// Lifecycle of a supervisor.
///
/// `Running -> Draining -> Stopped | Failed`. Both end states are terminal,
/// there is no restart path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SupervisorState {
    /// Polling loop and workloads are running.
    Running,
    /// Every workload has been cancelled; waiting for all tasks to return.
    Draining,
    /// All tasks exited and no fatal error was observed.
    Stopped,
    /// All tasks exited after a non-cancellation error.
    Failed,
}

impl SupervisorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SupervisorState::Stopped | SupervisorState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(SupervisorState::Stopped.is_terminal());
        assert!(SupervisorState::Failed.is_terminal());

        assert!(!SupervisorState::Running.is_terminal());
        assert!(!SupervisorState::Draining.is_terminal());
    }

    #[test]
    fn serde_uses_camel_case() {
        let json = serde_json::to_string(&SupervisorState::Draining).unwrap();
        assert_eq!(json, r#""draining""#);
    }
}
