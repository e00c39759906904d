use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

/// Opaque identifier naming a workload kind (e.g. `"cpu"`, `"memory"`).
///
/// Equality is exact string match: no trimming, no case folding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkloadName(String);

impl WorkloadName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkloadName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkloadName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WorkloadName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for WorkloadName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for WorkloadName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_exact() {
        assert_eq!(WorkloadName::from("cpu"), WorkloadName::new("cpu".to_string()));
        assert_ne!(WorkloadName::from("cpu"), WorkloadName::from("CPU"));
        assert_ne!(WorkloadName::from("cpu"), WorkloadName::from(" cpu"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&WorkloadName::from("memory")).unwrap();
        assert_eq!(json, r#""memory""#);
    }
}
