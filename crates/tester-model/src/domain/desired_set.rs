use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::WorkloadName;

/// Complete target state at the moment of a poll.
///
/// Absence of a name means "should not be running", never "unknown".
/// An empty set is a valid answer and asks for every workload to stop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesiredSet {
    names: BTreeSet<WorkloadName>,
}

impl DesiredSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a name; duplicates collapse.
    pub fn insert(&mut self, name: impl Into<WorkloadName>) -> bool {
        self.names.insert(name.into())
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkloadName> {
        self.names.iter()
    }
}

impl<N> FromIterator<N> for DesiredSet
where
    N: Into<WorkloadName>,
{
    fn from_iter<I: IntoIterator<Item = N>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl IntoIterator for DesiredSet {
    type Item = WorkloadName;
    type IntoIter = std::collections::btree_set::IntoIter<WorkloadName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

impl<'a> IntoIterator for &'a DesiredSet {
    type Item = &'a WorkloadName;
    type IntoIter = std::collections::btree_set::Iter<'a, WorkloadName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_collapse() {
        let set: DesiredSet = ["cpu", "memory", "cpu"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains("cpu"));
        assert!(set.contains("memory"));
    }

    #[test]
    fn empty_set_is_valid() {
        let set = DesiredSet::new();
        assert!(set.is_empty());
        assert!(!set.contains("cpu"));
    }

    #[test]
    fn insert_reports_novelty() {
        let mut set = DesiredSet::new();
        assert!(set.insert("disk"));
        assert!(!set.insert("disk"));
    }
}
