//! Desired-vs-active diff for one reconcile tick.
//!
//! [`reconcile`] is a three-way set diff: names only in the active set are stopped,
//! names only in the desired set are started (if registered), names in both are
//! left alone. Every stop is issued before the first start.
//!
//! The active set is not synchronised; callers serialise ticks by owning it from a
//! single task.
use std::{collections::HashMap, sync::Arc};

use tester_model::{DesiredSet, WorkloadName};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::{registry::WorkloadRegistry, workload::Workload};

pub type TaskHandle = JoinHandle<()>;

/// A running workload together with the means to stop it.
#[derive(Debug)]
pub struct ActiveWorkload {
    name: WorkloadName,
    cancel: CancellationToken,
    handle: TaskHandle,
}

impl ActiveWorkload {
    #[inline]
    pub fn name(&self) -> &WorkloadName {
        &self.name
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `true` once the workload task has returned.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn into_handle(self) -> TaskHandle {
        self.handle
    }
}

/// Table of running workloads, keyed uniquely by name.
///
/// Tokens handed to workloads are children of `parent`, so cancelling the parent
/// reaches every entry even between ticks.
#[derive(Debug)]
pub struct ActiveSet {
    parent: CancellationToken,
    entries: HashMap<WorkloadName, ActiveWorkload>,
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::with_parent(CancellationToken::new())
    }

    pub fn with_parent(parent: CancellationToken) -> Self {
        Self {
            parent,
            entries: HashMap::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&ActiveWorkload> {
        self.entries.get(name)
    }

    /// Active names in sorted order.
    pub fn names(&self) -> Vec<WorkloadName> {
        let mut names: Vec<_> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Cancels the entry and only then removes it.
    ///
    /// Does not wait for the task; the returned entry still holds its handle.
    pub fn stop(&mut self, name: &str) -> Option<ActiveWorkload> {
        self.entries.get(name)?.cancel.cancel();
        self.entries.remove(name)
    }

    /// Stops every entry. Used on shutdown and drain.
    pub fn stop_all(&mut self) -> Vec<ActiveWorkload> {
        for entry in self.entries.values() {
            entry.cancel.cancel();
        }
        self.entries.drain().map(|(_, entry)| entry).collect()
    }

    fn insert(&mut self, entry: ActiveWorkload) {
        debug_assert!(!self.entries.contains_key(&entry.name));
        self.entries.insert(entry.name.clone(), entry);
    }
}

impl Default for ActiveSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Starts the task for a newly desired workload.
pub trait Spawn {
    fn spawn(
        &mut self,
        name: &WorkloadName,
        workload: Arc<dyn Workload>,
        cancel: CancellationToken,
    ) -> TaskHandle;
}

impl<F> Spawn for F
where
    F: FnMut(&WorkloadName, Arc<dyn Workload>, CancellationToken) -> TaskHandle,
{
    fn spawn(
        &mut self,
        name: &WorkloadName,
        workload: Arc<dyn Workload>,
        cancel: CancellationToken,
    ) -> TaskHandle {
        self(name, workload, cancel)
    }
}

/// What a single tick changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub stopped: Vec<WorkloadName>,
    pub started: Vec<WorkloadName>,
    /// Desired but unregistered names.
    pub ignored: Vec<WorkloadName>,
}

impl ReconcileReport {
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.stopped.is_empty() && self.started.is_empty()
    }
}

#[instrument(level = "debug", skip_all, fields(desired = desired.len(), active = active.len()))]
pub fn reconcile<S>(
    desired: &DesiredSet,
    active: &mut ActiveSet,
    registry: &WorkloadRegistry,
    spawn: &mut S,
) -> ReconcileReport
where
    S: Spawn + ?Sized,
{
    let mut report = ReconcileReport::default();

    let mut leaving: Vec<WorkloadName> = active
        .entries
        .keys()
        .filter(|name| !desired.contains(name.as_str()))
        .cloned()
        .collect();
    leaving.sort();

    for name in leaving {
        if active.stop(name.as_str()).is_some() {
            info!(workload = %name, "workload no longer desired, cancelled");
            report.stopped.push(name);
        }
    }

    for name in desired {
        if active.contains(name.as_str()) {
            continue;
        }
        let Some(workload) = registry.get(name.as_str()) else {
            debug!(workload = %name, "unrecognized workload ignored");
            report.ignored.push(name.clone());
            continue;
        };

        let cancel = active.parent.child_token();
        let handle = spawn.spawn(name, workload, cancel.clone());
        active.insert(ActiveWorkload {
            name: name.clone(),
            cancel,
            handle,
        });
        info!(workload = %name, "workload desired, started");
        report.started.push(name.clone());
    }

    report
}
