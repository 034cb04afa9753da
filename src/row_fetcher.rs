//! Per-row background fetching
//!
//! Each watchlist card gets its own lookup task, keyed by a [`RowId`] that is
//! never reused. Re-rendering the list aborts the tasks of the rows it throws
//! away, and a late result for a row that no longer exists is simply dropped
//! by the receiver.

use std::collections::HashMap;
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::debug;

/// Identity of one rendered row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(u64);

impl RowId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Tracks the in-flight task of every live row
#[derive(Debug, Default)]
pub struct RowFetcher {
    next_id: u64,
    tasks: HashMap<RowId, JoinHandle<()>>,
}

impl RowFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh row id
    pub fn allocate(&mut self) -> RowId {
        self.next_id += 1;
        RowId(self.next_id)
    }

    /// Spawn the fetch task for a row
    pub fn spawn<F>(&mut self, row: RowId, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(previous) = self.tasks.insert(row, tokio::spawn(task)) {
            previous.abort();
        }
    }

    /// Abort every in-flight row task
    pub fn cancel_all(&mut self) {
        if !self.tasks.is_empty() {
            debug!("Cancelling {} row fetches", self.tasks.len());
        }
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }

    /// Forget a row whose result has been applied
    pub fn finish(&mut self, row: RowId) {
        self.tasks.remove(&row);
    }

    /// Drop handles of tasks that already completed
    pub fn reap(&mut self) {
        self.tasks.retain(|_, handle| !handle.is_finished());
    }

    /// Take every outstanding handle, for callers that need to await them
    pub fn drain_handles(&mut self) -> Vec<JoinHandle<()>> {
        self.tasks.drain().map(|(_, handle)| handle).collect()
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }
}

impl Drop for RowFetcher {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
