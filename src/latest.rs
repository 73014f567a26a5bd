//! Keeps only the results of the most recently issued search.
//!
//! Searches may complete out of order. Each search takes a [`SearchTicket`]
//! before issuing its request and presents it when applying the results;
//! results from a superseded ticket are discarded.
use crate::model::SearchResultSet;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchTicket(u64);

#[derive(Debug, Default)]
pub struct LatestResults {
    generation: AtomicU64,
    applied: RwLock<Option<SearchResultSet>>,
}

impl LatestResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new search, superseding every ticket issued before.
    pub fn begin(&self) -> SearchTicket {
        SearchTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Store `results` if `ticket` is still the latest. Returns whether they were stored.
    pub fn apply(&self, ticket: SearchTicket, results: SearchResultSet) -> bool {
        // Checked under the write lock so a stale apply cannot land after a newer one.
        let mut slot = self.applied.write();
        if !self.is_current(ticket) {
            debug!(ticket = ticket.0, "Discarding results of a superseded search");
            return false;
        }
        *slot = Some(results);
        true
    }

    /// Drop the current results and invalidate searches still in flight.
    pub fn clear(&self) {
        let mut slot = self.applied.write();
        self.generation.fetch_add(1, Ordering::SeqCst);
        *slot = None;
    }

    pub fn current(&self) -> Option<SearchResultSet> {
        self.applied.read().clone()
    }
}
