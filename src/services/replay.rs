//! Process-wide record of payment references that already paid for a request.
//!
//! The set only grows. It lives in memory, so a restart or a second instance
//! behind the same load balancer reopens the replay window for every
//! reference seen before; sharing it across instances needs an external store
//! with an atomic insert.

use dashmap::DashSet;

#[derive(Debug, Default)]
pub struct ReplayGuard {
    used: DashSet<String>,
}

impl ReplayGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_been_used(&self, reference: &str) -> bool {
        self.used.contains(reference)
    }

    /// Atomically records `reference` as consumed.
    ///
    /// Returns `true` only for the single caller that moved the reference from
    /// unused to used; every other caller, concurrent or later, gets `false`.
    #[must_use]
    pub fn mark_used(&self, reference: &str) -> bool {
        self.used.insert(reference.to_string())
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}
