//! Counts of change events rejected during delivery.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Process-scoped rejection counters.
///
/// Incremented only by [`MonitoringTopology::deliver`](crate::MonitoringTopology::deliver)
/// when an event turns out to be stale. Increments are lock-free and never
/// reset.
#[derive(Debug, Default)]
pub struct RejectionCounters {
    duplicate_adds: AtomicU64,
    missing_removes: AtomicU64,
}

/// Point-in-time copy of [`RejectionCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RejectionStats {
    /// `UP` events for nodes that were already members.
    pub duplicate_adds: u64,
    /// `DOWN` events for nodes that were not members.
    pub missing_removes: u64,
}

impl RejectionCounters {
    /// Number of `UP` events rejected because the node was already a member.
    pub fn duplicate_adds(&self) -> u64 {
        self.duplicate_adds.load(Ordering::Relaxed)
    }

    /// Number of `DOWN` events rejected because the node was not a member.
    pub fn missing_removes(&self) -> u64 {
        self.missing_removes.load(Ordering::Relaxed)
    }

    /// Current value of both counters.
    pub fn snapshot(&self) -> RejectionStats {
        RejectionStats {
            duplicate_adds: self.duplicate_adds(),
            missing_removes: self.missing_removes(),
        }
    }

    /// Returns the new count.
    pub(crate) fn record_duplicate_add(&self) -> u64 {
        self.duplicate_adds.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Returns the new count.
    pub(crate) fn record_missing_remove(&self) -> u64 {
        self.missing_removes.fetch_add(1, Ordering::Relaxed) + 1
    }
}
