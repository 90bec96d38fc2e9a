//! Inbound seam for membership change events.

use std::sync::Arc;

use ringwatch_types::LinkUpdate;

use crate::topology::MonitoringTopology;

/// Receives change events decided by the dissemination layer.
///
/// Delivery is best effort: implementations absorb stale or duplicated
/// events instead of reporting them, so callers may deliver the same event
/// any number of times from any thread.
pub trait ChangeEventSink: Send + Sync {
    /// Apply one change event.
    fn deliver(&self, update: &LinkUpdate);
}

impl ChangeEventSink for MonitoringTopology {
    fn deliver(&self, update: &LinkUpdate) {
        MonitoringTopology::deliver(self, update);
    }
}

impl<S: ChangeEventSink + ?Sized> ChangeEventSink for Arc<S> {
    fn deliver(&self, update: &LinkUpdate) {
        (**self).deliver(update);
    }
}

/// Deliver `updates` to `sink` in order.
pub fn deliver_all<'a, S, I>(sink: &S, updates: I)
where
    S: ChangeEventSink + ?Sized,
    I: IntoIterator<Item = &'a LinkUpdate>,
{
    for update in updates {
        sink.deliver(update);
    }
}
