//! The K-ring monitoring topology.
//!
//! [`MonitoringTopology`] is the shared structure the probing and gossip
//! layers consult to find out who watches whom. Every member sits on all K
//! rings; its predecessor on ring `k` is one of its monitors and its
//! successor on ring `k` is one of its monitorees.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use parking_lot::RwLock;
use ringwatch_types::{LinkStatus, LinkUpdate, MembershipChange, NodeId};
use tokio::sync::broadcast;
use tracing::{error, info, trace};

use crate::config::{DEFAULT_EVENT_CAPACITY, TopologyConfig};
use crate::counters::RejectionCounters;
use crate::error::TopologyError;
use crate::ordering::{Blake3Ordering, HashOrdering, OrderingKey};
use crate::ring::Ring;

/// K hash-ordered rings over the same member set, guarded as one unit.
///
/// A single reader/writer lock covers all rings. Mutations hold the write
/// lock for their whole body, including the pre-check across every ring, so
/// a reader never sees a member on some rings but not on others. Queries
/// hold the read lock and run in parallel with each other.
pub struct MonitoringTopology {
    /// The K rings, index `k` at position `k`.
    rings: RwLock<Vec<Ring>>,
    /// Ordering function family, seeded by ring index.
    ordering: Arc<dyn HashOrdering>,
    ring_count: NonZeroUsize,
    /// Stale events absorbed by [`deliver`](Self::deliver).
    counters: RejectionCounters,
    /// Applied changes, for the gossip layer and other observers.
    event_tx: broadcast::Sender<MembershipChange>,
}

impl MonitoringTopology {
    /// Create an empty topology with `ring_count` rings.
    pub fn new(ring_count: NonZeroUsize) -> Self {
        Self::build(
            ring_count,
            Arc::new(Blake3Ordering),
            DEFAULT_EVENT_CAPACITY,
            None,
        )
    }

    /// Create a topology whose rings each hold `node` as the only member.
    ///
    /// Used to bootstrap the first node of a cluster.
    pub fn with_member(ring_count: NonZeroUsize, node: NodeId) -> Self {
        Self::build(
            ring_count,
            Arc::new(Blake3Ordering),
            DEFAULT_EVENT_CAPACITY,
            Some(node),
        )
    }

    /// Create an empty topology that orders its rings with `ordering`.
    pub fn with_ordering(ring_count: NonZeroUsize, ordering: Arc<dyn HashOrdering>) -> Self {
        Self::build(ring_count, ordering, DEFAULT_EVENT_CAPACITY, None)
    }

    /// Create an empty topology from a validated config.
    pub fn from_config(config: &TopologyConfig) -> Result<Self, TopologyError> {
        config.validate()?;
        Ok(Self::build(
            config.ring_count()?,
            Arc::new(Blake3Ordering),
            config.event_capacity,
            None,
        ))
    }

    fn build(
        ring_count: NonZeroUsize,
        ordering: Arc<dyn HashOrdering>,
        event_capacity: usize,
        seed: Option<NodeId>,
    ) -> Self {
        let rings: Vec<Ring> = (0..ring_count.get())
            .map(|k| match &seed {
                Some(node) => Ring::with_member(k, ordering.ordering_key(k, node), node.clone()),
                None => Ring::new(k),
            })
            .collect();
        let (event_tx, _) = broadcast::channel(event_capacity);

        Self {
            rings: RwLock::new(rings),
            ordering,
            ring_count,
            counters: RejectionCounters::default(),
            event_tx,
        }
    }

    /// Number of rings, K.
    pub fn ring_count(&self) -> usize {
        self.ring_count.get()
    }

    /// Number of current members.
    pub fn member_count(&self) -> usize {
        self.rings.read().first().map_or(0, Ring::len)
    }

    /// Whether `node` is a current member.
    pub fn contains(&self, node: &NodeId) -> bool {
        let rings = self.rings.read();
        rings
            .first()
            .is_some_and(|ring| ring.contains(&self.ordering.ordering_key(0, node), node))
    }

    /// Sorted snapshot of the current member set.
    pub fn members(&self) -> Vec<NodeId> {
        let rings = self.rings.read();
        let mut members: Vec<NodeId> = rings
            .first()
            .map(|ring| ring.members().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    /// Rejection counters updated by [`deliver`](Self::deliver).
    pub fn counters(&self) -> &RejectionCounters {
        &self.counters
    }

    /// Subscribe to changes applied through [`deliver`](Self::deliver).
    pub fn subscribe(&self) -> broadcast::Receiver<MembershipChange> {
        self.event_tx.subscribe()
    }

    /// Add `node` to every ring.
    ///
    /// Fails with [`TopologyError::DuplicateMember`] and leaves all rings
    /// untouched if `node` is already a member.
    pub fn add_member(&self, node: NodeId) -> Result<(), TopologyError> {
        let keys = self.keys_for(&node);
        let mut rings = self.rings.write();
        insert_all(&mut rings, &keys, &node)
    }

    /// Remove `node` from every ring.
    ///
    /// Fails with [`TopologyError::MemberNotFound`] and leaves all rings
    /// untouched if `node` is not a member.
    pub fn remove_member(&self, node: &NodeId) -> Result<(), TopologyError> {
        let keys = self.keys_for(node);
        let mut rings = self.rings.write();
        remove_all(&mut rings, &keys, node)
    }

    /// The peers that monitor `node`: its predecessor on each ring.
    ///
    /// Rings with at most one member contribute nothing. Duplicates across
    /// rings collapse, so the result holds at most K members.
    pub fn monitors_of(&self, node: &NodeId) -> Result<BTreeSet<NodeId>, TopologyError> {
        self.neighbours(node, Ring::predecessor_of)
    }

    /// The peers `node` monitors: its successor on each ring.
    pub fn monitorees_of(&self, node: &NodeId) -> Result<BTreeSet<NodeId>, TopologyError> {
        self.neighbours(node, Ring::successor_of)
    }

    /// The members that would monitor `node` if it joined now.
    ///
    /// On each ring this is the member just before `node`'s insertion
    /// point. Fails with [`TopologyError::DuplicateMember`] if `node` is
    /// already a member.
    pub fn expected_monitors_of(&self, node: &NodeId) -> Result<BTreeSet<NodeId>, TopologyError> {
        let rings = self.rings.read();
        let mut monitors = BTreeSet::new();

        for ring in rings.iter().filter(|ring| !ring.is_empty()) {
            let key = self.ordering.ordering_key(ring.index(), node);
            if ring.contains(&key, node) {
                return Err(TopologyError::DuplicateMember(node.clone()));
            }
            if let Some(monitor) = ring.before(ring.insertion_point(&key, node)) {
                monitors.insert(monitor.clone());
            }
        }

        Ok(monitors)
    }

    /// Snapshot of ring `index` in ring order.
    ///
    /// Exposes raw ordering for inspection and tests only.
    pub fn view_ring(&self, index: usize) -> Result<Vec<NodeId>, TopologyError> {
        let rings = self.rings.read();
        rings
            .get(index)
            .map(Ring::snapshot)
            .ok_or(TopologyError::RingOutOfRange {
                index,
                ring_count: self.ring_count(),
            })
    }

    /// Apply one change event.
    ///
    /// `UP` adds the source and `DOWN` removes it. An `UP` for an existing
    /// member or a `DOWN` for an unknown node is stale: it bumps the matching
    /// counter and is otherwise ignored. Nothing is reported to the caller.
    pub fn deliver(&self, update: &LinkUpdate) {
        let node = &update.src;
        let keys = self.keys_for(node);
        let mut rings = self.rings.write();

        let outcome = match update.status {
            LinkStatus::Up => {
                insert_all(&mut rings, &keys, node).map(|()| MembershipChange::Joined(node.clone()))
            }
            LinkStatus::Down => {
                remove_all(&mut rings, &keys, node).map(|()| MembershipChange::Left(node.clone()))
            }
        };

        match outcome {
            Ok(change) => {
                // Sent under the write lock: subscribers observe changes in
                // the order they were applied.
                let _ = self.event_tx.send(change);
                let members = rings.first().map_or(0, Ring::len);
                drop(rings);
                info!(%node, status = %update.status, members, "applied membership change");
            }
            // Each direction fails only one way: `insert_all` rejects members
            // and `remove_all` rejects non-members.
            Err(_) => {
                drop(rings);
                match update.status {
                    LinkStatus::Up => {
                        let count = self.counters.record_duplicate_add();
                        trace!(%node, count, "ignored UP for existing member");
                    }
                    LinkStatus::Down => {
                        let count = self.counters.record_missing_remove();
                        trace!(%node, count, "ignored DOWN for unknown member");
                    }
                }
            }
        }
    }

    /// Ordering key of `node` on every ring, index `k` at position `k`.
    fn keys_for(&self, node: &NodeId) -> Vec<OrderingKey> {
        (0..self.ring_count())
            .map(|k| self.ordering.ordering_key(k, node))
            .collect()
    }

    fn neighbours(
        &self,
        node: &NodeId,
        pick: for<'r> fn(
            &'r Ring,
            &OrderingKey,
            &NodeId,
        ) -> Result<Option<&'r NodeId>, TopologyError>,
    ) -> Result<BTreeSet<NodeId>, TopologyError> {
        let rings = self.rings.read();
        let mut peers = BTreeSet::new();

        for ring in rings.iter() {
            let key = self.ordering.ordering_key(ring.index(), node);
            if let Some(peer) = pick(ring, &key, node)? {
                peers.insert(peer.clone());
            }
        }

        Ok(peers)
    }
}

/// Insert `node` into every ring, or into none if any ring already holds it.
fn insert_all(
    rings: &mut [Ring],
    keys: &[OrderingKey],
    node: &NodeId,
) -> Result<(), TopologyError> {
    let present = count_present(rings, keys, node);
    if present > 0 {
        return Err(TopologyError::DuplicateMember(node.clone()));
    }
    for (ring, key) in rings.iter_mut().zip(keys) {
        ring.insert(*key, node.clone())?;
    }
    Ok(())
}

/// Remove `node` from every ring, or from none if any ring lacks it.
fn remove_all(
    rings: &mut [Ring],
    keys: &[OrderingKey],
    node: &NodeId,
) -> Result<(), TopologyError> {
    let present = count_present(rings, keys, node);
    if present < rings.len() {
        return Err(TopologyError::MemberNotFound(node.clone()));
    }
    for (ring, key) in rings.iter_mut().zip(keys) {
        ring.remove(key, node)?;
    }
    Ok(())
}

/// How many rings hold `node`. Anything other than none or all means the
/// rings have diverged.
fn count_present(rings: &[Ring], keys: &[OrderingKey], node: &NodeId) -> usize {
    let present = rings
        .iter()
        .zip(keys)
        .filter(|(ring, key)| ring.contains(key, node))
        .count();
    if present != 0 && present != rings.len() {
        error!(%node, present, rings = rings.len(), "member present on only some rings");
    }
    debug_assert!(
        present == 0 || present == rings.len(),
        "rings diverged for {node}: present on {present} of {}",
        rings.len()
    );
    present
}

impl std::fmt::Debug for MonitoringTopology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitoringTopology")
            .field("ring_count", &self.ring_count)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}
