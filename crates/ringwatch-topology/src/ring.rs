//! A single hash-ordered view of the member set.

use std::cmp::Ordering;

use ringwatch_types::NodeId;
use tracing::debug;

use crate::error::TopologyError;
use crate::ordering::OrderingKey;

/// One of the K rings: every current member, sorted by this ring's
/// ordering key.
///
/// Entries are `(key, node)` pairs kept strictly sorted, so a digest
/// collision between two distinct members falls back to comparing the
/// identifiers themselves. Callers compute the key with the topology's
/// [`HashOrdering`](crate::HashOrdering) and pass it in; the ring only
/// ever compares keys it was given.
#[derive(Debug, Clone)]
pub(crate) struct Ring {
    /// Ring index, `0..K`.
    index: usize,
    /// Sorted members with their cached ordering keys.
    entries: Vec<(OrderingKey, NodeId)>,
}

impl Ring {
    /// Create an empty ring.
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            entries: Vec::new(),
        }
    }

    /// Create a ring holding a single member.
    pub(crate) fn with_member(index: usize, key: OrderingKey, node: NodeId) -> Self {
        Self {
            index,
            entries: vec![(key, node)],
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binary search for `(key, node)`: `Ok(position)` if present, otherwise
    /// `Err(insertion point)`.
    fn search(&self, key: &OrderingKey, node: &NodeId) -> Result<usize, usize> {
        self.entries.binary_search_by(|(k, n)| compare(k, n, key, node))
    }

    pub(crate) fn contains(&self, key: &OrderingKey, node: &NodeId) -> bool {
        self.search(key, node).is_ok()
    }

    /// Insert `node` at its sorted position.
    pub(crate) fn insert(&mut self, key: OrderingKey, node: NodeId) -> Result<(), TopologyError> {
        match self.search(&key, &node) {
            Ok(_) => Err(TopologyError::DuplicateMember(node)),
            Err(pos) => {
                debug!(ring = self.index, %node, pos, "inserted into ring");
                self.entries.insert(pos, (key, node));
                Ok(())
            }
        }
    }

    /// Remove `node` from the ring.
    pub(crate) fn remove(
        &mut self,
        key: &OrderingKey,
        node: &NodeId,
    ) -> Result<(), TopologyError> {
        match self.search(key, node) {
            Ok(pos) => {
                self.entries.remove(pos);
                debug!(ring = self.index, %node, pos, "removed from ring");
                Ok(())
            }
            Err(_) => Err(TopologyError::MemberNotFound(node.clone())),
        }
    }

    /// Zero-based position of `node`.
    pub(crate) fn position_of(
        &self,
        key: &OrderingKey,
        node: &NodeId,
    ) -> Result<usize, TopologyError> {
        self.search(key, node)
            .map_err(|_| TopologyError::MemberNotFound(node.clone()))
    }

    /// Position `node` would occupy if it were inserted now.
    pub(crate) fn insertion_point(&self, key: &OrderingKey, node: &NodeId) -> usize {
        match self.search(key, node) {
            Ok(pos) | Err(pos) => pos,
        }
    }

    /// Member at `pos`, if in bounds.
    pub(crate) fn at(&self, pos: usize) -> Option<&NodeId> {
        self.entries.get(pos).map(|(_, n)| n)
    }

    /// Member immediately before `pos`, wrapping from the first position to
    /// the last.
    pub(crate) fn before(&self, pos: usize) -> Option<&NodeId> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        self.at((pos + len - 1) % len)
    }

    /// Member immediately after `pos`, wrapping from the last position to
    /// the first.
    pub(crate) fn after(&self, pos: usize) -> Option<&NodeId> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        self.at((pos + 1) % len)
    }

    /// The member just before `node`, or `None` if the ring holds at most
    /// one member.
    ///
    /// Fails with [`TopologyError::MemberNotFound`] if `node` is not on a
    /// ring of two or more members.
    pub(crate) fn predecessor_of(
        &self,
        key: &OrderingKey,
        node: &NodeId,
    ) -> Result<Option<&NodeId>, TopologyError> {
        if self.len() <= 1 {
            return Ok(None);
        }
        let pos = self.position_of(key, node)?;
        Ok(self.before(pos))
    }

    /// The member just after `node`, or `None` if the ring holds at most
    /// one member.
    pub(crate) fn successor_of(
        &self,
        key: &OrderingKey,
        node: &NodeId,
    ) -> Result<Option<&NodeId>, TopologyError> {
        if self.len() <= 1 {
            return Ok(None);
        }
        let pos = self.position_of(key, node)?;
        Ok(self.after(pos))
    }

    /// Independent copy of the current order.
    pub(crate) fn snapshot(&self) -> Vec<NodeId> {
        self.entries.iter().map(|(_, n)| n.clone()).collect()
    }

    /// Iterate members in ring order.
    pub(crate) fn members(&self) -> impl Iterator<Item = &NodeId> {
        self.entries.iter().map(|(_, n)| n)
    }

    /// Whether entries are strictly increasing.
    #[cfg(test)]
    pub(crate) fn is_strictly_sorted(&self) -> bool {
        self.entries
            .windows(2)
            .all(|w| compare(&w[0].0, &w[0].1, &w[1].0, &w[1].1) == Ordering::Less)
    }
}

/// Total order over ring entries: key first, then identifier.
fn compare(
    a_key: &OrderingKey,
    a_node: &NodeId,
    b_key: &OrderingKey,
    b_node: &NodeId,
) -> Ordering {
    a_key.cmp(b_key).then_with(|| a_node.cmp(b_node))
}
