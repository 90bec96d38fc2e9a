//! Per-ring ordering keys.
//!
//! Ring `k` sorts its members by `ordering_key(k, node)`. Each ring index
//! seeds the hash differently, so the K rings are independent pseudo-random
//! permutations of the same member set.

use std::fmt;

use ringwatch_types::NodeId;

/// Sort key for a member on one ring: 32 raw digest bytes, compared
/// lexicographically.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct OrderingKey([u8; 32]);

impl OrderingKey {
    /// Return the raw digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for OrderingKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for OrderingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrderingKey(")?;
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

/// Maps `(ring index, node)` to that node's position key on the ring.
///
/// Implementations must be deterministic: the same inputs always yield the
/// same key. Keys for different ring indexes should be uncorrelated.
pub trait HashOrdering: Send + Sync {
    /// Compute the ordering key of `node` on ring `ring`.
    fn ordering_key(&self, ring: usize, node: &NodeId) -> OrderingKey;
}

/// Default ordering: `blake3(canonical node form ++ decimal ring index)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Ordering;

impl HashOrdering for Blake3Ordering {
    fn ordering_key(&self, ring: usize, node: &NodeId) -> OrderingKey {
        let mut hasher = blake3::Hasher::new();
        hasher.update(node.as_str().as_bytes());
        hasher.update(ring.to_string().as_bytes());
        OrderingKey(hasher.finalize().into())
    }
}
