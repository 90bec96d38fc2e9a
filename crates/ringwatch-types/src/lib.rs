//! Shared types for ringwatch.
//!
//! This crate defines the value types passed between the monitoring
//! topology and its collaborators: the member identifier ([`NodeId`]),
//! inbound change events ([`LinkUpdate`], [`LinkStatus`]) and the
//! notifications emitted once a change has been applied
//! ([`MembershipChange`]).

use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Identifier for a cluster member, derived from its network address.
///
/// Wraps the canonical string form of the address. Equality, ordering and
/// hashing are all by value.
#[derive(Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create an identifier from an already-canonical address string.
    pub fn new(canonical: impl Into<String>) -> Self {
        Self(canonical.into())
    }

    /// Return the canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<SocketAddr> for NodeId {
    fn from(addr: SocketAddr) -> Self {
        Self(addr.to_string())
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Change events
// ---------------------------------------------------------------------------

/// Liveness verdict carried by a [`LinkUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LinkStatus {
    /// The source joined or is reachable again.
    Up,
    /// The source left or was declared failed.
    Down,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("UP"),
            Self::Down => f.write_str("DOWN"),
        }
    }
}

/// A membership change decided by the dissemination layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkUpdate {
    /// The member the verdict is about.
    pub src: NodeId,
    /// Whether the member is joining or leaving.
    pub status: LinkStatus,
}

impl LinkUpdate {
    /// An `UP` event for `src`.
    pub fn up(src: impl Into<NodeId>) -> Self {
        Self {
            src: src.into(),
            status: LinkStatus::Up,
        }
    }

    /// A `DOWN` event for `src`.
    pub fn down(src: impl Into<NodeId>) -> Self {
        Self {
            src: src.into(),
            status: LinkStatus::Down,
        }
    }
}

/// A change that has been applied to every ring of a topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipChange {
    /// The member was added to all rings.
    Joined(NodeId),
    /// The member was removed from all rings.
    Left(NodeId),
}

impl MembershipChange {
    /// The member the change is about.
    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::Joined(id) | Self::Left(id) => id,
        }
    }
}
