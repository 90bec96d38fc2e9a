//! Error types for the topology crate.

use ringwatch_types::NodeId;

/// Errors returned by [`MonitoringTopology`](crate::MonitoringTopology)
/// operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    /// The node is already a member of every ring.
    #[error("node already in ring: {0}")]
    DuplicateMember(NodeId),

    /// The node is not a current member.
    #[error("node not in ring: {0}")]
    MemberNotFound(NodeId),

    /// A ring index at or beyond the configured ring count.
    #[error("ring {index} out of range (topology has {ring_count} rings)")]
    RingOutOfRange {
        /// The requested ring.
        index: usize,
        /// Number of rings in the topology.
        ring_count: usize,
    },

    /// The topology could not be built from its configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors produced while loading or validating a
/// [`TopologyConfig`](crate::TopologyConfig).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The TOML source could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// `ring_count` must be at least 1.
    #[error("ring_count must be positive")]
    InvalidRingCount,

    /// `event_capacity` must be at least 1.
    #[error("event_capacity must be positive")]
    InvalidEventCapacity,
}
