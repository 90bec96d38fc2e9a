//! Construction-time configuration for a monitoring topology.
//!
//! ```toml
//! ring_count = 10
//! event_capacity = 256
//! ```

use std::num::NonZeroUsize;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default number of rings (independent monitors per member).
pub const DEFAULT_RING_COUNT: usize = 10;

/// Default capacity of the membership-change broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Configuration for a [`MonitoringTopology`](crate::MonitoringTopology).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Number of rings, K. Fixed for the topology's lifetime.
    pub ring_count: usize,
    /// Buffered [`MembershipChange`](ringwatch_types::MembershipChange)
    /// notifications per subscriber before slow receivers start lagging.
    pub event_capacity: usize,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            ring_count: DEFAULT_RING_COUNT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl TopologyConfig {
    /// Create a config suitable for small test clusters (K = 3).
    pub fn test_config() -> Self {
        Self {
            ring_count: 3,
            event_capacity: 64,
        }
    }

    /// Parse and validate a config from TOML source.
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(src).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is within range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ring_count == 0 {
            return Err(ConfigError::InvalidRingCount);
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidEventCapacity);
        }
        Ok(())
    }

    /// The validated ring count.
    pub fn ring_count(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.ring_count).ok_or(ConfigError::InvalidRingCount)
    }
}
