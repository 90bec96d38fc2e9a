//! Multi-ring monitoring topology for scalable failure detection.
//!
//! Every member is placed on K independently hash-ordered rings. A member's
//! predecessor on each ring monitors it and its successor on each ring is one
//! of its monitorees, so each member watches and is watched by at most K peers
//! no matter how large the cluster grows.
//!
//! This crate provides:
//!
//! - [`MonitoringTopology`]: the K rings behind one reader/writer lock, with
//!   atomic add/remove and monitor/monitoree queries.
//! - [`HashOrdering`]: the per-ring ordering seam, with [`Blake3Ordering`] as
//!   the default.
//! - [`ChangeEventSink`]: the entry point the dissemination layer calls with
//!   [`LinkUpdate`](ringwatch_types::LinkUpdate)s.
//! - [`RejectionCounters`]: counts of stale events absorbed by delivery.

pub mod config;
mod counters;
mod error;
pub mod ordering;
mod ring;
mod sink;
mod topology;


pub use config::TopologyConfig;
pub use counters::{RejectionCounters, RejectionStats};
pub use error::{ConfigError, TopologyError};
pub use ordering::{Blake3Ordering, HashOrdering, OrderingKey};
pub use sink::{ChangeEventSink, deliver_all};
pub use topology::MonitoringTopology;
