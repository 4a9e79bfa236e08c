//! Destination selection subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → cluster identified
//!     → cluster.rs (filter destinations to eligible: Healthy | Unknown)
//!     → Apply the cluster's strategy:
//!         - round_robin.rs (shared cursor, cyclic rotation)
//!         - random.rs (uniform pick)
//!         - least_latency.rs (minimum observed EWMA)
//!     → Return destination or NoAvailableDestination
//! ```
//!
//! # Design Decisions
//! - Strategies are stateless beyond the rotation cursor
//! - Unhealthy destinations excluded; if all are unhealthy, selection fails
//!   explicitly instead of degrading silently
//! - Health and latency are lock-free atomics updated passively by the
//!   forwarder

pub mod cluster;
pub mod destination;
pub mod least_latency;
pub mod random;
pub mod round_robin;

use std::sync::Arc;

pub use cluster::ClusterMap;
pub use destination::{Destination, HealthState};

/// Strategy for picking one destination among the eligible set.
pub trait Balancer: Send + Sync + std::fmt::Debug {
    /// Pick one destination. `eligible` is never empty and already filtered
    /// to Healthy/Unknown members.
    fn pick(&self, eligible: &[Arc<Destination>]) -> Arc<Destination>;
}
