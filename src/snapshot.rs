//! Versioned configuration snapshots.
//!
//! A snapshot is the compiled, immutable form of one validated
//! `GatewayConfig`: the route table, the cluster map, the admission limiter
//! and the forwarding options. The active snapshot is shared read-only
//! across all request tasks and replaced wholesale on reload. Readers load
//! a consistent `Arc` per request and never observe a partial update.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

use crate::admission::FixedWindowLimiter;
use crate::config::schema::{ForwardingConfig, GatewayConfig};
use crate::config::validation::validate_config;
use crate::error::GatewayError;
use crate::load_balancer::ClusterMap;
use crate::routing::RouteTable;

/// Compiled runtime state derived from one config.
///
/// Rate-limit counters and rotation cursors live here, so applying a new
/// snapshot replaces them along with the tables.
#[derive(Debug)]
pub struct GatewaySnapshot {
    /// Monotonic version, for logs and reload diagnostics.
    pub version: u64,
    pub routes: RouteTable,
    pub clusters: ClusterMap,
    pub limiter: FixedWindowLimiter,
    pub forwarding: ForwardingConfig,
    /// Deadline for one upstream call; reloads with the rest of the snapshot.
    pub upstream_timeout: Duration,
}

impl GatewaySnapshot {
    /// Compile a config into a snapshot. Validation and compilation errors
    /// both reject the snapshot as a whole; nothing is partially applied.
    pub fn build(config: &GatewayConfig, version: u64) -> Result<Self, GatewayError> {
        if let Err(errors) = validate_config(config) {
            let joined = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(GatewayError::InvalidSnapshot(joined));
        }

        let routes = RouteTable::compile(&config.routes).map_err(GatewayError::InvalidSnapshot)?;
        let clusters =
            ClusterMap::build(&config.clusters).map_err(GatewayError::InvalidSnapshot)?;
        let limiter = FixedWindowLimiter::new(&config.rate_limit_policies);

        Ok(Self {
            version,
            routes,
            clusters,
            limiter,
            forwarding: config.forwarding.clone(),
            upstream_timeout: Duration::from_secs(config.timeouts.upstream_secs),
        })
    }
}

/// Atomically swappable handle to the active snapshot.
pub struct SharedSnapshot {
    current: ArcSwap<GatewaySnapshot>,
    next_version: AtomicU64,
}

impl SharedSnapshot {
    pub fn new(initial: GatewaySnapshot) -> Self {
        let next = initial.version + 1;
        Self {
            current: ArcSwap::from_pointee(initial),
            next_version: AtomicU64::new(next),
        }
    }

    /// Load the active snapshot. Each request loads once and uses that
    /// snapshot for its whole pipeline.
    pub fn load(&self) -> Arc<GatewaySnapshot> {
        self.current.load_full()
    }

    /// Build a snapshot from `config` and swap it in.
    ///
    /// All-or-nothing: on any validation or compilation failure the
    /// previously active snapshot remains in force and the error is
    /// returned to the reload initiator.
    pub fn apply(&self, config: &GatewayConfig) -> Result<u64, GatewayError> {
        let version = self.next_version.fetch_add(1, Ordering::Relaxed);
        let snapshot = GatewaySnapshot::build(config, version)?;
        self.current.store(Arc::new(snapshot));
        tracing::info!(version, "Applied new configuration snapshot");
        Ok(version)
    }
}
