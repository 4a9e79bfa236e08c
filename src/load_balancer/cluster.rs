//! Cluster management.
//!
//! # Responsibilities
//! - Group destinations by cluster name
//! - Filter to eligible destinations before applying the strategy
//! - Fail explicitly when nothing is selectable

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::schema::{ClusterConfig, Strategy};
use crate::error::GatewayError;
use crate::load_balancer::{
    destination::Destination, least_latency::LeastLatency, random::Random,
    round_robin::RoundRobin, Balancer,
};

/// One upstream cluster: its destinations and selection strategy.
#[derive(Debug)]
struct Cluster {
    destinations: Vec<Arc<Destination>>,
    balancer: Box<dyn Balancer>,
}

/// All clusters of one snapshot, keyed by name. Immutable after build;
/// only the destination atomics and the rotation cursors mutate at runtime.
#[derive(Debug, Default)]
pub struct ClusterMap {
    clusters: HashMap<String, Cluster>,
}

impl ClusterMap {
    /// Build the cluster map. Fails on unparseable destination addresses
    /// (callers surface this as an invalid snapshot).
    pub fn build(configs: &[ClusterConfig]) -> Result<Self, String> {
        let mut clusters = HashMap::with_capacity(configs.len());

        for config in configs {
            let mut destinations = Vec::with_capacity(config.destinations.len());
            for dest in &config.destinations {
                let addr = dest.address.parse().map_err(|_| {
                    format!(
                        "cluster '{}': invalid destination address '{}'",
                        config.name, dest.address
                    )
                })?;
                destinations.push(Arc::new(Destination::new(addr, dest.health)));
            }

            let balancer: Box<dyn Balancer> = match config.strategy {
                Strategy::RoundRobin => Box::new(RoundRobin::new()),
                Strategy::Random => Box::new(Random::new()),
                Strategy::LeastLatency => Box::new(LeastLatency::new()),
            };

            clusters.insert(
                config.name.clone(),
                Cluster {
                    destinations,
                    balancer,
                },
            );
        }

        Ok(Self { clusters })
    }

    /// Select one eligible destination in the named cluster.
    ///
    /// Unhealthy destinations are excluded; if every destination is
    /// unhealthy (or the cluster is unknown) the selection fails and no
    /// connection attempt is made.
    pub fn select(&self, cluster_name: &str) -> Result<Arc<Destination>, GatewayError> {
        let cluster = self
            .clusters
            .get(cluster_name)
            .ok_or_else(|| GatewayError::NoAvailableDestination {
                cluster: cluster_name.to_string(),
            })?;

        let eligible: Vec<Arc<Destination>> = cluster
            .destinations
            .iter()
            .filter(|d| d.is_eligible())
            .cloned()
            .collect();

        if eligible.is_empty() {
            return Err(GatewayError::NoAvailableDestination {
                cluster: cluster_name.to_string(),
            });
        }

        Ok(cluster.balancer.pick(&eligible))
    }

    /// All destinations across clusters (for health reporting).
    pub fn all_destinations(&self) -> impl Iterator<Item = &Arc<Destination>> {
        self.clusters.values().flat_map(|c| c.destinations.iter())
    }
}
