//! Least-observed-latency selection strategy.

use std::sync::Arc;

use crate::load_balancer::{destination::Destination, Balancer};

/// Selects the destination with the lowest observed latency EWMA.
/// Destinations with no sample yet sort first so every endpoint receives
/// traffic before the averages settle. Ties resolve to the first entry.
#[derive(Debug, Default)]
pub struct LeastLatency;

impl LeastLatency {
    pub fn new() -> Self {
        Self
    }
}

impl Balancer for LeastLatency {
    fn pick(&self, eligible: &[Arc<Destination>]) -> Arc<Destination> {
        eligible
            .iter()
            .min_by_key(|d| d.observed_latency_micros())
            .cloned()
            .unwrap_or_else(|| eligible[0].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::InitialHealth;
    use std::time::Duration;

    fn dest(port: u16) -> Arc<Destination> {
        Arc::new(Destination::new(
            format!("127.0.0.1:{}", port).parse().unwrap(),
            InitialHealth::Healthy,
        ))
    }

    #[test]
    fn test_picks_lowest_latency() {
        let lb = LeastLatency::new();
        let fast = dest(8080);
        let slow = dest(8081);
        fast.record_latency(Duration::from_millis(5));
        slow.record_latency(Duration::from_millis(50));

        let picked = lb.pick(&[slow.clone(), fast.clone()]);
        assert_eq!(picked.addr, fast.addr);
    }

    #[test]
    fn test_unprobed_destination_wins() {
        let lb = LeastLatency::new();
        let probed = dest(8080);
        let fresh = dest(8081);
        probed.record_latency(Duration::from_millis(1));

        let picked = lb.pick(&[probed.clone(), fresh.clone()]);
        assert_eq!(picked.addr, fresh.addr);
    }
}
