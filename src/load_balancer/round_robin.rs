//! Round-robin selection strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::{destination::Destination, Balancer};

/// Round-robin selector.
/// Stores a shared counter to rotate through destinations; safe under
/// concurrent selection since the cursor advances atomically.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Balancer for RoundRobin {
    fn pick(&self, eligible: &[Arc<Destination>]) -> Arc<Destination> {
        let cursor = self.counter.fetch_add(1, Ordering::Relaxed);
        eligible[cursor % eligible.len()].clone()
    }
}
