//! Random selection strategy.

use std::sync::Arc;

use crate::load_balancer::{destination::Destination, Balancer};

/// Uniform random selector.
#[derive(Debug, Default)]
pub struct Random;

impl Random {
    pub fn new() -> Self {
        Self
    }
}

impl Balancer for Random {
    fn pick(&self, eligible: &[Arc<Destination>]) -> Arc<Destination> {
        eligible[fastrand::usize(..eligible.len())].clone()
    }
}
