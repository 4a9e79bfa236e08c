//! Fixed-window rate limiting.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

use crate::config::schema::{Partition, RateLimitPolicyConfig};

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accept,
    Reject,
}

/// A compiled rate-limit policy.
#[derive(Debug, Clone)]
struct Policy {
    window_ms: u64,
    permits: u32,
    partition: Partition,
}

/// Counter state for one (policy, partition key) pair.
#[derive(Debug)]
struct WindowSlot {
    /// Fixed window index: `now_ms / window_ms`.
    window: u64,
    count: u32,
}

/// Fixed-window limiter over all configured policies.
///
/// Counters live in a sharded map keyed by (policy, partition key), so
/// concurrent checks on different partitions contend only on map shards.
/// The invariant: permits consumed within one window never exceed the
/// configured limit for that (policy, partition).
#[derive(Debug, Default)]
pub struct FixedWindowLimiter {
    policies: HashMap<String, Policy>,
    counters: DashMap<(String, String), WindowSlot>,
}

impl FixedWindowLimiter {
    pub fn new(configs: &[RateLimitPolicyConfig]) -> Self {
        let policies = configs
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    Policy {
                        window_ms: p.window_ms,
                        permits: p.permits,
                        partition: p.partition,
                    },
                )
            })
            .collect();

        Self {
            policies,
            counters: DashMap::new(),
        }
    }

    /// Check the policy named by a route for the given client.
    ///
    /// Unknown policy names accept; validation rejects dangling references
    /// before a snapshot is built, so this only covers internal misuse.
    pub fn check(&self, policy_name: &str, client_ip: IpAddr) -> Admission {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.check_at(policy_name, client_ip, now_ms)
    }

    /// Clock-injected variant of [`check`](Self::check).
    pub fn check_at(&self, policy_name: &str, client_ip: IpAddr, now_ms: u64) -> Admission {
        let Some(policy) = self.policies.get(policy_name) else {
            tracing::warn!(policy = %policy_name, "Unknown rate-limit policy, accepting");
            return Admission::Accept;
        };

        let key = match policy.partition {
            Partition::Global => "global".to_string(),
            Partition::ClientIp => client_ip.to_string(),
        };

        let window = now_ms / policy.window_ms;

        let mut slot = self
            .counters
            .entry((policy_name.to_string(), key))
            .or_insert(WindowSlot { window, count: 0 });

        if slot.window != window {
            slot.window = window;
            slot.count = 0;
        }

        if slot.count < policy.permits {
            slot.count += 1;
            Admission::Accept
        } else {
            Admission::Reject
        }
    }
}
