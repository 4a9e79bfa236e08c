//! Destination abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream endpoint
//! - Track health state (Unknown/Healthy/Unhealthy) from passive observation
//! - Track observed upstream latency (advisory, for least-latency balancing)

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::time::Duration;

use url::Url;

use crate::config::schema::InitialHealth;

/// Health State enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

impl From<InitialHealth> for HealthState {
    fn from(val: InitialHealth) -> Self {
        match val {
            InitialHealth::Unknown => HealthState::Unknown,
            InitialHealth::Healthy => HealthState::Healthy,
            InitialHealth::Unhealthy => HealthState::Unhealthy,
        }
    }
}

/// Consecutive outcomes required to flip health state.
const HEALTHY_THRESHOLD: usize = 2;
const UNHEALTHY_THRESHOLD: usize = 3;

/// A single upstream endpoint.
#[derive(Debug)]
pub struct Destination {
    /// The network address of the destination.
    pub addr: SocketAddr,
    /// Pre-calculated base URL.
    pub base_url: Url,

    /// Current health state (0=Unknown, 1=Healthy, 2=Unhealthy).
    state: AtomicU8,
    /// Consecutive failure count.
    consecutive_failures: AtomicUsize,
    /// Consecutive success count.
    consecutive_successes: AtomicUsize,

    /// EWMA of observed upstream latency in microseconds. 0 = no sample yet.
    latency_micros: AtomicU64,
}

impl Destination {
    pub fn new(addr: SocketAddr, initial: InitialHealth) -> Self {
        // SocketAddr always formats into a valid URL authority.
        let base_url = Url::parse(&format!("http://{}", addr)).expect("socket addr forms a URL");
        Self {
            addr,
            base_url,
            state: AtomicU8::new(HealthState::from(initial) as u8),
            consecutive_failures: AtomicUsize::new(0),
            consecutive_successes: AtomicUsize::new(0),
            latency_micros: AtomicU64::new(0),
        }
    }

    pub fn health(&self) -> HealthState {
        HealthState::from(self.state.load(Ordering::Relaxed))
    }

    /// Eligible for selection: Healthy or Unknown.
    pub fn is_eligible(&self) -> bool {
        self.state.load(Ordering::Relaxed) != (HealthState::Unhealthy as u8)
    }

    /// Report a successful upstream exchange.
    pub fn mark_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);

        if self.state.load(Ordering::Relaxed) == (HealthState::Healthy as u8) {
            return;
        }

        let successes = self.consecutive_successes.fetch_add(1, Ordering::Relaxed) + 1;
        if successes >= HEALTHY_THRESHOLD {
            self.state.store(HealthState::Healthy as u8, Ordering::Relaxed);
            tracing::info!(addr = %self.addr, "Destination transitioned to healthy");
        }
    }

    /// Report a failed upstream exchange (connect error or timeout).
    pub fn mark_failure(&self) {
        self.consecutive_successes.store(0, Ordering::Relaxed);

        if self.state.load(Ordering::Relaxed) == (HealthState::Unhealthy as u8) {
            return;
        }

        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= UNHEALTHY_THRESHOLD {
            self.state.store(HealthState::Unhealthy as u8, Ordering::Relaxed);
            tracing::warn!(addr = %self.addr, "Destination transitioned to unhealthy");
        }
    }

    /// Record an observed upstream latency sample into the EWMA.
    pub fn record_latency(&self, latency: Duration) {
        let sample = latency.as_micros() as u64;
        let prev = self.latency_micros.load(Ordering::Relaxed);
        // First sample seeds the average; afterwards weight 1/8 on the sample.
        let next = if prev == 0 {
            sample
        } else {
            prev - prev / 8 + sample / 8
        };
        self.latency_micros.store(next, Ordering::Relaxed);
    }

    /// Observed latency EWMA in microseconds. 0 means no sample yet.
    pub fn observed_latency_micros(&self) -> u64 {
        self.latency_micros.load(Ordering::Relaxed)
    }
}
