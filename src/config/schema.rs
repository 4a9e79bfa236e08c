//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route definitions mapping requests to clusters.
    pub routes: Vec<RouteConfig>,

    /// Upstream cluster definitions.
    pub clusters: Vec<ClusterConfig>,

    /// Rate-limit policy definitions referenced by routes.
    pub rate_limit_policies: Vec<RateLimitPolicyConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Header handling for forwarded requests.
    pub forwarding: ForwardingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Route configuration mapping requests to clusters.
///
/// Exactly one of `path`, `path_prefix`, `path_pattern` must be set.
/// Conflicts between routes resolve by specificity (exact > longest prefix >
/// pattern by literal count), then by declaration order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Exact path to match.
    #[serde(default)]
    pub path: Option<String>,

    /// Static path prefix to match.
    #[serde(default)]
    pub path_prefix: Option<String>,

    /// Segment pattern to match. `*` or `{name}` matches one segment,
    /// a trailing `**` matches any remainder.
    #[serde(default)]
    pub path_pattern: Option<String>,

    /// Host header to match (exact, case-insensitive, port ignored).
    #[serde(default)]
    pub host: Option<String>,

    /// HTTP methods to match. Empty/absent matches any method.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Target cluster name.
    pub cluster: String,

    /// Name of a rate-limit policy bound to this route, if any.
    #[serde(default)]
    pub rate_limit: Option<String>,
}

/// Upstream cluster configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterConfig {
    /// Unique cluster name.
    pub name: String,

    /// Load balancing strategy for this cluster.
    #[serde(default)]
    pub strategy: Strategy,

    /// Destination endpoints.
    pub destinations: Vec<DestinationConfig>,
}

/// Load balancing strategy tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    RoundRobin,
    Random,
    LeastLatency,
}

/// One upstream endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DestinationConfig {
    /// Destination address (e.g., "127.0.0.1:3000").
    pub address: String,

    /// Initial health state. Passive observation takes over at runtime.
    #[serde(default)]
    pub health: InitialHealth,
}

/// Configured starting health of a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InitialHealth {
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

/// Rate-limit policy: fixed window, permit count, partition key derivation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitPolicyConfig {
    /// Unique policy name, referenced from routes.
    pub name: String,

    /// Window duration in milliseconds. Boundaries are fixed, not sliding.
    pub window_ms: u64,

    /// Permits per window per partition.
    pub permits: u32,

    /// How the partition key is derived.
    #[serde(default)]
    pub partition: Partition,
}

/// Partition key derivation for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    /// One shared counter for all callers.
    #[default]
    Global,
    /// One counter per client IP address.
    ClientIp,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a single upstream call in seconds. Expiry aborts the
    /// call and yields a gateway-timeout response.
    pub upstream_secs: u64,

    /// Outer deadline for the whole inbound exchange in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 10,
            request_secs: 30,
        }
    }
}

/// Header handling applied by the forwarder.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Additional request headers to strip before forwarding, on top of the
    /// standard hop-by-hop set.
    pub strip_headers: Vec<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
