//! Gateway error taxonomy.
//!
//! Every variant is recoverable at the request level: each stage translates
//! its failure into a terminal caller-facing outcome and nothing here crashes
//! the process. `InvalidSnapshot` is the one non-request error; it is
//! reported to the reload initiator while the previous snapshot stays active.

use axum::http::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the gateway pipeline and snapshot management.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No route predicate matched the inbound request.
    #[error("no route matched the request")]
    NoRouteMatched,

    /// The route's rate-limit policy rejected the request.
    #[error("rate limit exceeded for policy '{policy}'")]
    RateLimitExceeded { policy: String },

    /// Every destination in the target cluster is unhealthy (or the cluster
    /// is unknown to the active snapshot).
    #[error("no available destination in cluster '{cluster}'")]
    NoAvailableDestination { cluster: String },

    /// The upstream connection failed before a response arrived.
    #[error("upstream unreachable: {reason}")]
    UpstreamUnreachable { reason: String },

    /// The upstream call exceeded the configured deadline and was aborted.
    #[error("upstream call timed out after {0:?}")]
    UpstreamTimeout(Duration),

    /// A config snapshot failed structural validation and was rejected
    /// without being applied.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl GatewayError {
    /// HTTP status class presented to the original caller.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NoRouteMatched => StatusCode::NOT_FOUND,
            GatewayError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::NoAvailableDestination { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            // Reload errors stay with the reload initiator.
            GatewayError::InvalidSnapshot(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
