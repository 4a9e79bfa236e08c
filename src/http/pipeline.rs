//! The request pipeline: Match → Admit → Select → Forward.
//!
//! Each stage is an explicit call that short-circuits the rest on
//! rejection or failure, and resolves its own error into a terminal
//! caller-facing outcome. Per request the stages run strictly in order;
//! across requests there is no ordering at all.
//!
//! State machine per request:
//! `Received → Matched|NoRoute(terminal) → Admitted|Rejected(terminal)
//!  → DestinationSelected|NoDestination(terminal)
//!  → Forwarded → {Success, UpstreamFailure, Timeout}(terminal)`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, Request, Response};
use tracing::Instrument;

use crate::admission::Admission;
use crate::error::GatewayError;
use crate::http::forwarder::Forwarder;
use crate::observability::metrics;
use crate::snapshot::GatewaySnapshot;

/// Final outcome class of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Upstream response relayed to the caller.
    Forwarded,
    NoRoute,
    Rejected,
    NoDestination,
    UpstreamFailure,
    Timeout,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Forwarded => "forwarded",
            Outcome::NoRoute => "no_route",
            Outcome::Rejected => "rejected",
            Outcome::NoDestination => "no_destination",
            Outcome::UpstreamFailure => "upstream_failure",
            Outcome::Timeout => "upstream_timeout",
        }
    }
}

impl From<&GatewayError> for Outcome {
    fn from(err: &GatewayError) -> Self {
        match err {
            GatewayError::NoRouteMatched => Outcome::NoRoute,
            GatewayError::RateLimitExceeded { .. } => Outcome::Rejected,
            GatewayError::NoAvailableDestination { .. } => Outcome::NoDestination,
            GatewayError::UpstreamUnreachable { .. } => Outcome::UpstreamFailure,
            GatewayError::UpstreamTimeout(_) => Outcome::Timeout,
            GatewayError::InvalidSnapshot(_) => Outcome::UpstreamFailure,
        }
    }
}

/// Per-request transient record. Owned by the handling task for the
/// lifetime of one request; never persisted or shared across requests.
#[derive(Debug)]
pub struct RequestContext {
    pub request_id: String,
    pub client_addr: SocketAddr,
    /// Matched route name, set by the match stage.
    pub route: Option<Arc<str>>,
    /// Selected destination, set by the select stage.
    pub destination: Option<SocketAddr>,
    pub started: Instant,
    pub outcome: Outcome,
    pub status: u16,
}

impl RequestContext {
    pub fn new(request_id: String, client_addr: SocketAddr) -> Self {
        Self {
            request_id,
            client_addr,
            route: None,
            destination: None,
            started: Instant::now(),
            outcome: Outcome::Forwarded,
            status: 0,
        }
    }
}

/// Run the full pipeline for one request, resolving every error into a
/// well-formed response. The context records the terminal outcome for
/// telemetry; recording it never alters control flow.
pub async fn run(
    snapshot: &GatewaySnapshot,
    forwarder: &Forwarder,
    ctx: &mut RequestContext,
    request: Request<Body>,
) -> Response<Body> {
    match run_stages(snapshot, forwarder, ctx, request).await {
        Ok(response) => {
            ctx.outcome = Outcome::Forwarded;
            ctx.status = response.status().as_u16();
            response
        }
        Err(err) => {
            ctx.outcome = Outcome::from(&err);
            let status = err.status();
            ctx.status = status.as_u16();

            tracing::warn!(
                request_id = %ctx.request_id,
                route = ctx.route.as_deref().unwrap_or("none"),
                outcome = ctx.outcome.as_str(),
                error = %err,
                "Request terminated before upstream success"
            );

            let mut response = Response::new(Body::from(err.to_string()));
            *response.status_mut() = status;
            response
        }
    }
}

async fn run_stages(
    snapshot: &GatewaySnapshot,
    forwarder: &Forwarder,
    ctx: &mut RequestContext,
    request: Request<Body>,
) -> Result<Response<Body>, GatewayError> {
    let (parts, body) = request.into_parts();
    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok());
    let path = parts.uri.path();

    // Match: the single most specific route or a terminal 404.
    let route = snapshot
        .routes
        .match_request(&parts.method, host, path)
        .ok_or(GatewayError::NoRouteMatched)?;
    ctx.route = Some(route.name.clone());

    // Admit: rejection short-circuits before any upstream resource is
    // touched. A route with no bound policy always accepts.
    if let Some(policy) = &route.rate_limit {
        if snapshot.limiter.check(policy, ctx.client_addr.ip()) == Admission::Reject {
            metrics::record_rate_limited(policy);
            return Err(GatewayError::RateLimitExceeded {
                policy: policy.to_string(),
            });
        }
    }

    // Select: one eligible destination in the target cluster.
    let destination = snapshot.clusters.select(&route.cluster)?;
    ctx.destination = Some(destination.addr);

    // Forward: nested telemetry operation around the upstream call.
    let span = tracing::info_span!(
        "upstream_call",
        cluster = %route.cluster,
        destination = %destination.addr,
    );
    forwarder
        .forward(
            &destination,
            parts,
            body,
            ctx.client_addr.ip(),
            &snapshot.forwarding.strip_headers,
            snapshot.upstream_timeout,
        )
        .instrument(span)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::*;

    fn snapshot_with(
        routes: Vec<RouteConfig>,
        clusters: Vec<ClusterConfig>,
        policies: Vec<RateLimitPolicyConfig>,
    ) -> GatewaySnapshot {
        let config = GatewayConfig {
            routes,
            clusters,
            rate_limit_policies: policies,
            ..GatewayConfig::default()
        };
        GatewaySnapshot::build(&config, 1).unwrap()
    }

    fn route(prefix: &str, cluster: &str, rate_limit: Option<&str>) -> RouteConfig {
        RouteConfig {
            name: format!("route-{}", cluster),
            path: None,
            path_prefix: Some(prefix.into()),
            path_pattern: None,
            host: None,
            methods: vec![],
            cluster: cluster.into(),
            rate_limit: rate_limit.map(String::from),
        }
    }

    fn cluster(name: &str, health: InitialHealth) -> ClusterConfig {
        ClusterConfig {
            name: name.into(),
            strategy: Strategy::RoundRobin,
            destinations: vec![DestinationConfig {
                address: "127.0.0.1:9".into(),
                health,
            }],
        }
    }

    fn ctx() -> RequestContext {
        RequestContext::new("test".into(), "127.0.0.1:55555".parse().unwrap())
    }

    fn request(path: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("http://gateway.local{}", path))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_no_route_is_404() {
        let snapshot = snapshot_with(
            vec![route("/catalog/", "catalog", None)],
            vec![cluster("catalog", InitialHealth::Healthy)],
            vec![],
        );
        let forwarder = Forwarder::new();
        let mut ctx = ctx();

        let response = run(&snapshot, &forwarder, &mut ctx, request("/unknown")).await;
        assert_eq!(response.status(), 404);
        assert_eq!(ctx.outcome, Outcome::NoRoute);
        assert!(ctx.route.is_none());
    }

    #[tokio::test]
    async fn test_rejection_short_circuits_before_selection() {
        let snapshot = snapshot_with(
            vec![route("/catalog/", "catalog", Some("strict"))],
            vec![cluster("catalog", InitialHealth::Healthy)],
            vec![RateLimitPolicyConfig {
                name: "strict".into(),
                window_ms: 60_000,
                permits: 1,
                partition: Partition::Global,
            }],
        );
        let forwarder = Forwarder::new();

        // First request consumes the only permit (and fails upstream, which
        // is irrelevant here).
        let mut first = ctx();
        let _ = run(&snapshot, &forwarder, &mut first, request("/catalog/1")).await;

        let mut second = ctx();
        let response = run(&snapshot, &forwarder, &mut second, request("/catalog/2")).await;
        assert_eq!(response.status(), 429);
        assert_eq!(second.outcome, Outcome::Rejected);
        // Rejected before selection: no destination was chosen.
        assert!(second.destination.is_none());
    }

    #[tokio::test]
    async fn test_all_unhealthy_is_503_without_connection_attempt() {
        let snapshot = snapshot_with(
            vec![route("/catalog/", "catalog", None)],
            vec![cluster("catalog", InitialHealth::Unhealthy)],
            vec![],
        );
        let forwarder = Forwarder::new();
        let mut ctx = ctx();

        let response = run(&snapshot, &forwarder, &mut ctx, request("/catalog/1")).await;
        assert_eq!(response.status(), 503);
        assert_eq!(ctx.outcome, Outcome::NoDestination);
        assert!(ctx.destination.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_502() {
        let snapshot = snapshot_with(
            vec![route("/catalog/", "catalog", None)],
            vec![cluster("catalog", InitialHealth::Healthy)],
            vec![],
        );
        let forwarder = Forwarder::new();
        let mut ctx = ctx();

        let response = run(&snapshot, &forwarder, &mut ctx, request("/catalog/1")).await;
        assert_eq!(response.status(), 502);
        assert_eq!(ctx.outcome, Outcome::UpstreamFailure);
        assert!(ctx.destination.is_some());
    }
}
