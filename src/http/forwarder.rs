//! Upstream forwarding.
//!
//! # Responsibilities
//! - Rewrite the request URI to the selected destination
//! - Strip hop-by-hop headers in both directions, keep everything else
//! - Append forwarding metadata (x-forwarded-for)
//! - Stream request and response bodies without buffering
//! - Enforce the upstream deadline; abort and report on expiry
//!
//! # Design Decisions
//! - One shared client: hyper's legacy client pools connections per
//!   authority, so repeated calls to a destination reuse sockets
//! - No retries here: connect failures and timeouts are reported to the
//!   caller; retry/failover is a policy for the caller of this contract
//! - Upstream calls always speak HTTP/1.1; the inbound version is not
//!   negotiated through the pooled client
//! - The deadline covers connection establishment and response headers,
//!   and the same deadline bounds each pause between response body frames;
//!   a failure or stall while the body is already streaming terminates the
//!   client connection abnormally instead of appending an error body
//! - The deadline is passed per call so a config reload takes effect on
//!   the next request
//! - Dropping the returned future (caller disconnect) aborts the upstream
//!   call and releases the connection

use std::net::IpAddr;
use std::str::FromStr;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::uri::{Authority, Scheme};
use axum::http::{header, request, HeaderMap, HeaderName, HeaderValue, Request, Response, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tower_http::timeout::TimeoutBody;

use crate::error::GatewayError;
use crate::load_balancer::Destination;
use crate::observability::metrics;

/// Hop-by-hop headers never forwarded (RFC 7230 §6.1).
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Forwards requests to upstream destinations.
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
}

impl Forwarder {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client }
    }

    /// Forward the request to `destination` and relay the response.
    ///
    /// Health marking is the only cluster-state side effect: success marks
    /// the destination up, connect failure or timeout marks it down.
    pub async fn forward(
        &self,
        destination: &Destination,
        parts: request::Parts,
        body: Body,
        client_ip: IpAddr,
        strip_extra: &[String],
        timeout: Duration,
    ) -> Result<Response<Body>, GatewayError> {
        let req = build_upstream_request(destination, parts, body, client_ip, strip_extra)?;

        let started = Instant::now();
        match tokio::time::timeout(timeout, self.client.request(req)).await {
            Ok(Ok(response)) => {
                let latency = started.elapsed();
                destination.mark_success();
                destination.record_latency(latency);
                metrics::record_upstream_latency(&destination.addr.to_string(), latency);
                metrics::record_destination_health(&destination.addr.to_string(), true);

                let (mut resp_parts, resp_body) = response.into_parts();
                strip_hop_by_hop(&mut resp_parts.headers);
                // An upstream that stalls mid-body trips the same deadline;
                // the body errors and the client connection is cut.
                let bounded = TimeoutBody::new(timeout, resp_body);
                Ok(Response::from_parts(resp_parts, Body::new(bounded)))
            }
            Ok(Err(e)) => {
                destination.mark_failure();
                metrics::record_destination_health(&destination.addr.to_string(), false);
                Err(GatewayError::UpstreamUnreachable {
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                // The timeout dropped the request future, aborting the call.
                destination.mark_failure();
                metrics::record_destination_health(&destination.addr.to_string(), false);
                Err(GatewayError::UpstreamTimeout(timeout))
            }
        }
    }
}

impl Default for Forwarder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the upstream request: rewritten URI, filtered headers, forwarding
/// metadata. The version is pinned to HTTP/1.1 regardless of the inbound
/// version; the pooled client does not negotiate per request.
fn build_upstream_request(
    destination: &Destination,
    parts: request::Parts,
    body: Body,
    client_ip: IpAddr,
    strip_extra: &[String],
) -> Result<Request<Body>, GatewayError> {
    let uri = rewrite_uri(&parts.uri, destination)?;

    let mut builder = Request::builder().method(parts.method.clone()).uri(uri);

    if let Some(headers) = builder.headers_mut() {
        *headers = filter_headers(&parts.headers, strip_extra);
        append_forwarded_for(headers, client_ip);
    }

    builder
        .body(body)
        .map_err(|e| GatewayError::UpstreamUnreachable {
            reason: format!("failed to build upstream request: {}", e),
        })
}

fn rewrite_uri(original: &Uri, destination: &Destination) -> Result<Uri, GatewayError> {
    let mut parts = original.clone().into_parts();
    parts.scheme = Some(Scheme::HTTP);
    // The destination carries a pre-parsed base URL; reuse its authority
    // instead of re-formatting the socket address on every request.
    parts.authority = Some(
        Authority::from_str(destination.base_url.authority()).map_err(|e| {
            GatewayError::UpstreamUnreachable {
                reason: format!("invalid destination authority: {}", e),
            }
        })?,
    );

    Uri::from_parts(parts).map_err(|e| GatewayError::UpstreamUnreachable {
        reason: format!("failed to rewrite URI: {}", e),
    })
}

/// Copy headers, dropping the hop-by-hop set, anything the Connection
/// header names, and the configured extra exclusions.
fn filter_headers(source: &HeaderMap, strip_extra: &[String]) -> HeaderMap {
    let connection_named: Vec<String> = source
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .collect();

    let mut filtered = HeaderMap::with_capacity(source.len());
    for (name, value) in source.iter() {
        if HOP_BY_HOP.contains(&name.as_str()) {
            continue;
        }
        if connection_named.iter().any(|n| n == name.as_str()) {
            continue;
        }
        if strip_extra.iter().any(|n| n.eq_ignore_ascii_case(name.as_str())) {
            continue;
        }
        filtered.append(name.clone(), value.clone());
    }
    filtered
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Append the client address to x-forwarded-for without touching any other
/// caller-supplied headers.
fn append_forwarded_for(headers: &mut HeaderMap, client_ip: IpAddr) {
    let name = HeaderName::from_static("x-forwarded-for");
    let value = match headers.get(&name).and_then(|v| v.to_str().ok()) {
        Some(existing) => format!("{}, {}", existing, client_ip),
        None => client_ip.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::InitialHealth;
    use axum::http::Version;

    #[test]
    fn test_hop_by_hop_stripped_caller_headers_kept() {
        let mut source = HeaderMap::new();
        source.insert(header::CONNECTION, HeaderValue::from_static("close"));
        source.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        source.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        source.insert("x-custom", HeaderValue::from_static("kept"));

        let filtered = filter_headers(&source, &[]);
        assert!(filtered.get(header::CONNECTION).is_none());
        assert!(filtered.get(header::TRANSFER_ENCODING).is_none());
        assert_eq!(filtered.get(header::ACCEPT).unwrap(), "application/json");
        assert_eq!(filtered.get("x-custom").unwrap(), "kept");
    }

    #[test]
    fn test_connection_named_headers_stripped() {
        let mut source = HeaderMap::new();
        source.insert(
            header::CONNECTION,
            HeaderValue::from_static("close, x-hop-token"),
        );
        source.insert("x-hop-token", HeaderValue::from_static("secret"));

        let filtered = filter_headers(&source, &[]);
        assert!(filtered.get("x-hop-token").is_none());
    }

    #[test]
    fn test_configured_exclusions_stripped() {
        let mut source = HeaderMap::new();
        source.insert("x-internal-auth", HeaderValue::from_static("secret"));
        source.insert("x-public", HeaderValue::from_static("ok"));

        let filtered = filter_headers(&source, &["X-Internal-Auth".to_string()]);
        assert!(filtered.get("x-internal-auth").is_none());
        assert!(filtered.get("x-public").is_some());
    }

    #[test]
    fn test_forwarded_for_appended() {
        let mut headers = HeaderMap::new();
        append_forwarded_for(&mut headers, "10.0.0.1".parse().unwrap());
        assert_eq!(headers.get("x-forwarded-for").unwrap(), "10.0.0.1");

        append_forwarded_for(&mut headers, "10.0.0.2".parse().unwrap());
        assert_eq!(headers.get("x-forwarded-for").unwrap(), "10.0.0.1, 10.0.0.2");
    }

    #[test]
    fn test_uri_rewrite_preserves_path_and_query() {
        let destination = Destination::new("127.0.0.1:3000".parse().unwrap(), InitialHealth::Healthy);
        let original: Uri = "http://gateway.local/catalog-service/products/42?page=2"
            .parse()
            .unwrap();
        let rewritten = rewrite_uri(&original, &destination).unwrap();
        assert_eq!(rewritten.authority().unwrap().as_str(), "127.0.0.1:3000");
        assert_eq!(
            rewritten.path_and_query().unwrap().as_str(),
            "/catalog-service/products/42?page=2"
        );
    }

    #[test]
    fn test_upstream_request_pinned_to_http11() {
        let destination = Destination::new("127.0.0.1:3000".parse().unwrap(), InitialHealth::Healthy);
        let (mut parts, body) = Request::builder()
            .uri("http://gateway.local/x")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        parts.version = Version::HTTP_2;

        let req =
            build_upstream_request(&destination, parts, body, "127.0.0.1".parse().unwrap(), &[])
                .unwrap();
        assert_eq!(req.version(), Version::HTTP_11);
    }

    #[tokio::test]
    async fn test_unreachable_destination_reported() {
        // Port 9 (discard) is not listening in the test environment.
        let destination = Destination::new("127.0.0.1:9".parse().unwrap(), InitialHealth::Healthy);
        let forwarder = Forwarder::new();

        let (parts, body) = Request::builder()
            .uri("http://gateway.local/x")
            .body(Body::empty())
            .unwrap()
            .into_parts();

        let err = forwarder
            .forward(
                &destination,
                parts,
                body,
                "127.0.0.1".parse().unwrap(),
                &[],
                Duration::from_secs(2),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamUnreachable { .. }));
    }
}
