//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum router with the catch-all gateway handler
//! - Wire up middleware (request ID, tracing, outer timeout)
//! - Hold the shared snapshot and apply config updates to it
//! - Dispatch each request through the pipeline
//! - Record request telemetry on completion

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::forwarder::Forwarder;
use crate::http::pipeline::{self, RequestContext};
use crate::http::request_id::MakeRequestUuid;
use crate::observability::metrics;
use crate::snapshot::{GatewaySnapshot, SharedSnapshot};

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<SharedSnapshot>,
    pub forwarder: Arc<Forwarder>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    snapshot: Arc<SharedSnapshot>,
}

impl HttpServer {
    /// Create a new server. Fails if the initial configuration does not
    /// compile into a valid snapshot.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let snapshot = Arc::new(SharedSnapshot::new(GatewaySnapshot::build(&config, 1)?));
        let forwarder = Arc::new(Forwarder::new());

        let state = AppState {
            snapshot: snapshot.clone(),
            forwarder,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            snapshot,
        })
    }

    /// Build the axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    ))),
            )
    }

    /// Run the server: serve requests, apply config updates as they
    /// arrive, stop gracefully on the shutdown signal.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.config.routes.len(),
            clusters = self.config.clusters.len(),
            "HTTP server starting"
        );
        publish_destination_health(&self.snapshot.load());

        // Reload task: each update is applied whole or rejected whole.
        let reload_snapshot = self.snapshot.clone();
        let reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            apply_updates(reload_snapshot, config_updates, reload_shutdown).await;
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Seed the health gauge for every destination in the snapshot, so the
/// metric is present before passive observations start arriving.
fn publish_destination_health(snapshot: &GatewaySnapshot) {
    for destination in snapshot.clusters.all_destinations() {
        metrics::record_destination_health(&destination.addr.to_string(), destination.is_eligible());
    }
}

/// Apply config updates until the channel closes or shutdown fires.
async fn apply_updates(
    snapshot: Arc<SharedSnapshot>,
    mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = config_updates.recv() => {
                match update {
                    Some(config) => match snapshot.apply(&config) {
                        Ok(version) => {
                            publish_destination_health(&snapshot.load());
                            tracing::info!(version, "Configuration reloaded");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Snapshot rejected, previous configuration stays active");
                        }
                    },
                    None => break,
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}

/// Main gateway handler: one pipeline run per request, wrapped in a span.
async fn gateway_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> impl IntoResponse {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    // Every request sees one consistent snapshot for its whole pipeline.
    let snapshot = state.snapshot.load();
    let mut ctx = RequestContext::new(request_id, client_addr);

    let span = tracing::info_span!(
        "gateway_request",
        request_id = %ctx.request_id,
        method = %method,
        path = %path,
        client = %client_addr,
    );

    let response: Response = pipeline::run(&snapshot, &state.forwarder, &mut ctx, request)
        .instrument(span)
        .await;

    metrics::record_request(
        &method,
        ctx.status,
        ctx.route.as_deref().unwrap_or("none"),
        ctx.outcome.as_str(),
        ctx.started,
    );

    tracing::debug!(
        request_id = %ctx.request_id,
        route = ctx.route.as_deref().unwrap_or("none"),
        destination = ?ctx.destination,
        outcome = ctx.outcome.as_str(),
        status = ctx.status,
        elapsed_ms = ctx.started.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}
