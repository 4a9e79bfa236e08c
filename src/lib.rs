//! Edge Gateway Library
//!
//! Request-routing and admission-control pipeline for an HTTP API gateway:
//! route matching, fixed-window rate limiting, destination selection,
//! streaming upstream forwarding, and per-request telemetry.

pub mod admission;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod routing;
pub mod snapshot;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use snapshot::{GatewaySnapshot, SharedSnapshot};
