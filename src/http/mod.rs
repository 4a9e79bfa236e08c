//! HTTP pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (decoded by axum)
//!     → server.rs (handler, telemetry span, snapshot load)
//!     → pipeline.rs (Match → Admit → Select → Forward, short-circuiting)
//!     → forwarder.rs (upstream call, streaming relay)
//!     → response streamed back to the caller
//! ```
//!
//! # Design Decisions
//! - Stages are explicit sequential calls, not middleware registration;
//!   each returns a result that short-circuits the rest on rejection
//! - The per-request context is owned by the handling task, never shared
//! - Caller disconnect drops the handler future, aborting the upstream call

pub mod forwarder;
pub mod pipeline;
pub mod request_id;
pub mod server;

pub use forwarder::Forwarder;
pub use pipeline::{Outcome, RequestContext};
pub use server::HttpServer;
