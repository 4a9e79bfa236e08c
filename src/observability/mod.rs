//! Observability subsystem.
//!
//! Spans come from `tracing` (one per request, one nested per upstream
//! call, emitted in the http module); this module owns the metric names
//! and the Prometheus exposition endpoint. Emitting telemetry never alters
//! control flow: a failed exporter install is logged and ignored.

pub mod metrics;
