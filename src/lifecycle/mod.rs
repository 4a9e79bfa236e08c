//! Lifecycle management.
//!
//! Startup wiring lives in `main.rs`; this module owns coordinated
//! shutdown: one broadcast signal that the server, the reload task and any
//! background tasks subscribe to.

pub mod shutdown;

pub use shutdown::Shutdown;
