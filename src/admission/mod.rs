//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → bound policy name (or none)
//!     → fixed_window.rs (counter check per policy + partition key)
//!     → Accept: pipeline continues to destination selection
//!     → Reject: 429 returned, no upstream resource touched
//! ```
//!
//! # Design Decisions
//! - Fixed window boundaries: counter resets at window edges, bursts at
//!   edges are an accepted tradeoff of the algorithm
//! - Counters are partitioned (global or per client IP) in a sharded map
//!   to keep contention bounded under high concurrency
//! - Time is injected into the check so tests control the clock
//! - Single-process counters; a distributed store is an extension point

pub mod fixed_window;

pub use fixed_window::{Admission, FixedWindowLimiter};
