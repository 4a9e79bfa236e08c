//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, host, path)
//!     → table.rs (route lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: matched Route or NoMatch
//!
//! Route Compilation (at snapshot build):
//!     RouteConfig[]
//!     → Compile predicates (exact / prefix / pattern, host, methods)
//!     → Sort by specificity, ties by declaration order
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at snapshot build, immutable at runtime
//! - No regex in hot path (segment patterns only)
//! - Deterministic: same input always matches same route
//! - Most specific match wins (exact > longest prefix > pattern by literals)

pub mod matcher;
pub mod table;

pub use matcher::{PathMatch, RoutePredicate};
pub use table::{CompiledRoute, RouteTable};
