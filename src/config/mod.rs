//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → compiled into a GatewaySnapshot and shared via ArcSwap
//!
//! On reload signal:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → SharedSnapshot::apply swaps the active snapshot atomically
//!     → in-flight requests keep the snapshot they loaded
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All sections have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::{
    ClusterConfig, DestinationConfig, ForwardingConfig, GatewayConfig, InitialHealth,
    ListenerConfig, ObservabilityConfig, Partition, RateLimitPolicyConfig, RouteConfig, Strategy,
    TimeoutConfig,
};
