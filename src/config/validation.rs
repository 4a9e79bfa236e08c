//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing clusters/policies)
//! - Validate value ranges (windows > 0, permits > 0, addresses parse)
//! - Detect duplicate names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before a config is accepted into the system (load and reload)

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// One semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route '{route}' references unknown cluster '{cluster}'")]
    UnknownCluster { route: String, cluster: String },

    #[error("route '{route}' references unknown rate-limit policy '{policy}'")]
    UnknownPolicy { route: String, policy: String },

    #[error("route '{route}' must set exactly one of path, path_prefix, path_pattern")]
    AmbiguousPathPredicate { route: String },

    #[error("route '{route}' has invalid method '{method}'")]
    InvalidMethod { route: String, method: String },

    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("cluster '{cluster}' has no destinations")]
    EmptyCluster { cluster: String },

    #[error("cluster '{cluster}' has unparseable destination address '{address}'")]
    InvalidAddress { cluster: String, address: String },

    #[error("policy '{policy}' must have window_ms > 0 and permits > 0")]
    InvalidPolicy { policy: String },
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut cluster_names = HashSet::new();
    for cluster in &config.clusters {
        if !cluster_names.insert(cluster.name.as_str()) {
            errors.push(ValidationError::DuplicateName {
                kind: "cluster",
                name: cluster.name.clone(),
            });
        }
        if cluster.destinations.is_empty() {
            errors.push(ValidationError::EmptyCluster {
                cluster: cluster.name.clone(),
            });
        }
        for dest in &cluster.destinations {
            if dest.address.parse::<SocketAddr>().is_err() {
                errors.push(ValidationError::InvalidAddress {
                    cluster: cluster.name.clone(),
                    address: dest.address.clone(),
                });
            }
        }
    }

    let mut policy_names = HashSet::new();
    for policy in &config.rate_limit_policies {
        if !policy_names.insert(policy.name.as_str()) {
            errors.push(ValidationError::DuplicateName {
                kind: "policy",
                name: policy.name.clone(),
            });
        }
        if policy.window_ms == 0 || policy.permits == 0 {
            errors.push(ValidationError::InvalidPolicy {
                policy: policy.name.clone(),
            });
        }
    }

    let mut route_names = HashSet::new();
    for route in &config.routes {
        if !route_names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateName {
                kind: "route",
                name: route.name.clone(),
            });
        }

        let predicates = [&route.path, &route.path_prefix, &route.path_pattern]
            .iter()
            .filter(|p| p.is_some())
            .count();
        if predicates != 1 {
            errors.push(ValidationError::AmbiguousPathPredicate {
                route: route.name.clone(),
            });
        }

        for method in &route.methods {
            if method.parse::<axum::http::Method>().is_err() {
                errors.push(ValidationError::InvalidMethod {
                    route: route.name.clone(),
                    method: method.clone(),
                });
            }
        }

        if !cluster_names.contains(route.cluster.as_str()) {
            errors.push(ValidationError::UnknownCluster {
                route: route.name.clone(),
                cluster: route.cluster.clone(),
            });
        }

        if let Some(policy) = &route.rate_limit {
            if !policy_names.contains(policy.as_str()) {
                errors.push(ValidationError::UnknownPolicy {
                    route: route.name.clone(),
                    policy: policy.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::*;

    fn base_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.clusters.push(ClusterConfig {
            name: "catalog".into(),
            strategy: Strategy::RoundRobin,
            destinations: vec![DestinationConfig {
                address: "127.0.0.1:3000".into(),
                health: InitialHealth::Unknown,
            }],
        });
        config.routes.push(RouteConfig {
            name: "catalog".into(),
            path: None,
            path_prefix: Some("/catalog-service/".into()),
            path_pattern: None,
            host: None,
            methods: vec![],
            cluster: "catalog".into(),
            rate_limit: None,
        });
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_dangling_cluster_reference() {
        let mut config = base_config();
        config.routes[0].cluster = "missing".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::UnknownCluster { .. }
        ));
    }

    #[test]
    fn test_dangling_policy_reference() {
        let mut config = base_config();
        config.routes[0].rate_limit = Some("missing".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::UnknownPolicy { .. }));
    }

    #[test]
    fn test_route_needs_exactly_one_path_predicate() {
        let mut config = base_config();
        config.routes[0].path = Some("/x".into()); // prefix already set
        assert!(validate_config(&config).is_err());

        let mut config = base_config();
        config.routes[0].path_prefix = None; // now none set
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_cluster_and_bad_address() {
        let mut config = base_config();
        config.clusters[0].destinations.clear();
        assert!(validate_config(&config).is_err());

        let mut config = base_config();
        config.clusters[0].destinations[0].address = "not-an-addr".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidAddress { .. }));
    }

    #[test]
    fn test_zero_window_policy_rejected() {
        let mut config = base_config();
        config.rate_limit_policies.push(RateLimitPolicyConfig {
            name: "p".into(),
            window_ms: 0,
            permits: 5,
            partition: Partition::Global,
        });
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidPolicy { .. }));
    }

    #[test]
    fn test_all_errors_collected() {
        let mut config = base_config();
        config.routes[0].cluster = "missing".into();
        config.routes[0].rate_limit = Some("also-missing".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
