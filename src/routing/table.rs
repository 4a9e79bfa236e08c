//! Route lookup.
//!
//! # Responsibilities
//! - Compile route configs into predicates
//! - Order by specificity so the first match is the best match
//! - Look up the matching route for a request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan over specificity-ordered routes (acceptable for typical
//!   table sizes; the sort makes the scan deterministic)
//! - Explicit no-match rather than silent default

use std::collections::HashSet;
use std::sync::Arc;

use axum::http::Method;

use crate::config::schema::RouteConfig;
use crate::routing::matcher::{PathMatch, PathPattern, RoutePredicate};

/// A route compiled from configuration, ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    /// Route identifier for logging/metrics.
    pub name: Arc<str>,
    pub predicate: RoutePredicate,
    /// Target cluster name.
    pub cluster: Arc<str>,
    /// Bound rate-limit policy name, if any.
    pub rate_limit: Option<Arc<str>>,
}

/// Immutable, specificity-ordered set of compiled routes.
///
/// Ordering is fixed at compile time: exact > longest static prefix >
/// pattern with most literal segments, ties broken by declaration order.
/// The scan then returns the first match, which is therefore the single
/// most specific route regardless of config file ordering.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Compile and order a route list. Fails if any pattern or method
    /// string is malformed (callers surface this as an invalid snapshot).
    pub fn compile(configs: &[RouteConfig]) -> Result<Self, String> {
        let mut routes = Vec::with_capacity(configs.len());

        for config in configs {
            let path = if let Some(exact) = &config.path {
                PathMatch::Exact(exact.clone())
            } else if let Some(prefix) = &config.path_prefix {
                PathMatch::Prefix(prefix.clone())
            } else if let Some(pattern) = &config.path_pattern {
                PathMatch::Pattern(PathPattern::parse(pattern).map_err(|e| e.to_string())?)
            } else {
                return Err(format!("route '{}' has no path predicate", config.name));
            };

            let mut methods = HashSet::new();
            for method in &config.methods {
                let parsed: Method = method
                    .parse()
                    .map_err(|_| format!("route '{}': invalid method '{}'", config.name, method))?;
                methods.insert(parsed);
            }

            routes.push(CompiledRoute {
                name: Arc::from(config.name.as_str()),
                predicate: RoutePredicate {
                    path,
                    host: config.host.as_ref().map(|h| h.to_lowercase()),
                    methods,
                },
                cluster: Arc::from(config.cluster.as_str()),
                rate_limit: config.rate_limit.as_deref().map(Arc::from),
            });
        }

        // Stable sort keeps declaration order within equal specificity.
        routes.sort_by(|a, b| b.predicate.specificity().cmp(&a.predicate.specificity()));

        Ok(Self { routes })
    }

    /// Return the most specific route matching the request, if any.
    pub fn match_request(
        &self,
        method: &Method,
        host: Option<&str>,
        path: &str,
    ) -> Option<&CompiledRoute> {
        self.routes
            .iter()
            .find(|route| route.predicate.matches(method, host, path))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(name: &str) -> RouteConfig {
        RouteConfig {
            name: name.into(),
            path: None,
            path_prefix: None,
            path_pattern: None,
            host: None,
            methods: vec![],
            cluster: "c".into(),
            rate_limit: None,
        }
    }

    #[test]
    fn test_exact_beats_prefix_beats_pattern() {
        // Declared least specific first to prove ordering is by specificity,
        // not file position.
        let mut pattern = route("pattern");
        pattern.path_pattern = Some("/catalog/{id}".into());
        let mut prefix = route("prefix");
        prefix.path_prefix = Some("/catalog/".into());
        let mut exact = route("exact");
        exact.path = Some("/catalog/42".into());

        let table = RouteTable::compile(&[pattern, prefix, exact]).unwrap();

        let hit = table
            .match_request(&Method::GET, None, "/catalog/42")
            .unwrap();
        assert_eq!(&*hit.name, "exact");

        let hit = table
            .match_request(&Method::GET, None, "/catalog/7/reviews")
            .unwrap();
        assert_eq!(&*hit.name, "prefix");
    }

    #[test]
    fn test_longest_prefix_wins() {
        let mut short = route("short");
        short.path_prefix = Some("/catalog/".into());
        let mut long = route("long");
        long.path_prefix = Some("/catalog/products/".into());

        let table = RouteTable::compile(&[short, long]).unwrap();
        let hit = table
            .match_request(&Method::GET, None, "/catalog/products/42")
            .unwrap();
        assert_eq!(&*hit.name, "long");
    }

    #[test]
    fn test_pattern_literal_count_ordering() {
        let mut loose = route("loose");
        loose.path_pattern = Some("/{service}/{id}/items".into());
        let mut tight = route("tight");
        tight.path_pattern = Some("/catalog/{id}/items".into());

        let table = RouteTable::compile(&[loose, tight]).unwrap();
        let hit = table
            .match_request(&Method::GET, None, "/catalog/42/items")
            .unwrap();
        assert_eq!(&*hit.name, "tight");
    }

    #[test]
    fn test_declaration_order_breaks_ties() {
        let mut first = route("first");
        first.path_prefix = Some("/api/".into());
        let mut second = route("second");
        second.path_prefix = Some("/api/".into());

        let table = RouteTable::compile(&[first, second]).unwrap();
        let hit = table.match_request(&Method::GET, None, "/api/x").unwrap();
        assert_eq!(&*hit.name, "first");
    }

    #[test]
    fn test_no_match_is_explicit() {
        let mut r = route("r");
        r.path_prefix = Some("/api/".into());
        let table = RouteTable::compile(&[r]).unwrap();
        assert!(table.match_request(&Method::GET, None, "/other").is_none());
    }

    #[test]
    fn test_method_and_host_filtering() {
        let mut get_only = route("get-only");
        get_only.path_prefix = Some("/api/".into());
        get_only.methods = vec!["GET".into()];
        let mut hosted = route("hosted");
        hosted.path_prefix = Some("/api/".into());
        hosted.host = Some("shop.example.com".into());

        let table = RouteTable::compile(&[get_only, hosted]).unwrap();

        let hit = table
            .match_request(&Method::POST, Some("shop.example.com"), "/api/x")
            .unwrap();
        assert_eq!(&*hit.name, "hosted");

        let hit = table.match_request(&Method::GET, None, "/api/x").unwrap();
        assert_eq!(&*hit.name, "get-only");

        assert!(table.match_request(&Method::POST, None, "/api/x").is_none());
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let mut r = route("r");
        r.path_pattern = Some("/a/**/b".into());
        assert!(RouteTable::compile(&[r]).is_err());
    }
}
