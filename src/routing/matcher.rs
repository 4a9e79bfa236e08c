//! Route matching logic.
//!
//! # Responsibilities
//! - Match host header (exact match, case-insensitive, port stripped)
//! - Match path by exact value, static prefix, or segment pattern
//! - Match optional HTTP method set
//! - Combine conditions with AND semantics
//! - Score predicates for specificity ordering
//!
//! # Design Decisions
//! - Host matching is case-insensitive (per HTTP spec)
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching

use std::collections::HashSet;

use axum::http::Method;

/// One pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*` or `{name}`: matches exactly one path segment.
    Wildcard,
}

/// A parsed segment pattern, e.g. `/catalog/{id}/items` or `/files/**`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
    /// Trailing `**`: the pattern matches any remainder.
    rest: bool,
    literal_count: usize,
}

/// Pattern string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid path pattern '{pattern}': {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: &'static str,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError {
                pattern: pattern.to_string(),
                reason: "must start with '/'",
            });
        }

        let raw: Vec<&str> = pattern[1..].split('/').collect();
        let mut segments = Vec::with_capacity(raw.len());
        let mut rest = false;
        let mut literal_count = 0;

        for (i, part) in raw.iter().enumerate() {
            if *part == "**" {
                if i != raw.len() - 1 {
                    return Err(PatternError {
                        pattern: pattern.to_string(),
                        reason: "'**' is only allowed as the final segment",
                    });
                }
                rest = true;
            } else if *part == "*" || (part.starts_with('{') && part.ends_with('}')) {
                segments.push(Segment::Wildcard);
            } else {
                literal_count += 1;
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        Ok(Self {
            segments,
            rest,
            literal_count,
        })
    }

    /// Number of literal segments, used for specificity ordering.
    pub fn literal_count(&self) -> usize {
        self.literal_count
    }

    fn matches(&self, path: &str) -> bool {
        let path = path.strip_prefix('/').unwrap_or(path);
        let parts: Vec<&str> = if path.is_empty() {
            Vec::new()
        } else {
            path.split('/').collect()
        };

        if self.rest {
            if parts.len() < self.segments.len() {
                return false;
            }
        } else if parts.len() != self.segments.len() {
            return false;
        }

        self.segments.iter().zip(parts.iter()).all(|(seg, part)| match seg {
            Segment::Literal(lit) => lit == part,
            Segment::Wildcard => !part.is_empty(),
        })
    }
}

/// The path component of a route predicate. Exactly one form per route.
#[derive(Debug, Clone)]
pub enum PathMatch {
    Exact(String),
    Prefix(String),
    Pattern(PathPattern),
}

impl PathMatch {
    fn matches(&self, path: &str) -> bool {
        match self {
            PathMatch::Exact(expected) => path == expected,
            PathMatch::Prefix(prefix) => path.starts_with(prefix.as_str()),
            PathMatch::Pattern(pattern) => pattern.matches(path),
        }
    }
}

/// Specificity rank of a route predicate.
///
/// Exact beats any prefix, a longer prefix beats a shorter one, and a prefix
/// beats any pattern; patterns rank by literal segment count. Declaration
/// order breaks remaining ties (handled by the table, which sorts stably).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    rank: u8,
    weight: usize,
}

/// Full match predicate for one route.
#[derive(Debug, Clone)]
pub struct RoutePredicate {
    pub path: PathMatch,
    /// Lowercased expected host, if any.
    pub host: Option<String>,
    /// Empty set matches any method.
    pub methods: HashSet<Method>,
}

impl RoutePredicate {
    /// Returns true if all conditions match (AND semantics).
    pub fn matches(&self, method: &Method, host: Option<&str>, path: &str) -> bool {
        if !self.methods.is_empty() && !self.methods.contains(method) {
            return false;
        }

        if let Some(expected) = &self.host {
            let actual = match host {
                Some(h) => h.split(':').next().unwrap_or(h),
                None => return false,
            };
            if !actual.eq_ignore_ascii_case(expected) {
                return false;
            }
        }

        self.path.matches(path)
    }

    pub fn specificity(&self) -> Specificity {
        match &self.path {
            PathMatch::Exact(_) => Specificity { rank: 3, weight: 0 },
            PathMatch::Prefix(p) => Specificity {
                rank: 2,
                weight: p.len(),
            },
            PathMatch::Pattern(p) => Specificity {
                rank: 1,
                weight: p.literal_count(),
            },
        }
    }
}
