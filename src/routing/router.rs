//! Route table and lookup.
//!
//! # Responsibilities
//! - Store the ordered (prefix, handler group) entries
//! - Resolve a path to exactly one entry
//!
//! # Design Decisions
//! - Immutable after construction (shared via Arc without locks)
//! - Longest prefix wins; declaration order breaks ties
//! - The API docs entry sits at `/` and therefore only wins when nothing
//!   more specific matches

use crate::collaborators::Feature;
use crate::routing::matcher::{Matcher, PathPrefixMatcher};

/// The handler group an entry delegates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    HealthCheck,
    StaticAssets,
    Feature(Feature),
    ApiDocs,
}

impl RouteGroup {
    /// Label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RouteGroup::HealthCheck => "health-check",
            RouteGroup::StaticAssets => "images",
            RouteGroup::Feature(feature) => feature.as_str(),
            RouteGroup::ApiDocs => "api-docs",
        }
    }
}

/// A single (prefix, group) pair.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    matcher: PathPrefixMatcher,
    group: RouteGroup,
}

impl RouteEntry {
    pub fn new(prefix: impl Into<String>, group: RouteGroup) -> Self {
        Self {
            matcher: PathPrefixMatcher::new(prefix),
            group,
        }
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn group(&self) -> RouteGroup {
        self.group
    }
}

/// Ordered route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

pub const HEALTH_CHECK_PREFIX: &str = "/health-check";
pub const STATIC_ASSETS_PREFIX: &str = "/images";

impl RouteTable {
    pub fn new(entries: Vec<RouteEntry>) -> Self {
        Self { entries }
    }

    /// The gateway's fixed table, in declaration order.
    pub fn standard() -> Self {
        let mut entries = vec![
            RouteEntry::new(HEALTH_CHECK_PREFIX, RouteGroup::HealthCheck),
            RouteEntry::new(STATIC_ASSETS_PREFIX, RouteGroup::StaticAssets),
        ];
        entries.extend(
            Feature::ALL
                .iter()
                .map(|f| RouteEntry::new(f.path(), RouteGroup::Feature(*f))),
        );
        entries.push(RouteEntry::new("/", RouteGroup::ApiDocs));
        Self { entries }
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Resolve `path` to its entry.
    pub fn resolve(&self, path: &str) -> Option<&RouteEntry> {
        let mut best: Option<&RouteEntry> = None;
        for entry in &self.entries {
            if !entry.matcher.matches(path) {
                continue;
            }
            // Strictly greater keeps the earlier declaration on ties.
            let better = best
                .map(|b| entry.matcher.specificity() > b.matcher.specificity())
                .unwrap_or(true);
            if better {
                best = Some(entry);
            }
        }
        best
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_order() {
        let table = RouteTable::standard();
        let prefixes: Vec<_> = table.entries().iter().map(|e| e.prefix()).collect();
        assert_eq!(
            prefixes,
            vec![
                "/health-check",
                "/images",
                "/youtube-transcript",
                "/web-page-reader",
                "/powerpoint-generator",
                "/word-generator",
                "/excel-generator",
                "/",
            ]
        );
    }

    #[test]
    fn test_specific_prefix_beats_docs() {
        let table = RouteTable::standard();
        assert_eq!(table.resolve("/health-check").unwrap().group(), RouteGroup::HealthCheck);
        assert_eq!(table.resolve("/images/a.png").unwrap().group(), RouteGroup::StaticAssets);
        assert_eq!(
            table.resolve("/word-generator").unwrap().group(),
            RouteGroup::Feature(Feature::WordGenerator)
        );
        assert_eq!(table.resolve("/swagger.json").unwrap().group(), RouteGroup::ApiDocs);
        assert_eq!(table.resolve("/nope").unwrap().group(), RouteGroup::ApiDocs);
    }

    #[test]
    fn test_every_path_resolves_to_one_entry() {
        let table = RouteTable::standard();
        for path in ["/", "/images", "/excel-generator/x", "/health-checkx"] {
            assert!(table.resolve(path).is_some(), "{path} should resolve");
        }
        assert_eq!(table.resolve("/health-checkx").unwrap().group(), RouteGroup::ApiDocs);
    }

    #[test]
    fn test_longest_prefix_wins_regardless_of_order() {
        let table = RouteTable::new(vec![
            RouteEntry::new("/", RouteGroup::ApiDocs),
            RouteEntry::new("/images", RouteGroup::StaticAssets),
        ]);
        assert_eq!(table.resolve("/images/x").unwrap().group(), RouteGroup::StaticAssets);
    }

    #[test]
    fn test_ties_keep_declaration_order() {
        let table = RouteTable::new(vec![
            RouteEntry::new("/images", RouteGroup::StaticAssets),
            RouteEntry::new("/images/", RouteGroup::ApiDocs),
        ]);
        assert_eq!(table.resolve("/images").unwrap().group(), RouteGroup::StaticAssets);
    }
}
