//! Request path parsing and alias resolution.
//!
//! Paths are treated as positional argument lists: `/shop/mugs/7` becomes
//! `["shop", "mugs", "7"]`. Empty segments (leading, trailing or doubled
//! slashes) are dropped, so `//shop//mugs/` yields the same list. Index
//! access past the end is simply `None`.
//!
//! Alias resolution goes through the external [`PathAliasResolver`] and only
//! accepts canonical paths containing a `node/<digits>` segment pair:
//!
//! - `/about-us` → `/node/12` → loads node 12
//! - `/about-us/edit` → `/node/12/edit` → loads node 12
//! - `/about-us` → `/taxonomy/term/4` → `None`
//! - `/unknown` → `/unknown` (resolver echoes unknown aliases) → `None`

use crate::store::EntityStore;
use crate::types::{Entity, EntityId, entity_type};
use tracing::debug;

/// Alias lookup service.
pub trait PathAliasResolver {
    /// Canonical internal path for an alias. Unknown aliases are returned
    /// unchanged.
    fn alias_to_path(&self, alias: &str) -> String;
}

/// The two path views of the request being served.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Internal (canonical) path, e.g. `/node/12`.
    pub path: String,
    /// Raw request URI as the visitor sent it, e.g. `/about-us?ref=nav`.
    pub request_uri: String,
}

impl RequestContext {
    pub fn new(path: impl Into<String>, request_uri: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            request_uri: request_uri.into(),
        }
    }
}

/// Split a path into its non-empty segments.
pub fn segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Segment at `index`, or `None` when out of range.
pub fn segment_at(path: &str, index: usize) -> Option<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .nth(index)
        .map(str::to_string)
}

/// Node id from the first `node/<digits>` segment pair in a canonical path.
///
/// Trailing segments are ignored, so `/node/12/edit` yields node 12.
pub fn parse_node_path(path: &str) -> Option<EntityId> {
    segments(path).windows(2).find_map(|pair| match pair {
        [kind, id] if kind == "node" && id.bytes().all(|b| b.is_ascii_digit()) => {
            id.parse::<u64>().ok().map(EntityId)
        }
        _ => None,
    })
}

fn strip_query(uri: &str) -> &str {
    uri.split(['?', '#']).next().unwrap_or(uri)
}

/// Resolves paths and aliases against the injected alias service and store.
pub struct PathResolver<'a> {
    aliases: &'a dyn PathAliasResolver,
    entities: &'a dyn EntityStore,
}

impl<'a> PathResolver<'a> {
    pub fn new(aliases: &'a dyn PathAliasResolver, entities: &'a dyn EntityStore) -> Self {
        Self { aliases, entities }
    }

    /// Load the node an alias points at.
    pub fn resolve_alias(&self, alias: &str) -> Option<Entity> {
        let canonical = self.aliases.alias_to_path(alias);
        let Some(nid) = parse_node_path(&canonical) else {
            debug!(alias, canonical = %canonical, "alias does not resolve to a node path");
            return None;
        };
        let node = self.entities.load(entity_type::NODE, nid);
        if node.is_none() {
            debug!(alias, %nid, "alias points at a missing node");
        }
        node
    }

    /// Segments of the current internal path.
    pub fn current_segments(&self, request: &RequestContext) -> Vec<String> {
        segments(&request.path)
    }

    pub fn current_segment_at(&self, request: &RequestContext, index: usize) -> Option<String> {
        segment_at(&request.path, index)
    }

    /// Segments of the request URI (the alias form), without the query string.
    pub fn alias_segments(&self, request: &RequestContext) -> Vec<String> {
        segments(strip_query(&request.request_uri))
    }

    pub fn alias_segment_at(&self, request: &RequestContext, index: usize) -> Option<String> {
        segment_at(strip_query(&request.request_uri), index)
    }
}
