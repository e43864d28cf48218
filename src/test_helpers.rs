//! Shared test utilities for the site-assistant test suite.
//!
//! Provides the fixture site and small service doubles that more than one
//! module's tests need.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = fixture_site();
//! let aliases = StaticAliases::new(&[("/about", "/node/1")]);
//! let resolver = PathResolver::new(&aliases, &site);
//! ```

use std::collections::BTreeMap;

use crate::memory::MemorySite;
use crate::path::PathAliasResolver;

// =========================================================================
// Fixture setup
// =========================================================================

const SITE_JSON: &str = include_str!("../fixtures/site.json");

/// A fresh copy of `fixtures/site.json`.
///
/// Every call parses the snapshot again, so tests can create carts without
/// affecting each other.
pub fn fixture_site() -> MemorySite {
    MemorySite::from_json(SITE_JSON).unwrap_or_else(|e| panic!("fixtures/site.json: {e}"))
}

// =========================================================================
// Service doubles
// =========================================================================

/// Alias resolver over a fixed table. Unknown aliases are echoed back.
pub struct StaticAliases(BTreeMap<String, String>);

impl StaticAliases {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(alias, path)| (alias.to_string(), path.to_string()))
                .collect(),
        )
    }
}

impl PathAliasResolver for StaticAliases {
    fn alias_to_path(&self, alias: &str) -> String {
        self.0
            .get(alias)
            .cloned()
            .unwrap_or_else(|| alias.to_string())
    }
}
