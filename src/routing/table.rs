//! Path to handler mapping.
//!
//! Lookups are exact string matches on the raw request target. Every
//! registered path is stored twice, with and without a trailing slash, and
//! the reserved `all` key fills a separate wildcard slot that answers any
//! path lacking an exact entry.

use std::collections::HashMap;
use std::fmt;

use crate::routing::fetch::Handler;

/// Registration key that matches every path.
pub const WILDCARD: &str = "all";

/// Result of resolving a path against the table.
#[derive(Clone)]
pub enum Route {
    Exact(Handler),
    Wildcard(Handler),
    NotFound,
}

impl Route {
    pub fn kind(&self) -> &'static str {
        match self {
            Route::Exact(_) => "exact",
            Route::Wildcard(_) => "wildcard",
            Route::NotFound => "not_found",
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

#[derive(Default, Clone)]
pub struct RoutingTable {
    exact: HashMap<String, Handler>,
    wildcard: Option<Handler>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `path` and `path/`, replacing whatever was
    /// there. Registering [`WILDCARD`] also fills the wildcard slot.
    pub fn insert(&mut self, path: &str, handler: Handler) {
        if path == WILDCARD {
            self.wildcard = Some(handler.clone());
        }

        self.exact.insert(path.to_string(), handler.clone());
        self.exact.insert(format!("{path}/"), handler);
    }

    pub fn resolve(&self, path: &str) -> Route {
        match (self.exact.get(path), &self.wildcard) {
            (Some(handler), _) => Route::Exact(handler.clone()),
            (None, Some(handler)) => Route::Wildcard(handler.clone()),
            (None, None) => Route::NotFound,
        }
    }

    /// Number of exact keys, trailing-slash twins included.
    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.wildcard.is_none()
    }
}

impl fmt::Debug for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<_> = self.exact.keys().collect();
        paths.sort();
        f.debug_struct("RoutingTable")
            .field("paths", &paths)
            .field("wildcard", &self.wildcard.is_some())
            .finish()
    }
}
