//! Ordered route table.
//!
//! # Responsibilities
//! - Hold (pattern, template) entries in configuration order
//! - Find the first entry whose pattern matches a normalized path
//! - Look up synthetic entries ("404", "500", ...) by key
//!
//! # Design Decisions
//! - Immutable after construction; replaced wholesale, never edited
//! - First match wins, no specificity ranking
//! - Keys not starting with '/' are synthetic and never path-matched
//! - A pattern that fails to compile drops its route with a warning

use std::sync::Arc;

use crate::routing::path::trim_trailing_slash;
use crate::routing::pattern::{Pattern, PatternCompiler, PatternError};
use crate::routing::template::Template;

/// One table entry.
#[derive(Debug, Clone)]
pub struct Route {
    key: String,
    pattern: Option<Arc<Pattern>>,
    template: Template,
}

impl Route {
    /// The key with its trailing slash trimmed. This is what descriptors
    /// report as the matched route.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Compiled matcher, `None` for synthetic keys.
    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_deref()
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn is_synthetic(&self) -> bool {
        self.pattern.is_none()
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.test(path))
    }
}

/// Immutable, ordered route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build a table with a private compiler, skipping routes whose pattern
    /// does not compile.
    pub fn new<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Template)>,
    {
        Self::with_compiler(entries, &PatternCompiler::new())
    }

    /// Build a table, skipping routes whose pattern does not compile.
    pub fn with_compiler<K, I>(entries: I, compiler: &PatternCompiler) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Template)>,
    {
        let mut routes = Vec::new();
        for (key, template) in entries {
            match Self::route(key.into(), template, compiler) {
                Ok(route) => routes.push(route),
                Err(e) => tracing::warn!(error = %e, "Skipping route"),
            }
        }
        Self { routes }
    }

    /// Build a table, failing with every pattern error found.
    pub fn try_with_compiler<K, I>(entries: I, compiler: &PatternCompiler) -> Result<Self, Vec<PatternError>>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Template)>,
    {
        let mut routes = Vec::new();
        let mut errors = Vec::new();
        for (key, template) in entries {
            match Self::route(key.into(), template, compiler) {
                Ok(route) => routes.push(route),
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() {
            Ok(Self { routes })
        } else {
            Err(errors)
        }
    }

    fn route(key: String, template: Template, compiler: &PatternCompiler) -> Result<Route, PatternError> {
        let key = trim_trailing_slash(&key).to_string();
        let pattern = if key.starts_with('/') {
            Some(compiler.compile(&key)?)
        } else {
            None
        };

        Ok(Route { key, pattern, template })
    }

    /// First route, in insertion order, whose pattern matches the path.
    ///
    /// The path is expected to be normalized already.
    pub fn find(&self, path: &str) -> Option<&Route> {
        let path = trim_trailing_slash(path);
        self.routes.iter().find(|route| route.matches(path))
    }

    /// Route registered under exactly this key.
    pub fn get(&self, key: &str) -> Option<&Route> {
        let key = trim_trailing_slash(key);
        self.routes.iter().find(|route| route.key == key)
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new([("/**", Template::default_route())])
    }
}
