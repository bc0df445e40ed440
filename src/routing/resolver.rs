//! Per-request route resolution.
//!
//! A `RouteResolver` lives for one resolution context: it holds a router
//! snapshot, the URL being routed and the cached descriptor. Changing the
//! table, the base or the URL drops the cache.

use std::sync::Arc;

use tracing::Span;
use uuid::Uuid;

use crate::routing::descriptor::RouteDescriptor;
use crate::routing::router::Router;
use crate::routing::table::RouteTable;
use crate::routing::value::Value;

/// Stateful, single-request view over a router.
#[derive(Debug, Clone)]
pub struct RouteResolver {
    router: Router,
    url: Option<String>,
    /// `Some(None)` caches a miss.
    cached: Option<Option<RouteDescriptor>>,
    span: Span,
}

impl RouteResolver {
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self::from_router(&Router::new(table))
    }

    pub fn from_router(router: &Router) -> Self {
        let resolution_id = Uuid::new_v4();
        Self {
            router: router.clone(),
            url: None,
            cached: None,
            span: tracing::debug_span!("resolve", resolution_id = %resolution_id),
        }
    }

    /// Replace the route table.
    pub fn set_routes(&mut self, table: Arc<RouteTable>) -> &mut Self {
        let mut router = Router::new(table);
        if let Some(base) = self.router.base() {
            router = router.with_base(base);
        }
        self.router = router;
        self.cached = None;
        self
    }

    pub fn routes(&self) -> &RouteTable {
        self.router.table()
    }

    pub fn set_base(&mut self, base: impl Into<String>) -> &mut Self {
        self.router = Router::new(self.router.table().clone()).with_base(base);
        self.cached = None;
        self
    }

    pub fn base(&self) -> Option<&str> {
        self.router.base()
    }

    /// Prefix an application URL with the base directory.
    pub fn rebase(&self, url: &str) -> String {
        match self.router.base() {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/')),
            None => url.to_string(),
        }
    }

    pub fn set_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.url = Some(url.into());
        self.cached = None;
        self
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// True once a resolution has been performed and cached.
    pub fn is_used(&self) -> bool {
        self.cached.is_some()
    }

    /// Descriptor for the current URL, resolved at most once.
    pub fn route(&mut self) -> Option<&RouteDescriptor> {
        if self.cached.is_none() {
            let _entered = self.span.enter();
            let resolved = match &self.url {
                Some(url) => self.router.resolve(url),
                None => {
                    tracing::debug!("No URL to route");
                    None
                }
            };
            self.cached = Some(resolved);
        }

        self.cached.as_ref().and_then(Option::as_ref)
    }

    /// Route a new URL.
    pub fn resolve(&mut self, raw: &str) -> Option<&RouteDescriptor> {
        self.set_url(raw);
        self.route()
    }

    /// One field of the current descriptor.
    pub fn get(&mut self, name: &str) -> Option<&Value> {
        self.route()?.get(name)
    }

    /// Synthetic route by key, bypassing path matching.
    pub fn lookup(&self, key: &str) -> Option<RouteDescriptor> {
        let _entered = self.span.enter();
        self.router.lookup(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::template::Template;

    fn resolver() -> RouteResolver {
        RouteResolver::new(Arc::new(RouteTable::default()))
    }

    #[test]
    fn test_cache_lifecycle() {
        let mut resolver = resolver();
        assert!(!resolver.is_used());
        assert!(resolver.route().is_none());
        assert!(resolver.is_used());

        resolver.set_url("/news/show/7");
        assert!(!resolver.is_used());
        assert_eq!(resolver.get("controller"), Some(&Value::from("news")));
        assert!(resolver.is_used());

        resolver.set_base("/app");
        assert!(!resolver.is_used());
    }

    #[test]
    fn test_set_routes_invalidates() {
        let mut resolver = resolver();
        assert_eq!(resolver.resolve("/blog").unwrap().controller(), Some("blog"));

        resolver.set_routes(Arc::new(RouteTable::new([(
            "/blog",
            Template::mapping([("controller", Template::expr("posts"))]),
        )])));
        assert!(!resolver.is_used());
        assert_eq!(resolver.route().unwrap().controller(), Some("posts"));
    }

    #[test]
    fn test_rebase() {
        let mut resolver = resolver();
        assert_eq!(resolver.rebase("img/a.png"), "img/a.png");
        resolver.set_base("/app/");
        assert_eq!(resolver.rebase("/img/a.png"), "/app/img/a.png");
        assert_eq!(resolver.rebase("img/a.png"), "/app/img/a.png");
    }
}
