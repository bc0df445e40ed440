//! Route lookup.
//!
//! # Responsibilities
//! - Pair an immutable route table with its base prefix
//! - Resolve a raw path to a descriptor (normalize → find → bind)
//! - Publish replacement routers atomically for concurrent readers
//!
//! # Design Decisions
//! - `Router` is immutable and shared via `Arc`; resolving needs no locks
//! - Reload swaps the whole `Arc<Router>`; in-flight resolutions keep the
//!   snapshot they started with
//! - Explicit `None` for no match rather than a silent default

use std::collections::HashSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::mpsc;

use crate::config::{ConfigError, RouterConfig};
use crate::observability::metrics;
use crate::routing::binder::bind;
use crate::routing::descriptor::RouteDescriptor;
use crate::routing::path::{split_segments, strip_base, strip_query, trim_trailing_slash};
use crate::routing::pattern::PatternCompiler;
use crate::routing::resolver::RouteResolver;
use crate::routing::table::RouteTable;
use crate::routing::template::Template;

/// An immutable route table plus the base prefix it is served under.
#[derive(Debug, Clone, Default)]
pub struct Router {
    table: Arc<RouteTable>,
    base: Option<String>,
}

impl Router {
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self { table, base: None }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Build a router from configuration, compiling patterns through `compiler`.
    pub fn from_config(config: &RouterConfig, compiler: &PatternCompiler) -> Self {
        let entries = config
            .routes
            .iter()
            .map(|(key, value)| (key.clone(), Template::from(value)));

        Self {
            table: Arc::new(RouteTable::with_compiler(entries, compiler)),
            base: config.router.base.clone(),
        }
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Path used for matching: query dropped, base stripped, trailing slash trimmed.
    pub fn normalize(&self, raw: &str) -> String {
        let path = strip_base(strip_query(raw), self.base.as_deref());
        trim_trailing_slash(&path).to_string()
    }

    /// Resolve a raw request path. Pure: same inputs, same descriptor.
    pub fn resolve(&self, raw: &str) -> Option<RouteDescriptor> {
        let path = self.normalize(raw);

        let Some(route) = self.table.find(&path) else {
            tracing::debug!(path = %path, "No route matched");
            metrics::record_resolution(false);
            return None;
        };

        let bound = bind(route.template(), &split_segments(&path));
        tracing::debug!(path = %path, route = %route.key(), "Route matched");
        metrics::record_resolution(true);

        Some(RouteDescriptor::new(route.key(), bound.value, bound.warnings))
    }

    /// Synthetic route by key, bound against no segments.
    pub fn lookup(&self, key: &str) -> Option<RouteDescriptor> {
        let route = self.table.get(key)?;
        let bound = bind(route.template(), &[]);
        Some(RouteDescriptor::new(route.key(), bound.value, bound.warnings))
    }
}

/// Shared, hot-swappable router.
#[derive(Debug)]
pub struct RouterHandle {
    current: ArcSwap<Router>,
    compiler: PatternCompiler,
}

impl RouterHandle {
    pub fn new(router: Router) -> Self {
        Self {
            current: ArcSwap::from_pointee(router),
            compiler: PatternCompiler::new(),
        }
    }

    pub fn from_config(config: &RouterConfig) -> Self {
        let compiler = PatternCompiler::new();
        let router = Router::from_config(config, &compiler);
        Self {
            current: ArcSwap::from_pointee(router),
            compiler,
        }
    }

    /// Current router snapshot.
    pub fn load(&self) -> Arc<Router> {
        self.current.load_full()
    }

    /// Fresh per-request resolver over the current snapshot.
    pub fn resolver(&self) -> RouteResolver {
        RouteResolver::from_router(&self.load())
    }

    /// Publish a new router.
    pub fn store(&self, router: Router) {
        self.current.store(Arc::new(router));
    }

    /// Rebuild from configuration and publish it.
    ///
    /// In strict mode a configuration with errors is rejected and the current
    /// router stays in place.
    pub fn reload(&self, config: &RouterConfig) -> Result<(), ConfigError> {
        if config.router.strict_validation {
            if let Err(errors) = crate::config::validation::validate_config(config) {
                metrics::record_reload(false);
                return Err(ConfigError::Validation(errors));
            }
        }

        let router = Router::from_config(config, &self.compiler);
        let live: HashSet<&str> = router
            .table()
            .routes()
            .filter_map(|route| route.pattern().map(|p| p.as_str()))
            .collect();
        self.compiler.retain(|pattern| live.contains(pattern));

        tracing::info!(routes = router.table().len(), base = ?router.base(), "Router reloaded");
        self.store(router);
        metrics::record_reload(true);
        Ok(())
    }

    /// Apply configuration updates until the sender side closes.
    pub async fn follow(&self, mut updates: mpsc::UnboundedReceiver<RouterConfig>) {
        while let Some(config) = updates.recv().await {
            if let Err(e) = self.reload(&config) {
                tracing::error!("Rejected configuration update: {}. Keeping current routes.", e);
            }
        }
    }
}
