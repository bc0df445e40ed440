//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Base prefix, validation mode and responder settings.
    pub router: RouterSettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Route table: pattern (or synthetic key) → template, in file order.
    pub routes: toml::Table,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            router: RouterSettings::default(),
            observability: ObservabilityConfig::default(),
            routes: default_routes(),
        }
    }
}

/// Default catch-all table: `/controller/action/args...`.
pub fn default_routes() -> toml::Table {
    let mut route = toml::Table::new();
    route.insert("controller".into(), toml::Value::String("$1|default".into()));
    route.insert("action".into(), toml::Value::String("$2|index".into()));
    route.insert(
        "args".into(),
        toml::Value::Array(vec![toml::Value::String("$3+".into())]),
    );

    let mut routes = toml::Table::new();
    routes.insert("/**".into(), toml::Value::Table(route));
    routes
}

/// Router settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterSettings {
    /// Webroot subdirectory stripped from every incoming path.
    pub base: Option<String>,

    /// Reject the whole configuration on any route error.
    /// When false, broken routes are skipped with a warning.
    pub strict_validation: bool,

    /// Directory `file` routes are served from.
    pub document_root: Option<PathBuf>,

    /// Body used for 404 responses when no "404" route handles them.
    pub not_found_message: String,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            base: None,
            strict_validation: false,
            document_root: None,
            not_found_message: "Sorry, this page does not exist".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
