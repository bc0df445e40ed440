//! Shared helpers for integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use wildroute::config::parse_config;
use wildroute::routing::PatternCompiler;
use wildroute::{RouteTable, Router};

/// Build a router from a TOML route file body.
#[allow(dead_code)]
pub fn router(src: &str) -> Router {
    let config = parse_config(src).expect("test config should parse");
    Router::from_config(&config, &PatternCompiler::new())
}

/// Build just the table from a TOML route file body.
#[allow(dead_code)]
pub fn table(src: &str) -> Arc<RouteTable> {
    router(src).table().clone()
}

/// Write a config file into a fresh temp directory.
#[allow(dead_code)]
pub fn write_config(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("wildroute-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("routes.toml");
    std::fs::write(&path, content).unwrap();
    path
}
