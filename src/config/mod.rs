//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! routes.toml
//!     → loader.rs (parse & deserialize, route order preserved)
//!     → validation.rs (patterns compile, templates lint, duplicates)
//!     → RouterConfig (validated, immutable)
//!     → Router::from_config → RouterHandle
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<Router> in RouterHandle
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults; no `[routes]` means the catch-all table
//! - Lenient by default: a broken route is skipped, the rest keep serving

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ObservabilityConfig, RouterConfig, RouterSettings};
pub use validation::ValidationError;
