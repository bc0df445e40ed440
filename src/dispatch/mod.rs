//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! RouteResolver
//!     → responder.rs (route descriptor → file or registered action)
//!     → registry.rs (controller/action → callable)
//!     → Outcome { status, location, body }
//!
//! On failure:
//!     no match / unknown action / missing target → 404 route
//!     action error                               → 500 route
//!     synthetic route missing or failing          → plain message
//! ```
//!
//! # Design Decisions
//! - Actions are registered up front; "not found" is a failed lookup
//! - Error and redirect pages are ordinary table entries keyed by status
//! - Produces values, never writes HTTP

pub mod registry;
pub mod responder;

use std::path::PathBuf;

use thiserror::Error;

pub use registry::{Action, Registry};
pub use responder::{Body, Origin, Outcome, Responder};

/// Reasons a descriptor could not be dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no route matched")]
    NoMatch,

    #[error("failed to route using '{route}': {missing} is not set")]
    MissingTarget { route: String, missing: &'static str },

    #[error("no action '{action}' registered for controller '{controller}'")]
    UnknownAction { controller: String, action: String },

    #[error("failed to route using '{route}': file '{}' doesn't exist", .path.display())]
    MissingFile { route: String, path: PathBuf },

    /// Raised by an action itself; answered with a 500.
    #[error("action failed: {0}")]
    Action(String),
}
