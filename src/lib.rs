//! Wildcard URL router.
//!
//! Resolves request paths against an ordered table of wildcard patterns and
//! binds captured segments into route descriptors (controller, action, args).

pub mod config;
pub mod dispatch;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use dispatch::{Outcome, Registry, Responder};
pub use routing::{RouteDescriptor, RouteResolver, RouteTable, Router, RouterHandle, Template, Value};
