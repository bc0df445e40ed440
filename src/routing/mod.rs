//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming path
//!     → path.rs (drop query, strip base, trim trailing slash)
//!     → table.rs (first pattern match, insertion order)
//!     → binder.rs (bind template against path segments)
//!     → Return: RouteDescriptor or None
//!
//! Table Compilation (at startup / reload):
//!     [routes] config, in file order
//!     → template.rs (expressions parsed once)
//!     → pattern.rs (wildcards compiled, memoized)
//!     → Freeze as immutable Router, publish via RouterHandle
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same table, base and path always bind the same descriptor
//! - First match wins (configuration order)
//! - Per-request state lives in `RouteResolver`, never in the shared router

pub mod binder;
pub mod descriptor;
pub mod path;
pub mod pattern;
pub mod resolver;
pub mod router;
pub mod table;
pub mod template;
pub mod value;

pub use descriptor::RouteDescriptor;
pub use pattern::{Pattern, PatternCompiler, PatternError};
pub use resolver::RouteResolver;
pub use router::{Router, RouterHandle};
pub use table::{Route, RouteTable};
pub use template::{Expression, Template, TemplateError};
pub use value::Value;
