//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every path pattern once, ahead of traffic
//! - Check templates for misplaced variadic placeholders
//! - Detect routes that collapse to the same key
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Whether errors are fatal is the caller's decision (`strict_validation`)

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::routing::path::trim_trailing_slash;
use crate::routing::pattern::{compile, PatternError};
use crate::routing::template::{Template, TemplateError};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route '{route}': {source}")]
    Pattern { route: String, source: PatternError },

    #[error("route '{route}': {source}")]
    Template { route: String, source: TemplateError },

    #[error("route '{route}' duplicates an earlier route and is unreachable")]
    DuplicateRoute { route: String },

    #[error("base '{base}' must be a plain path prefix")]
    InvalidBase { base: String },
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(base) = &config.router.base {
        if base.contains(|c: char| matches!(c, '?' | '#' | '*' | '[' | '{')) {
            errors.push(ValidationError::InvalidBase { base: base.clone() });
        }
    }

    let mut seen = HashSet::new();
    for (key, value) in &config.routes {
        let route = trim_trailing_slash(key).to_string();

        if !seen.insert(route.clone()) {
            errors.push(ValidationError::DuplicateRoute { route: key.clone() });
        }

        if route.starts_with('/') {
            if let Err(source) = compile(&route) {
                errors.push(ValidationError::Pattern { route: key.clone(), source });
            }
        }

        for source in Template::from(value).lint() {
            errors.push(ValidationError::Template { route: key.clone(), source });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml_src: &str) -> RouterConfig {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RouterConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let config = config(
            r#"
            [router]
            base = "/app/*"

            [routes]
            "/foo" = { controller = "a" }
            "/foo/" = { controller = "b" }
            "/[oops" = { controller = "c" }
            "/bar" = { controller = "$1+" }
            "#,
        );

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::InvalidBase { base: "/app/*".into() }));
        assert!(errors.contains(&ValidationError::DuplicateRoute { route: "/foo/".into() }));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Pattern { route, .. } if route == "/[oops")));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Template { route, .. } if route == "/bar")));
    }

    #[test]
    fn test_synthetic_keys_are_not_compiled() {
        let config = config(
            r#"
            [routes]
            "404" = { controller = "error", action = "show" }
            "{weird" = { controller = "x" }
            "#,
        );
        assert!(validate_config(&config).is_ok());
    }
}
