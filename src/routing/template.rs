//! Route templates.
//!
//! A template describes how to turn the segments of a matched path into a
//! route descriptor. Leaves are expressions: alternatives separated by '|',
//! evaluated left to right, first non-empty value wins.
//!
//! ```text
//!  $2         second path segment
//!  $3+        third segment and everything after it (sequences only)
//!  $          same as $1
//!  'index'    literal, one layer of matching quotes is stripped
//!  index      literal
//! ```

use std::fmt;

use thiserror::Error;

/// Template problems detected while loading or binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A `$N+` placeholder outside of a sequence.
    #[error("variadic placeholder '{placeholder}' at '{at}' is only allowed inside a sequence")]
    VariadicOutsideSequence { at: String, placeholder: String },
}

/// One alternative of an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alternative {
    /// Literal text, already unquoted.
    Literal(String),
    /// Reference to a path segment as written (`$2` has index 2).
    Placeholder { index: usize, variadic: bool },
}

impl Alternative {
    fn parse(option: &str) -> Self {
        match option.strip_prefix('$') {
            Some(rest) => {
                let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
                Alternative::Placeholder {
                    index: digits.parse().unwrap_or(0),
                    variadic: rest.ends_with('+'),
                }
            }
            None => Alternative::Literal(unquote(option).to_string()),
        }
    }

    /// Zero-based segment offset. `$0` and `$1` both refer to the first segment.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Alternative::Placeholder { index, .. } => Some(index.saturating_sub(1)),
            Alternative::Literal(_) => None,
        }
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self, Alternative::Placeholder { variadic: true, .. })
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alternative::Literal(text) => write!(f, "'{}'", text),
            Alternative::Placeholder { index, variadic } => {
                write!(f, "${}{}", index, if *variadic { "+" } else { "" })
            }
        }
    }
}

fn unquote(option: &str) -> &str {
    let bytes = option.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(&open), Some(&close))
            if bytes.len() >= 2 && open == close && (open == b'\'' || open == b'"') =>
        {
            &option[1..option.len() - 1]
        }
        _ => option,
    }
}

/// Ordered list of alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    alternatives: Vec<Alternative>,
}

impl Expression {
    pub fn parse(raw: &str) -> Self {
        Self {
            alternatives: raw.split('|').map(Alternative::parse).collect(),
        }
    }

    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    /// True if any alternative splices a tail of segments.
    pub fn is_variadic(&self) -> bool {
        self.alternatives.iter().any(Alternative::is_variadic)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, alt) in self.alternatives.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{}", alt)?;
        }
        Ok(())
    }
}

/// Template tree, shape decided once at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    Expression(Expression),
    Sequence(Vec<Template>),
    Mapping(Vec<(String, Template)>),
}

impl Template {
    pub fn expr(raw: &str) -> Self {
        Template::Expression(Expression::parse(raw))
    }

    pub fn sequence<I: IntoIterator<Item = Template>>(items: I) -> Self {
        Template::Sequence(items.into_iter().collect())
    }

    pub fn mapping<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Template)>,
    {
        Template::Mapping(entries.into_iter().map(|(k, t)| (k.into(), t)).collect())
    }

    /// The route installed when no table is configured.
    pub fn default_route() -> Self {
        Template::mapping([
            ("controller", Template::expr("$1|default")),
            ("action", Template::expr("$2|index")),
            ("args", Template::sequence([Template::expr("$3+")])),
        ])
    }

    /// Report variadic placeholders that are not direct children of a sequence.
    pub fn lint(&self) -> Vec<TemplateError> {
        let mut errors = Vec::new();
        self.lint_into("", false, &mut errors);
        errors
    }

    fn lint_into(&self, at: &str, in_sequence: bool, errors: &mut Vec<TemplateError>) {
        match self {
            Template::Expression(expr) if !in_sequence => {
                for alt in expr.alternatives().iter().filter(|a| a.is_variadic()) {
                    errors.push(TemplateError::VariadicOutsideSequence {
                        at: at.to_string(),
                        placeholder: alt.to_string(),
                    });
                }
            }
            Template::Expression(_) => {}
            Template::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    item.lint_into(&format!("{}[{}]", at, i), true, errors);
                }
            }
            Template::Mapping(entries) => {
                for (key, item) in entries {
                    item.lint_into(&child_path(at, key), false, errors);
                }
            }
        }
    }
}

pub(crate) fn child_path(at: &str, key: &str) -> String {
    if at.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", at, key)
    }
}

impl From<&str> for Template {
    fn from(raw: &str) -> Self {
        Template::expr(raw)
    }
}

impl From<&toml::Value> for Template {
    fn from(value: &toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Template::expr(s),
            toml::Value::Integer(n) => Template::expr(&n.to_string()),
            toml::Value::Float(n) => Template::expr(&n.to_string()),
            toml::Value::Boolean(b) => Template::expr(&b.to_string()),
            toml::Value::Datetime(d) => Template::expr(&d.to_string()),
            toml::Value::Array(items) => Template::Sequence(items.iter().map(Template::from).collect()),
            toml::Value::Table(table) => Template::Mapping(
                table
                    .iter()
                    .map(|(k, v)| (k.clone(), Template::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_alternatives() {
        let expr = Expression::parse("$1|'default'|\"x\"|plain");
        assert_eq!(
            expr.alternatives(),
            &[
                Alternative::Placeholder { index: 1, variadic: false },
                Alternative::Literal("default".into()),
                Alternative::Literal("x".into()),
                Alternative::Literal("plain".into()),
            ]
        );
    }

    #[test]
    fn test_placeholder_offsets() {
        assert_eq!(Alternative::parse("$").offset(), Some(0));
        assert_eq!(Alternative::parse("$0").offset(), Some(0));
        assert_eq!(Alternative::parse("$1").offset(), Some(0));
        assert_eq!(Alternative::parse("$3+").offset(), Some(2));
        assert!(Alternative::parse("$3+").is_variadic());
        assert_eq!(Alternative::parse("news").offset(), None);
    }

    #[test]
    fn test_unquote_requires_matching_pair() {
        assert_eq!(unquote("'a'"), "a");
        assert_eq!(unquote("\"a\""), "a");
        assert_eq!(unquote("'a\""), "'a\"");
        assert_eq!(unquote("'"), "'");
        assert_eq!(unquote("''"), "");
    }

    #[test]
    fn test_from_toml_keeps_order() {
        let value: toml::Value = toml::from_str(
            r#"
            zeta = "$1"
            alpha = ["$2", "$3+"]
            status = 301
            "#,
        )
        .unwrap();

        match Template::from(&value) {
            Template::Mapping(entries) => {
                let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, vec!["zeta", "alpha", "status"]);
                assert_eq!(entries[2].1, Template::expr("301"));
            }
            other => panic!("expected mapping, got {:?}", other),
        }
    }

    #[test]
    fn test_lint_variadic_outside_sequence() {
        let template = Template::mapping([
            ("controller", Template::expr("$1+")),
            ("args", Template::sequence([Template::expr("$2+")])),
            ("nested", Template::mapping([("x", Template::expr("a|$4+"))])),
        ]);

        let errors = template.lint();
        assert_eq!(
            errors,
            vec![
                TemplateError::VariadicOutsideSequence {
                    at: "controller".into(),
                    placeholder: "$1+".into(),
                },
                TemplateError::VariadicOutsideSequence {
                    at: "nested.x".into(),
                    placeholder: "$4+".into(),
                },
            ]
        );
        assert!(Template::default_route().lint().is_empty());
    }
}
