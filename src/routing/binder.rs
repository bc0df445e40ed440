//! Template binding.
//!
//! # Responsibilities
//! - Resolve every expression leaf of a template against path segments
//! - Splice `$N+` placeholders into their surrounding sequence
//! - Report misplaced variadic placeholders without aborting
//!
//! # Design Decisions
//! - The output sequence is built fresh; the template is never mutated.
//!   `read` walks the template, `write` is the next output slot.
//! - Placeholder indices always address the original segment list; only the
//!   output position shifts after a splice
//! - An empty string is "no value" and falls through to the next alternative
//! - A variadic expression that yields nothing removes its slot

use crate::routing::template::{child_path, Alternative, Expression, Template, TemplateError};
use crate::routing::value::Value;

/// Result of binding a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub value: Value,
    pub warnings: Vec<TemplateError>,
}

/// Where an expression sits in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Root,
    Sequence,
    Mapping,
}

enum Resolved {
    Scalar(String),
    Splice(Vec<Value>),
    Absent,
}

/// Bind a template against the segments of a matched path.
pub fn bind(template: &Template, segments: &[String]) -> Bound {
    let mut binder = Binder {
        segments,
        warnings: Vec::new(),
    };
    let value = binder.node(template, "", Slot::Root);

    Bound {
        value,
        warnings: binder.warnings,
    }
}

struct Binder<'a> {
    segments: &'a [String],
    warnings: Vec<TemplateError>,
}

impl<'a> Binder<'a> {
    fn node(&mut self, template: &Template, at: &str, slot: Slot) -> Value {
        match template {
            Template::Expression(expr) => match self.expression(expr, at, slot) {
                Resolved::Scalar(s) => Value::String(s),
                // Only reachable from a sequence, which handles splices itself.
                Resolved::Splice(values) => Value::Sequence(values),
                Resolved::Absent => Value::Null,
            },
            Template::Sequence(items) => self.sequence(items, at),
            Template::Mapping(entries) => Value::Mapping(
                entries
                    .iter()
                    .map(|(key, item)| {
                        let value = self.node(item, &child_path(at, key), Slot::Mapping);
                        (key.clone(), value)
                    })
                    .collect(),
            ),
        }
    }

    fn sequence(&mut self, items: &[Template], at: &str) -> Value {
        let mut out = Vec::with_capacity(items.len());

        for (read, item) in items.iter().enumerate() {
            let write = out.len();
            let item_at = format!("{}[{}]", at, read);

            let expr = match item {
                Template::Expression(expr) => expr,
                nested => {
                    out.push(self.node(nested, &item_at, Slot::Sequence));
                    continue;
                }
            };

            match self.expression(expr, &item_at, Slot::Sequence) {
                Resolved::Scalar(s) => out.push(Value::String(s)),
                Resolved::Splice(values) => {
                    tracing::trace!(read, write, spliced = values.len(), "Spliced segments");
                    out.extend(values);
                }
                Resolved::Absent if expr.is_variadic() => {
                    tracing::trace!(read, write, "Dropped empty splice");
                }
                Resolved::Absent => out.push(Value::Null),
            }
        }

        Value::Sequence(out)
    }

    fn expression(&mut self, expr: &Expression, at: &str, slot: Slot) -> Resolved {
        for alt in expr.alternatives() {
            match alt {
                Alternative::Literal(text) => {
                    if !text.is_empty() {
                        return Resolved::Scalar(text.clone());
                    }
                }
                Alternative::Placeholder { variadic: false, .. } => {
                    let segment = alt.offset().and_then(|i| self.segments.get(i));
                    if let Some(segment) = segment.filter(|s| !s.is_empty()) {
                        return Resolved::Scalar(segment.clone());
                    }
                }
                Alternative::Placeholder { variadic: true, .. } if slot != Slot::Sequence => {
                    let error = TemplateError::VariadicOutsideSequence {
                        at: at.to_string(),
                        placeholder: alt.to_string(),
                    };
                    tracing::warn!(at = %at, placeholder = %alt, "{}", error);
                    crate::observability::metrics::record_bind_warning();
                    self.warnings.push(error);
                }
                Alternative::Placeholder { variadic: true, .. } => {
                    let tail = alt
                        .offset()
                        .and_then(|i| self.segments.get(i..))
                        .unwrap_or(&[]);
                    if !tail.is_empty() {
                        return Resolved::Splice(tail.iter().cloned().map(Value::String).collect());
                    }
                }
            }
        }

        Resolved::Absent
    }
}
