//! The operation set (spec §4.2) — six declarative schema-diff variants,
//! each carrying both forward (request, client → head) and backward
//! (response, head → client) semantics.
//!
//! [`Operation::Rename`], [`Operation::AddField`], [`Operation::RemoveField`]
//! and [`Operation::MapEnumValues`] are schema-scoped: the transformation
//! engine applies them to whichever JSON object node currently matches
//! their declared schema, which may be the request/response root or a
//! nested object reached through the type descriptor. They're driven
//! through [`Operation::apply_forward`] / [`Operation::apply_backward`].
//!
//! [`Operation::CustomRequest`] and [`Operation::CustomResponse`] are
//! global: they see the whole envelope (headers, cookies, body) rather
//! than a single schema node, and are driven through
//! [`Operation::apply_forward_global`] / [`Operation::apply_backward_global`].

use std::collections::BTreeMap;
use std::sync::Arc;

use apiver_core::{json, CapturedFields, Error, RequestInfo, ResponseInfo};
use serde_json::Value;

/// A custom request transformer. May mutate the body, headers, cookies or
/// query of a [`RequestInfo`]. Errors abort the request migration (spec §4.7).
pub type CustomRequestFn =
    Arc<dyn Fn(&mut RequestInfo, &mut CapturedFields) -> Result<(), Error> + Send + Sync>;

/// A custom response transformer. Errors are logged and the pipeline
/// continues to the next operation (spec §4.7 — "returning a half-migrated
/// body to an old client is worse than returning head form").
pub type CustomResponseFn =
    Arc<dyn Fn(&mut ResponseInfo, &mut CapturedFields) -> Result<(), Error> + Send + Sync>;

/// A single declarative schema-diff operation.
#[derive(Clone)]
pub enum Operation {
    /// Rename a field. Forward: `old` → `new`. Backward: `new` → `old`,
    /// plus (4xx responses only) rewriting `new`'s name to `old`'s name
    /// inside error-message strings.
    Rename {
        /// The field's name at the older version.
        old: &'static str,
        /// The field's name at the newer version.
        new: &'static str,
    },
    /// Add a field with a default. Forward: set `default` if absent (and
    /// capture the pre-existing value if the field was already present —
    /// see spec §4.2). Backward: strip the field from the response.
    AddField {
        /// The field name.
        name: &'static str,
        /// The value to fill in when the client didn't send this field.
        default: Value,
    },
    /// Remove a field. Forward: capture its value, then delete it.
    /// Backward: restore the captured value if one exists, otherwise leave
    /// whatever the handler produced.
    RemoveField {
        /// The field name.
        name: &'static str,
    },
    /// Map a field's string value through an enum rename. Forward applies
    /// `forward`; backward applies its inverse (nondeterministic when the
    /// map is not injective — any preimage is an acceptable choice).
    MapEnumValues {
        /// The field name.
        field: &'static str,
        /// Old value → new value.
        forward: BTreeMap<String, String>,
    },
    /// A custom transformer invoked only on the request path, outside any
    /// schema.
    CustomRequest {
        /// Human-readable label, used in logs.
        label: &'static str,
        /// The transformer.
        f: CustomRequestFn,
    },
    /// A custom transformer invoked only on the response path, outside any
    /// schema.
    CustomResponse {
        /// Human-readable label, used in logs.
        label: &'static str,
        /// The transformer.
        f: CustomResponseFn,
    },
}

/// An [`Operation`] as declared inside a [`crate::VersionChange`]'s
/// per-schema list, together with whether it applies to error bodies.
///
/// Spec §4.7, step 6: response ops apply to success bodies unconditionally,
/// but to 4xx/5xx bodies only when `migrate_http_errors` is set — except
/// [`Operation::Rename`], which always performs its error-string rewrite on
/// 4xx bodies regardless of this flag (the key-level rename itself is
/// harmless to attempt on an error body: it simply won't find its field).
#[derive(Debug, Clone)]
pub struct SchemaOp {
    /// The operation.
    pub op: Operation,
    /// Whether this operation should still run when the response is a
    /// 4xx/5xx error.
    pub migrate_http_errors: bool,
}

impl SchemaOp {
    /// Wrap `op` with `migrate_http_errors = false` (the default).
    #[must_use]
    pub const fn new(op: Operation) -> Self {
        Self { op, migrate_http_errors: false }
    }

    /// Wrap `op` so it also runs against 4xx/5xx response bodies.
    #[must_use]
    pub const fn migrating_errors(op: Operation) -> Self {
        Self { op, migrate_http_errors: true }
    }
}

impl From<Operation> for SchemaOp {
    fn from(op: Operation) -> Self {
        Self::new(op)
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rename { old, new } => f.debug_struct("Rename").field("old", old).field("new", new).finish(),
            Self::AddField { name, default } => {
                f.debug_struct("AddField").field("name", name).field("default", default).finish()
            }
            Self::RemoveField { name } => f.debug_struct("RemoveField").field("name", name).finish(),
            Self::MapEnumValues { field, forward } => {
                f.debug_struct("MapEnumValues").field("field", field).field("forward", forward).finish()
            }
            Self::CustomRequest { label, .. } => f.debug_struct("CustomRequest").field("label", label).finish(),
            Self::CustomResponse { label, .. } => f.debug_struct("CustomResponse").field("label", label).finish(),
        }
    }
}

fn to_pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect()
}

/// Recursively rewrite occurrences of `from` (and its `PascalCase` form) to
/// `to` inside every string value of an error body. Non-string fields are
/// preserved verbatim; quoting is incidental — a plain substring replace
/// handles both bare and quoted occurrences since the JSON string's own
/// quotes are structural, not part of the string's characters.
fn rewrite_error_strings(node: &mut Value, from: &str, to: &str) {
    let from_pascal = to_pascal_case(from);
    let to_pascal = to_pascal_case(to);
    match node {
        Value::String(s) => {
            let rewritten = s.replace(from, to).replace(&from_pascal, &to_pascal);
            *s = rewritten;
        }
        Value::Object(map) => {
            for v in map.values_mut() {
                rewrite_error_strings(v, from, to);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                rewrite_error_strings(v, from, to);
            }
        }
        Value::Number(_) | Value::Bool(_) | Value::Null => {}
    }
}

impl Operation {
    /// Apply this operation's forward (request) semantics to a single JSON
    /// node matching this operation's schema. A no-op for the two global
    /// custom variants — drive those through [`Operation::apply_forward_global`].
    pub fn apply_forward(&self, node: &mut Value, captured: &mut CapturedFields) {
        match self {
            Self::Rename { old, new } => {
                json::rename_field(node, old, new);
            }
            Self::AddField { name, default } => {
                if json::has_field(node, name) {
                    if let Some(existing) = json::get_field(node, name) {
                        captured.set((*name).to_string(), existing.clone());
                    }
                } else {
                    let _ = json::set_field(node, name, default.clone());
                }
            }
            Self::RemoveField { name } => {
                if let Some(value) = json::get_field(node, name) {
                    captured.set((*name).to_string(), value.clone());
                }
                json::delete_field(node, name);
            }
            Self::MapEnumValues { field, forward } => {
                if let Ok(current) = json::get_field_string(node, field) {
                    if let Some(mapped) = forward.get(current) {
                        let mapped = mapped.clone();
                        let _ = json::set_field(node, field, Value::String(mapped));
                    }
                }
            }
            Self::CustomRequest { .. } | Self::CustomResponse { .. } => {}
        }
    }

    /// Apply this operation's backward (response) semantics to a single
    /// JSON node matching this operation's schema. `is_client_error`
    /// selects whether [`Operation::Rename`] additionally rewrites
    /// error-message strings (spec §4.7: "4xx only, regardless of
    /// `MigrateHTTPErrors`"). A no-op for the two global custom variants.
    pub fn apply_backward(&self, node: &mut Value, is_client_error: bool, captured: &mut CapturedFields) {
        match self {
            Self::Rename { old, new } => {
                json::rename_field(node, new, old);
                if is_client_error {
                    rewrite_error_strings(node, new, old);
                }
            }
            Self::AddField { name, .. } => {
                json::delete_field(node, name);
            }
            Self::RemoveField { name } => {
                if let Some(value) = captured.get(name).cloned() {
                    let _ = json::set_field(node, name, value);
                }
            }
            Self::MapEnumValues { field, forward } => {
                if let Ok(current) = json::get_field_string(node, field) {
                    if let Some((old_value, _)) = forward.iter().find(|(_, v)| v.as_str() == current) {
                        let old_value = old_value.clone();
                        let _ = json::set_field(node, field, Value::String(old_value));
                    }
                }
            }
            Self::CustomRequest { .. } | Self::CustomResponse { .. } => {}
        }
    }

    /// Run this operation's global forward transformer, if it is one.
    ///
    /// # Errors
    ///
    /// Propagates [`Operation::CustomRequest`]'s transformer error; aborts
    /// request migration per spec §4.7.
    pub fn apply_forward_global(&self, req: &mut RequestInfo, captured: &mut CapturedFields) -> Result<(), Error> {
        if let Self::CustomRequest { f, .. } = self {
            f(req, captured)?;
        }
        Ok(())
    }

    /// Run this operation's global backward transformer, if it is one.
    ///
    /// # Errors
    ///
    /// Propagates [`Operation::CustomResponse`]'s transformer error; callers
    /// should log it and continue per spec §4.7 rather than abort.
    pub fn apply_backward_global(&self, resp: &mut ResponseInfo, captured: &mut CapturedFields) -> Result<(), Error> {
        if let Self::CustomResponse { f, .. } = self {
            f(resp, captured)?;
        }
        Ok(())
    }

    /// Whether this is one of the two global (schema-less) custom variants.
    #[must_use]
    pub const fn is_global(&self) -> bool {
        matches!(self, Self::CustomRequest { .. } | Self::CustomResponse { .. })
    }
}
