//! Canonical request/response envelopes the engine operates on (spec §3).

use std::collections::HashMap;

use http::{HeaderMap, StatusCode};
use serde_json::Value;

/// Per-request scoped store of field values captured on the way in, for
/// restoration on the way out (spec §3, "Per-request scoped captured-fields
/// store").
///
/// Created lazily on first [`CapturedFields::set`]; owned by the request's
/// envelopes end to end. Never shared across requests and never locked —
/// `apiver-runtime` confines one instance to one request's async task.
#[derive(Debug, Clone, Default)]
pub struct CapturedFields {
    values: HashMap<String, Value>,
}

impl CapturedFields {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture `value` under `field`. A later capture of the same field
    /// overwrites the earlier one (only the most recent removal before
    /// head is meaningful for restoration).
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.values.insert(field.into(), value);
    }

    /// The captured value for `field`, if any was captured this request.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Whether any field capture happened this request.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Field names that were captured but never consumed by a restoring
    /// `RemoveField`. Used for the end-of-request diagnostic log.
    #[must_use]
    pub fn unconsumed<'a>(&'a self, consumed: &'a [String]) -> Vec<&'a str> {
        self.values
            .keys()
            .filter(|k| !consumed.iter().any(|c| c == *k))
            .map(String::as_str)
            .collect()
    }
}

/// The canonical incoming HTTP request the engine migrates forward.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    /// Request headers as received.
    pub headers: HeaderMap,
    /// Cookies parsed from the `Cookie` header, name → value.
    pub cookies: HashMap<String, String>,
    /// Query string parameters, name → value (last occurrence wins).
    pub query: HashMap<String, String>,
    /// The decoded JSON body. `Value::Null` for an empty body.
    pub body: Value,
    /// Whether the endpoint declared a request type and it was matched.
    pub schema_matched: bool,
    /// The matched request schema's type name, if any.
    pub matched_schema_type: Option<&'static str>,
}

impl RequestInfo {
    /// An empty request envelope with no body, used in tests and for
    /// pass-through endpoints.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            headers: HeaderMap::new(),
            cookies: HashMap::new(),
            query: HashMap::new(),
            body: Value::Null,
            schema_matched: false,
            matched_schema_type: None,
        }
    }
}

/// The canonical outgoing HTTP response the engine migrates backward.
#[derive(Debug, Clone)]
pub struct ResponseInfo {
    /// Response headers.
    pub headers: HeaderMap,
    /// The HTTP status code.
    pub status: StatusCode,
    /// The decoded JSON body. `Value::Null` for an empty body.
    pub body: Value,
    /// Whether the endpoint declared a response type and it was matched.
    pub schema_matched: bool,
    /// The matched response schema's type name, if any.
    pub matched_schema_type: Option<&'static str>,
}

impl ResponseInfo {
    /// A `200 OK` response envelope with the given body.
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self {
            headers: HeaderMap::new(),
            status: StatusCode::OK,
            body,
            schema_matched: false,
            matched_schema_type: None,
        }
    }

    /// Whether this response's status is a client or server error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status.is_client_error() || self.status.is_server_error()
    }
}
