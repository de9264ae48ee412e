//! Per-route endpoint metadata (spec §4.6).

use std::collections::BTreeMap;
use std::collections::HashMap;

use http::Method;

use crate::type_descriptor::TypeRef;

/// What a single registered route declares about its request and response
/// bodies.
#[derive(Debug, Clone, Default)]
pub struct EndpointDefinition {
    /// The declared request body type, if any. A route without one is a
    /// pass-through for request migration.
    pub request_type: Option<TypeRef>,
    /// The declared response body type, if any. A route without one is a
    /// pass-through for response migration.
    pub response_type: Option<TypeRef>,
    /// Nested-array element types that cannot be discovered by reflection
    /// alone, keyed by dotted JSON path (spec §4.6). Nested-object types
    /// are always discovered automatically from `response_type`'s
    /// descriptor and do not need to be listed here.
    pub nested_array_element_types: BTreeMap<String, TypeRef>,
}

impl EndpointDefinition {
    /// A pass-through definition with no declared types.
    #[must_use]
    pub fn pass_through() -> Self {
        Self::default()
    }

    /// Declare the request body type.
    #[must_use]
    pub fn with_request_type(mut self, type_ref: TypeRef) -> Self {
        self.request_type = Some(type_ref);
        self
    }

    /// Declare the response body type.
    #[must_use]
    pub fn with_response_type(mut self, type_ref: TypeRef) -> Self {
        self.response_type = Some(type_ref);
        self
    }

    /// Declare an explicit nested-array element type at `path`.
    #[must_use]
    pub fn with_nested_array(mut self, path: impl Into<String>, type_ref: TypeRef) -> Self {
        self.nested_array_element_types.insert(path.into(), type_ref);
        self
    }
}

/// A `(method, path)` → [`EndpointDefinition`] registry.
///
/// Built up during route registration on a single thread at startup; after
/// that, it is read-only and shared (typically behind an `Arc`) across
/// request-handling tasks without locking.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    definitions: HashMap<(Method, String), EndpointDefinition>,
}

impl EndpointRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `definition` for `(method, path_pattern)`. Registering the
    /// same pair twice replaces the earlier definition — callers are
    /// expected to register each route exactly once during startup.
    pub fn register(&mut self, method: Method, path_pattern: impl Into<String>, definition: EndpointDefinition) {
        let path_pattern = path_pattern.into();
        if self.definitions.contains_key(&(method.clone(), path_pattern.clone())) {
            tracing::warn!(%method, path = %path_pattern, "endpoint re-registered, replacing earlier definition");
        }
        self.definitions.insert((method, path_pattern), definition);
    }

    /// Look up the definition for an exact `(method, path)` pair. Absence
    /// means pass-through mode, not an error (spec §4.7, step 2).
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&EndpointDefinition> {
        self.definitions.get(&(method.clone(), path.to_string()))
    }

    /// The number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
