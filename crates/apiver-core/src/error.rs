//! The versioning error taxonomy (spec §7), shared across `apiver-build` and
//! `apiver-runtime` so both can produce and convert the same [`ErrorKind`]s.

use std::fmt;

/// A tagged error kind, stable across the request/response boundary.
///
/// Serializes as the `kind` field of the error body contract in §6:
/// `{ "error": <string>, "kind": <tag>, "version": <client-version-or-null> }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Build-time: malformed version string, duplicate versions, cycle in
    /// chain, oldest version carries changes.
    InvalidVersionSpec,
    /// Client-supplied version cannot be resolved.
    UnknownVersion,
    /// Body unparseable for an endpoint declaring a request type.
    MalformedBody,
    /// AST helper lookup failed to find its target field.
    FieldNotFound,
    /// AST helper found a field but its JSON type didn't match the request.
    TypeMismatch,
    /// Array index out of `[0, len)`.
    OutOfBounds,
    /// Indexed/length operation applied to a non-array node.
    NotAnArray,
    /// A custom user transformer returned an error.
    TransformerFailure,
    /// No migration route exists between two versions (should not occur
    /// after build-time validation).
    MigrationPlanFailure,
}

impl ErrorKind {
    /// The tag string used in the JSON error body and in logs.
    #[must_use]
    pub const fn as_tag(self) -> &'static str {
        match self {
            Self::InvalidVersionSpec => "InvalidVersionSpec",
            Self::UnknownVersion => "UnknownVersion",
            Self::MalformedBody => "MalformedBody",
            Self::FieldNotFound => "FieldNotFound",
            Self::TypeMismatch => "TypeMismatch",
            Self::OutOfBounds => "OutOfBounds",
            Self::NotAnArray => "NotAnArray",
            Self::TransformerFailure => "TransformerFailure",
            Self::MigrationPlanFailure => "MigrationPlanFailure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// A versioning error: a [`ErrorKind`] plus a human-readable message.
///
/// This is the type that crosses the request-time pipeline boundary; at
/// that boundary it is converted to the JSON error body in §6 and never
/// propagated further as a Rust error (see `apiver_runtime::error`).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    /// Construct an error of the given kind with a message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The error's kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = Error::new(ErrorKind::UnknownVersion, "no such version: 1999-01-01");
        assert_eq!(err.to_string(), "UnknownVersion: no such version: 1999-01-01");
    }

    #[test]
    fn tag_matches_variant_name() {
        assert_eq!(ErrorKind::MalformedBody.as_tag(), "MalformedBody");
        assert_eq!(ErrorKind::NotAnArray.as_tag(), "NotAnArray");
    }
}
