//! HTTP error wrapper — converts [`apiver_core::Error`] to a JSON response
//! following the error body contract (spec §6).

use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use apiver_core::{Error, ErrorKind};

/// The HTTP status a [`ErrorKind`] maps to (spec §7).
///
/// [`ErrorKind::InvalidVersionSpec`] is a build-time-only kind and never
/// reaches this mapping at request time; it falls back to `500` here rather
/// than panicking, since a wrapped build error could in principle still be
/// converted through this path.
#[must_use]
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::UnknownVersion | ErrorKind::MalformedBody => StatusCode::BAD_REQUEST,
        ErrorKind::FieldNotFound
        | ErrorKind::TypeMismatch
        | ErrorKind::OutOfBounds
        | ErrorKind::NotAnArray
        | ErrorKind::TransformerFailure
        | ErrorKind::MigrationPlanFailure
        | ErrorKind::InvalidVersionSpec => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// An [`apiver_core::Error`] plus the client-supplied version string it
/// occurred against, converted to the JSON error body contract on response:
///
/// ```json
/// { "error": "<message>", "kind": "<tag>", "version": "<client-version-or-null>" }
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeError {
    inner: Error,
    client_version: Option<String>,
}

impl RuntimeError {
    /// Wrap `inner`, attaching the client's requested version string (if one
    /// was parsed before the error occurred) for the response body.
    #[must_use]
    pub fn new(inner: Error, client_version: Option<String>) -> Self {
        Self { inner, client_version }
    }

    /// The wrapped error's kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.inner.kind()
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner)
    }
}

impl From<Error> for RuntimeError {
    fn from(inner: Error) -> Self {
        Self::new(inner, None)
    }
}

impl IntoResponse for RuntimeError {
    fn into_response(self) -> axum::response::Response {
        let status = status_for(self.inner.kind());
        let body = serde_json::json!({
            "error": self.inner.message(),
            "kind": self.inner.kind().as_tag(),
            "version": self.client_version,
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::UnknownVersion, StatusCode::BAD_REQUEST)]
    #[case(ErrorKind::MalformedBody, StatusCode::BAD_REQUEST)]
    #[case(ErrorKind::FieldNotFound, StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(ErrorKind::TypeMismatch, StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(ErrorKind::OutOfBounds, StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(ErrorKind::NotAnArray, StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(ErrorKind::TransformerFailure, StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(ErrorKind::MigrationPlanFailure, StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(ErrorKind::InvalidVersionSpec, StatusCode::INTERNAL_SERVER_ERROR)]
    fn status_for_maps_every_kind(#[case] kind: ErrorKind, #[case] expected: StatusCode) {
        assert_eq!(status_for(kind), expected);
    }

    async fn error_body(err: RuntimeError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn unknown_version_is_bad_request() {
        let err = RuntimeError::new(
            Error::new(ErrorKind::UnknownVersion, "no such version: 1999-01-01"),
            Some("1999-01-01".to_string()),
        );
        let (status, json) = error_body(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "UnknownVersion");
        assert_eq!(json["version"], "1999-01-01");
        assert_eq!(json["error"], "no such version: 1999-01-01");
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let err = RuntimeError::new(Error::new(ErrorKind::MalformedBody, "unexpected EOF"), None);
        let (status, json) = error_body(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["version"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn field_lookup_failures_are_internal_errors() {
        for kind in [
            ErrorKind::FieldNotFound,
            ErrorKind::TypeMismatch,
            ErrorKind::OutOfBounds,
            ErrorKind::NotAnArray,
            ErrorKind::TransformerFailure,
            ErrorKind::MigrationPlanFailure,
        ] {
            let err = RuntimeError::new(Error::new(kind, "boom"), None);
            let (status, _) = error_body(err).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{kind} should map to 500");
        }
    }

    #[test]
    fn display_delegates_to_inner() {
        let err = RuntimeError::new(Error::new(ErrorKind::UnknownVersion, "bad version"), None);
        assert_eq!(err.to_string(), "UnknownVersion: bad version");
    }

    #[test]
    fn error_source_is_inner_error() {
        use std::error::Error as _;
        let err = RuntimeError::new(Error::new(ErrorKind::MalformedBody, "boom"), None);
        let source = err.source().expect("should have a source");
        assert!(source.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn response_content_type_is_json() {
        let err = RuntimeError::new(Error::new(ErrorKind::UnknownVersion, "x"), None);
        let response = err.into_response();
        let content_type = response.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.contains("application/json"));
    }
}
