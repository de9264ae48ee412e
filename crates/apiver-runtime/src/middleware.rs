//! The Axum middleware driving the per-request pipeline (spec §4.7):
//! `Detect → Resolve → Parse → MigrateReq → Handle → MigrateResp → Restore → Write`.

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::Value;

use apiver_core::{CapturedFields, Error, ErrorKind, RequestInfo, ResponseInfo};

use crate::detect::detect_client_version;
use crate::error::RuntimeError;
use crate::pipeline::{backward_route, forward_route, migrate_request_forward, migrate_response_backward, DEFAULT_MAX_DEPTH};
use crate::state::ApiVersioning;

fn parse_cookies(headers: &http::HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for header in headers.get_all(http::header::COOKIE) {
        let Ok(value) = header.to_str() else { continue };
        for pair in value.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                cookies.insert(name.to_string(), value.to_string());
            }
        }
    }
    cookies
}

fn parse_query(uri: &http::Uri) -> HashMap<String, String> {
    let mut query = HashMap::new();
    if let Some(raw) = uri.query() {
        for pair in raw.split('&') {
            if let Some((name, value)) = pair.split_once('=') {
                query.insert(name.to_string(), value.to_string());
            }
        }
    }
    query
}

async fn buffer_body(body: Body) -> Result<Bytes, Error> {
    body.collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| Error::new(ErrorKind::MalformedBody, format!("failed to read request body: {e}")))
}

fn parse_json_body(bytes: &Bytes, schema_declared: bool) -> Result<Value, Error> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Ok(value),
        Err(e) if schema_declared => Err(Error::new(ErrorKind::MalformedBody, format!("invalid JSON body: {e}"))),
        Err(_) => Ok(Value::Null),
    }
}

/// The version-aware middleware. Register per route with
/// `.route_layer(axum::middleware::from_fn_with_state(api_versioning, version_middleware))`,
/// not a router-level `.layer(...)` — [`MatchedPath`] is only populated
/// after route matching has already picked a handler, so a router-level
/// layer would never see it.
///
/// Endpoints with no [`apiver_build::EndpointDefinition`] registered for
/// `(method, matched_path_pattern)` — e.g. `/users/{id}`, not the literal
/// request path — pass straight through to `next` untouched (spec §4.7,
/// step 2), as does any request the router couldn't match to a route at
/// all.
pub async fn version_middleware(State(state): State<ApiVersioning>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let Some(path) = req.extensions().get::<MatchedPath>().map(|p| p.as_str().to_string()) else {
        return next.run(req).await;
    };

    let Some(endpoint) = state.endpoints().lookup(&method, &path).cloned() else {
        return next.run(req).await;
    };

    let (parts, body) = req.into_parts();
    let body_bytes = match buffer_body(body).await {
        Ok(bytes) => bytes,
        Err(e) => return RuntimeError::from(e).into_response(),
    };
    let parsed_body = match parse_json_body(&body_bytes, endpoint.request_type.is_some()) {
        Ok(value) => value,
        Err(e) => return RuntimeError::from(e).into_response(),
    };

    let mut request_info = RequestInfo {
        headers: parts.headers.clone(),
        cookies: parse_cookies(&parts.headers),
        query: parse_query(&parts.uri),
        body: parsed_body,
        schema_matched: endpoint.request_type.is_some(),
        matched_schema_type: endpoint.request_type.as_ref().map(|t| t.name),
    };

    let client_version = match detect_client_version(&request_info, state.detection(), state.bundle()) {
        Ok(v) => v,
        Err(e) => return RuntimeError::new(e, None).into_response(),
    };

    let mut captured = CapturedFields::new();
    let forward = forward_route(state.chain(), &client_version);
    if let Err(e) = migrate_request_forward(&mut request_info, &forward, endpoint.request_type.as_ref(), DEFAULT_MAX_DEPTH, &mut captured) {
        return RuntimeError::new(e, Some(client_version.as_str().to_string())).into_response();
    }

    let migrated_body = match serde_json::to_vec(&request_info.body) {
        Ok(bytes) => bytes,
        Err(e) => {
            return RuntimeError::new(Error::new(ErrorKind::MalformedBody, e.to_string()), Some(client_version.as_str().to_string()))
                .into_response();
        }
    };
    let mut downstream_request = Request::from_parts(parts, Body::from(migrated_body));
    *downstream_request.headers_mut() = request_info.headers.clone();
    downstream_request.headers_mut().remove(http::header::CONTENT_LENGTH);

    let response = next.run(downstream_request).await;
    let (resp_parts, resp_body) = response.into_parts();
    let resp_bytes = match buffer_body(resp_body).await {
        Ok(bytes) => bytes,
        Err(e) => return RuntimeError::new(e, Some(client_version.as_str().to_string())).into_response(),
    };
    let resp_value: Value = if resp_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&resp_bytes).unwrap_or(Value::Null)
    };

    let mut response_info = ResponseInfo {
        headers: resp_parts.headers.clone(),
        status: resp_parts.status,
        body: resp_value,
        schema_matched: endpoint.response_type.is_some(),
        matched_schema_type: endpoint.response_type.as_ref().map(|t| t.name),
    };

    let backward = backward_route(state.chain(), &client_version);
    migrate_response_backward(&mut response_info, &backward, endpoint.response_type.as_ref(), &endpoint, DEFAULT_MAX_DEPTH, &mut captured);

    let final_body = serde_json::to_vec(&response_info.body).unwrap_or_default();
    let mut final_response = Response::from_parts(resp_parts, Body::from(final_body));
    *final_response.headers_mut() = response_info.headers;
    final_response.headers_mut().remove(http::header::CONTENT_LENGTH);
    *final_response.status_mut() = response_info.status;
    final_response
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiver_build::{ChainBuilder, Described, EndpointDefinition, EndpointRegistry, FieldShape, FieldSpec, Operation, TypeRef, VersionChange};
    use apiver_core::{Version, VersionBundle};
    use axum::routing::{get, post};
    use axum::Json;
    use axum::Router;
    use tower::ServiceExt;

    struct User;
    impl Described for User {
        const TYPE_NAME: &'static str = "User";
        fn fields() -> &'static [FieldSpec] {
            &[FieldSpec { json_name: "full_name", shape: FieldShape::Scalar }]
        }
    }

    fn user_type() -> TypeRef {
        TypeRef { name: User::TYPE_NAME, descriptor: User::fields }
    }

    async fn echo_handler(Json(body): Json<Value>) -> Json<Value> {
        Json(body)
    }

    fn build_app() -> Router {
        let v1 = apiver_core::Version::date("2024-01-01").unwrap();
        let v2 = apiver_core::Version::date("2024-06-01").unwrap();
        let change = VersionChange::builder("rename name to full_name", v1.clone(), v2)
            .for_schema("User", Operation::Rename { old: "name", new: "full_name" })
            .build()
            .unwrap();
        let chain = ChainBuilder::new().add(change).build().unwrap();
        let bundle = VersionBundle::new(vec![v1]).unwrap();

        let mut endpoints = EndpointRegistry::new();
        let definition = EndpointDefinition::pass_through().with_request_type(user_type()).with_response_type(user_type());
        endpoints.register(http::Method::POST, "/users", definition.clone());
        endpoints.register(http::Method::POST, "/users/{id}", definition);

        let state = ApiVersioning::new(bundle, chain, endpoints, crate::config::VersionDetectionConfig::default());

        // `route_layer`, not `layer`: `MatchedPath` is only populated for
        // requests the router actually matched to a route, and only a
        // route-scoped layer runs late enough to see it.
        Router::new()
            .route("/users", post(echo_handler))
            .route("/users/{id}", post(echo_handler))
            .route("/health", get(|| async { "ok" }))
            .route_layer(axum::middleware::from_fn_with_state(state, version_middleware))
    }

    #[tokio::test]
    async fn migrates_request_and_response_for_registered_endpoint() {
        let app = build_app();
        let request = Request::builder()
            .method("POST")
            .uri("/users")
            .header("X-API-Version", "2024-01-01")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"John"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json, serde_json::json!({"name": "John"}));
    }

    #[tokio::test]
    async fn migrates_request_and_response_for_parameterized_route() {
        // Regression test: the endpoint is registered against the route
        // template `/users/{id}`, but the request hits a concrete path
        // (`/users/42`). Lookup must go through `MatchedPath`, not the
        // literal request path, or this would silently pass through.
        let app = build_app();
        let request = Request::builder()
            .method("POST")
            .uri("/users/42")
            .header("X-API-Version", "2024-01-01")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"John"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json, serde_json::json!({"name": "John"}));
    }

    #[tokio::test]
    async fn unregistered_route_passes_through_untouched() {
        let app = build_app();
        let request = Request::builder().method("GET").uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn unknown_version_is_rejected_before_reaching_handler() {
        let app = build_app();
        let request = Request::builder()
            .method("POST")
            .uri("/users")
            .header("X-API-Version", "1999-01-01")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"John"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["kind"], "UnknownVersion");
    }
}
