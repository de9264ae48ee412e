#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference
//!
//! - [`ApiVersioning`] — the `Arc`-shared, per-app state built once at startup.
//! - [`version_middleware`] — the Axum middleware driving the pipeline.
//! - [`VersionDetectionConfig`] / [`VersionLocation`] / [`VersionFormat`] — where and how
//!   the client's requested version is read.
//! - [`RuntimeError`] — converts [`apiver_core::Error`] to the JSON error body contract.
//! - [`pipeline`] — the JSON transformation engine, for callers driving migration outside
//!   of Axum (e.g. a background job replaying stored payloads).

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod detect;
mod error;
mod middleware;
pub mod pipeline;
mod state;

pub use config::{VersionDetectionConfig, VersionFormat, VersionLocation};
pub use detect::detect_client_version;
pub use error::{status_for, RuntimeError};
pub use middleware::version_middleware;
pub use state::ApiVersioning;
