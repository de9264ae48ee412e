#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference
//!
//! - [`Version`] / [`VersionBundle`] — comparable version identifiers.
//! - [`json`] — order-preserving JSON AST helpers.
//! - [`RequestInfo`] / [`ResponseInfo`] / [`CapturedFields`] — request/response envelopes.
//! - [`Error`] / [`ErrorKind`] — the shared error taxonomy.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod envelope;
mod error;
pub mod json;
mod version;

pub use envelope::{CapturedFields, RequestInfo, ResponseInfo};
pub use error::{Error, ErrorKind};
pub use version::{BundleError, Version, VersionBundle, VersionKind, VersionParseError};
