#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference
//!
//! - [`Operation`] — the six declarative schema-diff variants.
//! - [`VersionChange`] / [`VersionChangeBuilder`] — one version edge.
//! - [`MigrationChain`] / [`ChainBuilder`] — the validated chain and route
//!   planning.
//! - [`Described`] / [`TypeDescriptor`] — reflective-style type analysis.
//! - [`EndpointDefinition`] / [`EndpointRegistry`] — per-route metadata.
//! - [`BuildError`] — everything that can go wrong while constructing the
//!   above, all caught before a server starts serving.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod chain;
mod endpoint;
mod error;
mod operation;
mod type_descriptor;
mod version_change;

pub use chain::{ChainBuilder, MigrationChain};
pub use endpoint::{EndpointDefinition, EndpointRegistry};
pub use error::BuildError;
pub use operation::{CustomRequestFn, CustomResponseFn, Operation, SchemaOp};
pub use type_descriptor::{DescriptorFn, Described, FieldShape, FieldSpec, TypeDescriptor, TypeRef};
pub use version_change::{VersionChange, VersionChangeBuilder};
