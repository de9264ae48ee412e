//! Errors raised while *constructing* version chains, operations and
//! endpoint registries — as opposed to [`apiver_core::Error`], which is
//! raised while a request is in flight.

use thiserror::Error;

/// Something about a declared chain, operation or endpoint set doesn't hold
/// together. All of these are caught at startup, before any request is
/// served.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum BuildError {
    /// Two or more [`crate::VersionChange`]s were declared between the same
    /// ordered pair of versions.
    #[error("duplicate version change from {from} to {to}")]
    DuplicateChange {
        /// The source version's raw string.
        from: String,
        /// The target version's raw string.
        to: String,
    },

    /// The declared changes form a cycle instead of a linear or branching
    /// chain toward head.
    #[error("version change graph contains a cycle at {at}")]
    Cycle {
        /// The raw version string where the cycle was detected.
        at: String,
    },

    /// Two changes both claim the same predecessor version, which would
    /// make "the next version" ambiguous.
    #[error("version {from} branches to both {to_a} and {to_b}")]
    Branch {
        /// The shared source version.
        from: String,
        /// The first conflicting target.
        to_a: String,
        /// The second conflicting target.
        to_b: String,
    },

    /// A chain was built with no changes at all, or a route was requested
    /// for a version the chain doesn't know about.
    #[error("unknown version {0}")]
    UnknownVersion(String),

    /// [`crate::ChainBuilder::build`] was asked to produce a chain that
    /// doesn't reach every version in the supplied bundle.
    #[error("version {0} is not reachable from head")]
    Unreachable(String),

    /// A type descriptor's recursive analysis exceeded its configured
    /// `max_depth` without terminating, almost always a sign of a missing
    /// cycle-breaking shape declaration.
    #[error("type descriptor analysis exceeded max depth {max_depth} at {path}")]
    DepthExceeded {
        /// The configured limit.
        max_depth: usize,
        /// The field path where the limit was hit.
        path: String,
    },
}
