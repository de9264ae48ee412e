//! The app-owned, `Arc`-shared state the pipeline reads on every request
//! (spec §5: `EndpointRegistry`, `MigrationChain` and `VersionBundle` are
//! all "constructed before serving; immutable afterward").

use std::sync::Arc;

use apiver_build::{EndpointRegistry, MigrationChain};
use apiver_core::VersionBundle;

use crate::config::VersionDetectionConfig;

/// Everything the middleware needs, built once at startup and shared
/// read-only across request-handling tasks.
///
/// Deliberately a plain struct behind one `Arc`, not a process-wide global —
/// nothing here prevents an application from running two independent
/// `ApiVersioning` instances (e.g. in tests) side by side.
#[derive(Clone)]
pub struct ApiVersioning {
    inner: Arc<Inner>,
}

struct Inner {
    bundle: VersionBundle,
    chain: MigrationChain,
    endpoints: EndpointRegistry,
    detection: VersionDetectionConfig,
}

impl ApiVersioning {
    /// Bundle the validated chain, version set, endpoint registry, and
    /// detection config into shared state.
    #[must_use]
    pub fn new(bundle: VersionBundle, chain: MigrationChain, endpoints: EndpointRegistry, detection: VersionDetectionConfig) -> Self {
        Self {
            inner: Arc::new(Inner { bundle, chain, endpoints, detection }),
        }
    }

    /// The declared version set.
    #[must_use]
    pub fn bundle(&self) -> &VersionBundle {
        &self.inner.bundle
    }

    /// The validated migration chain.
    #[must_use]
    pub fn chain(&self) -> &MigrationChain {
        &self.inner.chain
    }

    /// The registered endpoint definitions.
    #[must_use]
    pub fn endpoints(&self) -> &EndpointRegistry {
        &self.inner.endpoints
    }

    /// The version detection configuration.
    #[must_use]
    pub fn detection(&self) -> &VersionDetectionConfig {
        &self.inner.detection
    }
}
