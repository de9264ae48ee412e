//! Version detection configuration (spec §6, "Version detection").

use apiver_core::VersionKind;

/// Where to read the client-supplied version from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionLocation {
    /// An HTTP request header.
    Header,
    /// A query string parameter.
    Query,
    /// A cookie.
    Cookie,
}

/// How to parse the client-supplied version string (spec §3: `Version` has
/// three concrete kinds plus the `head` sentinel; the client never supplies
/// `head` directly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFormat {
    /// `YYYY-MM-DD`.
    Date,
    /// `MAJOR.MINOR[.PATCH]`.
    Semver,
    /// Opaque, lexicographically ordered string.
    String,
}

impl VersionFormat {
    /// The [`VersionKind`] this format parses to.
    #[must_use]
    pub const fn version_kind(self) -> VersionKind {
        match self {
            Self::Date => VersionKind::Date,
            Self::Semver => VersionKind::Semver,
            Self::String => VersionKind::Opaque,
        }
    }
}

/// How the pipeline locates and parses the client's requested API version.
#[derive(Debug, Clone)]
pub struct VersionDetectionConfig {
    /// The header, query, or cookie name carrying the version (default
    /// `X-API-Version`).
    pub parameter_name: String,
    /// Where `parameter_name` is read from.
    pub location: VersionLocation,
    /// How the raw value is parsed.
    pub format: VersionFormat,
    /// Used when `parameter_name` is absent from the request.
    pub default_version: Option<String>,
}

impl Default for VersionDetectionConfig {
    fn default() -> Self {
        Self {
            parameter_name: "X-API-Version".to_string(),
            location: VersionLocation::Header,
            format: VersionFormat::Date,
            default_version: None,
        }
    }
}

impl VersionDetectionConfig {
    /// Start from the defaults: header `X-API-Version`, date format, no
    /// default version.
    #[must_use]
    pub fn builder() -> Self {
        Self::default()
    }

    /// Override the parameter name.
    #[must_use]
    pub fn parameter_name(mut self, name: impl Into<String>) -> Self {
        self.parameter_name = name.into();
        self
    }

    /// Override where the parameter is read from.
    #[must_use]
    pub const fn location(mut self, location: VersionLocation) -> Self {
        self.location = location;
        self
    }

    /// Override the parsing format.
    #[must_use]
    pub const fn format(mut self, format: VersionFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the version used when the client doesn't supply one.
    #[must_use]
    pub fn default_version(mut self, version: impl Into<String>) -> Self {
        self.default_version = Some(version.into());
        self
    }
}
