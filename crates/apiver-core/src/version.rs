//! Comparable API version identifiers and the bundle of versions an API serves.

use std::cmp::Ordering;
use std::fmt;

/// The kind of version string a [`Version`] was parsed from.
///
/// Three concrete kinds (calendar date, semantic, opaque string) plus the
/// distinguished [`Version::head`] sentinel, which always compares greater
/// than any concrete version regardless of kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionKind {
    /// ISO `YYYY-MM-DD`.
    Date,
    /// `MAJOR.MINOR[.PATCH]`, optional `v` prefix.
    Semver,
    /// Lexicographically ordered opaque string.
    Opaque,
    /// The distinguished head sentinel.
    Head,
}

/// Parsed components of a concrete (non-head, non-opaque) version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Components {
    Date { year: u32, month: u32, day: u32 },
    Semver { major: u64, minor: u64, patch: u64 },
    None,
}

/// A comparable API version identifier.
///
/// Equal [`Version::as_str`] output implies equal identity (`==`). Versions
/// constructed with the same kind compare by their parsed components;
/// [`Version::head`] always compares strictly greater than any non-head
/// version. Comparing two concrete versions of different kinds falls back
/// to lexicographic comparison of the raw string — callers are expected to
/// build a [`VersionBundle`] from versions of a single consistent kind.
#[derive(Debug, Clone)]
pub struct Version {
    kind: VersionKind,
    raw: String,
    components: Components,
}

impl Version {
    /// The distinguished head version. Handlers are written against this version.
    #[must_use]
    pub fn head() -> Self {
        Self {
            kind: VersionKind::Head,
            raw: "head".to_string(),
            components: Components::None,
        }
    }

    /// Parse a calendar-date version (`YYYY-MM-DD`).
    ///
    /// # Errors
    ///
    /// Returns [`VersionParseError`] if `raw` is not a well-formed ISO date.
    pub fn date(raw: impl Into<String>) -> Result<Self, VersionParseError> {
        let raw = raw.into();
        let parts: Vec<&str> = raw.split('-').collect();
        let [y, m, d] = parts.as_slice() else {
            return Err(VersionParseError::InvalidDate(raw));
        };
        let (year, month, day) = (
            y.parse::<u32>().map_err(|_| VersionParseError::InvalidDate(raw.clone()))?,
            m.parse::<u32>().map_err(|_| VersionParseError::InvalidDate(raw.clone()))?,
            d.parse::<u32>().map_err(|_| VersionParseError::InvalidDate(raw.clone()))?,
        );
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(VersionParseError::InvalidDate(raw));
        }
        Ok(Self {
            kind: VersionKind::Date,
            raw,
            components: Components::Date { year, month, day },
        })
    }

    /// Parse a semantic version (`MAJOR.MINOR[.PATCH]`, optional leading `v`).
    ///
    /// # Errors
    ///
    /// Returns [`VersionParseError`] if `raw` is not a well-formed semver.
    pub fn semver(raw: impl Into<String>) -> Result<Self, VersionParseError> {
        let raw = raw.into();
        let trimmed = raw.strip_prefix('v').unwrap_or(&raw);
        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(VersionParseError::InvalidSemver(raw));
        }
        let mut nums = [0u64; 3];
        for (i, part) in parts.iter().enumerate() {
            nums[i] = part
                .parse::<u64>()
                .map_err(|_| VersionParseError::InvalidSemver(raw.clone()))?;
        }
        Ok(Self {
            kind: VersionKind::Semver,
            raw,
            components: Components::Semver {
                major: nums[0],
                minor: nums[1],
                patch: nums[2],
            },
        })
    }

    /// An opaque, lexicographically ordered version string.
    #[must_use]
    pub fn opaque(raw: impl Into<String>) -> Self {
        Self {
            kind: VersionKind::Opaque,
            raw: raw.into(),
            components: Components::None,
        }
    }

    /// This version's kind.
    #[must_use]
    pub const fn kind(&self) -> VersionKind {
        self.kind
    }

    /// The raw string this version was constructed from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this is the distinguished head version.
    #[must_use]
    pub const fn is_head(&self) -> bool {
        matches!(self.kind, VersionKind::Head)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}
impl Eq for Version {}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_head(), other.is_head()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }
        match (&self.components, &other.components) {
            (
                Components::Date { year: y1, month: m1, day: d1 },
                Components::Date { year: y2, month: m2, day: d2 },
            ) => (y1, m1, d1).cmp(&(y2, m2, d2)),
            (
                Components::Semver { major: a1, minor: b1, patch: c1 },
                Components::Semver { major: a2, minor: b2, patch: c2 },
            ) => (a1, b1, c1).cmp(&(a2, b2, c2)),
            _ => self.raw.cmp(&other.raw),
        }
    }
}

/// Failure parsing a client- or schema-supplied version string.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum VersionParseError {
    /// Not a well-formed `YYYY-MM-DD` date.
    #[error("invalid calendar-date version: {0:?}")]
    InvalidDate(String),
    /// Not a well-formed `MAJOR.MINOR[.PATCH]` semantic version.
    #[error("invalid semantic version: {0:?}")]
    InvalidSemver(String),
}

/// A finite ordered sequence of distinct non-head versions plus exactly one head.
///
/// Invariants: no duplicates by [`Version::as_str`]; the oldest non-head
/// version is the baseline (callers should not attach migrations whose
/// `from` equals it, though `VersionBundle` itself does not own
/// migrations and cannot enforce this — see `apiver_build::MigrationChain`).
#[derive(Debug, Clone)]
pub struct VersionBundle {
    /// Non-head versions, oldest first.
    versions: Vec<Version>,
}

impl VersionBundle {
    /// Build a bundle from non-head versions. Head is implicit and always present.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Duplicate`] if two versions share the same
    /// [`Version::as_str`] output, or [`BundleError::Empty`] if `versions`
    /// is empty (a bundle needs at least a baseline version).
    pub fn new(mut versions: Vec<Version>) -> Result<Self, BundleError> {
        if versions.is_empty() {
            return Err(BundleError::Empty);
        }
        versions.sort();
        for pair in versions.windows(2) {
            if pair[0] == pair[1] {
                return Err(BundleError::Duplicate(pair[0].as_str().to_string()));
            }
        }
        Ok(Self { versions })
    }

    /// The non-head versions, oldest first.
    #[must_use]
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// The oldest, baseline version. It carries no migrations.
    #[must_use]
    pub fn oldest(&self) -> &Version {
        &self.versions[0]
    }

    /// The distinguished head version.
    #[must_use]
    pub fn head(&self) -> Version {
        Version::head()
    }

    /// Look up a version by its exact raw string, among the declared
    /// non-head versions or `"head"`.
    #[must_use]
    pub fn find(&self, raw: &str) -> Option<Version> {
        if raw == "head" {
            return Some(Version::head());
        }
        self.versions.iter().find(|v| v.as_str() == raw).cloned()
    }

    /// Resolve an arbitrary client-supplied version string to the closest
    /// version in the bundle that is less than or equal to it.
    ///
    /// Returns `None` if `raw` parses to something older than every
    /// declared version (there is no lesser-or-equal member).
    #[must_use]
    pub fn resolve(&self, candidate: &Version) -> Option<Version> {
        if candidate.is_head() {
            return Some(Version::head());
        }
        self.versions
            .iter()
            .rev()
            .find(|v| *v <= candidate)
            .cloned()
    }
}

/// Failure constructing a [`VersionBundle`].
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum BundleError {
    /// No versions were supplied.
    #[error("version bundle must contain at least one version")]
    Empty,
    /// Two versions shared the same raw string.
    #[error("duplicate version in bundle: {0:?}")]
    Duplicate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_is_always_greatest() {
        let v = Version::date("2023-01-01").unwrap();
        assert!(Version::head() > v);
    }

    #[test]
    fn date_ordering() {
        let a = Version::date("2023-01-01").unwrap();
        let b = Version::date("2023-06-15").unwrap();
        assert!(a < b);
    }

    #[test]
    fn semver_ordering_numeric_not_lexicographic() {
        let a = Version::semver("1.9.0").unwrap();
        let b = Version::semver("1.10.0").unwrap();
        assert!(a < b, "1.9.0 should sort before 1.10.0 numerically");
    }

    #[test]
    fn semver_v_prefix_accepted() {
        let a = Version::semver("v1.2.3").unwrap();
        assert_eq!(a.as_str(), "v1.2.3");
        assert_eq!(a.kind(), VersionKind::Semver);
    }

    #[test]
    fn invalid_date_rejected() {
        assert!(Version::date("2023-13-01").is_err());
        assert!(Version::date("not-a-date").is_err());
    }

    #[test]
    fn equal_string_implies_equal_identity() {
        let a = Version::opaque("beta");
        let b = Version::opaque("beta");
        assert_eq!(a, b);
    }

    #[test]
    fn bundle_rejects_duplicates() {
        let err = VersionBundle::new(vec![
            Version::date("2023-01-01").unwrap(),
            Version::date("2023-01-01").unwrap(),
        ])
        .unwrap_err();
        assert_eq!(err, BundleError::Duplicate("2023-01-01".to_string()));
    }

    #[test]
    fn bundle_rejects_empty() {
        assert_eq!(VersionBundle::new(vec![]).unwrap_err(), BundleError::Empty);
    }

    #[test]
    fn bundle_oldest_is_sorted_first() {
        let bundle = VersionBundle::new(vec![
            Version::date("2023-06-01").unwrap(),
            Version::date("2023-01-01").unwrap(),
        ])
        .unwrap();
        assert_eq!(bundle.oldest().as_str(), "2023-01-01");
    }

    #[test]
    fn resolve_exact_match() {
        let bundle = VersionBundle::new(vec![
            Version::date("2023-01-01").unwrap(),
            Version::date("2023-06-01").unwrap(),
        ])
        .unwrap();
        let resolved = bundle.resolve(&Version::date("2023-06-01").unwrap()).unwrap();
        assert_eq!(resolved.as_str(), "2023-06-01");
    }

    #[test]
    fn resolve_closest_strictly_lesser() {
        let bundle = VersionBundle::new(vec![
            Version::date("2023-01-01").unwrap(),
            Version::date("2023-06-01").unwrap(),
        ])
        .unwrap();
        let resolved = bundle.resolve(&Version::date("2023-08-01").unwrap()).unwrap();
        assert_eq!(resolved.as_str(), "2023-06-01");
    }

    #[test]
    fn resolve_none_when_older_than_all() {
        let bundle = VersionBundle::new(vec![Version::date("2023-06-01").unwrap()]).unwrap();
        assert!(bundle.resolve(&Version::date("2020-01-01").unwrap()).is_none());
    }

    #[test]
    fn resolve_head_candidate_returns_head() {
        let bundle = VersionBundle::new(vec![Version::date("2023-06-01").unwrap()]).unwrap();
        assert!(bundle.resolve(&Version::head()).unwrap().is_head());
    }

    #[test]
    fn find_head_literal() {
        let bundle = VersionBundle::new(vec![Version::date("2023-06-01").unwrap()]).unwrap();
        assert!(bundle.find("head").unwrap().is_head());
        assert!(bundle.find("2023-06-01").is_some());
        assert!(bundle.find("1999-01-01").is_none());
    }
}
