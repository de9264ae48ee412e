//! Version detection (spec §4.7, step 1).

use apiver_core::{Error, ErrorKind, RequestInfo, Version, VersionBundle};

use crate::config::{VersionDetectionConfig, VersionFormat, VersionLocation};

fn raw_value<'a>(req: &'a RequestInfo, config: &VersionDetectionConfig) -> Option<&'a str> {
    match config.location {
        VersionLocation::Header => req.headers.get(config.parameter_name.as_str()).and_then(|v| v.to_str().ok()),
        VersionLocation::Query => req.query.get(config.parameter_name.as_str()).map(String::as_str),
        VersionLocation::Cookie => req.cookies.get(config.parameter_name.as_str()).map(String::as_str),
    }
}

fn parse(raw: &str, format: VersionFormat) -> Result<Version, Error> {
    match format {
        VersionFormat::Date => {
            Version::date(raw).map_err(|e| Error::new(ErrorKind::UnknownVersion, format!("invalid version {raw:?}: {e}")))
        }
        VersionFormat::Semver => {
            Version::semver(raw).map_err(|e| Error::new(ErrorKind::UnknownVersion, format!("invalid version {raw:?}: {e}")))
        }
        VersionFormat::String => Ok(Version::opaque(raw)),
    }
}

/// Detect, parse and resolve the client's requested version (spec §4.7,
/// step 1): read `config.parameter_name` from the configured location,
/// falling back to `config.default_version` if absent, then resolve it
/// against `bundle` to the closest version at or below it.
///
/// # Errors
///
/// Returns [`ErrorKind::UnknownVersion`] if no version is available to
/// parse, the raw value doesn't parse under `config.format`, or the parsed
/// version is older than every version in `bundle`.
pub fn detect_client_version(
    req: &RequestInfo,
    config: &VersionDetectionConfig,
    bundle: &VersionBundle,
) -> Result<Version, Error> {
    let raw = raw_value(req, config).map(str::to_string).or_else(|| config.default_version.clone());
    let Some(raw) = raw else {
        return Err(Error::new(
            ErrorKind::UnknownVersion,
            format!("no value for {:?} and no default version configured", config.parameter_name),
        ));
    };
    let candidate = parse(&raw, config.format)?;
    let resolved = bundle
        .resolve(&candidate)
        .ok_or_else(|| Error::new(ErrorKind::UnknownVersion, format!("no version at or before {raw:?}")))?;
    if resolved != candidate {
        tracing::debug!(
            requested = candidate.as_str(),
            resolved = resolved.as_str(),
            "client version not declared in bundle, falling back to closest lesser version"
        );
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;
    use std::collections::HashMap;

    fn bundle() -> VersionBundle {
        VersionBundle::new(vec![
            Version::date("2024-01-01").unwrap(),
            Version::date("2024-06-01").unwrap(),
        ])
        .unwrap()
    }

    fn request_with_header(name: &str, value: &str) -> RequestInfo {
        let mut headers = HeaderMap::new();
        headers.insert(http::HeaderName::from_bytes(name.as_bytes()).unwrap(), value.parse().unwrap());
        RequestInfo { headers, ..RequestInfo::empty() }
    }

    #[test]
    fn reads_default_header_name() {
        let config = VersionDetectionConfig::default();
        let req = request_with_header("X-API-Version", "2024-06-01");
        let version = detect_client_version(&req, &config, &bundle()).unwrap();
        assert_eq!(version.as_str(), "2024-06-01");
    }

    #[test]
    fn falls_back_to_default_version_when_absent() {
        let config = VersionDetectionConfig::default().default_version("2024-01-01");
        let req = RequestInfo::empty();
        let version = detect_client_version(&req, &config, &bundle()).unwrap();
        assert_eq!(version.as_str(), "2024-01-01");
    }

    #[test]
    fn resolves_to_closest_lesser_version() {
        let config = VersionDetectionConfig::default();
        let req = request_with_header("X-API-Version", "2024-08-01");
        let version = detect_client_version(&req, &config, &bundle()).unwrap();
        assert_eq!(version.as_str(), "2024-06-01");
    }

    #[test]
    fn fails_unknown_version_when_older_than_all() {
        let config = VersionDetectionConfig::default();
        let req = request_with_header("X-API-Version", "2020-01-01");
        let err = detect_client_version(&req, &config, &bundle()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownVersion);
    }

    #[test]
    fn fails_unknown_version_with_no_parameter_and_no_default() {
        let config = VersionDetectionConfig::default();
        let req = RequestInfo::empty();
        let err = detect_client_version(&req, &config, &bundle()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownVersion);
    }

    #[test]
    fn reads_from_query_parameter() {
        let config = VersionDetectionConfig::default().location(VersionLocation::Query);
        let mut query = HashMap::new();
        query.insert("X-API-Version".to_string(), "2024-01-01".to_string());
        let req = RequestInfo { query, ..RequestInfo::empty() };
        let version = detect_client_version(&req, &config, &bundle()).unwrap();
        assert_eq!(version.as_str(), "2024-01-01");
    }

    #[test]
    fn reads_from_cookie() {
        let config = VersionDetectionConfig::default().location(VersionLocation::Cookie);
        let mut cookies = HashMap::new();
        cookies.insert("X-API-Version".to_string(), "2024-06-01".to_string());
        let req = RequestInfo { cookies, ..RequestInfo::empty() };
        let version = detect_client_version(&req, &config, &bundle()).unwrap();
        assert_eq!(version.as_str(), "2024-06-01");
    }

    #[test]
    fn malformed_value_is_unknown_version() {
        let config = VersionDetectionConfig::default();
        let req = request_with_header("X-API-Version", "not-a-date");
        let err = detect_client_version(&req, &config, &bundle()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownVersion);
    }
}
