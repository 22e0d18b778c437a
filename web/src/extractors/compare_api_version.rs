//! Rejects requests whose `x-version` header does not match the API version
//! this server exposes.

use crate::AppState;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use log::*;
use semver::Version;
use service::config::X_VERSION;

pub(crate) struct CompareApiVersion(pub String);

impl FromRequestParts<AppState> for CompareApiVersion {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let requested = parts
            .headers
            .get(X_VERSION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("Missing {X_VERSION} header"),
                )
            })?;

        let supported = state.config.api_version();
        match version_matches(requested, supported) {
            Some(true) => Ok(CompareApiVersion(requested.to_string())),
            Some(false) => {
                debug!("Rejecting request with {X_VERSION} '{requested}' (supported: {supported})");
                Err((
                    StatusCode::BAD_REQUEST,
                    format!("Unsupported API version '{requested}', expected '{supported}'"),
                ))
            }
            None => Err((
                StatusCode::BAD_REQUEST,
                format!("Invalid {X_VERSION} header '{requested}'"),
            )),
        }
    }
}

/// Semantic-version comparison of the requested and supported versions.
/// `None` when either side is not a parseable semver string.
fn version_matches(requested: &str, supported: &str) -> Option<bool> {
    let requested = Version::parse(requested).ok()?;
    let supported = Version::parse(supported).ok()?;
    Some(requested == supported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_versions_are_accepted() {
        assert_eq!(version_matches("1.0.0-beta1", "1.0.0-beta1"), Some(true));
    }

    #[test]
    fn differing_versions_are_rejected() {
        assert_eq!(version_matches("1.0.0", "1.0.0-beta1"), Some(false));
        assert_eq!(version_matches("1.1.0", "1.0.0"), Some(false));
    }

    #[test]
    fn malformed_versions_fail_to_parse() {
        assert_eq!(version_matches("not-a-version", "1.0.0"), None);
        assert_eq!(version_matches("1.0", "1.0.0"), None);
    }
}
