//! Input validation utilities.
//!
//! This module contains functions for validating configuration and user inputs before they are
//! used to build requests against the FHIR API.

use crate::{EhrError, EhrResult};

/// Validates a base URL and returns it without trailing slashes.
///
/// Paths are appended to base URLs with a single `/`, so the stored form never ends in one.
/// Guardrails:
/// - rejects empty or whitespace-only strings
/// - requires an `http://` or `https://` scheme with a non-empty host part
/// - rejects whitespace inside the URL
///
/// # Errors
///
/// Returns [`EhrError::Config`] if the URL is invalid.
pub fn normalise_base_url(url: &str) -> EhrResult<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(EhrError::Config("base URL cannot be empty".into()));
    }

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| EhrError::Config(format!("base URL must use http(s): {url}")))?;

    if rest.trim_end_matches('/').is_empty() {
        return Err(EhrError::Config(format!("base URL has no host: {url}")));
    }

    if url.chars().any(char::is_whitespace) {
        return Err(EhrError::Config(format!(
            "base URL contains whitespace: {url}"
        )));
    }

    Ok(url.trim_end_matches('/').to_string())
}

/// Validates a FHIR logical id before it is embedded in a request path.
///
/// FHIR ids are 1-64 characters from `[A-Za-z0-9\-\.]`.
///
/// # Errors
///
/// Returns [`EhrError::InvalidInput`] if the id is not a valid FHIR id.
pub fn validate_resource_id(id: &str) -> EhrResult<()> {
    const MAX_ID_LEN: usize = 64;

    if id.is_empty() || id.len() > MAX_ID_LEN {
        return Err(EhrError::InvalidInput(format!(
            "resource id must be 1-{MAX_ID_LEN} characters"
        )));
    }

    let ok = id
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-'));

    if !ok {
        return Err(EhrError::InvalidInput(
            "resource id contains invalid characters (only alphanumeric, '.', '-' allowed)".into(),
        ));
    }

    Ok(())
}
