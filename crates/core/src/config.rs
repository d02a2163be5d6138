//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::constants::DEFAULT_LOGOUT_REDIRECT_URL;
use crate::validation::normalise_base_url;
use crate::{EhrError, EhrResult};
use ehr_types::NonEmptyText;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    fhir_url: String,
    platform_url: String,
    organization_name_long: NonEmptyText,
    consents_domain: String,
    logout_redirect_url: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// Base URLs are validated and stored without a trailing slash.
    ///
    /// # Errors
    ///
    /// Returns [`EhrError::Config`] if a URL is not an absolute http(s) URL or the organisation
    /// name is blank.
    pub fn new(
        fhir_url: &str,
        platform_url: &str,
        organization_name_long: &str,
        consents_domain: &str,
        logout_redirect_url: Option<String>,
    ) -> EhrResult<Self> {
        let organization_name_long = NonEmptyText::new(organization_name_long).map_err(|_| {
            EhrError::Config("organisation long name cannot be empty".into())
        })?;

        Ok(Self {
            fhir_url: normalise_base_url(fhir_url)?,
            platform_url: normalise_base_url(platform_url)?,
            organization_name_long,
            consents_domain: normalise_base_url(consents_domain)?,
            logout_redirect_url: logout_redirect_url
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_LOGOUT_REDIRECT_URL.into()),
        })
    }

    pub fn fhir_url(&self) -> &str {
        &self.fhir_url
    }

    pub fn platform_url(&self) -> &str {
        &self.platform_url
    }

    pub fn organization_name_long(&self) -> &str {
        self.organization_name_long.as_str()
    }

    pub fn consents_domain(&self) -> &str {
        &self.consents_domain
    }

    pub fn logout_redirect_url(&self) -> &str {
        &self.logout_redirect_url
    }

    /// Browser-style document title: `"<tab title> | <organisation> EHR"`.
    pub fn document_title(&self, tab_title: &str) -> String {
        format!("{tab_title} | {} EHR", self.organization_name_long)
    }
}

/// Require a setting that was read from the environment (or CLI) by the caller.
///
/// # Errors
///
/// Returns [`EhrError::Config`] naming `name` if `value` is `None` or blank.
pub fn required_setting(name: &str, value: Option<String>) -> EhrResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EhrError::Config(format!("{name} must be set")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> CoreConfig {
        CoreConfig::new(
            "https://fhir.example.com/r4/",
            "https://platform.example.com",
            "Sample Clinic",
            "https://consents.example.com/",
            None,
        )
        .expect("valid config")
    }

    #[test]
    fn strips_trailing_slashes_and_defaults_logout() {
        let cfg = cfg();
        assert_eq!(cfg.fhir_url(), "https://fhir.example.com/r4");
        assert_eq!(cfg.consents_domain(), "https://consents.example.com");
        assert_eq!(cfg.logout_redirect_url(), "/");
    }

    #[test]
    fn document_title_names_organisation() {
        assert_eq!(cfg().document_title("Patients"), "Patients | Sample Clinic EHR");
    }

    #[test]
    fn rejects_blank_organisation_and_bad_urls() {
        assert!(matches!(
            CoreConfig::new("https://a", "https://b", "  ", "https://c", None),
            Err(EhrError::Config(_))
        ));
        assert!(matches!(
            CoreConfig::new("ftp://a", "https://b", "Org", "https://c", None),
            Err(EhrError::Config(_))
        ));
    }

    #[test]
    fn required_setting_rejects_missing_and_blank() {
        assert!(required_setting("EHR_FHIR_URL", None).is_err());
        assert!(required_setting("EHR_FHIR_URL", Some(" ".into())).is_err());
        assert_eq!(
            required_setting("EHR_FHIR_URL", Some(" https://x ".into())).expect("set"),
            "https://x"
        );
    }
}
