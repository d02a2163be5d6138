//! # Functions
//!
//! Serverless-style demo functions backed by the FHIR API, plus a local HTTP host for them.
//!
//! Each function takes a [`FunctionInput`] and always answers with a [`FunctionOutput`]; errors
//! become status codes in the output and never escape to the host. Functions authenticate as a
//! machine client with a client-credentials grant and keep the token in their own
//! [`FunctionContext`] between invocations.

pub mod create_patient;
pub mod envelope;
pub mod error;
pub mod get_patients;
pub mod host;
pub mod secrets;

pub use envelope::{FunctionInput, FunctionOutput, Secrets};
pub use error::{FunctionError, FunctionResult};

use ehr_core::client::{default_http_client, http_client};
use ehr_core::CredentialCache;
use std::time::Duration;

/// Per-function state that outlives a single invocation.
#[derive(Debug)]
pub struct FunctionContext {
    pub http: reqwest::Client,
    pub tokens: CredentialCache,
}

impl FunctionContext {
    /// Context whose outbound requests use the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError::Ehr`] if the HTTP client cannot be built.
    pub fn new() -> FunctionResult<Self> {
        Ok(Self::with_http(
            default_http_client().map_err(ehr_core::EhrError::from)?,
        ))
    }

    /// Context whose outbound requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError::Ehr`] if the HTTP client cannot be built.
    pub fn with_timeout(timeout: Duration) -> FunctionResult<Self> {
        Ok(Self::with_http(
            http_client(timeout).map_err(ehr_core::EhrError::from)?,
        ))
    }

    pub fn with_http(http: reqwest::Client) -> Self {
        Self {
            http,
            tokens: CredentialCache::new(),
        }
    }

    /// Returns a valid machine token, running the grant described by the secrets if needed.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError::MissingSecret`] if a grant setting is missing, or
    /// [`FunctionError::Ehr`] if the grant fails.
    pub async fn token(&self, secrets: Option<&Secrets>) -> FunctionResult<String> {
        let creds = secrets::client_credentials(secrets)?;
        Ok(self.tokens.ensure_fresh(&self.http, &creds).await?)
    }
}
