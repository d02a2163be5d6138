//! Secret lookup for function invocations.
//!
//! A function reads its secrets from the invocation's `secrets` map when the runtime supplies
//! one, and from process environment variables otherwise. The two sources are never mixed.

use crate::envelope::Secrets;
use crate::error::{FunctionError, FunctionResult};
use ehr_core::ClientCredentials;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecretKey {
    AuthEndpoint,
    AuthClient,
    AuthSecret,
    AuthAudience,
    FhirApi,
}

impl SecretKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SecretKey::AuthEndpoint => "ZAPEHR_AUTH_ENDPOINT",
            SecretKey::AuthClient => "ZAPEHR_AUTH_CLIENT",
            SecretKey::AuthSecret => "ZAPEHR_AUTH_SECRET",
            SecretKey::AuthAudience => "ZAPEHR_AUTH_AUDIENCE",
            SecretKey::FhirApi => "FHIR_API",
        }
    }
}

/// Looks up one secret.
///
/// # Errors
///
/// Returns [`FunctionError::MissingSecret`] if the selected source has no value for `key`.
pub fn get_secret(key: SecretKey, secrets: Option<&Secrets>) -> FunctionResult<String> {
    let value = match secrets {
        Some(map) => map.get(key.as_str()).cloned(),
        None => std::env::var(key.as_str()).ok(),
    };
    value.ok_or_else(|| FunctionError::MissingSecret(key.as_str().to_string()))
}

/// Collects the client-credentials grant settings.
pub fn client_credentials(secrets: Option<&Secrets>) -> FunctionResult<ClientCredentials> {
    Ok(ClientCredentials {
        endpoint: get_secret(SecretKey::AuthEndpoint, secrets)?,
        client_id: get_secret(SecretKey::AuthClient, secrets)?,
        client_secret: get_secret(SecretKey::AuthSecret, secrets)?,
        audience: get_secret(SecretKey::AuthAudience, secrets)?,
    })
}
