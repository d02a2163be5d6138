//! Client-credentials token acquisition and caching.
//!
//! A [`CredentialCache`] is owned by whoever calls the FHIR API on behalf of a machine client
//! (the serverless functions). It is handed in explicitly; there is no process-global token.

use crate::client::handle_response;
use crate::constants::{DEFAULT_TOKEN_LIFETIME_SECS, TOKEN_EXPIRY_SKEW_SECS};
use crate::{EhrError, EhrResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Settings for an OAuth2 client-credentials grant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientCredentials {
    pub endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    pub audience: String,
}

#[derive(Serialize)]
struct GrantRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'a str,
}

#[derive(Deserialize)]
struct GrantResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// A bearer token together with the instant it stops being valid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Whether the token is still usable at `now`, allowing for clock skew.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_EXPIRY_SKEW_SECS) < self.expires_at
    }
}

/// Runs a client-credentials grant against `creds.endpoint`.
///
/// # Errors
///
/// Returns an [`EhrError`] if the request fails, the endpoint answers with a non-2xx status,
/// the response carries no `access_token`, or its `expires_in` cannot be turned into an instant.
pub async fn request_token(
    http: &reqwest::Client,
    creds: &ClientCredentials,
) -> EhrResult<AccessToken> {
    tracing::debug!(endpoint = %creds.endpoint, "requesting client-credentials token");
    let resp = http
        .post(&creds.endpoint)
        .json(&GrantRequest {
            grant_type: "client_credentials",
            client_id: &creds.client_id,
            client_secret: &creds.client_secret,
            audience: &creds.audience,
        })
        .send()
        .await?;

    let body = handle_response(resp).await?;
    let grant: GrantResponse = serde_json::from_value(body).map_err(EhrError::Deserialization)?;
    let token = grant
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or(EhrError::MissingAccessToken)?;
    let lifetime = grant.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    let expires_at = Duration::try_seconds(lifetime)
        .and_then(|d| Utc::now().checked_add_signed(d))
        .ok_or_else(|| {
            EhrError::InvalidTokenResponse(format!("expires_in {lifetime} is out of range"))
        })?;

    Ok(AccessToken { token, expires_at })
}

/// Caches one access token and refreshes it on demand.
///
/// The slot sits behind an async mutex held across the grant, so callers racing on a cold or
/// expired cache share a single token request.
#[derive(Debug, Default)]
pub struct CredentialCache {
    slot: Mutex<Option<AccessToken>>,
}

impl CredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the cache with a known token.
    pub fn with_token(token: AccessToken) -> Self {
        Self {
            slot: Mutex::new(Some(token)),
        }
    }

    /// Returns a token valid for at least the skew window, running a grant if needed.
    ///
    /// # Errors
    ///
    /// Propagates any failure from [`request_token`]; the cache is left empty in that case.
    pub async fn ensure_fresh(
        &self,
        http: &reqwest::Client,
        creds: &ClientCredentials,
    ) -> EhrResult<String> {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref().filter(|t| t.is_fresh_at(Utc::now())) {
            tracing::debug!("reusing cached access token");
            return Ok(cached.token.clone());
        }

        *slot = None;
        let fresh = request_token(http, creds).await?;
        tracing::info!(expires_at = %fresh.expires_at, "obtained access token");
        let token = fresh.token.clone();
        *slot = Some(fresh);
        Ok(token)
    }

    /// Drops the cached token so the next call runs a grant.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}
