//! REST helpers for the FHIR API and the platform user endpoint.
//!
//! Every call takes the bearer token as a parameter. Token acquisition belongs to the caller
//! (see [`crate::auth::CredentialCache`]); nothing here fetches or caches credentials.

use crate::constants::{FHIR_JSON_CONTENT_TYPE, HTTP_TIMEOUT_SECS};
use std::time::Duration;
use crate::{EhrError, EhrResult};
use fhir::patch::JSON_PATCH_CONTENT_TYPE;
use fhir::{Bundle, PatchOperation, Resource, ResourceType, SearchParams};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Builds the shared outbound HTTP client with a per-request timeout.
///
/// # Errors
///
/// Returns the builder's error if the TLS backend cannot be initialised.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// [`http_client`] with the default [`HTTP_TIMEOUT_SECS`].
pub fn default_http_client() -> reqwest::Result<reqwest::Client> {
    http_client(Duration::from_secs(HTTP_TIMEOUT_SECS))
}

/// Client for a FHIR R4 REST endpoint.
#[derive(Clone, Debug)]
pub struct FhirClient {
    http: reqwest::Client,
    base_url: String,
}

impl FhirClient {
    /// # Errors
    ///
    /// Returns [`EhrError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> EhrResult<Self> {
        Ok(Self::with_http(default_http_client()?, base_url))
    }

    /// Builds a client sharing an existing connection pool.
    pub fn with_http(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str, token: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(token)
            .header(ACCEPT, FHIR_JSON_CONTENT_TYPE)
    }

    /// Searches `resource_type` and unwraps the result bundle into its resources.
    ///
    /// Parameters with absent or empty values are not sent.
    ///
    /// # Errors
    ///
    /// Returns an [`EhrError`] if the request fails, the server answers with a non-2xx status,
    /// or the body is not a bundle.
    pub async fn search(
        &self,
        resource_type: ResourceType,
        params: &SearchParams,
        token: &str,
    ) -> EhrResult<Vec<Resource>> {
        let url = self.url(resource_type.as_str());
        tracing::debug!(%url, params = ?params.query_pairs(), "FHIR search");
        let resp = self
            .request(Method::GET, &url, token)
            .query(&params.query_pairs())
            .send()
            .await?;
        let body = handle_response(resp).await?;
        let bundle: Bundle = serde_json::from_value(body).map_err(EhrError::Deserialization)?;
        Ok(bundle.into_resources())
    }

    /// Reads a single resource by id.
    pub async fn read(
        &self,
        resource_type: ResourceType,
        id: &str,
        token: &str,
    ) -> EhrResult<Resource> {
        let url = self.url(&format!("{resource_type}/{id}"));
        tracing::debug!(%url, "FHIR read");
        let resp = self.request(Method::GET, &url, token).send().await?;
        handle_response(resp).await.map(Resource::new)
    }

    /// Applies a patch document to a resource and returns the updated resource.
    pub async fn patch(
        &self,
        resource_type: ResourceType,
        id: &str,
        operations: &[PatchOperation],
        token: &str,
    ) -> EhrResult<Resource> {
        let url = self.url(&format!("{resource_type}/{id}"));
        tracing::debug!(%url, "FHIR patch");
        let resp = self
            .request(Method::PATCH, &url, token)
            .header(CONTENT_TYPE, JSON_PATCH_CONTENT_TYPE)
            .json(operations)
            .send()
            .await?;
        handle_response(resp).await.map(Resource::new)
    }

    /// Creates a resource and returns it as stored by the server (with its new id).
    pub async fn create(
        &self,
        resource_type: ResourceType,
        resource: &Value,
        token: &str,
    ) -> EhrResult<Resource> {
        let url = self.url(resource_type.as_str());
        tracing::debug!(%url, "FHIR create");
        let resp = self
            .request(Method::POST, &url, token)
            .header(CONTENT_TYPE, FHIR_JSON_CONTENT_TYPE)
            .json(resource)
            .send()
            .await?;
        handle_response(resp).await.map(Resource::new)
    }
}

/// The signed-in platform user.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, ToSchema)]
pub struct User {
    pub name: String,
    pub email: String,
}

/// Client for the platform API (outside FHIR).
#[derive(Clone, Debug)]
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
}

impl PlatformClient {
    pub fn with_http(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `GET /user/me`
    pub async fn current_user(&self, token: &str) -> EhrResult<User> {
        let url = format!("{}/user/me", self.base_url);
        let resp = self.http.get(&url).bearer_auth(token).send().await?;
        let body = handle_response(resp).await?;
        serde_json::from_value(body).map_err(EhrError::Deserialization)
    }
}

/// Reads a response body as JSON, turning non-2xx statuses into [`EhrError::UnexpectedStatus`].
///
/// The error body is kept as JSON when it parses (FHIR servers answer with an
/// `OperationOutcome`), otherwise as a JSON string.
pub(crate) async fn handle_response(resp: reqwest::Response) -> EhrResult<Value> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
        tracing::error!(status = status.as_u16(), %body, "FHIR request failed");
        return Err(EhrError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&text).map_err(EhrError::Deserialization)
}
