use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum EhrError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: Value },
    #[error("failed to deserialize response: {0}")]
    Deserialization(serde_json::Error),
    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),
    #[error("invalid token response: {0}")]
    InvalidTokenResponse(String),
    #[error("token response did not contain an access_token")]
    MissingAccessToken,
    #[error("{0} not found")]
    NotFound(String),
}

pub type EhrResult<T> = std::result::Result<T, EhrError>;
