use api_shared::{AuthError, ErrorBody};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ehr_core::EhrError;

/// Error response with a `{"error": "..."}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        tracing::warn!("Rejected request: {}", err);
        Self::new(StatusCode::UNAUTHORIZED, err.to_string())
    }
}

impl From<EhrError> for ApiError {
    fn from(err: EhrError) -> Self {
        tracing::error!("Request failed: {:?}", err);
        match err {
            EhrError::InvalidInput(msg) => Self::bad_request(msg),
            EhrError::NotFound(what) => Self::new(StatusCode::NOT_FOUND, format!("{what} not found")),
            EhrError::UnexpectedStatus { status: 404, .. } => {
                Self::new(StatusCode::NOT_FOUND, "Resource not found")
            }
            EhrError::UnexpectedStatus {
                status: 401 | 403, ..
            } => Self::new(StatusCode::UNAUTHORIZED, "FHIR API rejected the access token"),
            EhrError::Config(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Server misconfigured")
            }
            _ => Self::new(StatusCode::BAD_GATEWAY, "FHIR API request failed"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.message))).into_response()
    }
}
