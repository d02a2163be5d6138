//! # API Shared
//!
//! Shared utilities and definitions for the EHR HTTP surfaces.
//!
//! Contains:
//! - Response types used by every server (`HealthRes`, `ErrorBody`)
//! - Shared services like `HealthService`
//! - Bearer-token extraction from request headers
//!
//! Used by `api-rest` and `functions` for common functionality.

pub mod auth;
pub mod health;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use auth::{bearer_token, AuthError};
pub use health::{HealthRes, HealthService};

/// JSON error payload: `{"error": "..."}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
