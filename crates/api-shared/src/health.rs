use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Simple health service that can be used by both the REST API and the function host
///
/// This service provides a standardised way to check the health status of the EHR gateway.
#[derive(Clone, Debug, Default)]
pub struct HealthService;

impl HealthService {
    /// Creates a new instance of HealthService.
    ///
    /// # Returns
    /// A new `HealthService` instance.
    pub fn new() -> Self {
        Self
    }

    /// Check health without creating an instance
    ///
    /// # Arguments
    /// * `component` - Name reported in the message, e.g. `"EHR REST API"`
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health(component: &str) -> HealthRes {
        HealthRes {
            ok: true,
            message: format!("{component} is alive"),
        }
    }
}
