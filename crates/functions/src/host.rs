//! Local function host.
//!
//! Serves each function at `POST /local/{name}`. The request headers and body become the
//! [`FunctionInput`] (without a secrets map, so secrets come from the environment) and the
//! [`FunctionOutput`] status and body become the HTTP response.

use crate::envelope::{FunctionInput, FunctionOutput};
use crate::{create_patient, get_patients, FunctionContext, FunctionResult};
use api_shared::{ErrorBody, HealthRes, HealthService};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// One context per function, so each keeps its own cached token.
#[derive(Clone)]
pub struct HostState {
    create_patient: Arc<FunctionContext>,
    get_patients: Arc<FunctionContext>,
}

impl HostState {
    /// # Errors
    ///
    /// Returns an error if a function's HTTP client cannot be built.
    pub fn new() -> FunctionResult<Self> {
        Ok(Self {
            create_patient: Arc::new(FunctionContext::new()?),
            get_patients: Arc::new(FunctionContext::new()?),
        })
    }
}

pub fn router(state: HostState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/local/:name", post(invoke))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health("EHR function host"))
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let map: Map<String, Value> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), Value::String(v.to_string())))
        })
        .collect();
    Value::Object(map)
}

#[axum::debug_handler]
async fn invoke(
    State(state): State<HostState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let input = FunctionInput {
        headers: Some(headers_to_json(&headers)),
        body: Some(body).filter(|b| !b.is_empty()),
        secrets: None,
    };

    tracing::info!(function = %name, "invoking function");
    let output = match name.as_str() {
        create_patient::NAME => create_patient::handle(&state.create_patient, input).await,
        get_patients::NAME => get_patients::handle(&state.get_patients, input).await,
        _ => {
            tracing::warn!(function = %name, "unknown function");
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorBody::new(format!("unknown function '{name}'"))),
            )
                .into_response();
        }
    };
    tracing::info!(function = %name, status = output.status_code, "function finished");
    into_response(output)
}

fn into_response(output: FunctionOutput) -> Response {
    let status =
        StatusCode::from_u16(output.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        output.body,
    )
        .into_response()
}
