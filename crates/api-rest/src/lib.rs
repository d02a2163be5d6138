//! # API REST
//!
//! REST API implementation for the EHR gateway.
//!
//! Handles:
//! - HTTP endpoints with axum, one per EHR page
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (bearer extraction, JSON errors, CORS)
//!
//! Every page endpoint forwards the caller's bearer token to the FHIR API; the server holds no
//! credentials of its own.

#![warn(rust_2018_idioms)]

pub mod error;

use api_shared::{bearer_token, ErrorBody, HealthRes, HealthService};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{Json, Redirect},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use ehr_core::config::required_setting;
use ehr_core::views::{
    AppointmentPage, AppointmentRow, AppointmentTable, AppointmentsPage, Breadcrumb,
    CancelOutcome, ConsentCheck, ConsentPanel, DetailItem, DetailPanel, InsurancePage,
    PatientPage, PatientRow, PatientTable, PatientsPage, PolicyLink, SidebarItem,
};
use ehr_core::{AppointmentQuery, CoreConfig, EhrService, RowFilter, User};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

pub use error::ApiError;

/// Application state for the REST API server
///
/// Holds the page service shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EhrService>,
}

impl AppState {
    pub fn new(service: EhrService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        current_user,
        list_appointments,
        search_appointments,
        get_appointment,
        cancel_appointment,
        list_patients,
        get_patient,
        get_insurance,
    ),
    components(schemas(
        HealthRes,
        ErrorBody,
        User,
        AppointmentsPage,
        AppointmentTable,
        AppointmentRow,
        PatientsPage,
        PatientTable,
        PatientRow,
        AppointmentPage,
        PatientPage,
        InsurancePage,
        CancelOutcome,
        Breadcrumb,
        SidebarItem,
        DetailPanel,
        DetailItem,
        ConsentPanel,
        ConsentCheck,
        PolicyLink,
    ))
)]
pub struct ApiDoc;

/// Reads the core configuration from `EHR_*` environment variables.
///
/// # Errors
/// Returns an error if a required variable is unset or a value fails validation.
pub fn config_from_env() -> anyhow::Result<CoreConfig> {
    let var = |name: &str| std::env::var(name).ok();
    Ok(CoreConfig::new(
        &required_setting("EHR_FHIR_URL", var("EHR_FHIR_URL"))?,
        &required_setting("EHR_PLATFORM_URL", var("EHR_PLATFORM_URL"))?,
        &required_setting(
            "EHR_ORGANIZATION_NAME_LONG",
            var("EHR_ORGANIZATION_NAME_LONG"),
        )?,
        &required_setting(
            "EHR_ORGANIZATION_CONSENTS_DOMAIN",
            var("EHR_ORGANIZATION_CONSENTS_DOMAIN"),
        )?,
        var("EHR_LOGOUT_REDIRECT_URL"),
    )?)
}

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/logout", get(logout))
        .route("/health", get(health))
        .route("/me", get(current_user))
        .route("/appointments", get(list_appointments))
        .route("/appointments/search", get(search_appointments))
        .route("/appointment/:id", get(get_appointment))
        .route("/appointment/:id/cancel", post(cancel_appointment))
        .route("/patients", get(list_patients))
        .route("/patient/:id", get(get_patient))
        .route("/patient/:id/insurance", get(get_insurance))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Query strings
// ============================================================================

/// Row filters for list pages.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Case-insensitive substring of the patient's name
    pub name: Option<String>,
    /// Appointment day, `YYYY-MM-DD`
    pub date: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> Result<RowFilter, ApiError> {
        let date = match self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) => Some(
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .map_err(|_| ApiError::bad_request(format!("invalid date '{d}'")))?,
            ),
            None => None,
        };
        Ok(RowFilter {
            name: self.name,
            date,
        })
    }
}

/// Server-side filters for the appointment search page.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Lower bound (ISO date or date-time)
    pub start: Option<String>,
    /// Upper bound (ISO date or date-time)
    pub end: Option<String>,
    /// Comma-separated appointment statuses
    pub status: Option<String>,
    /// Case-insensitive substring of the patient's name
    pub name: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Sends the browser to the appointments page.
async fn root() -> Redirect {
    Redirect::to("/appointments")
}

/// Sends the browser to the configured post-logout page.
async fn logout(State(state): State<AppState>) -> Redirect {
    Redirect::to(state.service.config().logout_redirect_url())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// # Returns
/// * `Json<HealthRes>` - Health status response containing service status
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health("EHR REST API"))
}

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Signed-in user", body = User),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 502, description = "Platform API failure", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<User>, ApiError> {
    let token = bearer_token(&headers)?;
    Ok(Json(state.service.current_user(token).await?))
}

#[utoipa::path(
    get,
    path = "/appointments",
    params(ListQuery),
    responses(
        (status = 200, description = "Upcoming booked appointments", body = AppointmentsPage),
        (status = 400, description = "Invalid filter", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 502, description = "FHIR API failure", body = ErrorBody)
    )
)]
/// Upcoming booked appointments
///
/// # Arguments
/// * `query` - Optional patient name and appointment day filters
///
/// # Errors
/// Returns `401` without a bearer token, `400` for an invalid date and `502` if the FHIR search
/// fails.
#[axum::debug_handler]
async fn list_appointments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<AppointmentsPage>, ApiError> {
    let token = bearer_token(&headers)?;
    let filter = query.into_filter()?;
    Ok(Json(state.service.upcoming_appointments(token, &filter).await?))
}

#[utoipa::path(
    get,
    path = "/appointments/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Appointments matching the filters", body = AppointmentsPage),
        (status = 400, description = "Invalid date bound", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 502, description = "FHIR API failure", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn search_appointments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Result<Json<AppointmentsPage>, ApiError> {
    let token = bearer_token(&headers)?;
    let search = AppointmentQuery {
        start: query.start,
        end: query.end,
        status: query.status,
    };
    let filter = RowFilter {
        name: query.name,
        date: None,
    };
    Ok(Json(
        state
            .service
            .search_appointments(token, &search, &filter)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/appointment/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment detail", body = AppointmentPage),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 404, description = "Appointment or patient not found", body = ErrorBody),
        (status = 502, description = "FHIR API failure", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn get_appointment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<AppointmentPage>, ApiError> {
    let token = bearer_token(&headers)?;
    Ok(Json(state.service.appointment(token, &id).await?))
}

#[utoipa::path(
    post,
    path = "/appointment/{id}/cancel",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment cancelled and slot freed", body = CancelOutcome),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 404, description = "Appointment not found", body = ErrorBody),
        (status = 502, description = "FHIR API failure", body = ErrorBody)
    )
)]
/// Cancel an appointment
///
/// Sets the appointment status to `cancelled` and frees the slot it was booked into.
#[axum::debug_handler]
async fn cancel_appointment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<CancelOutcome>, ApiError> {
    let token = bearer_token(&headers)?;
    Ok(Json(state.service.cancel_appointment(token, &id).await?))
}

#[utoipa::path(
    get,
    path = "/patients",
    params(ListQuery),
    responses(
        (status = 200, description = "Patient list", body = PatientsPage),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 502, description = "FHIR API failure", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn list_patients(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<PatientsPage>, ApiError> {
    let token = bearer_token(&headers)?;
    let filter = RowFilter {
        name: query.name,
        date: None,
    };
    Ok(Json(state.service.patients(token, &filter).await?))
}

#[utoipa::path(
    get,
    path = "/patient/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient detail", body = PatientPage),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 404, description = "Patient not found", body = ErrorBody),
        (status = 502, description = "FHIR API failure", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn get_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<PatientPage>, ApiError> {
    let token = bearer_token(&headers)?;
    Ok(Json(state.service.patient(token, &id).await?))
}

#[utoipa::path(
    get,
    path = "/patient/{id}/insurance",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Insurance page", body = InsurancePage),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 404, description = "Patient not found", body = ErrorBody),
        (status = 502, description = "FHIR API failure", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn get_insurance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<InsurancePage>, ApiError> {
    let token = bearer_token(&headers)?;
    Ok(Json(state.service.insurance(token, &id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{header as header_matcher, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(server: &MockServer) -> Router {
        let config = CoreConfig::new(
            &server.uri(),
            &server.uri(),
            "Acme Clinic",
            "https://consents.example.com",
            Some("https://example.com/signed-out".into()),
        )
        .expect("config");
        router(AppState::new(EhrService::new(config).expect("service")))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, "Bearer user-token")
            .body(Body::empty())
            .expect("request")
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn root_and_logout_redirect() {
        let server = MockServer::start().await;

        let response = app(&server)
            .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/appointments");

        let response = app(&server)
            .oneshot(Request::builder().uri("/logout").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://example.com/signed-out"
        );
    }

    #[tokio::test]
    async fn health_is_public() {
        let server = MockServer::start().await;
        let response = app(&server)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["ok"], true);
    }

    #[tokio::test]
    async fn pages_require_bearer_token() {
        let server = MockServer::start().await;
        let response = app(&server)
            .oneshot(Request::builder().uri("/patients").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn appointments_page_forwards_token_and_builds_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Appointment"))
            .and(header_matcher("authorization", "Bearer user-token"))
            .and(query_param("status", "booked"))
            .and(query_param("_include", "Appointment:patient"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "Bundle",
                "entry": [
                    {"resource": {"resourceType": "Appointment", "id": "a1", "status": "booked",
                                  "start": "2030-01-02T09:00:00Z",
                                  "meta": {"lastUpdated": "2029-12-01T10:00:00Z"},
                                  "participant": [{"actor": {"reference": "Patient/p1"}}]}},
                    {"resource": {"resourceType": "Patient", "id": "p1",
                                  "name": [{"given": ["Ann"], "family": "Lee"}],
                                  "birthDate": "1990-02-03"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = app(&server)
            .oneshot(get("/appointments?name=ann&date=2030-01-02"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["document_title"], "Appointments | Acme Clinic EHR");
        assert_eq!(body["table"]["rows"][0]["patient"], "Ann Lee");
        assert_eq!(body["table"]["rows"][0]["status"], "Booked");
        assert_eq!(body["table"]["rows"][0]["appointment"], "01.02.2030, 9:00 AM");
    }

    #[tokio::test]
    async fn search_page_sends_utc_bound_and_lowercase_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Appointment"))
            .and(query_param("date", "ge2030-01-02T07:00:00.000Z"))
            .and(query_param("status", "booked,arrived"))
            .and(query_param("_include", "Appointment:patient"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "Bundle",
                "entry": [
                    {"resource": {"resourceType": "Appointment", "id": "a1", "status": "arrived",
                                  "start": "2030-01-02T09:00:00Z",
                                  "meta": {"lastUpdated": "2029-12-01T10:00:00Z"},
                                  "participant": [{"actor": {"reference": "Patient/p1"}}]}},
                    {"resource": {"resourceType": "Patient", "id": "p1",
                                  "name": [{"given": ["Ann"], "family": "Lee"}],
                                  "birthDate": "1990-02-03"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = app(&server)
            .oneshot(get(
                "/appointments/search?start=2030-01-02T09:00:00%2B02:00&status=Booked,%20Arrived",
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await["table"]["rows"][0]["patient"],
            "Ann Lee"
        );
    }

    #[tokio::test]
    async fn search_page_rejects_unparseable_bound() {
        let server = MockServer::start().await;
        let response = app(&server)
            .oneshot(get("/appointments/search?end=next-week"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn insurance_page_links_back_to_patient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Patient/p1"))
            .and(header_matcher("authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "Patient", "id": "p1",
                "name": [{"given": ["Ann", "Marie"], "family": "Lee"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = app(&server)
            .oneshot(get("/patient/p1/insurance"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["document_title"], "Insurance | Acme Clinic EHR");
        assert_eq!(
            body["breadcrumbs"],
            json!([
                {"link": "/patients", "label": "Patients"},
                {"link": "/patient/p1", "label": "Ann Lee"},
                {"link": "#", "label": "Insurance"}
            ])
        );
    }

    #[tokio::test]
    async fn invalid_day_filter_is_bad_request() {
        let server = MockServer::start().await;
        let response = app(&server)
            .oneshot(get("/appointments?date=tomorrow"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upstream_failure_is_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Appointment"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&server)
            .await;

        let response = app(&server)
            .oneshot(get("/appointment/a1"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(response).await["error"], "FHIR API request failed");
    }

    #[tokio::test]
    async fn missing_patient_in_detail_bundle_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Appointment"))
            .and(query_param("_id", "a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "Bundle",
                "entry": [{"resource": {"resourceType": "Appointment", "id": "a1"}}]
            })))
            .mount(&server)
            .await;

        let response = app(&server)
            .oneshot(get("/appointment/a1"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cancel_route_patches_appointment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Appointment/a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "Appointment", "id": "a1"
            })))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/Appointment/a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "Appointment", "id": "a1", "status": "cancelled"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = Request::builder()
            .method("POST")
            .uri("/appointment/a1/cancel")
            .header(header::AUTHORIZATION, "Bearer user-token")
            .body(Body::empty())
            .expect("request");
        let response = app(&server).oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "cancelled");
    }

    #[tokio::test]
    async fn me_returns_platform_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Dr Who", "email": "who@example.com"
            })))
            .mount(&server)
            .await;

        let response = app(&server).oneshot(get("/me")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["email"], "who@example.com");
    }
}
