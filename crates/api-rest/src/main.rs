//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the EHR REST API server on its own.
//!
//! ## Intended use
//! This binary is useful for development and debugging when you only want the REST server (with
//! OpenAPI/Swagger UI). The workspace's main `ehr-run` binary runs the REST server and the local
//! function host concurrently.

use api_rest::{config_from_env, router, AppState};
use ehr_core::constants::DEFAULT_REST_ADDR;
use ehr_core::EhrService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the EHR REST API server
///
/// # Environment Variables
/// - `EHR_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `EHR_FHIR_URL`, `EHR_PLATFORM_URL`, `EHR_ORGANIZATION_NAME_LONG`,
///   `EHR_ORGANIZATION_CONSENTS_DOMAIN`: required
/// - `EHR_LOGOUT_REDIRECT_URL`: optional
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is incomplete or invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("ehr_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("EHR_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let cfg = config_from_env()?;

    tracing::info!("-- Starting EHR REST API on {}", addr);
    tracing::info!("-- FHIR API: {}", cfg.fhir_url());

    let app = router(AppState::new(EhrService::new(cfg)?));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
