use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, config_from_env};
use ehr_core::EhrService;
use ehr_core::constants::{DEFAULT_FUNCTIONS_ADDR, DEFAULT_REST_ADDR};
use functions::host::HostState;

/// Main entry point for the EHR application
///
/// Starts both servers concurrently:
/// - REST page API on port 3000 (configurable via EHR_REST_ADDR)
/// - local function host on port 3001 (configurable via EHR_FUNCTIONS_ADDR)
///
/// The REST server forwards each caller's bearer token to the FHIR API. The function host
/// authenticates as a machine client using the secrets in the environment.
///
/// # Environment Variables
/// - `EHR_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `EHR_FUNCTIONS_ADDR`: function host address (default: "0.0.0.0:3001")
/// - `EHR_FHIR_URL`, `EHR_PLATFORM_URL`, `EHR_ORGANIZATION_NAME_LONG`,
///   `EHR_ORGANIZATION_CONSENTS_DOMAIN`: REST configuration (required)
/// - `ZAPEHR_AUTH_ENDPOINT`, `ZAPEHR_AUTH_CLIENT`, `ZAPEHR_AUTH_SECRET`,
///   `ZAPEHR_AUTH_AUDIENCE`, `FHIR_API`: function secrets
///
/// # Returns
/// * `Ok(())` - If servers start and run successfully
/// * `Err(anyhow::Error)` - If configuration is invalid, or server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ehr_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("functions=info".parse()?)
                .add_directive("ehr_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("EHR_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let functions_addr =
        std::env::var("EHR_FUNCTIONS_ADDR").unwrap_or_else(|_| DEFAULT_FUNCTIONS_ADDR.into());
    let cfg = config_from_env()?;

    tracing::info!("++ Starting EHR REST on {}", rest_addr);
    tracing::info!("++ Starting EHR functions on {}", functions_addr);

    let rest_app = api_rest::router(AppState::new(EhrService::new(cfg)?));
    let functions_app = functions::host::router(HostState::new()?);

    let rest_listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    let functions_listener = tokio::net::TcpListener::bind(&functions_addr).await?;

    let rest_server = tokio::spawn(async move { axum::serve(rest_listener, rest_app).await });
    let functions_server =
        tokio::spawn(async move { axum::serve(functions_listener, functions_app).await });

    // Run both
    let (rest_result, functions_result) = tokio::try_join!(rest_server, functions_server)?;
    rest_result?;
    functions_result?;

    Ok(())
}
