//! Standalone local function host binary.
//!
//! Serves `create-patient` and `get-patients` at `POST /local/{name}`, reading their secrets
//! (`ZAPEHR_AUTH_ENDPOINT`, `ZAPEHR_AUTH_CLIENT`, `ZAPEHR_AUTH_SECRET`,
//! `ZAPEHR_AUTH_AUDIENCE`, `FHIR_API`) from the environment or a `.env` file.

use ehr_core::constants::DEFAULT_FUNCTIONS_ADDR;
use functions::host::{router, HostState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("functions=info".parse()?)
                .add_directive("ehr_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr =
        std::env::var("EHR_FUNCTIONS_ADDR").unwrap_or_else(|_| DEFAULT_FUNCTIONS_ADDR.into());
    tracing::info!("-- Starting EHR function host on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(HostState::new()?)).await?;

    Ok(())
}
