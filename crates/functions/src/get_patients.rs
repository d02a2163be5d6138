//! `get-patients`: lists patients, most recently updated first.

use crate::envelope::{FunctionInput, FunctionOutput};
use crate::secrets::{get_secret, SecretKey};
use crate::FunctionContext;
use ehr_core::constants::SEARCH_COUNT;
use ehr_core::FhirClient;
use fhir::{ResourceType, SearchParams};
use serde_json::Value;

pub const NAME: &str = "get-patients";

/// Patients sorted by `_lastUpdated`, oldest first as the FHIR API returns them.
pub fn search_params() -> SearchParams {
    SearchParams::new()
        .count(SEARCH_COUNT)
        .sort("_lastUpdated")
}

/// Runs `get-patients`.
///
/// Answers 200 with the patients as a JSON array, newest first; 500 `Error getting available
/// patients` if the search fails; 500 `Internal service error` for token or secret failures.
pub async fn handle(ctx: &FunctionContext, input: FunctionInput) -> FunctionOutput {
    let secrets = input.secrets.as_ref();

    let token = match ctx.token(secrets).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("Could not obtain access token: {}", e);
            return FunctionOutput::internal_error();
        }
    };
    let fhir_api = match get_secret(SecretKey::FhirApi, secrets) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("{}", e);
            return FunctionOutput::internal_error();
        }
    };

    tracing::debug!("searchFhirResources");
    let fhir = FhirClient::with_http(ctx.http.clone(), &fhir_api);
    match fhir
        .search(ResourceType::Patient, &search_params(), &token)
        .await
    {
        Ok(resources) => {
            tracing::info!(
                "searchFhirResources success: returned {} patients",
                resources.len()
            );
            let patients: Vec<Value> = resources
                .into_iter()
                .rev()
                .map(fhir::Resource::into_value)
                .collect();
            FunctionOutput::json(200, &Value::Array(patients))
        }
        Err(e) => {
            tracing::error!("Error searching patients: {:?}", e);
            FunctionOutput::error(500, "Error getting available patients")
        }
    }
}
