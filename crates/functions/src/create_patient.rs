//! `create-patient`: registers a patient from the four demo form fields.

use crate::envelope::{FunctionInput, FunctionOutput};
use crate::secrets::{get_secret, SecretKey};
use crate::FunctionContext;
use ehr_core::{EhrError, FhirClient};
use ehr_types::NonEmptyText;
use fhir::{NewPatient, ResourceType};
use serde_json::{json, Value};

pub const NAME: &str = "create-patient";

const MISSING_PARAMETERS: &str =
    "Missing required parameters. firstName, lastName, dateOfBirth, and address are required.";

/// Extracts the new patient from a request body, or `None` if any field is missing,
/// blank or not a string.
fn new_patient(body: &Value) -> Option<NewPatient> {
    let field = |name: &str| {
        NonEmptyText::from_optional(body.get(name).and_then(Value::as_str))
            .ok()
            .map(NonEmptyText::into_inner)
    };
    Some(NewPatient {
        first_name: field("firstName")?,
        last_name: field("lastName")?,
        birth_date: field("dateOfBirth")?,
        address: field("address")?,
    })
}

/// Runs `create-patient`.
///
/// Validation failures answer 400, token or secret failures 500 `Internal service error`, and
/// a rejected create 500 carrying the FHIR API's error body.
pub async fn handle(ctx: &FunctionContext, input: FunctionInput) -> FunctionOutput {
    tracing::debug!("validateRequestParameters");
    let Some(raw) = input.body.as_deref() else {
        return FunctionOutput::error(400, "Request body is required.");
    };
    let body: Value = match serde_json::from_str(raw) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("Request body is not JSON: {}", e);
            return FunctionOutput::internal_error();
        }
    };
    let Some(patient) = new_patient(&body) else {
        return FunctionOutput::error(400, MISSING_PARAMETERS);
    };
    tracing::info!("validateRequestParameters success");

    let secrets = input.secrets.as_ref();
    let (token, fhir_api) = match ctx.token(secrets).await.and_then(|token| {
        get_secret(SecretKey::FhirApi, secrets).map(|fhir_api| (token, fhir_api))
    }) {
        Ok(found) => found,
        Err(e) => {
            tracing::error!("Could not prepare FHIR access: {}", e);
            return FunctionOutput::internal_error();
        }
    };

    tracing::debug!("createPatient");
    let fhir = FhirClient::with_http(ctx.http.clone(), &fhir_api);
    match fhir
        .create(ResourceType::Patient, &patient.to_resource(), &token)
        .await
    {
        Ok(created) => {
            let id = created.id().unwrap_or_default();
            tracing::info!(patient_id = %id, "createPatient success");
            FunctionOutput::json(
                200,
                &json!({ "message": format!("Successfully created a patient with id {id}") }),
            )
        }
        Err(e) => {
            tracing::error!("Error creating patient: {:?}", e);
            let errors = match e {
                EhrError::UnexpectedStatus { body, .. } => body,
                other => Value::String(other.to_string()),
            };
            FunctionOutput::json(
                500,
                &json!({ "message": "Error creating patient", "errors": errors }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Secrets;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn secrets(server: &MockServer) -> Secrets {
        [
            ("ZAPEHR_AUTH_ENDPOINT", format!("{}/oauth/token", server.uri())),
            ("ZAPEHR_AUTH_CLIENT", "client".into()),
            ("ZAPEHR_AUTH_SECRET", "secret".into()),
            ("ZAPEHR_AUTH_AUDIENCE", "https://api.example.com".into()),
            ("FHIR_API", format!("{}/r4", server.uri())),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "m2m"})),
            )
            .mount(server)
            .await;
    }

    fn valid_body() -> String {
        json!({
            "firstName": "Ann",
            "lastName": "Lee",
            "dateOfBirth": "1990-02-03",
            "address": "1 Main St"
        })
        .to_string()
    }

    #[tokio::test]
    async fn missing_body_is_bad_request() {
        let out = handle(&FunctionContext::new().expect("context"), FunctionInput::default()).await;
        assert_eq!(out.status_code, 400);
        assert_eq!(
            out.body_json().expect("json"),
            json!({"error": "Request body is required."})
        );
    }

    #[tokio::test]
    async fn non_json_body_is_internal_error() {
        let out = handle(&FunctionContext::new().expect("context"), FunctionInput::with_body("{not json")).await;
        assert_eq!(out, FunctionOutput::internal_error());
    }

    #[tokio::test]
    async fn each_missing_field_is_bad_request() {
        let ctx = FunctionContext::new().expect("context");
        for field in ["firstName", "lastName", "dateOfBirth", "address"] {
            let mut body: Value = serde_json::from_str(&valid_body()).expect("json");
            body[field] = json!("");
            let out = handle(&ctx, FunctionInput::with_body(body.to_string())).await;
            assert_eq!(out.status_code, 400, "blank {field}");

            body.as_object_mut().expect("object").remove(field);
            let out = handle(&ctx, FunctionInput::with_body(body.to_string())).await;
            assert_eq!(out.status_code, 400, "missing {field}");
            assert_eq!(out.body_json().expect("json")["error"], MISSING_PARAMETERS);
        }
    }

    #[tokio::test]
    async fn non_string_field_is_bad_request() {
        let body = json!({
            "firstName": "Ann", "lastName": "Lee", "dateOfBirth": 19900203, "address": "1 Main St"
        });
        let out = handle(&FunctionContext::new().expect("context"), FunctionInput::with_body(body.to_string())).await;
        assert_eq!(out.status_code, 400);
    }

    #[tokio::test]
    async fn creates_patient_and_reports_id() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/r4/Patient"))
            .and(header("authorization", "Bearer m2m"))
            .and(body_json(json!({
                "resourceType": "Patient",
                "name": [{"family": "Lee", "given": ["Ann"]}],
                "birthDate": "1990-02-03",
                "address": [{"line": ["1 Main St"]}]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "resourceType": "Patient", "id": "new-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let input = FunctionInput::with_body(valid_body()).with_secrets(secrets(&server));
        let out = handle(&FunctionContext::new().expect("context"), input).await;

        assert_eq!(out.status_code, 200);
        assert_eq!(
            out.body_json().expect("json"),
            json!({"message": "Successfully created a patient with id new-1"})
        );
    }

    #[tokio::test]
    async fn downstream_rejection_carries_errors() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/r4/Patient"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "resourceType": "OperationOutcome",
                "issue": [{"severity": "error", "code": "invalid"}]
            })))
            .mount(&server)
            .await;

        let input = FunctionInput::with_body(valid_body()).with_secrets(secrets(&server));
        let out = handle(&FunctionContext::new().expect("context"), input).await;

        assert_eq!(out.status_code, 500);
        let body = out.body_json().expect("json");
        assert_eq!(body["message"], "Error creating patient");
        assert_eq!(body["errors"]["resourceType"], "OperationOutcome");
    }

    #[tokio::test]
    async fn token_failure_is_internal_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let input = FunctionInput::with_body(valid_body()).with_secrets(secrets(&server));
        let out = handle(&FunctionContext::new().expect("context"), input).await;
        assert_eq!(out, FunctionOutput::internal_error());
    }
}
