//! Client for the demo functions, following the demo website's add-patient flow.
//!
//! Every step is recorded as a log line, the way the website shows them in its log panel.

use chrono::NaiveDate;
use ehr_core::client::default_http_client;
use serde_json::{json, Value};

pub const CREATE_PATIENT: &str = "create-patient";
pub const GET_PATIENTS: &str = "get-patients";
const PROJECT_ID_HEADER: &str = "x-zapehr-project-id";

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("Error: All fields are required")]
    MissingFields,
    #[error("function request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("function answered with status {0}")]
    Status(u16),
    #[error("no URL for {0}; set its URL or a functions base URL")]
    MissingUrl(&'static str),
}

pub type DemoResult<T> = std::result::Result<T, DemoError>;

/// The four add-patient form fields. Blank text counts as missing.
#[derive(Clone, Debug, Default)]
pub struct PatientForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}

impl PatientForm {
    /// Builds the `create-patient` request body.
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::MissingFields`] if any field is missing or blank.
    pub fn to_body(&self) -> DemoResult<Value> {
        let text = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        match (
            text(&self.first_name),
            text(&self.last_name),
            self.date_of_birth,
            text(&self.address),
        ) {
            (Some(first_name), Some(last_name), Some(dob), Some(address)) => Ok(json!({
                "firstName": first_name,
                "lastName": last_name,
                "dateOfBirth": dob.format("%Y-%m-%d").to_string(),
                "address": address,
            })),
            _ => Err(DemoError::MissingFields),
        }
    }
}

/// Deployed functions wrap their result in `output`; the local host does not.
pub fn choose_json(json: Value, app_env: &str) -> Value {
    if app_env == "local" {
        json
    } else {
        json.get("output").cloned().unwrap_or(Value::Null)
    }
}

/// A row of the demo patient grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientSummary {
    pub id: Option<String>,
    pub name: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
}

impl PatientSummary {
    pub fn from_value(patient: &Value) -> Self {
        let name = patient["name"].get(0).map(|name| {
            let given: Vec<&str> = name["given"]
                .as_array()
                .map(|g| g.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            format!(
                "{} {}",
                given.join(","),
                name["family"].as_str().unwrap_or_default()
            )
        });
        Self {
            id: patient["id"].as_str().map(String::from),
            name,
            date_of_birth: patient["birthDate"].as_str().map(String::from),
            address: patient["address"][0]["line"][0].as_str().map(String::from),
        }
    }
}

/// Where each function is invoked.
///
/// Deployed functions have unrelated URLs, so each can be given on its own. The local host
/// serves both under one base as `{base}/{name}`, which fills in any URL not given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionUrls {
    pub create_patient: String,
    pub get_patients: String,
}

impl FunctionUrls {
    /// # Errors
    ///
    /// Returns [`DemoError::MissingUrl`] if a function has neither its own URL nor a base.
    pub fn resolve(
        base: Option<&str>,
        create_patient: Option<String>,
        get_patients: Option<String>,
    ) -> DemoResult<Self> {
        let base = base
            .map(|b| b.trim().trim_end_matches('/'))
            .filter(|b| !b.is_empty());
        let pick = |explicit: Option<String>, name: &'static str| {
            explicit
                .filter(|url| !url.trim().is_empty())
                .or_else(|| base.map(|b| format!("{b}/{name}")))
                .ok_or(DemoError::MissingUrl(name))
        };
        Ok(Self {
            create_patient: pick(create_patient, CREATE_PATIENT)?,
            get_patients: pick(get_patients, GET_PATIENTS)?,
        })
    }
}

pub struct DemoClient {
    http: reqwest::Client,
    urls: FunctionUrls,
    project_id: String,
    app_env: String,
    logs: Vec<String>,
}

impl DemoClient {
    /// # Errors
    ///
    /// Returns [`DemoError::Request`] if the HTTP client cannot be built.
    pub fn new(urls: FunctionUrls, project_id: &str, app_env: &str) -> DemoResult<Self> {
        Ok(Self {
            http: default_http_client()?,
            urls,
            project_id: project_id.to_string(),
            app_env: app_env.to_string(),
            logs: Vec::new(),
        })
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    fn log(&mut self, message: String) {
        tracing::debug!("{}", message);
        self.logs.push(message);
    }

    /// Creates a patient from the form, then refreshes the patient list.
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::MissingFields`] before any request if the form is incomplete, or a
    /// request or status error from either function call.
    pub async fn add_patient(&mut self, form: &PatientForm) -> DemoResult<Vec<PatientSummary>> {
        let body = form.to_body()?;
        let url = self.urls.create_patient.clone();
        self.log(format!(
            "Calling function {url} to create patient. This function validates the parameters \
             and then calls the FHIR API to create a patient."
        ));

        let sent = self
            .http
            .post(&url)
            .header(PROJECT_ID_HEADER, &self.project_id)
            .json(&body)
            .send()
            .await;
        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                self.log("Error saving patient".into());
                return Err(e.into());
            }
        };
        if !response.status().is_success() {
            self.log("Error saving patient".into());
            return Err(DemoError::Status(response.status().as_u16()));
        }
        self.log("Successfully created patient".into());

        self.search_patients().await
    }

    /// Fetches the patient list through `get-patients`.
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::Request`] if the call fails or [`DemoError::Status`] for a non-2xx
    /// answer.
    pub async fn search_patients(&mut self) -> DemoResult<Vec<PatientSummary>> {
        let url = self.urls.get_patients.clone();
        self.log(format!(
            "Calling function {url} to get patients. This function searches patients using the \
             FHIR API."
        ));

        let result = async {
            let response = self
                .http
                .post(&url)
                .header(PROJECT_ID_HEADER, &self.project_id)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(DemoError::Status(response.status().as_u16()));
            }
            Ok::<Value, DemoError>(response.json::<Value>().await?)
        }
        .await;

        match result {
            Ok(json) => {
                self.log("Successfully got patients".into());
                let patients = choose_json(json, &self.app_env);
                Ok(patients
                    .as_array()
                    .map(|list| list.iter().map(PatientSummary::from_value).collect())
                    .unwrap_or_default())
            }
            Err(e) => {
                self.log("Error getting patients".into());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn form() -> PatientForm {
        PatientForm {
            first_name: Some("Ann".into()),
            last_name: Some("Lee".into()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 2, 3),
            address: Some("1 Main St".into()),
        }
    }

    fn base_urls(server: &MockServer) -> FunctionUrls {
        FunctionUrls::resolve(Some(&server.uri()), None, None).expect("urls")
    }

    fn patient_json() -> Value {
        json!({
            "resourceType": "Patient",
            "id": "p1",
            "name": [{"given": ["Ann"], "family": "Lee"}],
            "birthDate": "1990-02-03",
            "address": [{"line": ["1 Main St"]}]
        })
    }

    #[test]
    fn incomplete_form_is_rejected() {
        let mut f = form();
        f.address = Some(String::new());
        let err = f.to_body().expect_err("blank address");
        assert_eq!(err.to_string(), "Error: All fields are required");

        let mut f = form();
        f.date_of_birth = None;
        assert!(matches!(f.to_body(), Err(DemoError::MissingFields)));
    }

    #[test]
    fn explicit_function_urls_override_the_base() {
        let urls = FunctionUrls::resolve(
            Some("http://localhost:3001/local/"),
            Some("https://fn.example.com/zambda/abc/execute".into()),
            None,
        )
        .expect("urls");
        assert_eq!(urls.create_patient, "https://fn.example.com/zambda/abc/execute");
        assert_eq!(urls.get_patients, "http://localhost:3001/local/get-patients");

        let err = FunctionUrls::resolve(None, Some("https://fn.example.com/a".into()), None)
            .expect_err("no get-patients URL");
        assert!(matches!(err, DemoError::MissingUrl(GET_PATIENTS)));
    }

    #[test]
    fn output_is_unwrapped_outside_local() {
        let wrapped = json!({"output": [1, 2]});
        assert_eq!(choose_json(wrapped.clone(), "local"), wrapped);
        assert_eq!(choose_json(wrapped, "dev"), json!([1, 2]));
    }

    #[test]
    fn summary_reads_name_and_first_address_line() {
        let summary = PatientSummary::from_value(&patient_json());
        assert_eq!(summary.name.as_deref(), Some("Ann Lee"));
        assert_eq!(summary.address.as_deref(), Some("1 Main St"));
        assert_eq!(summary.date_of_birth.as_deref(), Some("1990-02-03"));

        let bare = PatientSummary::from_value(&json!({"id": "p2"}));
        assert_eq!(bare.name, None);
        assert_eq!(bare.address, None);
    }

    #[tokio::test]
    async fn add_patient_creates_then_refreshes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/local/create-patient"))
            .and(header("x-zapehr-project-id", "proj-1"))
            .and(body_json(json!({
                "firstName": "Ann",
                "lastName": "Lee",
                "dateOfBirth": "1990-02-03",
                "address": "1 Main St"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/local/get-patients"))
            .and(header("x-zapehr-project-id", "proj-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([patient_json()])))
            .expect(1)
            .mount(&server)
            .await;

        let urls = FunctionUrls::resolve(Some(&format!("{}/local/", server.uri())), None, None)
            .expect("urls");
        let mut client = DemoClient::new(urls, "proj-1", "local").expect("client");
        let patients = client.add_patient(&form()).await.expect("added");

        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].id.as_deref(), Some("p1"));
        assert_eq!(client.logs().len(), 4);
        assert_eq!(client.logs()[1], "Successfully created patient");
        assert_eq!(client.logs()[3], "Successfully got patients");
    }

    #[tokio::test]
    async fn incomplete_form_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut client = DemoClient::new(base_urls(&server), "proj-1", "local").expect("client");
        let result = client.add_patient(&PatientForm::default()).await;
        assert!(matches!(result, Err(DemoError::MissingFields)));
        assert!(client.logs().is_empty());
    }

    #[tokio::test]
    async fn failed_search_is_logged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/get-patients"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut client = DemoClient::new(base_urls(&server), "proj-1", "dev").expect("client");
        let result = client.search_patients().await;
        assert!(matches!(result, Err(DemoError::Status(500))));
        assert_eq!(client.logs().last().map(String::as_str), Some("Error getting patients"));
    }

    #[tokio::test]
    async fn deployed_functions_are_called_at_their_own_urls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/zambda/create-id/execute"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"output": {"message": "ok"}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/zambda/list-id/execute"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"output": [patient_json()]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let urls = FunctionUrls::resolve(
            None,
            Some(format!("{}/zambda/create-id/execute", server.uri())),
            Some(format!("{}/zambda/list-id/execute", server.uri())),
        )
        .expect("urls");
        let mut client = DemoClient::new(urls, "proj-1", "production").expect("client");
        let patients = client.add_patient(&form()).await.expect("added");
        assert_eq!(patients[0].id.as_deref(), Some("p1"));
    }

    #[tokio::test]
    async fn deployed_results_are_unwrapped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/get-patients"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"output": [patient_json()]})),
            )
            .mount(&server)
            .await;

        let mut client = DemoClient::new(base_urls(&server), "proj-1", "dev").expect("client");
        let patients = client.search_patients().await.expect("patients");
        assert_eq!(patients[0].name.as_deref(), Some("Ann Lee"));
    }
}
