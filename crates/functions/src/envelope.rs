//! Invocation envelope shared by every function.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Secret values supplied by the function runtime, keyed by name.
pub type Secrets = HashMap<String, String>;

/// Input to a function invocation.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct FunctionInput {
    pub headers: Option<Value>,
    /// Raw request body; functions parse it themselves.
    pub body: Option<String>,
    /// When present, secrets are read only from here; otherwise from the environment.
    pub secrets: Option<Secrets>,
}

impl FunctionInput {
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Default::default()
        }
    }

    pub fn with_secrets(mut self, secrets: Secrets) -> Self {
        self.secrets = Some(secrets);
        self
    }
}

/// Result of a function invocation. `body` is a serialised JSON document.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionOutput {
    pub status_code: u16,
    pub body: String,
}

impl FunctionOutput {
    /// Serialises `payload` as the body.
    pub fn json(status_code: u16, payload: &Value) -> Self {
        Self {
            status_code,
            body: payload.to_string(),
        }
    }

    /// `{"error": message}`
    pub fn error(status_code: u16, message: &str) -> Self {
        Self::json(status_code, &serde_json::json!({ "error": message }))
    }

    /// `500 {"error":"Internal service error"}`
    pub fn internal_error() -> Self {
        Self::error(500, "Internal service error")
    }

    /// Parses the body back into JSON.
    pub fn body_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}
