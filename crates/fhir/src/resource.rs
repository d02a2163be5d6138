//! Loosely-typed FHIR resources.
//!
//! Resources travel through the application as [`Resource`], a thin wrapper around the raw JSON
//! document returned by the FHIR API. Nothing is dropped on the way through; typed views (for
//! example [`crate::Patient`]) are deserialised on demand with [`Resource::parse`].

use crate::{FhirError, FhirResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// FHIR resource types this application works with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Appointment,
    Bundle,
    Consent,
    Coverage,
    Organization,
    Patient,
    RelatedPerson,
    Slot,
}

impl ResourceType {
    /// The `resourceType` string used on the wire and in REST paths.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Appointment => "Appointment",
            ResourceType::Bundle => "Bundle",
            ResourceType::Consent => "Consent",
            ResourceType::Coverage => "Coverage",
            ResourceType::Organization => "Organization",
            ResourceType::Patient => "Patient",
            ResourceType::RelatedPerson => "RelatedPerson",
            ResourceType::Slot => "Slot",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Appointment" => Ok(ResourceType::Appointment),
            "Bundle" => Ok(ResourceType::Bundle),
            "Consent" => Ok(ResourceType::Consent),
            "Coverage" => Ok(ResourceType::Coverage),
            "Organization" => Ok(ResourceType::Organization),
            "Patient" => Ok(ResourceType::Patient),
            "RelatedPerson" => Ok(ResourceType::RelatedPerson),
            "Slot" => Ok(ResourceType::Slot),
            other => Err(FhirError::InvalidInput(format!(
                "unsupported resourceType '{other}'"
            ))),
        }
    }
}

/// A single FHIR resource as returned by the API.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Resource(Value);

impl Resource {
    /// Wraps a JSON document. No validation is performed.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The raw `resourceType` string, if present.
    pub fn resource_type(&self) -> Option<&str> {
        self.0.get("resourceType").and_then(Value::as_str)
    }

    /// Whether this resource's `resourceType` equals `resource_type`.
    pub fn is(&self, resource_type: ResourceType) -> bool {
        self.resource_type() == Some(resource_type.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Deserialises a typed view of this resource.
    ///
    /// Uses `serde_path_to_error` so a failure names the offending field (e.g.
    /// `participant[0].actor`).
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if a field the view reads has an unexpected type.
    pub fn parse<T: DeserializeOwned>(&self) -> FhirResult<T> {
        match serde_path_to_error::deserialize::<_, T>(&self.0) {
            Ok(parsed) => Ok(parsed),
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                Err(FhirError::Translation(format!(
                    "{} schema mismatch at {path}: {source}",
                    self.resource_type().unwrap_or("resource")
                )))
            }
        }
    }
}

impl From<Value> for Resource {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
