//! FHIR Patient view and the minimal patient used by the create-patient function.
//!
//! Responsibilities:
//! - Define a lenient view over the Patient fields the application reads
//! - Provide accessors matching how the pages present a patient (first name, ZIP, ...)
//! - Build the wire JSON for a newly registered patient

use crate::datatypes::{Address, ContactPoint, Extension, HumanName, Identifier, Meta};
use crate::ResourceType;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ============================================================================
// Patient view
// ============================================================================

/// Lenient view of a FHIR `Patient`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Patient {
    pub id: Option<String>,
    pub meta: Option<Meta>,
    pub name: Vec<HumanName>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub address: Vec<Address>,
    pub contact: Vec<PatientContact>,
    pub identifier: Vec<Identifier>,
}

/// A contact party (guardian, next of kin, ...) recorded on the patient.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PatientContact {
    pub name: Option<HumanName>,
    pub telecom: Vec<ContactPoint>,
    pub address: Option<Address>,
    pub extension: Vec<Extension>,
}

impl Patient {
    /// The primary (first) name.
    pub fn primary_name(&self) -> Option<&HumanName> {
        self.name.first()
    }

    pub fn first_name(&self) -> Option<&str> {
        self.primary_name().and_then(HumanName::first_given)
    }

    pub fn last_name(&self) -> Option<&str> {
        self.primary_name().and_then(|n| n.family.as_deref())
    }

    /// Display name used in tables: all given names then family name.
    pub fn display_name(&self) -> Option<String> {
        self.primary_name().map(HumanName::display_name)
    }

    /// Short name used for page titles and breadcrumbs: first given name and family name.
    pub fn short_name(&self) -> Option<String> {
        let name = self.primary_name()?;
        Some(format!(
            "{} {}",
            name.first_given().unwrap_or_default(),
            name.family.as_deref().unwrap_or_default()
        ))
    }

    /// Whether the patient has a primary name with at least one given name and a birth date.
    ///
    /// Table rows are only produced for patients that satisfy this.
    pub fn has_listing_fields(&self) -> bool {
        self.primary_name().is_some_and(|n| !n.given.is_empty()) && self.birth_date.is_some()
    }

    pub fn postal_code(&self) -> Option<&str> {
        self.address.first().and_then(|a| a.postal_code.as_deref())
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.last_updated.as_deref())
    }

    /// The first identifier's value, but only when its assigner display matches `assigner`.
    pub fn identifier_assigned_by(&self, assigner: &str) -> Option<&str> {
        let identifier = self.identifier.first()?;
        let display = identifier.assigner.as_ref()?.display.as_deref()?;
        if display == assigner {
            identifier.value.as_deref()
        } else {
            None
        }
    }
}

// ============================================================================
// New patient
// ============================================================================

/// The four fields collected when registering a patient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    /// ISO 8601 date (`YYYY-MM-DD`).
    pub birth_date: String,
    /// Single free-text address line.
    pub address: String,
}

impl NewPatient {
    /// Render the Patient resource to POST to the FHIR API.
    pub fn to_resource(&self) -> Value {
        json!({
            "resourceType": ResourceType::Patient.as_str(),
            "name": [{
                "family": self.last_name,
                "given": [self.first_name],
            }],
            "birthDate": self.birth_date,
            "address": [{
                "line": [self.address],
            }],
        })
    }
}
