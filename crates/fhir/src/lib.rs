//! FHIR R4 boundary support for the EHR gateway.
//!
//! This crate provides **wire views** and **format helpers** for resources exchanged with a
//! third-party FHIR REST API:
//! - a loosely-typed [`Resource`] wrapper that keeps the full JSON document
//! - lenient typed views for the fields the application reads (Patient, Appointment, ...)
//! - search bundle unwrapping and `_include`/`_revinclude` reassembly
//! - search parameter lists and FHIR-Patch operations
//! - date/time display formatting
//!
//! No HTTP transport lives here; see `ehr-core` for the REST client.

pub mod appointment;
pub mod bundle;
pub mod consent;
pub mod datatypes;
pub mod datetime;
pub mod patch;
pub mod patient;
pub mod resource;
pub mod search;

pub use appointment::{Appointment, AppointmentParticipant, Slot};
pub use bundle::{Bundle, BundleEntry};
pub use consent::{Consent, Coverage, Organization, RelatedPerson};
pub use datatypes::{Address, CodeableConcept, ContactPoint, HumanName, Meta, Reference};
pub use datetime::{format_date_time, DateStyle};
pub use patch::{PatchOp, PatchOperation};
pub use patient::{NewPatient, Patient, PatientContact};
pub use resource::{Resource, ResourceType};
pub use search::{SearchParam, SearchParams};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
