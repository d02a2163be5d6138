//! Typed records reassembled from search-with-includes results.
//!
//! A single FHIR search returns a flat list mixing the primary resource with everything pulled
//! in through `_include` / `_revinclude`. The types here pick that list apart into the shape
//! each page reads.

use crate::{EhrError, EhrResult};
use fhir::bundle::{parse_all, parse_first, referenced};
use fhir::{
    Appointment, Consent, Coverage, Organization, Patient, RelatedPerson, Resource, ResourceType,
};

/// Appointments and the patients included alongside them.
#[derive(Clone, Debug, Default)]
pub struct AppointmentListing {
    pub appointments: Vec<Appointment>,
    pub patients: Vec<Patient>,
}

impl AppointmentListing {
    pub fn from_resources(resources: &[Resource]) -> EhrResult<Self> {
        Ok(Self {
            appointments: parse_all(resources, ResourceType::Appointment)?,
            patients: parse_all(resources, ResourceType::Patient)?,
        })
    }
}

/// Everything shown on the appointment detail page.
#[derive(Clone, Debug)]
pub struct AppointmentRecord {
    pub appointment: Appointment,
    pub patient: Patient,
    pub consents: Vec<Consent>,
    /// RelatedPerson who signed the first consent.
    pub consent_performer: Option<RelatedPerson>,
    pub coverage: Option<Coverage>,
    /// RelatedPerson holding the coverage policy.
    pub coverage_subscriber: Option<RelatedPerson>,
    pub organization: Option<Organization>,
}

impl AppointmentRecord {
    /// Reassembles an appointment detail search result.
    ///
    /// Consent performers and coverage subscribers are both RelatedPersons, so each is matched
    /// by the reference held on its owning resource rather than by type alone.
    ///
    /// # Errors
    ///
    /// Returns [`EhrError::NotFound`] if the result holds no Appointment or no Patient, and
    /// [`EhrError::Fhir`] if a resource does not fit its typed view.
    pub fn from_resources(resources: &[Resource]) -> EhrResult<Self> {
        let appointment: Appointment = parse_first(resources, ResourceType::Appointment)?
            .ok_or_else(|| EhrError::NotFound("Appointment".into()))?;
        let patient: Patient = parse_first(resources, ResourceType::Patient)?
            .ok_or_else(|| EhrError::NotFound("Patient".into()))?;
        let consents: Vec<Consent> = parse_all(resources, ResourceType::Consent)?;
        let coverage: Option<Coverage> = parse_first(resources, ResourceType::Coverage)?;

        let consent_performer: Option<RelatedPerson> = referenced(
            resources,
            ResourceType::RelatedPerson,
            consents.first().and_then(Consent::performer_reference),
        )
        .map(Resource::parse)
        .transpose()?;

        let coverage_subscriber: Option<RelatedPerson> = referenced(
            resources,
            ResourceType::RelatedPerson,
            coverage.as_ref().and_then(Coverage::subscriber_reference),
        )
        .map(Resource::parse)
        .transpose()?;

        Ok(Self {
            appointment,
            patient,
            consents,
            consent_performer,
            coverage,
            coverage_subscriber,
            organization: parse_first(resources, ResourceType::Organization)?,
        })
    }

    /// `category[0].text` of every consent, in result order.
    pub fn consent_texts(&self) -> Vec<&str> {
        self.consents
            .iter()
            .filter_map(Consent::category_text)
            .collect()
    }
}

/// A patient and their appointments.
#[derive(Clone, Debug)]
pub struct PatientRecord {
    pub patient: Patient,
    pub appointments: Vec<Appointment>,
}

impl PatientRecord {
    /// # Errors
    ///
    /// Returns [`EhrError::NotFound`] if the result holds no Patient.
    pub fn from_resources(resources: &[Resource]) -> EhrResult<Self> {
        let patient = parse_first(resources, ResourceType::Patient)?
            .ok_or_else(|| EhrError::NotFound("Patient".into()))?;
        Ok(Self {
            patient,
            appointments: parse_all(resources, ResourceType::Appointment)?,
        })
    }
}
