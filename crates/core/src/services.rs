//! Page services.
//!
//! Each page runs one FHIR search (or read) with the caller's bearer token, reassembles the
//! result into a record and shapes it into the page view model. The search parameter builders
//! are kept separate and pure so the exact queries can be checked without a server.

use crate::client::{default_http_client, FhirClient, PlatformClient, User};
use crate::config::CoreConfig;
use crate::constants::SEARCH_COUNT;
use crate::records::{AppointmentListing, AppointmentRecord, PatientRecord};
use crate::validation::validate_resource_id;
use crate::views::pages::{
    AppointmentPage, AppointmentsPage, CancelOutcome, InsurancePage, PatientPage, PatientsPage,
};
use crate::views::tables::{
    appointment_rows, patient_rows, AppointmentTable, PatientTable, RowFilter,
    PATIENTS_EMPTY, PATIENT_APPOINTMENTS_EMPTY, UPCOMING_APPOINTMENTS_EMPTY,
};
use crate::{EhrError, EhrResult};
use chrono::{DateTime, SecondsFormat, Utc};
use fhir::datetime::parse_iso;
use fhir::{Appointment, PatchOperation, Patient, ResourceType, SearchParams};

// ============================================================================
// Search parameters
// ============================================================================

/// Date range and status filter for the appointment search page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppointmentQuery {
    /// Lower bound, any ISO date or date-time.
    pub start: Option<String>,
    /// Upper bound, any ISO date or date-time.
    pub end: Option<String>,
    /// Comma-separated statuses, any case.
    pub status: Option<String>,
}

fn to_search_instant(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Booked appointments from `now` onwards, with their patients.
pub fn upcoming_appointments_params(now: DateTime<Utc>) -> SearchParams {
    SearchParams::new()
        .count(SEARCH_COUNT)
        .sort("date")
        .with("date", format!("ge{}", to_search_instant(now)))
        .with("status", "booked")
        .include("Appointment:patient")
}

/// Appointments within an optional date range and status set, with their patients.
///
/// Bounds are normalised to UTC instants; statuses are lower-cased and re-joined with commas.
///
/// # Errors
///
/// Returns [`EhrError::InvalidInput`] if a bound is not an ISO date or date-time.
pub fn appointment_search_params(query: &AppointmentQuery) -> EhrResult<SearchParams> {
    let bound = |prefix: &str, value: Option<&str>| -> EhrResult<Option<String>> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => {
                let instant = parse_iso(v)
                    .map_err(|_| EhrError::InvalidInput(format!("invalid date '{v}'")))?;
                Ok(Some(format!(
                    "{prefix}{}",
                    to_search_instant(instant.with_timezone(&Utc))
                )))
            }
            None => Ok(None),
        }
    };

    let status = query.status.as_deref().map(|s| {
        s.split(',')
            .map(|part| part.trim().to_lowercase())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    });

    Ok(SearchParams::new()
        .count(SEARCH_COUNT)
        .sort("date")
        .with_optional("date", bound("ge", query.start.as_deref())?)
        .with_optional("date", bound("le", query.end.as_deref())?)
        .with_optional("status", status)
        .include("Appointment:patient"))
}

/// One appointment with its patient, consents, coverage and the people and payer they reference.
pub fn appointment_detail_params(id: &str) -> SearchParams {
    SearchParams::new()
        .id(id)
        .include("Appointment:patient")
        .revinclude_iterate("Consent:patient")
        .include_iterate("Consent:consentor:RelatedPerson")
        .revinclude_iterate("Coverage:patient")
        .include_iterate("Coverage:subscriber:RelatedPerson")
        .include_iterate("Coverage:payor:Organization")
}

/// One patient with every appointment referencing them.
pub fn patient_detail_params(id: &str) -> SearchParams {
    SearchParams::new()
        .id(id)
        .revinclude("Appointment:patient")
}

pub fn patient_list_params() -> SearchParams {
    SearchParams::new().count(SEARCH_COUNT)
}

// ============================================================================
// Service
// ============================================================================

/// Builds EHR pages from the FHIR API on behalf of a signed-in user.
#[derive(Clone, Debug)]
pub struct EhrService {
    config: CoreConfig,
    fhir: FhirClient,
    platform: PlatformClient,
}

impl EhrService {
    /// Builds the service with the default outbound timeout.
    ///
    /// # Errors
    ///
    /// Returns [`EhrError::Http`] if the HTTP client cannot be built.
    pub fn new(config: CoreConfig) -> EhrResult<Self> {
        Ok(Self::with_http(config, default_http_client()?))
    }

    pub fn with_http(config: CoreConfig, http: reqwest::Client) -> Self {
        Self {
            fhir: FhirClient::with_http(http.clone(), config.fhir_url()),
            platform: PlatformClient::with_http(http, config.platform_url()),
            config,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub async fn current_user(&self, token: &str) -> EhrResult<User> {
        self.platform.current_user(token).await
    }

    async fn listing(&self, params: &SearchParams, token: &str) -> EhrResult<AppointmentListing> {
        let resources = self
            .fhir
            .search(ResourceType::Appointment, params, token)
            .await?;
        AppointmentListing::from_resources(&resources)
    }

    /// Upcoming booked appointments.
    pub async fn upcoming_appointments(
        &self,
        token: &str,
        filter: &RowFilter,
    ) -> EhrResult<AppointmentsPage> {
        let listing = self
            .listing(&upcoming_appointments_params(Utc::now()), token)
            .await?;
        let rows = appointment_rows(&listing.appointments, &listing.patients, filter);
        tracing::debug!(rows = rows.len(), "built upcoming appointments table");

        Ok(AppointmentsPage::new(
            &self.config,
            "Appointments",
            AppointmentTable {
                rows,
                empty_message: UPCOMING_APPOINTMENTS_EMPTY.into(),
            },
        ))
    }

    /// Appointments matching a date range and status filter.
    pub async fn search_appointments(
        &self,
        token: &str,
        query: &AppointmentQuery,
        filter: &RowFilter,
    ) -> EhrResult<AppointmentsPage> {
        let listing = self
            .listing(&appointment_search_params(query)?, token)
            .await?;
        let rows = appointment_rows(&listing.appointments, &listing.patients, filter);

        Ok(AppointmentsPage::new(
            &self.config,
            "Appointments Search",
            AppointmentTable {
                rows,
                empty_message: UPCOMING_APPOINTMENTS_EMPTY.into(),
            },
        ))
    }

    /// Appointment detail page.
    ///
    /// # Errors
    ///
    /// Returns [`EhrError::InvalidInput`] for a malformed id, [`EhrError::NotFound`] if the
    /// search finds no appointment or patient, and the client's errors otherwise.
    pub async fn appointment(&self, token: &str, id: &str) -> EhrResult<AppointmentPage> {
        validate_resource_id(id)?;
        let resources = self
            .fhir
            .search(ResourceType::Appointment, &appointment_detail_params(id), token)
            .await?;
        let record = AppointmentRecord::from_resources(&resources)?;
        Ok(AppointmentPage::new(&self.config, id, &record))
    }

    /// Cancels an appointment and frees its slot.
    ///
    /// The appointment is read first to find the slot. Its status is then patched to
    /// `cancelled`, and the slot (if any) to `free`.
    pub async fn cancel_appointment(&self, token: &str, id: &str) -> EhrResult<CancelOutcome> {
        validate_resource_id(id)?;
        let appointment: Appointment = self
            .fhir
            .read(ResourceType::Appointment, id, token)
            .await?
            .parse()?;

        self.fhir
            .patch(
                ResourceType::Appointment,
                id,
                &[PatchOperation::set_status("cancelled")],
                token,
            )
            .await?;
        tracing::info!(appointment_id = %id, "appointment cancelled");

        let freed_slot_id = match appointment.slot_id() {
            Some(slot_id) => {
                self.fhir
                    .patch(
                        ResourceType::Slot,
                        slot_id,
                        &[PatchOperation::set_status("free")],
                        token,
                    )
                    .await?;
                tracing::info!(%slot_id, "slot freed");
                Some(slot_id.to_string())
            }
            None => None,
        };

        Ok(CancelOutcome {
            appointment_id: id.to_string(),
            status: "cancelled".into(),
            freed_slot_id,
            redirect: "/appointments".into(),
        })
    }

    /// Patient list page.
    pub async fn patients(&self, token: &str, filter: &RowFilter) -> EhrResult<PatientsPage> {
        let resources = self
            .fhir
            .search(ResourceType::Patient, &patient_list_params(), token)
            .await?;
        let patients: Vec<Patient> = fhir::bundle::parse_all(&resources, ResourceType::Patient)?;

        Ok(PatientsPage::new(
            &self.config,
            PatientTable {
                rows: patient_rows(&patients, filter),
                empty_message: PATIENTS_EMPTY.into(),
            },
        ))
    }

    /// Patient detail page with their appointments.
    pub async fn patient(&self, token: &str, id: &str) -> EhrResult<PatientPage> {
        validate_resource_id(id)?;
        let resources = self
            .fhir
            .search(ResourceType::Patient, &patient_detail_params(id), token)
            .await?;
        let record = PatientRecord::from_resources(&resources)?;
        let table = AppointmentTable {
            rows: appointment_rows(
                &record.appointments,
                std::slice::from_ref(&record.patient),
                &RowFilter::default(),
            ),
            empty_message: PATIENT_APPOINTMENTS_EMPTY.into(),
        };
        Ok(PatientPage::new(&self.config, id, &record, table))
    }

    /// Insurance section of a patient.
    pub async fn insurance(&self, token: &str, id: &str) -> EhrResult<InsurancePage> {
        validate_resource_id(id)?;
        let patient: Patient = self
            .fhir
            .read(ResourceType::Patient, id, token)
            .await?
            .parse()?;
        Ok(InsurancePage::new(&self.config, id, &patient))
    }
}
