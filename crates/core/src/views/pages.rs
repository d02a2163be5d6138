//! Page view models.
//!
//! Each page carries its document title and navigation alongside the panels and tables it shows,
//! so a client only lays the data out.

use super::panels::{
    appointment_patient_details, consent_panel, contact_details, patient_details, payer_panel,
    ConsentPanel, DetailPanel,
};
use super::tables::{AppointmentTable, PatientTable};
use crate::config::CoreConfig;
use crate::records::{AppointmentRecord, PatientRecord};
use fhir::datetime::format_optional;
use fhir::{DateStyle, Patient};
use serde::Serialize;
use utoipa::ToSchema;

/// Link target marking the current page in a breadcrumb chain.
pub const CURRENT_PAGE_LINK: &str = "#";

#[derive(Clone, Debug, Serialize, PartialEq, Eq, ToSchema)]
pub struct Breadcrumb {
    pub link: String,
    pub label: String,
}

impl Breadcrumb {
    pub fn new(link: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            label: label.into(),
        }
    }

    pub fn current(label: impl Into<String>) -> Self {
        Self::new(CURRENT_PAGE_LINK, label)
    }
}

/// Entry in the patient section's side navigation. `path` is relative to `/patient/{id}/`.
#[derive(Clone, Debug, Serialize, PartialEq, Eq, ToSchema)]
pub struct SidebarItem {
    pub label: String,
    pub path: String,
}

pub fn patient_sidebar_items() -> Vec<SidebarItem> {
    [("Details", "."), ("Insurance", "insurance")]
        .into_iter()
        .map(|(label, path)| SidebarItem {
            label: label.into(),
            path: path.into(),
        })
        .collect()
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq, ToSchema)]
pub struct AppointmentsPage {
    pub document_title: String,
    pub title: String,
    pub table: AppointmentTable,
}

impl AppointmentsPage {
    pub fn new(config: &CoreConfig, title: &str, table: AppointmentTable) -> Self {
        Self {
            document_title: config.document_title(title),
            title: title.to_string(),
            table,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq, ToSchema)]
pub struct PatientsPage {
    pub document_title: String,
    pub title: String,
    pub table: PatientTable,
}

impl PatientsPage {
    pub fn new(config: &CoreConfig, table: PatientTable) -> Self {
        Self {
            document_title: config.document_title("Patients"),
            title: "Patients".into(),
            table,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq, ToSchema)]
pub struct AppointmentPage {
    pub document_title: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub appointment_id: String,
    pub status: Option<String>,
    /// Start in `time` style.
    pub start: Option<String>,
    /// `Appointment.created` in `time` style.
    pub created: Option<String>,
    pub patient_details: DetailPanel,
    pub contact_details: DetailPanel,
    pub consents: ConsentPanel,
    pub payer: DetailPanel,
    /// Confirmation text for the cancel action.
    pub cancel_prompt: String,
}

impl AppointmentPage {
    pub fn new(config: &CoreConfig, appointment_id: &str, record: &AppointmentRecord) -> Self {
        let appointment = &record.appointment;
        let start = format_optional(appointment.start.as_deref(), DateStyle::Time);

        Self {
            document_title: config.document_title(start.as_deref().unwrap_or("Appointment")),
            breadcrumbs: vec![
                Breadcrumb::new("/appointments", "Appointments"),
                Breadcrumb::current(appointment_id),
            ],
            appointment_id: appointment_id.to_string(),
            status: appointment.status.clone(),
            created: format_optional(appointment.created.as_deref(), DateStyle::Time),
            patient_details: appointment_patient_details(
                &record.patient,
                appointment.description.as_deref(),
            ),
            contact_details: contact_details(record.patient.contact.first()),
            consents: consent_panel(record, config.consents_domain()),
            payer: payer_panel(record),
            cancel_prompt: cancel_prompt(config, start.as_deref()),
            start,
        }
    }
}

/// "Are you sure you want to cancel the appointment with <organisation> on <start>?"
pub fn cancel_prompt(config: &CoreConfig, start: Option<&str>) -> String {
    format!(
        "Are you sure you want to cancel the appointment with {} on {}?",
        config.organization_name_long(),
        start.unwrap_or_default()
    )
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq, ToSchema)]
pub struct PatientPage {
    pub document_title: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub sidebar: Vec<SidebarItem>,
    pub patient_id: String,
    pub name: Option<String>,
    /// `meta.lastUpdated` in `time` style.
    pub last_updated: Option<String>,
    pub patient_details: DetailPanel,
    pub contact_details: DetailPanel,
    pub appointments: AppointmentTable,
}

impl PatientPage {
    pub fn new(
        config: &CoreConfig,
        patient_id: &str,
        record: &PatientRecord,
        appointments: AppointmentTable,
    ) -> Self {
        let patient = &record.patient;
        let name = patient.short_name();

        Self {
            document_title: config.document_title(name.as_deref().unwrap_or("Patient")),
            breadcrumbs: vec![
                Breadcrumb::new("/patients", "Patients"),
                Breadcrumb::current(name.clone().unwrap_or_default()),
            ],
            sidebar: patient_sidebar_items(),
            patient_id: patient_id.to_string(),
            last_updated: format_optional(patient.last_updated(), DateStyle::Time),
            patient_details: patient_details(patient),
            contact_details: contact_details(patient.contact.first()),
            appointments,
            name,
        }
    }
}

/// Insurance section of a patient. Only the navigation is populated so far.
#[derive(Clone, Debug, Serialize, PartialEq, Eq, ToSchema)]
pub struct InsurancePage {
    pub document_title: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub sidebar: Vec<SidebarItem>,
    pub patient_id: String,
    pub name: Option<String>,
}

impl InsurancePage {
    pub fn new(config: &CoreConfig, patient_id: &str, patient: &Patient) -> Self {
        let name = patient.short_name();
        Self {
            document_title: config.document_title("Insurance"),
            breadcrumbs: vec![
                Breadcrumb::new("/patients", "Patients"),
                Breadcrumb::new(
                    format!("/patient/{patient_id}"),
                    name.clone().unwrap_or_default(),
                ),
                Breadcrumb::current("Insurance"),
            ],
            sidebar: patient_sidebar_items(),
            patient_id: patient_id.to_string(),
            name,
        }
    }
}

/// Result of cancelling an appointment.
#[derive(Clone, Debug, Serialize, PartialEq, Eq, ToSchema)]
pub struct CancelOutcome {
    pub appointment_id: String,
    pub status: String,
    /// Slot set back to `free`, if the appointment held one.
    pub freed_slot_id: Option<String>,
    /// Where a client goes next.
    pub redirect: String,
}
