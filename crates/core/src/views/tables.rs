//! Appointment and patient table rows.

use chrono::{DateTime, FixedOffset, NaiveDate};
use fhir::datetime::parse_iso;
use fhir::{format_date_time, Appointment, DateStyle, Patient};
use serde::Serialize;
use utoipa::ToSchema;

pub const UPCOMING_APPOINTMENTS_EMPTY: &str =
    "There are no appointments on this date for these patients. Please update your filters above.";
pub const PATIENT_APPOINTMENTS_EMPTY: &str = "This patient does not have any appointments.";
pub const PATIENTS_EMPTY: &str = "There are no patients. Please update the search filter above.";

#[derive(Clone, Debug, Serialize, PartialEq, Eq, ToSchema)]
pub struct AppointmentRow {
    pub id: String,
    pub patient: String,
    pub patient_dob: String,
    pub appointment: String,
    pub status: String,
    pub created: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq, ToSchema)]
pub struct PatientRow {
    pub id: String,
    pub patient: String,
    pub date_of_birth: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq, ToSchema)]
pub struct AppointmentTable {
    pub rows: Vec<AppointmentRow>,
    /// Shown in place of the table when `rows` is empty.
    pub empty_message: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq, ToSchema)]
pub struct PatientTable {
    pub rows: Vec<PatientRow>,
    pub empty_message: String,
}

/// Row filters applied after the search.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowFilter {
    /// Case-insensitive substring of the patient display name.
    pub name: Option<String>,
    /// Calendar day the appointment starts on, in the appointment's own offset.
    pub date: Option<NaiveDate>,
}

impl RowFilter {
    fn matches_name(&self, display_name: &str) -> bool {
        match self.name.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => display_name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }

    fn matches_date(&self, start: Option<&DateTime<FixedOffset>>) -> bool {
        match self.date {
            Some(day) => start.is_some_and(|s| s.date_naive() == day),
            None => true,
        }
    }
}

/// Upper-cases the first character and leaves the rest alone.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn display_or_raw(iso: &str, style: DateStyle) -> String {
    format_date_time(iso, style).unwrap_or_else(|_| iso.to_string())
}

/// Builds appointment rows, newest `meta.lastUpdated` first.
///
/// Each appointment is paired with the patient its first participant references. Appointments
/// are dropped when that patient is missing or lacks a given name or birth date, or when the
/// appointment itself has no `start` or `meta.lastUpdated`.
pub fn appointment_rows(
    appointments: &[Appointment],
    patients: &[Patient],
    filter: &RowFilter,
) -> Vec<AppointmentRow> {
    let mut rows: Vec<(Option<DateTime<FixedOffset>>, AppointmentRow)> = appointments
        .iter()
        .filter_map(|appointment| {
            let patient_id = appointment.patient_id()?;
            let start = appointment.start.as_deref()?;
            let created = appointment.last_updated()?;
            let patient = patients
                .iter()
                .find(|p| p.id.as_deref() == Some(patient_id) && p.has_listing_fields())?;

            let display_name = patient.display_name()?;
            let start_at = parse_iso(start).ok();
            if !filter.matches_name(&display_name) || !filter.matches_date(start_at.as_ref()) {
                return None;
            }

            let row = AppointmentRow {
                id: appointment.id.clone().unwrap_or_default(),
                patient: display_name,
                patient_dob: display_or_raw(patient.birth_date.as_deref()?, DateStyle::Date),
                appointment: display_or_raw(start, DateStyle::Time),
                status: capitalize(appointment.status.as_deref().unwrap_or_default()),
                created: display_or_raw(created, DateStyle::Time),
            };
            Some((parse_iso(created).ok(), row))
        })
        .collect();

    // Unparseable creation times sort last.
    rows.sort_by(|(a, _), (b, _)| b.cmp(a));
    rows.into_iter().map(|(_, row)| row).collect()
}

/// Builds patient rows sorted by display name.
///
/// Patients without a given name or birth date are skipped.
pub fn patient_rows(patients: &[Patient], filter: &RowFilter) -> Vec<PatientRow> {
    let mut rows: Vec<PatientRow> = patients
        .iter()
        .filter(|p| p.has_listing_fields())
        .filter_map(|patient| {
            let display_name = patient.display_name()?;
            if !filter.matches_name(&display_name) {
                return None;
            }
            Some(PatientRow {
                id: patient.id.clone().unwrap_or_default(),
                patient: display_name,
                date_of_birth: display_or_raw(patient.birth_date.as_deref()?, DateStyle::Date),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        a.patient
            .to_lowercase()
            .cmp(&b.patient.to_lowercase())
            .then_with(|| a.patient.cmp(&b.patient))
    });
    rows
}
