//! View models returned to clients: tables, detail panels and whole pages.
//!
//! These are plain serialisable structs built from typed FHIR records. Nothing in here performs
//! I/O; see [`crate::services`] for the searches that feed them.

pub mod pages;
pub mod panels;
pub mod tables;

pub use pages::{
    AppointmentPage, AppointmentsPage, Breadcrumb, CancelOutcome, InsurancePage, PatientPage,
    PatientsPage, SidebarItem,
};
pub use panels::{ConsentCheck, ConsentPanel, DetailItem, DetailPanel, PolicyLink};
pub use tables::{AppointmentRow, AppointmentTable, PatientRow, PatientTable, RowFilter};
