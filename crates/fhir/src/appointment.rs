//! FHIR Appointment and Slot views.

use crate::bundle::reference_id;
use crate::datatypes::{Meta, Reference};
use crate::ResourceType;
use serde::{Deserialize, Serialize};

/// Lenient view of a FHIR `Appointment`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Appointment {
    pub id: Option<String>,
    pub meta: Option<Meta>,
    pub status: Option<String>,
    pub start: Option<String>,
    pub created: Option<String>,
    pub description: Option<String>,
    pub participant: Vec<AppointmentParticipant>,
    pub slot: Vec<Reference>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppointmentParticipant {
    pub actor: Option<Reference>,
    pub status: Option<String>,
}

impl Appointment {
    /// Id of the patient referenced by the first participant.
    ///
    /// Only the first participant is consulted; the patient is always booked first.
    pub fn patient_id(&self) -> Option<&str> {
        let reference = self
            .participant
            .first()?
            .actor
            .as_ref()?
            .reference
            .as_deref()?;
        Some(reference_id(reference, ResourceType::Patient))
    }

    /// Id of the first booked slot, taken from the segment after `Slot/`.
    pub fn slot_id(&self) -> Option<&str> {
        let reference = self.slot.first()?.reference.as_deref()?;
        reference.split('/').nth(1).filter(|id| !id.is_empty())
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.last_updated.as_deref())
    }
}

/// Lenient view of a FHIR `Slot`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Slot {
    pub id: Option<String>,
    pub status: Option<String>,
}
