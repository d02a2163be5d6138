//! Labelled detail panels shown on the appointment and patient pages.

use crate::constants::CARD_ON_FILE_ASSIGNER;
use crate::records::AppointmentRecord;
use fhir::datatypes::telecom_value;
use fhir::datetime::format_optional;
use fhir::{DateStyle, Patient, PatientContact};
use serde::Serialize;
use utoipa::ToSchema;

/// One `label: value` line. `value` is `None` when the source field is absent.
#[derive(Clone, Debug, Serialize, PartialEq, Eq, ToSchema)]
pub struct DetailItem {
    pub label: String,
    pub value: Option<String>,
}

impl DetailItem {
    pub fn new(label: &str, value: Option<impl Into<String>>) -> Self {
        Self {
            label: label.to_string(),
            value: value.map(Into::into),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq, ToSchema)]
pub struct DetailPanel {
    pub title: String,
    pub items: Vec<DetailItem>,
}

impl DetailPanel {
    pub fn new(title: &str, items: Vec<DetailItem>) -> Self {
        Self {
            title: title.to_string(),
            items,
        }
    }

    /// Value of the first item with `label`.
    pub fn value(&self, label: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|i| i.label == label)
            .and_then(|i| i.value.as_deref())
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq, ToSchema)]
pub struct PolicyLink {
    pub text: String,
    pub href: String,
}

/// A consent form and whether the patient has accepted it.
#[derive(Clone, Debug, Serialize, PartialEq, Eq, ToSchema)]
pub struct ConsentCheck {
    pub title: String,
    pub checked: bool,
    pub links: Vec<PolicyLink>,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq, ToSchema)]
pub struct ConsentPanel {
    pub title: String,
    pub items: Vec<DetailItem>,
    pub checks: Vec<ConsentCheck>,
}

// ============================================================================
// Patient and contact
// ============================================================================

/// "Patient Information": first name, last name, date of birth, sex and ZIP.
pub fn patient_details(patient: &Patient) -> DetailPanel {
    DetailPanel::new(
        "Patient Information",
        vec![
            DetailItem::new("First name", patient.first_name()),
            DetailItem::new("Last name", patient.last_name()),
            DetailItem::new(
                "Date of birth",
                format_optional(patient.birth_date.as_deref(), DateStyle::Date),
            ),
            DetailItem::new("Sex", patient.gender.as_deref()),
            DetailItem::new("ZIP", patient.postal_code()),
        ],
    )
}

/// [`patient_details`] plus the appointment's reason for visit.
pub fn appointment_patient_details(patient: &Patient, description: Option<&str>) -> DetailPanel {
    let mut panel = patient_details(patient);
    panel
        .items
        .push(DetailItem::new("Reason for visit", description));
    panel
}

/// "Contact Information" built from the patient's first contact.
pub fn contact_details(contact: Option<&PatientContact>) -> DetailPanel {
    let name = contact.and_then(|c| c.name.as_ref());
    let address = contact.and_then(|c| c.address.as_ref());
    let telecom = contact.map(|c| c.telecom.as_slice()).unwrap_or_default();

    DetailPanel::new(
        "Contact Information",
        vec![
            DetailItem::new(
                "First name",
                name.filter(|n| !n.given.is_empty())
                    .map(|n| n.given.join(" ")),
            ),
            DetailItem::new("Last name", name.and_then(|n| n.family.as_deref())),
            DetailItem::new(
                "Date of birth",
                format_optional(
                    contact
                        .and_then(|c| c.extension.first())
                        .and_then(|e| e.value_date.as_deref()),
                    DateStyle::Date,
                ),
            ),
            DetailItem::new("Phone number", telecom_value(telecom, "phone")),
            DetailItem::new("Email", telecom_value(telecom, "email")),
            DetailItem::new(
                "Street address",
                address
                    .filter(|a| !a.line.is_empty())
                    .map(|a| a.line.join(", ")),
            ),
            DetailItem::new("City", address.and_then(|a| a.city.as_deref())),
            DetailItem::new("State", address.and_then(|a| a.state.as_deref())),
            DetailItem::new("ZIP", address.and_then(|a| a.postal_code.as_deref())),
        ],
    )
}

// ============================================================================
// Consents
// ============================================================================

/// Human label for a RelatedPerson relationship code.
pub fn relationship_label(code: Option<&str>) -> &'static str {
    match code {
        Some("ONESELF") => "Self",
        Some("PRN") => "Parent/legal guardian",
        Some("O") => "Other",
        _ => "Unknown",
    }
}

/// (check title, consent category text, policy links as (text, path under the consents domain))
const CONSENT_FORMS: [(&str, &str, &[(&str, &str)]); 4] = [
    (
        "Provider Terms & Conditions and Privacy Policy.",
        "Terms & Conditions and Privacy Policy",
        &[
            ("Terms & Conditions", "terms-and-conditions/"),
            ("Privacy Policy", "privacy-policy/"),
        ],
    ),
    (
        "HIPAA Acknowledgement",
        "Notice of Privacy Practices",
        &[("HIPAA Acknowledgement", "notice-of-privacy-practices/")],
    ),
    (
        "Consent to Treat and Guarantee of Payment",
        "Consent to Treat and Guarantee of Payment",
        &[("Consent to Treat and Guarantee of Payment", "BH-consent/")],
    ),
    (
        "Financial Agreement",
        "Financial Policy",
        &[("Financial Agreement", "BH-financial-policy/")],
    ),
];

/// "Accepted Consents": who signed, their relationship, when, and one check per consent form.
///
/// A form is checked when any consent's first category text names it.
pub fn consent_panel(record: &AppointmentRecord, consents_domain: &str) -> ConsentPanel {
    let performer = record.consent_performer.as_ref();
    let texts = record.consent_texts();

    let checks = CONSENT_FORMS
        .iter()
        .map(|(title, category, links)| ConsentCheck {
            title: title.to_string(),
            checked: texts.contains(category),
            links: links
                .iter()
                .map(|(text, path)| PolicyLink {
                    text: text.to_string(),
                    href: format!("{consents_domain}/{path}"),
                })
                .collect(),
        })
        .collect();

    ConsentPanel {
        title: "Accepted Consents".into(),
        items: vec![
            DetailItem::new("Signed by", performer.and_then(|p| p.first_name())),
            DetailItem::new(
                "Relationship to patient",
                Some(relationship_label(
                    performer.and_then(|p| p.relationship_code()),
                )),
            ),
            DetailItem::new(
                "Date & Time",
                format_optional(
                    record.consents.first().and_then(|c| c.date_time.as_deref()),
                    DateStyle::Time,
                ),
            ),
        ],
        checks,
    }
}

// ============================================================================
// Payer
// ============================================================================

/// "Payer": the insuring organisation and policy holder, or self-pay.
///
/// The policy holder is the coverage subscriber when one was included, otherwise the patient.
pub fn payer_panel(record: &AppointmentRecord) -> DetailPanel {
    let patient = &record.patient;

    let items = match &record.organization {
        Some(organization) => {
            let (first, last, birth_date) = match &record.coverage_subscriber {
                Some(holder) => (
                    holder.first_name(),
                    holder.last_name(),
                    holder.birth_date.as_deref(),
                ),
                None => (
                    patient.first_name(),
                    patient.last_name(),
                    patient.birth_date.as_deref(),
                ),
            };
            vec![
                DetailItem::new("Payer", organization.name.as_deref()),
                DetailItem::new("Policy holder's first name", first),
                DetailItem::new("Policy holder's last name", last),
                DetailItem::new(
                    "Policy holder's date of birth",
                    format_optional(birth_date, DateStyle::Date),
                ),
                DetailItem::new(
                    "ID number",
                    record
                        .coverage
                        .as_ref()
                        .and_then(|c| c.subscriber_id.as_deref()),
                ),
            ]
        }
        None => vec![
            DetailItem::new("Payer", Some("Self-pay")),
            DetailItem::new(
                "Cardpointe Identifier",
                patient.identifier_assigned_by(CARD_ON_FILE_ASSIGNER),
            ),
        ],
    };

    DetailPanel::new("Payer", items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhir::Resource;
    use serde_json::{json, Value};

    fn record(extra: Vec<Value>) -> AppointmentRecord {
        let mut values = vec![
            json!({"resourceType": "Appointment", "id": "a1", "description": "Cough"}),
            json!({"resourceType": "Patient", "id": "p1",
                   "name": [{"given": ["Ann", "Marie"], "family": "Lee"}],
                   "birthDate": "1990-02-03", "gender": "female",
                   "address": [{"postalCode": "10001"}],
                   "identifier": [{"value": "tok-123", "assigner": {"display": "CardPointe"}}]}),
        ];
        values.extend(extra);
        let resources: Vec<Resource> = values.into_iter().map(Resource::new).collect();
        AppointmentRecord::from_resources(&resources).expect("record")
    }

    #[test]
    fn patient_panel_lists_core_fields() {
        let record = record(vec![]);
        let panel = appointment_patient_details(
            &record.patient,
            record.appointment.description.as_deref(),
        );

        assert_eq!(panel.title, "Patient Information");
        assert_eq!(panel.value("First name"), Some("Ann"));
        assert_eq!(panel.value("Last name"), Some("Lee"));
        assert_eq!(panel.value("Date of birth"), Some("02.03.1990"));
        assert_eq!(panel.value("Sex"), Some("female"));
        assert_eq!(panel.value("ZIP"), Some("10001"));
        assert_eq!(panel.value("Reason for visit"), Some("Cough"));
        assert!(patient_details(&record.patient)
            .items
            .iter()
            .all(|i| i.label != "Reason for visit"));
    }

    #[test]
    fn contact_panel_reads_first_contact() {
        let patient: Patient = serde_json::from_value(json!({
            "resourceType": "Patient",
            "contact": [{
                "name": {"given": ["Jo", "Ann"], "family": "Lee"},
                "telecom": [
                    {"system": "email", "value": "jo@example.com"},
                    {"system": "phone", "value": "555-0100"}
                ],
                "address": {"line": ["1 Main St", "Apt 2"], "city": "Springfield", "state": "IL", "postalCode": "62701"},
                "extension": [{"valueDate": "1960-07-04"}]
            }]
        }))
        .expect("patient");

        let panel = contact_details(patient.contact.first());
        assert_eq!(panel.value("First name"), Some("Jo Ann"));
        assert_eq!(panel.value("Date of birth"), Some("07.04.1960"));
        assert_eq!(panel.value("Phone number"), Some("555-0100"));
        assert_eq!(panel.value("Email"), Some("jo@example.com"));
        assert_eq!(panel.value("Street address"), Some("1 Main St, Apt 2"));
        assert_eq!(panel.value("State"), Some("IL"));
        assert_eq!(panel.items.len(), 9);
    }

    #[test]
    fn contact_panel_without_contact_is_all_empty() {
        let panel = contact_details(None);
        assert_eq!(panel.items.len(), 9);
        assert!(panel.items.iter().all(|i| i.value.is_none()));
    }

    #[test]
    fn relationship_codes() {
        assert_eq!(relationship_label(Some("ONESELF")), "Self");
        assert_eq!(relationship_label(Some("PRN")), "Parent/legal guardian");
        assert_eq!(relationship_label(Some("O")), "Other");
        assert_eq!(relationship_label(Some("SPS")), "Unknown");
        assert_eq!(relationship_label(None), "Unknown");
    }

    #[test]
    fn consent_panel_checks_forms_and_signer() {
        let record = record(vec![
            json!({"resourceType": "Consent", "id": "c1",
                   "category": [{"text": "Notice of Privacy Practices"}],
                   "dateTime": "2024-11-01T08:15:00-05:00",
                   "performer": [{"reference": "RelatedPerson/rp1"}]}),
            json!({"resourceType": "Consent", "id": "c2",
                   "category": [{"text": "Financial Policy"}]}),
            json!({"resourceType": "RelatedPerson", "id": "rp1",
                   "name": [{"given": ["Sue"]}],
                   "relationship": [{"coding": [{"code": "PRN"}]}]}),
        ]);

        let panel = consent_panel(&record, "https://consents.example.com");
        assert_eq!(panel.items[0].value.as_deref(), Some("Sue"));
        assert_eq!(panel.items[1].value.as_deref(), Some("Parent/legal guardian"));
        assert_eq!(panel.items[2].value.as_deref(), Some("11.01.2024, 8:15 AM"));

        let checked: Vec<_> = panel.checks.iter().map(|c| c.checked).collect();
        assert_eq!(checked, [false, true, false, true]);
        assert_eq!(panel.checks[0].links.len(), 2);
        assert_eq!(
            panel.checks[0].links[1].href,
            "https://consents.example.com/privacy-policy/"
        );
        assert_eq!(
            panel.checks[3].links[0].href,
            "https://consents.example.com/BH-financial-policy/"
        );
    }

    #[test]
    fn payer_panel_uses_subscriber_when_insured() {
        let record = record(vec![
            json!({"resourceType": "Coverage", "id": "cov1", "subscriberId": "XYZ",
                   "subscriber": {"reference": "RelatedPerson/rp2"}}),
            json!({"resourceType": "RelatedPerson", "id": "rp2",
                   "name": [{"given": ["Bob"], "family": "Lee"}], "birthDate": "1960-01-02"}),
            json!({"resourceType": "Organization", "id": "o1", "name": "Acme Health"}),
        ]);

        let panel = payer_panel(&record);
        assert_eq!(panel.value("Payer"), Some("Acme Health"));
        assert_eq!(panel.value("Policy holder's first name"), Some("Bob"));
        assert_eq!(panel.value("Policy holder's date of birth"), Some("01.02.1960"));
        assert_eq!(panel.value("ID number"), Some("XYZ"));
    }

    #[test]
    fn payer_panel_falls_back_to_patient_as_holder() {
        let record = record(vec![
            json!({"resourceType": "Organization", "id": "o1", "name": "Acme Health"}),
        ]);
        let panel = payer_panel(&record);
        assert_eq!(panel.value("Policy holder's first name"), Some("Ann"));
        assert_eq!(panel.value("Policy holder's date of birth"), Some("02.03.1990"));
        assert_eq!(panel.value("ID number"), None);
    }

    #[test]
    fn payer_panel_self_pay_shows_card_identifier() {
        let panel = payer_panel(&record(vec![]));
        assert_eq!(panel.value("Payer"), Some("Self-pay"));
        assert_eq!(panel.value("Cardpointe Identifier"), Some("tok-123"));
        assert_eq!(panel.items.len(), 2);
    }
}
