//! FHIR Consent, Coverage, Organization and RelatedPerson views.
//!
//! These are the resources pulled into an appointment search through `_include`/`_revinclude`
//! to describe what the patient signed and who pays.

use crate::datatypes::{CodeableConcept, HumanName, Reference};
use serde::{Deserialize, Serialize};

/// Lenient view of a FHIR `Consent`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Consent {
    pub id: Option<String>,
    pub category: Vec<CodeableConcept>,
    pub date_time: Option<String>,
    pub performer: Vec<Reference>,
}

impl Consent {
    /// Text of the first category, naming the signed document.
    pub fn category_text(&self) -> Option<&str> {
        self.category.first().and_then(|c| c.text.as_deref())
    }

    /// Reference of the first performer (the person who signed).
    pub fn performer_reference(&self) -> Option<&str> {
        self.performer.first().and_then(|p| p.reference.as_deref())
    }
}

/// Lenient view of a FHIR `Coverage`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Coverage {
    pub id: Option<String>,
    pub subscriber: Option<Reference>,
    pub subscriber_id: Option<String>,
    pub payor: Vec<Reference>,
}

impl Coverage {
    pub fn subscriber_reference(&self) -> Option<&str> {
        self.subscriber.as_ref().and_then(|s| s.reference.as_deref())
    }
}

/// Lenient view of a FHIR `Organization`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Organization {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Lenient view of a FHIR `RelatedPerson`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct RelatedPerson {
    pub id: Option<String>,
    pub name: Vec<HumanName>,
    pub birth_date: Option<String>,
    pub relationship: Vec<CodeableConcept>,
}

impl RelatedPerson {
    pub fn first_name(&self) -> Option<&str> {
        self.name.first().and_then(HumanName::first_given)
    }

    pub fn last_name(&self) -> Option<&str> {
        self.name.first().and_then(|n| n.family.as_deref())
    }

    /// Code of the first coding of the first relationship (e.g. `PRN`).
    pub fn relationship_code(&self) -> Option<&str> {
        self.relationship
            .first()
            .and_then(|r| r.coding.first())
            .and_then(|c| c.code.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Resource;
    use serde_json::json;

    #[test]
    fn consent_accessors() {
        let consent: Consent = Resource::new(json!({
            "resourceType": "Consent",
            "category": [{"text": "Financial Policy"}],
            "dateTime": "2024-02-01T10:00:00Z",
            "performer": [{"reference": "RelatedPerson/rp1"}]
        }))
        .parse()
        .expect("parse consent");

        assert_eq!(consent.category_text(), Some("Financial Policy"));
        assert_eq!(consent.performer_reference(), Some("RelatedPerson/rp1"));
        assert_eq!(consent.date_time.as_deref(), Some("2024-02-01T10:00:00Z"));
    }

    #[test]
    fn related_person_relationship_code() {
        let person: RelatedPerson = Resource::new(json!({
            "resourceType": "RelatedPerson",
            "name": [{"family": "Doe", "given": ["Jane"]}],
            "relationship": [{"coding": [{"code": "PRN"}]}]
        }))
        .parse()
        .expect("parse related person");

        assert_eq!(person.first_name(), Some("Jane"));
        assert_eq!(person.last_name(), Some("Doe"));
        assert_eq!(person.relationship_code(), Some("PRN"));
    }
}
