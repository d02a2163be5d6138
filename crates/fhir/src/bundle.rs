//! Search bundle unwrapping and reassembly.
//!
//! A search with `_include`/`_revinclude` returns one flat bundle mixing several resource types.
//! Pages rebuild their related objects from that list with the helpers here: linear scans that
//! select entries by `resourceType`, optionally narrowed by a cross-reference id. Results keep
//! the API response order; duplicates are not collapsed.

use crate::{FhirResult, Resource, ResourceType};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A FHIR `Bundle` as returned by search endpoints.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Bundle {
    pub resource_type: Option<String>,
    pub total: Option<u64>,
    pub entry: Vec<BundleEntry>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct BundleEntry {
    pub full_url: Option<String>,
    pub resource: Option<Resource>,
}

impl Bundle {
    /// Unwraps `entry[].resource`, skipping entries without a resource.
    ///
    /// A bundle without `entry` yields an empty list.
    pub fn into_resources(self) -> Vec<Resource> {
        self.entry.into_iter().filter_map(|e| e.resource).collect()
    }
}

/// Strips the `Type/` prefix from a reference, e.g. `RelatedPerson/rp1` -> `rp1`.
///
/// A reference without the prefix is returned unchanged.
pub fn reference_id(reference: &str, resource_type: ResourceType) -> &str {
    reference
        .strip_prefix(resource_type.as_str())
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(reference)
}

/// Every resource of `resource_type`, in response order.
pub fn of_type(resources: &[Resource], resource_type: ResourceType) -> Vec<&Resource> {
    resources.iter().filter(|r| r.is(resource_type)).collect()
}

/// The first resource of `resource_type`.
pub fn first_of_type(resources: &[Resource], resource_type: ResourceType) -> Option<&Resource> {
    resources.iter().find(|r| r.is(resource_type))
}

/// The first resource of `resource_type` whose id matches `reference`.
///
/// `reference` is a FHIR reference such as `RelatedPerson/rp1`; its type prefix is stripped
/// before comparing. Returns `None` when the reference itself is absent.
pub fn referenced<'a>(
    resources: &'a [Resource],
    resource_type: ResourceType,
    reference: Option<&str>,
) -> Option<&'a Resource> {
    let id = reference_id(reference?, resource_type);
    resources
        .iter()
        .find(|r| r.is(resource_type) && r.id() == Some(id))
}

/// Parses every resource of `resource_type` into the typed view `T`, keeping order.
///
/// # Errors
///
/// Returns the first [`crate::FhirError`] raised by [`Resource::parse`].
pub fn parse_all<T: DeserializeOwned>(
    resources: &[Resource],
    resource_type: ResourceType,
) -> FhirResult<Vec<T>> {
    of_type(resources, resource_type)
        .into_iter()
        .map(Resource::parse)
        .collect()
}

/// Parses the first resource of `resource_type` into `T`, if there is one.
///
/// # Errors
///
/// Returns a [`crate::FhirError`] if the matching resource does not fit the view.
pub fn parse_first<T: DeserializeOwned>(
    resources: &[Resource],
    resource_type: ResourceType,
) -> FhirResult<Option<T>> {
    first_of_type(resources, resource_type)
        .map(Resource::parse)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mixed() -> Vec<Resource> {
        let bundle: Bundle = serde_json::from_value(json!({
            "resourceType": "Bundle",
            "entry": [
                {"resource": {"resourceType": "Appointment", "id": "a1"}},
                {"resource": {"resourceType": "Patient", "id": "p1"}},
                {"fullUrl": "urn:no-resource"},
                {"resource": {"resourceType": "Consent", "id": "c1"}},
                {"resource": {"resourceType": "RelatedPerson", "id": "rp1"}},
                {"resource": {"resourceType": "Appointment", "id": "a2"}},
                {"resource": {"resourceType": "RelatedPerson", "id": "rp2"}},
                {"resource": {"resourceType": "Consent", "id": "c2"}}
            ]
        }))
        .expect("bundle json");
        bundle.into_resources()
    }

    fn ids(resources: &[&Resource]) -> Vec<String> {
        resources
            .iter()
            .filter_map(|r| r.id().map(str::to_string))
            .collect()
    }

    #[test]
    fn unwraps_entries_with_resources_only() {
        assert_eq!(mixed().len(), 7);

        let empty: Bundle =
            serde_json::from_value(json!({"resourceType": "Bundle"})).expect("bundle json");
        assert!(empty.into_resources().is_empty());
    }

    #[test]
    fn of_type_preserves_relative_order() {
        let resources = mixed();
        assert_eq!(ids(&of_type(&resources, ResourceType::Appointment)), ["a1", "a2"]);
        assert_eq!(ids(&of_type(&resources, ResourceType::Consent)), ["c1", "c2"]);
        assert_eq!(ids(&of_type(&resources, ResourceType::Patient)), ["p1"]);
        assert!(of_type(&resources, ResourceType::Coverage).is_empty());
    }

    #[test]
    fn first_of_type_returns_earliest_match() {
        let resources = mixed();
        let first = first_of_type(&resources, ResourceType::RelatedPerson).expect("match");
        assert_eq!(first.id(), Some("rp1"));
        assert!(first_of_type(&resources, ResourceType::Organization).is_none());
    }

    #[test]
    fn referenced_matches_on_stripped_id() {
        let resources = mixed();
        let found = referenced(
            &resources,
            ResourceType::RelatedPerson,
            Some("RelatedPerson/rp2"),
        )
        .expect("match");
        assert_eq!(found.id(), Some("rp2"));

        assert!(referenced(&resources, ResourceType::RelatedPerson, None).is_none());
        assert!(referenced(
            &resources,
            ResourceType::RelatedPerson,
            Some("RelatedPerson/missing")
        )
        .is_none());
        // Type must match as well as id.
        assert!(referenced(&resources, ResourceType::Patient, Some("Patient/rp1")).is_none());
    }

    #[test]
    fn reference_id_strips_only_matching_prefix() {
        assert_eq!(reference_id("Patient/p1", ResourceType::Patient), "p1");
        assert_eq!(reference_id("p1", ResourceType::Patient), "p1");
        assert_eq!(
            reference_id("RelatedPerson/x", ResourceType::Patient),
            "RelatedPerson/x"
        );
    }

    #[test]
    fn parse_first_and_all_use_typed_views() {
        let resources = mixed();
        let appointments: Vec<crate::Appointment> =
            parse_all(&resources, ResourceType::Appointment).expect("parse");
        assert_eq!(appointments.len(), 2);
        assert_eq!(appointments[1].id.as_deref(), Some("a2"));

        let coverage: Option<crate::Coverage> =
            parse_first(&resources, ResourceType::Coverage).expect("parse");
        assert!(coverage.is_none());
    }
}
