//! FHIR search parameter lists.
//!
//! Parameters are an ordered list of key/value pairs rather than a map: FHIR allows a key to
//! repeat (two `date` bounds, several `_include:iterate` entries). A parameter whose value is
//! absent or empty is kept in the list but left out of the query string.

/// A single search parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchParam {
    pub key: String,
    pub value: Option<String>,
}

/// Ordered list of search parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchParams {
    params: Vec<SearchParam>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter with a value.
    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_optional(key, Some(value))
    }

    /// Appends a parameter whose value may be absent.
    pub fn with_optional(mut self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        self.params.push(SearchParam {
            key: key.into(),
            value: value.map(Into::into),
        });
        self
    }

    /// `_count`
    pub fn count(self, count: u32) -> Self {
        self.with("_count", count.to_string())
    }

    /// `_sort`
    pub fn sort(self, field: &str) -> Self {
        self.with("_sort", field)
    }

    /// `_id`
    pub fn id(self, id: &str) -> Self {
        self.with("_id", id)
    }

    /// `_include`
    pub fn include(self, target: &str) -> Self {
        self.with("_include", target)
    }

    /// `_include:iterate`
    pub fn include_iterate(self, target: &str) -> Self {
        self.with("_include:iterate", target)
    }

    /// `_revinclude`
    pub fn revinclude(self, target: &str) -> Self {
        self.with("_revinclude", target)
    }

    /// `_revinclude:iterate`
    pub fn revinclude_iterate(self, target: &str) -> Self {
        self.with("_revinclude:iterate", target)
    }

    pub fn params(&self) -> &[SearchParam] {
        &self.params
    }

    /// Key/value pairs to send, skipping absent and empty values.
    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .filter_map(|p| match p.value.as_deref() {
                Some(value) if !value.is_empty() => Some((p.key.as_str(), value)),
                _ => None,
            })
            .collect()
    }
}
