//! Validated primitive types shared across the EHR workspace.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    #[error("text is blank")]
    Blank,
}

/// Text with at least one non-whitespace character, stored trimmed.
///
/// Required form fields (a new patient's names, birth date and address) go through this type so
/// that blank values are rejected before anything is sent to the FHIR API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// # Errors
    ///
    /// Returns [`TextError::Blank`] if `input` is empty after trimming.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        match input.as_ref().trim() {
            "" => Err(TextError::Blank),
            text => Ok(Self(text.to_string())),
        }
    }

    /// Treats a missing value the same as a blank one.
    pub fn from_optional(input: Option<&str>) -> Result<Self, TextError> {
        Self::new(input.unwrap_or_default())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonEmptyText {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyText> for String {
    fn from(text: NonEmptyText) -> Self {
        text.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
