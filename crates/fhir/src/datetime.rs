//! ISO 8601 parsing and display formatting for FHIR date/dateTime/instant values.
//!
//! Values are displayed in their own offset; a value without an offset is read as UTC.

use crate::{FhirError, FhirResult};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Display style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateStyle {
    /// `MM.dd.yyyy`
    Date,
    /// `MM.dd.yyyy, h:mm a`
    Time,
}

impl DateStyle {
    fn pattern(self) -> &'static str {
        match self {
            DateStyle::Date => "%m.%d.%Y",
            DateStyle::Time => "%m.%d.%Y, %-I:%M %p",
        }
    }
}

/// Parses a FHIR `date`, `dateTime` or `instant`.
///
/// Accepts `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, naive `YYYY-MM-DDTHH:MM[:SS[.fff]]`, and RFC 3339
/// with an offset. A partial date is read as the first day of its year or month.
///
/// # Errors
///
/// Returns [`FhirError::InvalidInput`] for anything else, including the empty string.
pub fn parse_iso(iso: &str) -> FhirResult<DateTime<FixedOffset>> {
    let iso = iso.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(iso) {
        return Ok(dt);
    }

    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(iso, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(iso, "%Y-%m-%d")
                .ok()
                .or_else(|| partial_date(iso))
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| FhirError::InvalidInput(format!("invalid ISO date/time '{iso}'")))?;

    Ok(Utc.from_utc_datetime(&naive).into())
}

/// FHIR `date` reduced precision: `YYYY` or `YYYY-MM`.
fn partial_date(iso: &str) -> Option<NaiveDate> {
    let (year, month) = match iso.split_once('-') {
        Some((year, month)) if digits(month, 2) => (year, month.parse().ok()?),
        Some(_) => return None,
        None => (iso, 1),
    };
    if !digits(year, 4) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, 1)
}

fn digits(text: &str, len: usize) -> bool {
    text.len() == len && text.bytes().all(|b| b.is_ascii_digit())
}

/// Formats an ISO value in the given style.
///
/// # Errors
///
/// Returns [`FhirError::InvalidInput`] if `iso` cannot be parsed.
pub fn format_date_time(iso: &str, style: DateStyle) -> FhirResult<String> {
    Ok(parse_iso(iso)?.format(style.pattern()).to_string())
}

/// Formats an optional ISO value, yielding `None` when it is absent or unparseable.
pub fn format_optional(iso: Option<&str>, style: DateStyle) -> Option<String> {
    iso.and_then(|v| format_date_time(v, style).ok())
}
