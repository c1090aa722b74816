//! Boundary parsing for user-supplied values.
//!
//! Everything here fails with a `ValidationError` and runs before the store
//! is touched.

use crate::error::ValidationError;
use chrono::NaiveDate;

/// Parse an ISO `YYYY-MM-DD` calendar date
pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    // chrono accepts signs and unpadded fields; the boundary format is strict
    if !is_iso_date_shape(trimmed.as_bytes()) {
        return Err(ValidationError::BadDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| ValidationError::BadDate(raw.to_string()))
}

fn is_iso_date_shape(bytes: &[u8]) -> bool {
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Parse a non-negative dose count
pub fn parse_dose_count(raw: &str) -> Result<u32, ValidationError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ValidationError::BadDoseCount(raw.to_string()))
}

/// Reject empty names; `what` names the field in the error
pub fn parse_name<'a>(raw: &'a str, what: &'static str) -> Result<&'a str, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName(what));
    }
    Ok(trimmed)
}
