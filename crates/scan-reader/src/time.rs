//! Time reference parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{Result, ScanError};

/// Parse a product's time reference.
///
/// Accepts RFC 3339 (`2019-07-02T00:00:00Z`, `2019-07-02T00:00:00.5+02:00`),
/// the same without an offset (taken as UTC), and a bare date
/// (`2019-07-02`, midnight UTC).
pub fn parse_time_reference(text: &str) -> Result<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Ok(t.with_timezone(&Utc));
    }

    let naive = text.trim_end_matches('Z');
    if let Ok(t) = NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&t));
    }

    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(t) = d.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&t));
        }
    }

    Err(ScanError::InvalidTimeReference(text.to_string()))
}
