//! Calendar date fields, exchanged as `YYYY-MM-DD`.

use chrono::NaiveDate;

pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// A real calendar date in `YYYY-MM-DD` form.
pub fn validate_iso_date(value: &str) -> bool {
    parse_iso_date(value).is_some()
}

/// A validity window is well-formed unless both ends parse and the end
/// precedes the start.
pub fn validate_date_window(from: &str, until: &str) -> bool {
    match (parse_iso_date(from), parse_iso_date(until)) {
        (Some(start), Some(end)) => end >= start,
        _ => true,
    }
}
