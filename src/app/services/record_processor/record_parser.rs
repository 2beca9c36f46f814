//! Raw record parsing
//!
//! Turns one `station,temperature,humidity` line into a [`Reading`]. Records
//! that cannot be parsed are rejected with [`ParseError::MalformedRecord`] and
//! never produce a partially filled reading.

use crate::app::models::Reading;
use crate::constants::{RECORD_DELIMITER, RECORD_FIELD_COUNT};
use crate::error::ParseError;

/// Parse a raw delimited record into a typed reading
///
/// Fields are trimmed before parsing. The humidity field accepts integer and
/// decimal forms. Non-finite numbers are rejected so that running totals stay
/// finite.
pub fn parse(raw: &str) -> Result<Reading, ParseError> {
    let fields: Vec<&str> = raw.split(RECORD_DELIMITER).collect();

    if fields.len() != RECORD_FIELD_COUNT {
        return Err(ParseError::malformed(
            raw,
            format!(
                "expected {} fields, found {}",
                RECORD_FIELD_COUNT,
                fields.len()
            ),
        ));
    }

    let station = fields[0].trim();
    if station.is_empty() {
        return Err(ParseError::malformed(raw, "empty station identifier"));
    }

    let temperature_celsius = parse_numeric_field(raw, "temperature", fields[1])?;
    let humidity_percent = parse_numeric_field(raw, "humidity", fields[2])?;

    Ok(Reading {
        station: station.to_string(),
        temperature_celsius,
        humidity_percent,
    })
}

/// Parse one numeric field, rejecting NaN and infinities
fn parse_numeric_field(raw: &str, field_name: &str, value: &str) -> Result<f64, ParseError> {
    let value = value.trim();
    let parsed = value.parse::<f64>().map_err(|e| {
        ParseError::malformed(
            raw,
            format!("invalid {} value '{}' ({})", field_name, value, e),
        )
    })?;

    if !parsed.is_finite() {
        return Err(ParseError::malformed(
            raw,
            format!("non-finite {} value '{}'", field_name, value),
        ));
    }

    Ok(parsed)
}
