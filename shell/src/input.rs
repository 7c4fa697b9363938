//! Turning typed text into field values.

use docstore_engine::FieldValue;

/// Input that parses as an integer becomes `Integer`, anything else `Text`.
pub fn parse_value(raw: &str) -> FieldValue {
    match raw.parse::<i64>() {
        Ok(n) => FieldValue::Integer(n),
        Err(_) => FieldValue::Text(raw.to_string()),
    }
}

/// Whether a field prompt answer ends the field loop.
pub fn is_done(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("done")
}
