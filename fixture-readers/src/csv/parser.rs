//! Conversion between CSV fields and cell values

use fixture_core::Value;

/// Value of one CSV field; the null token reads as [`Value::Null`]
pub fn parse_field(field: &str, null_token: &str) -> Value {
    if field == null_token {
        Value::Null
    } else {
        Value::Text(field.to_string())
    }
}

/// CSV field text for a value
pub fn format_value(value: &Value, null_token: &str) -> String {
    match value {
        Value::Null => null_token.to_string(),
        other => other.to_string(),
    }
}

/// Table names listed by an ordering file, one per line
///
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_ordering(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
