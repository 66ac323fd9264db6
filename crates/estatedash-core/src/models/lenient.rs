//! Lenient field decoders used at the fetch boundary
//!
//! The API is loose about types: numbers arrive as strings, timestamps as
//! RFC 3339 text, plain dates or epoch milliseconds, and optional fields as
//! `null`, `""` or not at all. Every decoder here accepts any JSON value and
//! falls back to the empty value instead of failing the whole record.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse a timestamp from RFC 3339, `YYYY-MM-DD` or epoch milliseconds
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

/// Parse a number from a JSON number or a numeric string
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Parse a non-empty string, accepting numbers as text
pub fn parse_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a boolean flag, accepting `"true"`/`"false"` and 0/1
pub fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_timestamp(&Value::deserialize(deserializer)?))
}

pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_number(&Value::deserialize(deserializer)?).unwrap_or(0.0))
}

pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_number(&Value::deserialize(deserializer)?))
}

pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_text(&Value::deserialize(deserializer)?))
}

pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_flag(&Value::deserialize(deserializer)?).unwrap_or(false))
}

/// Any JSON array, or empty for every other shape
pub fn list<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items),
        _ => Ok(Vec::new()),
    }
}

/// A nested object; any other shape (or an undecodable object) is the default
pub fn object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => Ok(serde_json::from_value(value).unwrap_or_default()),
        _ => Ok(T::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use serde_json::json;

    #[test]
    fn test_timestamp_formats() {
        let rfc = parse_timestamp(&json!("2026-03-04T10:15:00.000Z")).unwrap();
        assert_eq!(rfc.day(), 4);

        let date = parse_timestamp(&json!("2026-03-04")).unwrap();
        assert_eq!(date.month(), 3);

        let millis = parse_timestamp(&json!(1_772_619_300_000i64)).unwrap();
        assert_eq!(millis.year(), 2026);

        assert!(parse_timestamp(&json!("yesterday")).is_none());
        assert!(parse_timestamp(&json!(null)).is_none());
    }

    #[test]
    fn test_number_formats() {
        assert_eq!(parse_number(&json!(1500)), Some(1500.0));
        assert_eq!(parse_number(&json!("2,500.5")), Some(2500.5));
        assert_eq!(parse_number(&json!("n/a")), None);
        assert_eq!(parse_number(&json!({ "amount": 1 })), None);
    }

    #[test]
    fn test_text_and_flag() {
        assert_eq!(parse_text(&json!("  Pune ")).as_deref(), Some("Pune"));
        assert_eq!(parse_text(&json!("   ")), None);
        assert_eq!(parse_flag(&json!("true")), Some(true));
        assert_eq!(parse_flag(&json!(0)), Some(false));
        assert_eq!(parse_flag(&json!("maybe")), None);
    }
}
