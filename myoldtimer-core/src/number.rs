//! Tolerant number parsing for persisted and user-entered values.
//!
//! Policy: `null`, missing, empty strings and anything non-finite become `None`,
//! never zero. Numeric strings may use `,` or `.` as the decimal separator.

use serde_json::Value;

/// Parse a loosely typed JSON value into a finite number.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number_str(s),
        _ => None,
    }
}

/// Parse user text into a finite number.
pub fn parse_number_str(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.replacen(',', ".", 1)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

pub fn parse_non_negative(value: &Value) -> Option<f64> {
    parse_number(value).filter(|v| *v >= 0.0)
}

/// Odometer readings: finite and `>= 0`.
pub fn parse_non_negative_mileage(s: &str) -> Option<f64> {
    parse_number_str(s).filter(|v| *v >= 0.0)
}

pub fn parse_positive_str(s: &str) -> Option<f64> {
    parse_number_str(s).filter(|v| *v > 0.0)
}

/// Integral floats that round-trip exactly through `i64`.
pub fn is_integral(v: f64) -> bool {
    v.is_finite() && v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0
}

/// Render a number the way it is persisted: integral values without a fraction.
pub fn to_json_number(v: f64) -> Value {
    if is_integral(v) {
        Value::from(v as i64)
    } else {
        serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Serde adapter for `Option<f64>` fields: integral values are written as JSON
/// integers so canonical records serialize byte-stably.
pub mod json_number {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::is_integral;

    pub fn serialize<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        match *value {
            None => s.serialize_none(),
            Some(v) if is_integral(v) => s.serialize_i64(v as i64),
            Some(v) => s.serialize_f64(v),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Option::<f64>::deserialize(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_number_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_number(&json!(12)), Some(12.0));
        assert_eq!(parse_number(&json!(12.5)), Some(12.5));
        assert_eq!(parse_number(&json!("12.5")), Some(12.5));
        assert_eq!(parse_number(&json!(" 12,5 ")), Some(12.5));
    }

    #[test]
    fn test_parse_number_rejects_empty_and_garbage() {
        assert_eq!(parse_number(&json!(null)), None);
        assert_eq!(parse_number(&json!("")), None);
        assert_eq!(parse_number(&json!("   ")), None);
        assert_eq!(parse_number(&json!("abc")), None);
        assert_eq!(parse_number(&json!("inf")), None);
        assert_eq!(parse_number(&json!("NaN")), None);
        assert_eq!(parse_number(&json!(true)), None);
        assert_eq!(parse_number(&json!([1])), None);
        assert_eq!(parse_number(&json!({"v": 1})), None);
    }

    #[test]
    fn test_non_negative_mileage() {
        assert_eq!(parse_non_negative_mileage("123456"), Some(123456.0));
        assert_eq!(parse_non_negative_mileage("0"), Some(0.0));
        assert_eq!(parse_non_negative_mileage("-1"), None);
        assert_eq!(parse_non_negative(&json!(-3)), None);
    }

    #[test]
    fn test_to_json_number_keeps_integers_integral() {
        assert_eq!(to_json_number(10000.0), json!(10000));
        assert_eq!(to_json_number(0.5), json!(0.5));
        assert_eq!(to_json_number(f64::NAN), Value::Null);
    }
}
