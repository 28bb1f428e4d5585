//! Lossless scalar coercion used on decode.
//!
//! Loaders for text formats (INI, XML, environment-style sources) tend to
//! hand back strings for everything. A scalar field converts its raw value
//! to the declared kind only when nothing is lost doing so; otherwise the
//! raw value passes through and type conformance is left to validation.
//!
//! Numbers are never converted between integer and float form: JSON Schema
//! accepts an integer for a `number` field, and decode must hand back the
//! value that encode was given.

use filecfg_core::{FieldValue, ScalarKind};
use serde_json::Value;

/// Coerce `raw` towards `kind`, falling back to structural pass-through.
pub fn coerce_scalar(kind: ScalarKind, raw: &Value) -> FieldValue {
    let coerced = match (kind, raw) {
        (ScalarKind::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(FieldValue::Int),

        (ScalarKind::Number, Value::String(s)) => number_from_text(s.trim()),

        (ScalarKind::Boolean, Value::Bool(b)) => Some(FieldValue::Bool(*b)),
        (ScalarKind::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(FieldValue::Bool(true)),
            "false" => Some(FieldValue::Bool(false)),
            _ => None,
        },

        (ScalarKind::String, Value::String(s)) => Some(FieldValue::Str(s.clone())),
        (ScalarKind::String, Value::Number(n)) if n.is_i64() || n.is_u64() => {
            Some(FieldValue::Str(n.to_string()))
        }
        (ScalarKind::String, Value::Bool(b)) => Some(FieldValue::Str(b.to_string())),

        _ => None,
    };
    coerced.unwrap_or_else(|| FieldValue::from_generic(raw))
}

/// Integer text stays an integer so that `"2"` and `2` decode alike.
fn number_from_text(s: &str) -> Option<FieldValue> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(FieldValue::Int(i));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(FieldValue::Float)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_string_to_integer() {
        assert_eq!(coerce_scalar(ScalarKind::Integer, &json!("42")), FieldValue::Int(42));
        assert_eq!(coerce_scalar(ScalarKind::Integer, &json!(" -7 ")), FieldValue::Int(-7));
    }

    #[test]
    fn numbers_keep_their_integer_or_float_form() {
        assert_eq!(coerce_scalar(ScalarKind::Integer, &json!(7)), FieldValue::Int(7));
        assert_eq!(coerce_scalar(ScalarKind::Integer, &json!(3.0)), FieldValue::Float(3.0));
        assert_eq!(coerce_scalar(ScalarKind::Integer, &json!(3.5)), FieldValue::Float(3.5));
        assert_eq!(coerce_scalar(ScalarKind::Number, &json!(2)), FieldValue::Int(2));
        assert_eq!(coerce_scalar(ScalarKind::Number, &json!(2.0)), FieldValue::Float(2.0));
    }

    #[test]
    fn number_from_numeric_strings() {
        assert_eq!(coerce_scalar(ScalarKind::Number, &json!("1.25")), FieldValue::Float(1.25));
        assert_eq!(coerce_scalar(ScalarKind::Number, &json!(" 4 ")), FieldValue::Int(4));
        assert_eq!(coerce_scalar(ScalarKind::Number, &json!("inf")), FieldValue::from("inf"));
    }

    #[test]
    fn boolean_from_text() {
        assert_eq!(coerce_scalar(ScalarKind::Boolean, &json!("TRUE")), FieldValue::Bool(true));
        assert_eq!(coerce_scalar(ScalarKind::Boolean, &json!("no")), FieldValue::from("no"));
    }

    #[test]
    fn string_from_integer_and_bool_but_not_float() {
        assert_eq!(coerce_scalar(ScalarKind::String, &json!(12)), FieldValue::from("12"));
        assert_eq!(coerce_scalar(ScalarKind::String, &json!(false)), FieldValue::from("false"));
        assert_eq!(coerce_scalar(ScalarKind::String, &json!(1.5)), FieldValue::Float(1.5));
    }

    #[test]
    fn impossible_coercions_pass_through() {
        assert_eq!(coerce_scalar(ScalarKind::Integer, &json!("abc")), FieldValue::from("abc"));
        assert_eq!(
            coerce_scalar(ScalarKind::Integer, &json!([1, 2])),
            FieldValue::list([1, 2])
        );
    }
}
