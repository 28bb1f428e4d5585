//! TOML through the `toml` crate.
//!
//! Options:
//! - `pretty`: multi-line arrays and expanded tables.
//!
//! TOML has no null. Null values inside objects are omitted on dump;
//! null array elements are rejected.

use serde_json::{Map, Value};

use crate::backend::{bool_option, Backend, Content, HandlerOptions};
use crate::error::BackendError;

#[derive(Debug, Clone, Copy, Default)]
pub struct TomlBackend;

impl Backend for TomlBackend {
    fn name(&self) -> &str {
        "toml"
    }

    fn supported_options(&self) -> &[&'static str] {
        &["pretty"]
    }

    fn dumps(&self, value: &Value, options: &HandlerOptions) -> Result<Content, BackendError> {
        if !value.is_object() {
            return Err(BackendError::Unrepresentable {
                what: "a non-table document root in TOML".to_string(),
            });
        }
        let value = without_nulls(value)?;
        let text = if bool_option(options, "pretty", false) {
            ::toml::to_string_pretty(&value)?
        } else {
            ::toml::to_string(&value)?
        };
        Ok(Content::Text(text))
    }

    fn loads(&self, content: &Content, _options: &HandlerOptions) -> Result<Value, BackendError> {
        Ok(::toml::from_str::<Value>(content.as_text()?)?)
    }
}

fn without_nulls(value: &Value) -> Result<Value, BackendError> {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                if !v.is_null() {
                    out.insert(k.clone(), without_nulls(v)?);
                }
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| {
                if item.is_null() {
                    Err(BackendError::Unrepresentable {
                        what: "null inside a TOML array".to_string(),
                    })
                } else {
                    without_nulls(item)
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}
