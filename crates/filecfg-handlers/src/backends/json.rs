//! JSON through `serde_json`.
//!
//! Options:
//! - `indent`: spaces per level; absent or `null` writes compact output.
//! - `sort_keys`: sort object keys at every depth.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::backend::{bool_option, Backend, Content, HandlerOptions};
use crate::error::BackendError;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBackend;

impl Backend for JsonBackend {
    fn name(&self) -> &str {
        "serde_json"
    }

    fn supported_options(&self) -> &[&'static str] {
        &["indent", "sort_keys"]
    }

    fn dumps(&self, value: &Value, options: &HandlerOptions) -> Result<Content, BackendError> {
        let sorted;
        let value = if bool_option(options, "sort_keys", false) {
            sorted = sort_keys(value);
            &sorted
        } else {
            value
        };

        let Some(indent) = options.get("indent").and_then(Value::as_u64) else {
            return Ok(Content::Text(serde_json::to_string(value)?));
        };
        let indent = " ".repeat(usize::try_from(indent).unwrap_or(0));
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(
            &mut out,
            PrettyFormatter::with_indent(indent.as_bytes()),
        );
        value.serialize(&mut serializer)?;
        // serde_json only writes valid UTF-8.
        Ok(Content::Text(String::from_utf8_lossy(&out).into_owned()))
    }

    fn loads(&self, content: &Content, _options: &HandlerOptions) -> Result<Value, BackendError> {
        Ok(serde_json::from_str(content.as_text()?)?)
    }
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k.clone(), sort_keys(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
