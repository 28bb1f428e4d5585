//! YAML through `serde_yaml`. No options.

use serde_json::{Map, Number, Value};

use crate::backend::{Backend, Content, HandlerOptions};
use crate::error::BackendError;

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlBackend;

impl Backend for YamlBackend {
    fn name(&self) -> &str {
        "serde_yaml"
    }

    fn dumps(&self, value: &Value, _options: &HandlerOptions) -> Result<Content, BackendError> {
        Ok(Content::Text(serde_yaml::to_string(value)?))
    }

    fn loads(&self, content: &Content, _options: &HandlerOptions) -> Result<Value, BackendError> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(content.as_text()?)?;
        yaml_to_generic(&yaml).map_err(|what| BackendError::Unrepresentable { what })
    }
}

/// Convert a YAML tree into a generic value.
///
/// Tags are dropped. Scalar keys are stringified; sequence or mapping
/// keys are rejected.
fn yaml_to_generic(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| format!("YAML number {n}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_generic)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (k, v) in mapping {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Null => "null".to_string(),
                    other => return Err(format!("YAML mapping key {other:?}")),
                };
                map.insert(key, yaml_to_generic(v)?);
            }
            Ok(Value::Object(map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_generic(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dumps_block_style() {
        let out = YamlBackend
            .dumps(&json!({"name": "svc", "tags": ["a", "b"]}), &HandlerOptions::new())
            .unwrap();
        assert_eq!(out.as_text().unwrap(), "name: svc\ntags:\n- a\n- b\n");
    }

    #[test]
    fn loads_scalars_with_their_types() {
        let v = YamlBackend
            .loads(
                &Content::from("port: 8080\nratio: 0.5\non: true\nnothing: ~\n"),
                &HandlerOptions::new(),
            )
            .unwrap();
        assert_eq!(v, json!({"port": 8080, "ratio": 0.5, "on": true, "nothing": null}));
    }

    #[test]
    fn non_string_keys_are_stringified() {
        let v = YamlBackend
            .loads(&Content::from("1: one\ntrue: yes\n"), &HandlerOptions::new())
            .unwrap();
        assert_eq!(v, json!({"1": "one", "true": "yes"}));
    }

    #[test]
    fn tags_are_dropped() {
        let v = YamlBackend
            .loads(&Content::from("level: !custom warn\n"), &HandlerOptions::new())
            .unwrap();
        assert_eq!(v, json!({"level": "warn"}));
    }

    #[test]
    fn sequence_keys_are_rejected() {
        let err = YamlBackend
            .loads(&Content::from("? [a, b]\n: 1\n"), &HandlerOptions::new())
            .unwrap_err();
        assert!(matches!(err, BackendError::Unrepresentable { .. }));
    }
}
