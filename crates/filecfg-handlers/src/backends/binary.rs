//! # Binary object graph
//!
//! A compact tagged tree encoded with `bincode`. `bincode` is not
//! self-describing, so generic values are first mapped onto [`Node`],
//! whose variants carry the type of every element. Object member order is
//! kept.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::backend::{Backend, Content, HandlerOptions};
use crate::error::BackendError;

/// Wire form of one generic value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    List(Vec<Node>),
    Map(Vec<(String, Node)>),
}

impl From<&Value> for Node {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Self::Str(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Map(map.iter().map(|(k, v)| (k.clone(), Self::from(v))).collect())
            }
        }
    }
}

impl TryFrom<Node> for Value {
    type Error = BackendError;

    fn try_from(node: Node) -> Result<Self, Self::Error> {
        Ok(match node {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(b),
            Node::Int(i) => Value::from(i),
            Node::UInt(u) => Value::from(u),
            Node::Float(f) => Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| BackendError::Unrepresentable {
                    what: format!("the float {f}"),
                })?,
            Node::Str(s) => Value::String(s),
            Node::List(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Node::Map(entries) => {
                let mut map = Map::new();
                for (k, v) in entries {
                    map.insert(k, Value::try_from(v)?);
                }
                Value::Object(map)
            }
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeBackend;

impl Backend for BincodeBackend {
    fn name(&self) -> &str {
        "bincode"
    }

    fn dumps(&self, value: &Value, _options: &HandlerOptions) -> Result<Content, BackendError> {
        Ok(Content::Bytes(bincode::serialize(&Node::from(value))?))
    }

    fn loads(&self, content: &Content, _options: &HandlerOptions) -> Result<Value, BackendError> {
        let node: Node = bincode::deserialize(content.as_bytes())?;
        Value::try_from(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trip_keeps_types_and_order() {
        let value = json!({
            "z": "last-first",
            "count": -3,
            "big": u64::MAX,
            "ratio": 1.5,
            "flags": [true, false],
            "nested": {"none": null, "empty": {}},
        });
        let out = BincodeBackend.dumps(&value, &HandlerOptions::new()).unwrap();
        assert!(!out.is_text());
        let back = BincodeBackend.loads(&out, &HandlerOptions::new()).unwrap();
        assert_eq!(back, value);
        let keys: Vec<&String> = back.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "count", "big", "ratio", "flags", "nested"]);
    }

    #[test]
    fn non_finite_floats_are_rejected_on_load() {
        let bytes = bincode::serialize(&Node::Float(f64::INFINITY)).unwrap();
        let err = BincodeBackend
            .loads(&Content::Bytes(bytes), &HandlerOptions::new())
            .unwrap_err();
        assert!(matches!(err, BackendError::Unrepresentable { .. }));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(BincodeBackend
            .loads(&Content::Bytes(vec![0xff; 3]), &HandlerOptions::new())
            .is_err());
    }
}
