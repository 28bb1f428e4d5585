//! # Live Values
//!
//! [`FieldValue`] is the typed, in-memory value of one field; [`Instance`]
//! binds a record to its field values. Instances are ordinary values: they
//! can be mutated freely and are only checked when explicitly validated.
//!
//! ## Equality
//!
//! `FieldValue::Set` compares by set-equality. Decoded sets make no promise
//! about member order, so two sets holding the same members are equal
//! regardless of how they were built.
//!
//! `FieldValue::Map` keeps insertion order, which is the order encode writes
//! and decode reads. Equality ignores that order.

use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::error::DefinitionError;
use crate::record::Record;

/// Insertion-ordered string-keyed entries of a mapping field.
pub type FieldMap = IndexMap<String, FieldValue>;

/// The live value of one field.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<FieldValue>),
    /// Duplicate-free collection; member order is unspecified.
    Set(Vec<FieldValue>),
    Map(FieldMap),
    Record(Instance),
    /// An enum member, by member name.
    Enum(String),
}

impl FieldValue {
    /// Build a list value.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<FieldValue>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a set value, dropping duplicates.
    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<FieldValue>,
    {
        Self::Set(dedup(items.into_iter().map(Into::into)))
    }

    /// Build a map value.
    pub fn map<I, K, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<FieldValue>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn enum_member(name: &str) -> Self {
        Self::Enum(name.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Instance> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Structural conversion from a generic value, with no type direction.
    ///
    /// This is the pass-through path for untyped and unrecognized fields.
    /// Integers outside the `i64` range become floats.
    pub fn from_generic(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::Str(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from_generic).collect()),
            Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_generic(v)))
                    .collect(),
            ),
        }
    }

    /// Structural conversion to a generic value, with no type direction.
    ///
    /// Enum members render as their member name, nested records as maps
    /// keyed by wire name. Non-finite floats become `null`.
    pub fn to_generic(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Number(Number::from(*i)),
            Self::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::Str(s) | Self::Enum(s) => Value::String(s.clone()),
            Self::List(items) | Self::Set(items) => {
                Value::Array(items.iter().map(Self::to_generic).collect())
            }
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_generic()))
                    .collect(),
            ),
            Self::Record(instance) => {
                let mut out = Map::new();
                for field in instance.record().fields() {
                    if let Some(v) = instance.get(field.name()) {
                        out.insert(field.wire().to_string(), v.to_generic());
                    }
                }
                Value::Object(out)
            }
        }
    }
}

/// Remove duplicates, keeping first occurrences.
pub fn dedup(items: impl IntoIterator<Item = FieldValue>) -> Vec<FieldValue> {
    let mut out: Vec<FieldValue> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => {
                a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
            }
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Instance> for FieldValue {
    fn from(instance: Instance) -> Self {
        Self::Record(instance)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(items: Vec<FieldValue>) -> Self {
        Self::List(items)
    }
}

/// A record bound to its field values, keyed by host-side field name.
#[derive(Debug, Clone)]
pub struct Instance {
    record: Arc<Record>,
    values: BTreeMap<String, FieldValue>,
}

impl Instance {
    /// A new instance with every declared default applied.
    pub fn new(record: &Arc<Record>) -> Self {
        let mut instance = Self::empty(record);
        for field in record.fields() {
            if let Some(default) = field.default() {
                if !default.is_null() {
                    instance
                        .values
                        .insert(field.name().to_string(), default.clone());
                }
            }
        }
        instance
    }

    /// A new instance with no values set, not even defaults.
    pub fn empty(record: &Arc<Record>) -> Self {
        Self {
            record: Arc::clone(record),
            values: BTreeMap::new(),
        }
    }

    pub fn record(&self) -> &Arc<Record> {
        &self.record
    }

    /// Set a field by host-side name. Setting `Null` clears the field.
    ///
    /// # Errors
    ///
    /// Returns `DefinitionError::UnknownField` if the record has no such field.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), DefinitionError> {
        if self.record.field(name).is_none() {
            return Err(DefinitionError::UnknownField {
                record: self.record.name().to_string(),
                field: name.to_string(),
            });
        }
        let value = value.into();
        if value.is_null() {
            self.values.remove(name);
        } else {
            self.values.insert(name.to_string(), value);
        }
        Ok(())
    }

    /// Builder-style [`Self::set`].
    ///
    /// # Errors
    ///
    /// Returns `DefinitionError::UnknownField` if the record has no such field.
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Result<Self, DefinitionError> {
        self.set(name, value)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Remove a field's value, returning it.
    pub fn take(&mut self, name: &str) -> Option<FieldValue> {
        self.values.remove(name)
    }

    /// Set values, by host-side field name.
    pub fn values(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.record.id() == other.record.id() && self.values == other.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDescriptor;
    use crate::types::DeclaredType;
    use serde_json::json;

    fn record() -> Arc<Record> {
        Record::builder("Service")
            .field(FieldDescriptor::new("host", DeclaredType::string()).default_value("localhost"))
            .field(FieldDescriptor::new("port", DeclaredType::integer()).optional())
            .build()
            .unwrap()
    }

    #[test]
    fn new_applies_defaults_empty_does_not() {
        let r = record();
        assert_eq!(Instance::new(&r).get("host"), Some(&FieldValue::from("localhost")));
        assert!(Instance::empty(&r).get("host").is_none());
    }

    #[test]
    fn setting_unknown_field_fails() {
        let err = Instance::new(&record()).with("nope", 1).unwrap_err();
        assert!(matches!(err, DefinitionError::UnknownField { .. }));
    }

    #[test]
    fn setting_null_clears() {
        let mut i = Instance::new(&record()).with("port", 80).unwrap();
        i.set("port", FieldValue::Null).unwrap();
        assert!(i.get("port").is_none());
    }

    #[test]
    fn set_equality_ignores_order() {
        assert_eq!(FieldValue::set([1, 2, 3]), FieldValue::set([3, 1, 2]));
        assert_ne!(FieldValue::list([1, 2, 3]), FieldValue::list([3, 1, 2]));
        assert_eq!(FieldValue::set([1, 1, 2]), FieldValue::Set(vec![1.into(), 2.into()]));
    }

    #[test]
    fn maps_keep_insertion_order() {
        let m = FieldValue::map([("zeta", 1), ("alpha", 2)]);
        let FieldValue::Map(entries) = &m else {
            panic!("expected a map");
        };
        let keys: Vec<&str> = entries.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(m, FieldValue::map([("alpha", 2), ("zeta", 1)]));

        let raw = json!({"zeta": 1, "alpha": 2});
        assert_eq!(FieldValue::from_generic(&raw).to_generic(), raw);
        let rendered: Vec<String> = match FieldValue::from_generic(&raw).to_generic() {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        };
        assert_eq!(rendered, vec!["zeta", "alpha"]);
    }

    #[test]
    fn generic_conversion_is_structural() {
        let raw = json!({"a": [1, "x", true, null], "b": {"c": 1.5}});
        let v = FieldValue::from_generic(&raw);
        assert_eq!(v.to_generic(), raw);
    }

    #[test]
    fn record_renders_by_wire_name() {
        let r = Record::builder("R")
            .field(FieldDescriptor::new("display_name", DeclaredType::string()).wire_name("display-name"))
            .build()
            .unwrap();
        let i = Instance::new(&r).with("display_name", "x").unwrap();
        assert_eq!(FieldValue::Record(i).to_generic(), json!({"display-name": "x"}));
    }

    #[test]
    fn instances_of_distinct_records_differ() {
        let (a, b) = (record(), record());
        assert_ne!(Instance::new(&a), Instance::new(&b));
        assert_eq!(Instance::new(&a), Instance::new(&a));
    }
}
