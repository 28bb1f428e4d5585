//! # Value Codec
//!
//! Converts record instances to and from the generic map representation
//! every format handler dumps from and loads into.
//!
//! ## Contract
//!
//! - `encode` walks fields in declaration order and emits one entry per set
//!   field, keyed by wire name. Unset fields emit nothing.
//! - `decode` is lenient: absent keys leave the field unset (or apply its
//!   declared default), and values that do not fit their shape pass through
//!   unchanged. The only decode failures are enum reverse-lookup misses and
//!   custom decoder errors.
//! - For instances whose values conform to their shapes,
//!   `decode(encode(x)) == x`. Sets round-trip up to set-equality; fields
//!   with custom hooks round-trip only as faithfully as their hooks do.

use std::sync::Arc;

use filecfg_core::value::dedup;
use filecfg_core::{
    DecodeError, FieldDescriptor, FieldMap, FieldValue, Instance, Record, ShapeCache, TypeShape,
};
use serde_json::{Map, Value};

use crate::coerce::coerce_scalar;
use crate::error::CodecError;

/// The generic map: an ordered, string-keyed tree of JSON values.
pub type GenericMap = Map<String, Value>;

/// Shape-directed encoder/decoder.
#[derive(Debug, Clone)]
pub struct Codec {
    cache: Arc<ShapeCache>,
}

impl Codec {
    /// A codec reading shapes from `cache`.
    pub fn new(cache: Arc<ShapeCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<ShapeCache> {
        &self.cache
    }

    /// Encode an instance into a generic map.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Classify` if a field (at any depth) declares a
    /// mapping with a non-string key.
    pub fn encode(&self, instance: &Instance) -> Result<GenericMap, CodecError> {
        let mut out = GenericMap::new();
        for field in instance.record().fields() {
            let Some(value) = instance.get(field.name()) else {
                continue;
            };

            if let Some(encoder) = field.encode_hook() {
                out.insert(field.wire().to_string(), encoder(value));
                continue;
            }

            let shape = self.cache.shape_of(field)?;
            let encoded = self.encode_value(field, &shape, value)?;
            out.insert(field.wire().to_string(), encoded);
        }
        Ok(out)
    }

    /// Encode a single value of `field` under `shape`, ignoring hooks.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Classify` if a nested record field declares a
    /// mapping with a non-string key.
    pub fn encode_value(
        &self,
        field: &FieldDescriptor,
        shape: &TypeShape,
        value: &FieldValue,
    ) -> Result<Value, CodecError> {
        let encoded = match (shape, value) {
            (TypeShape::RecordRef(_), FieldValue::Record(instance)) => {
                Value::Object(self.encode(instance)?)
            }
            (TypeShape::Sequence(element), FieldValue::List(items) | FieldValue::Set(items)) => {
                Value::Array(self.encode_items(field, element, items)?)
            }
            (TypeShape::SetOf(element), FieldValue::List(items) | FieldValue::Set(items)) => {
                let mut unique: Vec<Value> = Vec::with_capacity(items.len());
                for item in self.encode_items(field, element, items)? {
                    if !unique.contains(&item) {
                        unique.push(item);
                    }
                }
                Value::Array(unique)
            }
            (TypeShape::Mapping { value: value_shape, .. }, FieldValue::Map(entries)) => {
                let mut out = GenericMap::new();
                for (key, entry) in entries {
                    out.insert(key.clone(), self.encode_value(field, value_shape, entry)?);
                }
                Value::Object(out)
            }
            (TypeShape::EnumRef(enum_type), FieldValue::Enum(member)) => enum_type
                .member(member)
                .map_or_else(|| Value::String(member.clone()), |m| m.value.clone()),
            (TypeShape::Unrecognized { type_name: Some(name) }, _) => {
                tracing::warn!(
                    field = field.qualified_name(),
                    type_name = %name,
                    "unrecognized type, encoding value unchanged"
                );
                value.to_generic()
            }
            _ => value.to_generic(),
        };
        Ok(encoded)
    }

    fn encode_items(
        &self,
        field: &FieldDescriptor,
        element: &TypeShape,
        items: &[FieldValue],
    ) -> Result<Vec<Value>, CodecError> {
        items
            .iter()
            .map(|item| self.encode_value(field, element, item))
            .collect()
    }

    /// Decode a generic map into an instance of `record`.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Decode` for enum values with no matching member
    /// or failing custom decoders, and `CodecError::Classify` for fields
    /// declaring non-string mapping keys.
    pub fn decode(&self, map: &GenericMap, record: &Arc<Record>) -> Result<Instance, CodecError> {
        let mut instance = Instance::empty(record);
        for field in record.fields() {
            let Some(raw) = map.get(field.wire()) else {
                if let Some(default) = field.default() {
                    instance.set(field.name(), default.clone())?;
                }
                continue;
            };

            let value = match field.decode_hook() {
                Some(decoder) => decoder(raw).map_err(|reason| DecodeError::Hook {
                    field: field.qualified_name().to_string(),
                    reason,
                })?,
                None => {
                    let shape = self.cache.shape_of(field)?;
                    self.decode_value(field, &shape, raw)?
                }
            };
            instance.set(field.name(), value)?;
        }
        Ok(instance)
    }

    /// Decode a single raw value of `field` under `shape`, ignoring hooks.
    ///
    /// # Errors
    ///
    /// See [`Self::decode`].
    pub fn decode_value(
        &self,
        field: &FieldDescriptor,
        shape: &TypeShape,
        raw: &Value,
    ) -> Result<FieldValue, CodecError> {
        if raw.is_null() {
            return Ok(FieldValue::Null);
        }

        let decoded = match (shape, raw) {
            (TypeShape::RecordRef(record), Value::Object(map)) => {
                FieldValue::Record(self.decode(map, record)?)
            }
            (TypeShape::Sequence(element), Value::Array(items)) => {
                FieldValue::List(self.decode_items(field, element, items)?)
            }
            (TypeShape::SetOf(element), Value::Array(items)) => {
                FieldValue::Set(dedup(self.decode_items(field, element, items)?))
            }
            (TypeShape::Mapping { value: value_shape, .. }, Value::Object(entries)) => {
                let mut out = FieldMap::with_capacity(entries.len());
                for (key, entry) in entries {
                    out.insert(key.clone(), self.decode_value(field, value_shape, entry)?);
                }
                FieldValue::Map(out)
            }
            (TypeShape::EnumRef(enum_type), _) => match enum_type.member_for_value(raw) {
                Some(member) => FieldValue::Enum(member.name.clone()),
                None => {
                    return Err(DecodeError::UnknownEnumValue {
                        field: field.qualified_name().to_string(),
                        enum_name: enum_type.name().to_string(),
                        value: raw.to_string(),
                    }
                    .into())
                }
            },
            (TypeShape::Scalar(kind), _) => coerce_scalar(*kind, raw),
            (TypeShape::PatternString(_), _) => coerce_scalar(filecfg_core::ScalarKind::String, raw),
            (TypeShape::Unrecognized { type_name: Some(name) }, _) => {
                tracing::warn!(
                    field = field.qualified_name(),
                    type_name = %name,
                    "unrecognized type, decoding value unchanged"
                );
                FieldValue::from_generic(raw)
            }
            _ => FieldValue::from_generic(raw),
        };
        Ok(decoded)
    }

    fn decode_items(
        &self,
        field: &FieldDescriptor,
        element: &TypeShape,
        items: &[Value],
    ) -> Result<Vec<FieldValue>, CodecError> {
        items
            .iter()
            .map(|item| self.decode_value(field, element, item))
            .collect()
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(ShapeCache::shared())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filecfg_core::{ContainerKind, DeclaredType, EnumType};
    use serde_json::json;

    fn dependency() -> Arc<Record> {
        Record::builder("Project.Dependency")
            .field(FieldDescriptor::new("name", DeclaredType::string()))
            .field(FieldDescriptor::new("version", DeclaredType::pattern(r"^v\d+$").unwrap()))
            .build()
            .unwrap()
    }

    fn project(dep: &Arc<Record>) -> Arc<Record> {
        Record::builder("Project")
            .field(FieldDescriptor::new("name", DeclaredType::string()))
            .field(FieldDescriptor::new(
                "dependencies",
                DeclaredType::map_of(DeclaredType::string(), DeclaredType::record(dep)),
            ))
            .build()
            .unwrap()
    }

    #[test]
    fn nested_project_encodes_and_decodes() {
        let dep = dependency();
        let proj = project(&dep);
        let d1 = Instance::new(&dep)
            .with("name", "D")
            .unwrap()
            .with("version", "v3")
            .unwrap();
        let p = Instance::new(&proj)
            .with("name", "P")
            .unwrap()
            .with("dependencies", FieldValue::map([("d1", d1)]))
            .unwrap();

        let codec = Codec::default();
        let encoded = codec.encode(&p).unwrap();
        assert_eq!(
            Value::Object(encoded.clone()),
            json!({"name": "P", "dependencies": {"d1": {"name": "D", "version": "v3"}}})
        );
        assert_eq!(codec.decode(&encoded, &proj).unwrap(), p);
    }

    #[test]
    fn encode_follows_declaration_order_and_wire_names() {
        let r = Record::builder("R")
            .field(FieldDescriptor::new("zeta", DeclaredType::integer()))
            .field(FieldDescriptor::new("alpha", DeclaredType::integer()).wire_name("a-l-p-h-a"))
            .build()
            .unwrap();
        let i = Instance::new(&r).with("alpha", 1).unwrap().with("zeta", 2).unwrap();
        let keys: Vec<String> = Codec::default().encode(&i).unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta".to_string(), "a-l-p-h-a".to_string()]);
    }

    #[test]
    fn unset_optional_field_emits_nothing() {
        let r = Record::builder("R")
            .field(FieldDescriptor::new("a", DeclaredType::string()).optional())
            .field(FieldDescriptor::new("b", DeclaredType::string()).optional().default_value("x"))
            .build()
            .unwrap();
        let encoded = Codec::default().encode(&Instance::new(&r)).unwrap();
        assert_eq!(Value::Object(encoded), json!({"b": "x"}));
    }

    #[test]
    fn decode_absent_field_is_lenient_and_applies_default() {
        let r = Record::builder("R")
            .field(FieldDescriptor::new("a", DeclaredType::string()))
            .field(FieldDescriptor::new("b", DeclaredType::integer()).default_value(5))
            .build()
            .unwrap();
        let i = Codec::default().decode(&GenericMap::new(), &r).unwrap();
        assert!(i.get("a").is_none());
        assert_eq!(i.get("b"), Some(&FieldValue::Int(5)));
    }

    #[test]
    fn enum_encodes_underlying_value_and_reverse_looks_up() {
        let level = Arc::new(EnumType::new("Level", [("LOW", 1), ("HIGH", 10)]).unwrap());
        let r = Record::builder("R")
            .field(FieldDescriptor::new("level", DeclaredType::enumeration(&level)))
            .build()
            .unwrap();
        let codec = Codec::default();
        let i = Instance::new(&r).with("level", FieldValue::enum_member("HIGH")).unwrap();
        let encoded = codec.encode(&i).unwrap();
        assert_eq!(encoded["level"], json!(10));
        assert_eq!(codec.decode(&encoded, &r).unwrap(), i);

        let bad = json!({"level": 5}).as_object().unwrap().clone();
        let err = codec.decode(&bad, &r).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Decode(DecodeError::UnknownEnumValue { .. })
        ));
    }

    #[test]
    fn sets_collapse_duplicates_both_ways() {
        let r = Record::builder("R")
            .field(FieldDescriptor::new("tags", DeclaredType::set_of(DeclaredType::string())))
            .build()
            .unwrap();
        let codec = Codec::default();
        let i = Instance::new(&r)
            .with("tags", FieldValue::list(["a", "b", "a"]))
            .unwrap();
        let encoded = codec.encode(&i).unwrap();
        assert_eq!(encoded["tags"].as_array().unwrap().len(), 2);

        let raw = json!({"tags": ["x", "y", "x"]}).as_object().unwrap().clone();
        let decoded = codec.decode(&raw, &r).unwrap();
        assert_eq!(decoded.get("tags"), Some(&FieldValue::set(["y", "x"])));
    }

    #[test]
    fn custom_hooks_short_circuit() {
        let r = Record::builder("R")
            .field(
                FieldDescriptor::new("port", DeclaredType::integer())
                    .encoder(|v| json!(format!("port-{}", v.as_i64().unwrap_or_default())))
                    .decoder(|raw| {
                        raw.as_str()
                            .and_then(|s| s.strip_prefix("port-"))
                            .and_then(|s| s.parse::<i64>().ok())
                            .map(FieldValue::Int)
                            .ok_or_else(|| format!("cannot parse {raw}"))
                    }),
            )
            .build()
            .unwrap();
        let codec = Codec::default();
        let i = Instance::new(&r).with("port", 80).unwrap();
        let encoded = codec.encode(&i).unwrap();
        assert_eq!(encoded["port"], json!("port-80"));
        assert_eq!(codec.decode(&encoded, &r).unwrap(), i);

        let bad = json!({"port": 80}).as_object().unwrap().clone();
        assert!(matches!(
            codec.decode(&bad, &r).unwrap_err(),
            CodecError::Decode(DecodeError::Hook { .. })
        ));
    }

    #[test]
    fn type_mismatches_pass_through() {
        let dep = dependency();
        let r = Record::builder("R")
            .field(FieldDescriptor::new("count", DeclaredType::integer()))
            .field(FieldDescriptor::new("items", DeclaredType::list_of(DeclaredType::string())))
            .field(FieldDescriptor::new("dep", DeclaredType::record(&dep)))
            .build()
            .unwrap();
        let raw = json!({"count": "many", "items": "not-a-list", "dep": 3})
            .as_object()
            .unwrap()
            .clone();
        let i = Codec::default().decode(&raw, &r).unwrap();
        assert_eq!(i.get("count"), Some(&FieldValue::from("many")));
        assert_eq!(i.get("items"), Some(&FieldValue::from("not-a-list")));
        assert_eq!(i.get("dep"), Some(&FieldValue::Int(3)));
    }

    #[test]
    fn scalar_strings_coerce_on_decode() {
        let r = Record::builder("R")
            .field(FieldDescriptor::new("port", DeclaredType::integer()))
            .field(FieldDescriptor::new("debug", DeclaredType::boolean()))
            .build()
            .unwrap();
        let raw = json!({"port": "8080", "debug": "false"}).as_object().unwrap().clone();
        let i = Codec::default().decode(&raw, &r).unwrap();
        assert_eq!(i.get("port"), Some(&FieldValue::Int(8080)));
        assert_eq!(i.get("debug"), Some(&FieldValue::Bool(false)));
    }

    #[test]
    fn untyped_and_unrecognized_fields_pass_through() {
        let r = Record::builder("R")
            .field(FieldDescriptor::untyped("anything"))
            .field(FieldDescriptor::new("when", DeclaredType::opaque("datetime")))
            .build()
            .unwrap();
        let raw = json!({"anything": {"a": [1, 2]}, "when": "2024-01-01T00:00:00Z"})
            .as_object()
            .unwrap()
            .clone();
        let codec = Codec::default();
        let i = codec.decode(&raw, &r).unwrap();
        assert_eq!(codec.encode(&i).unwrap(), raw);
    }

    #[test]
    fn ordered_mapping_keeps_key_order_through_decode_and_encode() {
        let r = Record::builder("Routes")
            .field(FieldDescriptor::new(
                "routes",
                DeclaredType::Container {
                    kind: ContainerKind::OrderedDict,
                    params: vec![DeclaredType::string(), DeclaredType::integer()],
                },
            ))
            .build()
            .unwrap();
        let raw = json!({"routes": {"zeta": 1, "alpha": 2, "mid": 3}});
        let raw = raw.as_object().unwrap();
        let codec = Codec::default();

        let decoded = codec.decode(raw, &r).unwrap();
        let Some(FieldValue::Map(entries)) = decoded.get("routes") else {
            panic!("expected a map");
        };
        let keys: Vec<&str> = entries.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);

        let encoded = codec.encode(&decoded).unwrap();
        let keys: Vec<&str> = encoded["routes"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn integers_in_number_fields_round_trip_unchanged() {
        let r = Record::builder("Ratio")
            .field(FieldDescriptor::new("ratio", DeclaredType::number()))
            .field(FieldDescriptor::new("count", DeclaredType::integer()))
            .build()
            .unwrap();
        let codec = Codec::default();
        let i = Instance::new(&r)
            .with("ratio", 2)
            .unwrap()
            .with("count", 3)
            .unwrap();
        let back = codec.decode(&codec.encode(&i).unwrap(), &r).unwrap();
        assert_eq!(back.get("ratio"), Some(&FieldValue::Int(2)));
        assert_eq!(back, i);

        let i = i.with("ratio", 2.0).unwrap();
        let back = codec.decode(&codec.encode(&i).unwrap(), &r).unwrap();
        assert_eq!(back.get("ratio"), Some(&FieldValue::Float(2.0)));
    }

    #[test]
    fn unsupported_key_type_fails_encode() {
        let r = Record::builder("R")
            .field(FieldDescriptor::new(
                "ports",
                DeclaredType::map_of(DeclaredType::integer(), DeclaredType::string()),
            ))
            .build()
            .unwrap();
        let i = Instance::new(&r)
            .with("ports", FieldValue::map([("80", "http")]))
            .unwrap();
        assert!(matches!(
            Codec::default().encode(&i).unwrap_err(),
            CodecError::Classify(_)
        ));
    }
}
