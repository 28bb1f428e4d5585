//! # Schema Compiler
//!
//! Turns a [`Record`] into a JSON-Schema draft-07 document by recursing on
//! each field's cached [`TypeShape`].
//!
//! ## Node rules
//!
//! | Shape | Node | Modifiers |
//! |---|---|---|
//! | `Scalar(string)`, `PatternString` | `type: string` (+ `pattern`) | `minLength`/`maxLength` |
//! | `Scalar(integer|number)` | `type: integer|number` | `minimum`/`maximum` |
//! | `Scalar(boolean)` | `type: boolean` | none |
//! | `Sequence` | `type: array`, `items` | `minItems`/`maxItems`, `uniqueItems`, `contains` |
//! | `SetOf` | as `Sequence`, `uniqueItems: true` | as `Sequence` |
//! | `Mapping` | `type: object`, `patternProperties` | none |
//! | `RecordRef` | nested object node | none |
//! | `EnumRef` | `enum` (+ `type` when uniform) | none |
//! | `Unrecognized` | `{}` | none |
//!
//! A modifier outside its shape's column is dropped with a
//! [`Warning::ModifierNotApplicable`]. Only classification failures and
//! default-value encoding failures abort compilation.
//!
//! ## Locators
//!
//! Every node below the root carries `$id: "#/<path>"`, where the path
//! accumulates `properties/<wireName>` per field, `items` per sequence
//! element and `values` per mapping value. Locators are for humans reading
//! the document; nothing resolves them.

use std::sync::Arc;

use filecfg_codec::{Codec, CodecError};
use filecfg_core::{
    ClassifyError, FieldDescriptor, Primitive, Record, ShapeCache, TypeShape, Warning,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// The only draft the compiler emits.
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Error that stops compilation of a record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A field's declared type could not be classified.
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    /// A field default could not be encoded for the `default` keyword.
    #[error("cannot encode default of field '{field}': {source}")]
    Default {
        /// Qualified field name.
        field: String,
        /// Underlying codec failure.
        source: CodecError,
    },
}

/// A compiled schema document and the warnings raised producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSchema {
    pub document: Value,
    pub warnings: Vec<Warning>,
}

impl CompiledSchema {
    /// The root `$id`, if the document has one.
    pub fn id(&self) -> Option<&str> {
        self.document.get("$id").and_then(Value::as_str)
    }
}

/// Shape-directed schema compiler.
#[derive(Debug, Clone)]
pub struct SchemaCompiler {
    codec: Codec,
}

impl SchemaCompiler {
    /// A compiler reading shapes from `cache`. Pass the same cache the codec
    /// uses so both agree on every field.
    pub fn new(cache: Arc<ShapeCache>) -> Self {
        Self {
            codec: Codec::new(cache),
        }
    }

    pub fn cache(&self) -> &Arc<ShapeCache> {
        self.codec.cache()
    }

    /// Compile a root schema document for `record`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Classify` if any field, at any depth, declares a
    /// mapping with a non-string key.
    pub fn compile(&self, record: &Arc<Record>) -> Result<CompiledSchema, SchemaError> {
        let mut warnings = Vec::new();
        let mut node = Map::new();

        let draft = record.schema_draft().unwrap_or(DRAFT_07);
        if !is_draft_07(draft) {
            warnings.push(Warning::UnsupportedSchemaDraft {
                record: record.name().to_string(),
                draft: draft.to_string(),
            });
        }
        node.insert("$schema".into(), json!(draft));
        let id = record
            .schema_id()
            .map_or_else(|| format!("{}.json", record.name()), str::to_string);
        node.insert("$id".into(), json!(id));
        self.object_body(record, "", &mut node, &mut warnings)?;

        tracing::debug!(
            record = record.name(),
            warnings = warnings.len(),
            "schema compiled"
        );
        Ok(finish(Value::Object(node), warnings))
    }

    /// Compile `record` as a nested object node located at `path_prefix`.
    ///
    /// The node carries no `$schema`; its own `$id` is `#/<path_prefix>`
    /// and its fields extend that path.
    ///
    /// # Errors
    ///
    /// See [`Self::compile`].
    pub fn compile_at(
        &self,
        record: &Arc<Record>,
        path_prefix: &str,
    ) -> Result<CompiledSchema, SchemaError> {
        let mut warnings = Vec::new();
        let mut node = Map::new();
        node.insert("$id".into(), json!(format!("#/{path_prefix}")));
        self.object_body(record, path_prefix, &mut node, &mut warnings)?;
        Ok(finish(Value::Object(node), warnings))
    }

    fn object_body(
        &self,
        record: &Record,
        path: &str,
        node: &mut Map<String, Value>,
        warnings: &mut Vec<Warning>,
    ) -> Result<(), SchemaError> {
        node.insert("type".into(), json!("object"));
        node.insert("title".into(), json!(record.title()));
        if let Some(description) = record.description() {
            node.insert("description".into(), json!(description));
        }

        let required: Vec<Value> = record
            .fields()
            .iter()
            .filter(|f| f.is_required())
            .map(|f| json!(f.wire()))
            .collect();
        node.insert("required".into(), Value::Array(required));

        let mut properties = Map::new();
        for field in record.fields() {
            let field_path = join(path, &format!("properties/{}", field.wire()));
            let compiled = self.field_node(field, &field_path, warnings)?;
            properties.insert(field.wire().to_string(), Value::Object(compiled));
        }
        node.insert("properties".into(), Value::Object(properties));
        Ok(())
    }

    fn field_node(
        &self,
        field: &FieldDescriptor,
        path: &str,
        warnings: &mut Vec<Warning>,
    ) -> Result<Map<String, Value>, SchemaError> {
        let shape = self.codec.cache().shape_of(field)?;
        let mut node = self.shape_node(field, &shape, path, warnings)?;
        apply_modifiers(field, &shape, &mut node, warnings);

        if let Some(default) = field.default().filter(|d| !d.is_null()) {
            let encoded = match field.encode_hook() {
                Some(encoder) => encoder(default),
                None => self
                    .codec
                    .encode_value(field, &shape, default)
                    .map_err(|source| SchemaError::Default {
                        field: field.qualified_name().to_string(),
                        source,
                    })?,
            };
            node.insert("default".into(), encoded);
        }
        if let Some(title) = field.title_text() {
            node.insert("title".into(), json!(title));
        }
        if let Some(description) = field.description_text() {
            node.insert("description".into(), json!(description));
        }
        if !field.examples().is_empty() {
            node.insert("examples".into(), Value::Array(field.examples().to_vec()));
        }
        Ok(node)
    }

    fn shape_node(
        &self,
        field: &FieldDescriptor,
        shape: &TypeShape,
        path: &str,
        warnings: &mut Vec<Warning>,
    ) -> Result<Map<String, Value>, SchemaError> {
        let mut node = Map::new();
        node.insert("$id".into(), json!(format!("#/{path}")));

        match shape {
            TypeShape::Scalar(kind) => {
                node.insert("type".into(), json!(kind.schema_type()));
            }
            TypeShape::PatternString(pattern) => {
                node.insert("type".into(), json!("string"));
                node.insert("pattern".into(), json!(pattern.pattern()));
            }
            TypeShape::Sequence(element) | TypeShape::SetOf(element) => {
                let items_path = join(path, "items");
                let items = self.shape_node(field, element, &items_path, warnings)?;
                node.insert("type".into(), json!("array"));
                node.insert("items".into(), Value::Object(items));
                if matches!(shape, TypeShape::SetOf(_)) {
                    node.insert("uniqueItems".into(), json!(true));
                }
            }
            TypeShape::Mapping { key, value } => {
                let values_path = join(path, "values");
                let values = self.shape_node(field, value, &values_path, warnings)?;
                let mut pattern_properties = Map::new();
                pattern_properties.insert(key.schema_pattern().to_string(), Value::Object(values));
                node.insert("type".into(), json!("object"));
                node.insert("patternProperties".into(), Value::Object(pattern_properties));
            }
            TypeShape::RecordRef(record) => {
                self.object_body(record, path, &mut node, warnings)?;
            }
            TypeShape::EnumRef(enum_type) => {
                let values: Vec<Value> =
                    enum_type.members().iter().map(|m| m.value.clone()).collect();
                if let Some(kind) = uniform_json_type(&values) {
                    node.insert("type".into(), json!(kind));
                }
                node.insert("enum".into(), Value::Array(values));
            }
            TypeShape::Unrecognized { type_name } => {
                if let Some(type_name) = type_name {
                    warnings.push(Warning::UnrecognizedType {
                        field: field.qualified_name().to_string(),
                        type_name: type_name.clone(),
                    });
                }
            }
        }
        Ok(node)
    }
}

fn finish(document: Value, warnings: Vec<Warning>) -> CompiledSchema {
    for warning in &warnings {
        warning.emit();
    }
    CompiledSchema { document, warnings }
}

fn is_draft_07(draft: &str) -> bool {
    draft.trim_end_matches('#') == DRAFT_07.trim_end_matches('#')
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{path}/{segment}")
    }
}

fn json_type(value: &Value) -> Option<&'static str> {
    match value {
        Value::String(_) => Some("string"),
        Value::Bool(_) => Some("boolean"),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some("integer"),
        Value::Number(_) => Some("number"),
        _ => None,
    }
}

fn uniform_json_type(values: &[Value]) -> Option<&'static str> {
    let first = json_type(values.first()?)?;
    values
        .iter()
        .all(|v| json_type(v) == Some(first))
        .then_some(first)
}

#[derive(Clone, Copy)]
enum BoundKind {
    Length,
    Range,
    Items,
}

impl BoundKind {
    fn keywords(self) -> (&'static str, &'static str) {
        match self {
            Self::Length => ("minLength", "maxLength"),
            Self::Range => ("minimum", "maximum"),
            Self::Items => ("minItems", "maxItems"),
        }
    }
}

fn apply_modifiers(
    field: &FieldDescriptor,
    shape: &TypeShape,
    node: &mut Map<String, Value>,
    warnings: &mut Vec<Warning>,
) {
    let (bounds, collection) = match shape {
        TypeShape::Scalar(Primitive::String) | TypeShape::PatternString(_) => {
            (Some(BoundKind::Length), false)
        }
        TypeShape::Scalar(Primitive::Integer | Primitive::Number) => {
            (Some(BoundKind::Range), false)
        }
        TypeShape::Sequence(_) | TypeShape::SetOf(_) => (Some(BoundKind::Items), true),
        _ => (None, false),
    };

    let not_applicable = |warnings: &mut Vec<Warning>, modifier: &'static str| {
        warnings.push(Warning::ModifierNotApplicable {
            field: field.qualified_name().to_string(),
            modifier,
            shape: shape.to_string(),
        });
    };

    let requested = [("min", field.min_bound()), ("max", field.max_bound())];
    match bounds {
        Some(kind) => {
            let (min_keyword, max_keyword) = kind.keywords();
            for ((modifier, bound), keyword) in requested.into_iter().zip([min_keyword, max_keyword]) {
                let Some(bound) = bound else { continue };
                match bound_value(kind, bound) {
                    Ok(value) => {
                        node.insert(keyword.into(), value);
                    }
                    Err(reason) => warnings.push(Warning::InvalidModifier {
                        field: field.qualified_name().to_string(),
                        modifier,
                        reason,
                    }),
                }
            }
        }
        None => {
            for (modifier, bound) in requested {
                if bound.is_some() {
                    not_applicable(warnings, modifier);
                }
            }
        }
    }

    if field.is_unique() {
        if collection {
            node.insert("uniqueItems".into(), json!(true));
        } else {
            not_applicable(warnings, "unique");
        }
    }
    if let Some(member) = field.contains_value() {
        if collection {
            node.insert("contains".into(), json!({ "const": member }));
        } else {
            not_applicable(warnings, "contains");
        }
    }
}

fn bound_value(kind: BoundKind, bound: &Value) -> Result<Value, String> {
    match (kind, bound) {
        (BoundKind::Range, Value::Number(_)) => Ok(bound.clone()),
        (BoundKind::Length | BoundKind::Items, Value::Number(n)) if n.as_u64().is_some() => {
            Ok(bound.clone())
        }
        (BoundKind::Range, _) => Err(format!("expected a number, got {bound}")),
        _ => Err(format!("expected a non-negative integer, got {bound}")),
    }
}
