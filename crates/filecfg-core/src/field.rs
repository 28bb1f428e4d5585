//! # Field Descriptors
//!
//! One declared attribute of a [`Record`](crate::Record): host name, wire
//! name, declared type, requiredness, default, documentation, bounds and
//! optional custom codec hooks.
//!
//! Descriptors are built with a consuming builder and frozen once handed to
//! a [`RecordBuilder`](crate::RecordBuilder). The builder assigns each one a
//! [`FieldId`] that keys the classification cache.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::record::RecordId;
use crate::types::DeclaredType;
use crate::value::FieldValue;

/// Identity of one field: its record and its declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId {
    pub record: RecordId,
    pub index: usize,
}

impl FieldId {
    pub(crate) const UNBOUND: FieldId = FieldId {
        record: RecordId::UNBOUND,
        index: usize::MAX,
    };
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.record, self.index)
    }
}

/// Encoder hook: live value to generic value.
pub type EncodeFn = Arc<dyn Fn(&FieldValue) -> Value + Send + Sync>;

/// Decoder hook: generic value to live value. `Err` carries a message.
pub type DecodeFn = Arc<dyn Fn(&Value) -> Result<FieldValue, String> + Send + Sync>;

/// Custom codec strategy for a single field.
///
/// A present hook replaces the generic recursive codec for that direction
/// entirely; its output is used verbatim.
#[derive(Clone, Default)]
pub struct FieldHooks {
    pub encoder: Option<EncodeFn>,
    pub decoder: Option<DecodeFn>,
}

impl FieldHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoder<F>(mut self, f: F) -> Self
    where
        F: Fn(&FieldValue) -> Value + Send + Sync + 'static,
    {
        self.encoder = Some(Arc::new(f));
        self
    }

    pub fn with_decoder<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<FieldValue, String> + Send + Sync + 'static,
    {
        self.decoder = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for FieldHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldHooks")
            .field("encoder", &self.encoder.as_ref().map(|_| "<fn>"))
            .field("decoder", &self.decoder.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Metadata for one declared field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub(crate) id: FieldId,
    pub(crate) qualified_name: String,
    name: String,
    wire_name: Option<String>,
    declared_type: Option<DeclaredType>,
    required: bool,
    default: Option<FieldValue>,
    title: Option<String>,
    description: Option<String>,
    examples: Vec<Value>,
    min: Option<Value>,
    max: Option<Value>,
    unique: bool,
    contains: Option<Value>,
    hooks: Option<FieldHooks>,
}

impl FieldDescriptor {
    /// A required field of the given declared type.
    pub fn new(name: &str, declared_type: DeclaredType) -> Self {
        let mut field = Self::untyped(name);
        field.declared_type = Some(declared_type);
        field
    }

    /// A required field with no declared type. Values pass through the
    /// codec unchanged and the schema node is unconstrained.
    pub fn untyped(name: &str) -> Self {
        Self {
            id: FieldId::UNBOUND,
            qualified_name: name.to_string(),
            name: name.to_string(),
            wire_name: None,
            declared_type: None,
            required: true,
            default: None,
            title: None,
            description: None,
            examples: Vec::new(),
            min: None,
            max: None,
            unique: false,
            contains: None,
            hooks: None,
        }
    }

    /// Serialize under a different key.
    pub fn wire_name(mut self, wire_name: &str) -> Self {
        self.wire_name = Some(wire_name.to_string());
        self
    }

    /// Leave this field out of the schema's `required` list.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.examples.push(example.into());
        self
    }

    /// Lower bound: string length, item count, or numeric minimum depending
    /// on the field's shape. Checked when the schema is compiled.
    pub fn min(mut self, min: impl Into<Value>) -> Self {
        self.min = Some(min.into());
        self
    }

    /// Upper bound, with the same shape-dependent meaning as [`Self::min`].
    pub fn max(mut self, max: impl Into<Value>) -> Self {
        self.max = Some(max.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// A value every sequence or set instance must contain.
    pub fn contains(mut self, member: impl Into<Value>) -> Self {
        self.contains = Some(member.into());
        self
    }

    pub fn hooks(mut self, hooks: FieldHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn encoder<F>(mut self, f: F) -> Self
    where
        F: Fn(&FieldValue) -> Value + Send + Sync + 'static,
    {
        self.hooks = Some(self.hooks.take().unwrap_or_default().with_encoder(f));
        self
    }

    pub fn decoder<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<FieldValue, String> + Send + Sync + 'static,
    {
        self.hooks = Some(self.hooks.take().unwrap_or_default().with_decoder(f));
        self
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    /// Host-side name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Record.field`, used in diagnostics.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Key used in serialized form. Defaults to [`Self::name`].
    pub fn wire(&self) -> &str {
        self.wire_name.as_deref().unwrap_or(&self.name)
    }

    pub fn declared_type(&self) -> Option<&DeclaredType> {
        self.declared_type.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default(&self) -> Option<&FieldValue> {
        self.default.as_ref()
    }

    pub fn title_text(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn examples(&self) -> &[Value] {
        &self.examples
    }

    pub fn min_bound(&self) -> Option<&Value> {
        self.min.as_ref()
    }

    pub fn max_bound(&self) -> Option<&Value> {
        self.max.as_ref()
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn contains_value(&self) -> Option<&Value> {
        self.contains.as_ref()
    }

    pub fn encode_hook(&self) -> Option<&EncodeFn> {
        self.hooks.as_ref().and_then(|h| h.encoder.as_ref())
    }

    pub fn decode_hook(&self) -> Option<&DecodeFn> {
        self.hooks.as_ref().and_then(|h| h.decoder.as_ref())
    }
}
