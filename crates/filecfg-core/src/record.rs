//! # Records
//!
//! A record is an ordered, immutable list of field descriptors plus
//! documentation and schema identity metadata. It is the unit the schema
//! compiler and the value codec walk.
//!
//! ## Identity
//!
//! Every built record receives a process-unique [`RecordId`]. Two records
//! with identical fields compile to equivalent schemas but are distinct
//! identities; the classification cache keys on ids, never on structure.
//!
//! ## Acyclicity
//!
//! A field can only reference a record that has already been built and
//! wrapped in an `Arc`, so no record can reach itself through its fields.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::DefinitionError;
use crate::field::{FieldDescriptor, FieldId};

static NEXT_RECORD_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique record identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u64);

impl RecordId {
    pub(crate) const UNBOUND: RecordId = RecordId(0);

    fn next() -> Self {
        Self(NEXT_RECORD_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record:{}", self.0)
    }
}

/// A declared structured type.
#[derive(Debug)]
pub struct Record {
    id: RecordId,
    name: String,
    title: Option<String>,
    description: Option<String>,
    schema_id: Option<String>,
    schema_draft: Option<String>,
    fields: Vec<FieldDescriptor>,
}

impl Record {
    /// Start declaring a record. `name` is the declaring path, e.g.
    /// `Project.Dependency` for a record nested in `Project`.
    pub fn builder(name: &str) -> RecordBuilder {
        RecordBuilder {
            name: name.to_string(),
            title: None,
            description: None,
            schema_id: None,
            schema_draft: None,
            fields: Vec::new(),
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema title; defaults to the record name.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn schema_id(&self) -> Option<&str> {
        self.schema_id.as_deref()
    }

    pub fn schema_draft(&self) -> Option<&str> {
        self.schema_draft.as_deref()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field by host-side name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Look up a field by wire name.
    pub fn field_by_wire(&self, wire: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.wire() == wire)
    }
}

/// Builder for [`Record`].
#[derive(Debug)]
pub struct RecordBuilder {
    name: String,
    title: Option<String>,
    description: Option<String>,
    schema_id: Option<String>,
    schema_draft: Option<String>,
    fields: Vec<FieldDescriptor>,
}

impl RecordBuilder {
    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// `$id` of the root schema document.
    pub fn schema_id(mut self, schema_id: &str) -> Self {
        self.schema_id = Some(schema_id.to_string());
        self
    }

    /// `$schema` of the root schema document.
    pub fn schema_draft(mut self, schema_draft: &str) -> Self {
        self.schema_draft = Some(schema_draft.to_string());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Freeze the record.
    ///
    /// # Errors
    ///
    /// Returns `DefinitionError::DuplicateWireName` if two fields share a
    /// wire name.
    pub fn build(self) -> Result<Arc<Record>, DefinitionError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.wire().to_string()) {
                return Err(DefinitionError::DuplicateWireName {
                    record: self.name,
                    wire_name: field.wire().to_string(),
                });
            }
        }

        let id = RecordId::next();
        let fields = self
            .fields
            .into_iter()
            .enumerate()
            .map(|(index, mut field)| {
                field.id = FieldId { record: id, index };
                field.qualified_name = format!("{}.{}", self.name, field.name());
                field
            })
            .collect();

        tracing::debug!(record = %self.name, %id, "record declared");
        Ok(Arc::new(Record {
            id,
            name: self.name,
            title: self.title,
            description: self.description,
            schema_id: self.schema_id,
            schema_draft: self.schema_draft,
            fields,
        }))
    }
}
