//! # Schema Validation
//!
//! Runs generic-map encodings of instances against compiled documents using
//! the `jsonschema` crate (draft-07).
//!
//! Validation is the strict step the codec deliberately is not: decode
//! passes mismatched values through, and this module reports them with the
//! instance path, the schema path and a message for each violation.
//!
//! ## Schema Resolution
//!
//! Compiled documents are self-contained. No `$ref` is ever emitted, so the
//! validator installs a retriever that refuses every external URI instead
//! of reaching for the network.

use std::fmt;

use jsonschema::{Draft, Retrieve, Uri, Validator};
use serde_json::Value;
use thiserror::Error;

use crate::compile::CompiledSchema;

/// Retriever for documents that must not resolve anything externally.
struct OfflineRetriever;

impl Retrieve for OfflineRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("external schema reference '{}' is not resolvable", uri.as_str()).into())
    }
}

/// Error during schema validation.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The instance did not conform to the schema.
    #[error("validation failed against schema '{schema_name}':\n{violations}")]
    ValidationFailed {
        /// `$id` of the schema that was validated against.
        schema_name: String,
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },

    /// The compiled validator could not be built (e.g., a pattern the
    /// validator's regex engine rejects).
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuildError {
        /// `$id` of the schema.
        schema_name: String,
        /// Reason the validator could not be built.
        reason: String,
    },
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer path to the violating value in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A compiled validator for one schema document.
///
/// Building compiles every `pattern` once; reuse the validator across
/// instances of the same record.
pub struct SchemaValidator {
    schema_name: String,
    validator: Validator,
}

impl SchemaValidator {
    /// Build a validator for a compiled schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::ValidatorBuildError` if the document
    /// is not a valid draft-07 schema.
    pub fn new(schema: &CompiledSchema) -> Result<Self, SchemaValidationError> {
        Self::from_document(&schema.document)
    }

    /// Build a validator for a raw schema document.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_document(document: &Value) -> Result<Self, SchemaValidationError> {
        let schema_name = document
            .get("$id")
            .and_then(Value::as_str)
            .unwrap_or("schema")
            .to_string();

        let mut opts = jsonschema::options();
        opts.with_draft(Draft::Draft7);
        opts.with_retriever(OfflineRetriever);

        let validator = opts.build(&without_locators(document)).map_err(|e| {
            SchemaValidationError::ValidatorBuildError {
                schema_name: schema_name.clone(),
                reason: e.to_string(),
            }
        })?;
        tracing::debug!(schema = %schema_name, "validator built");

        Ok(Self {
            schema_name,
            validator,
        })
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// Whether `instance` conforms.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Every violation `instance` commits, in validator order.
    pub fn violations(&self, instance: &Value) -> Vec<Violation> {
        self.validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect()
    }

    /// Validate `instance`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::ValidationFailed` with structured
    /// violation details if the instance is invalid.
    pub fn validate(&self, instance: &Value) -> Result<(), SchemaValidationError> {
        let violations = self.violations(instance);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::ValidationFailed {
                schema_name: self.schema_name.clone(),
                violations: ValidationViolations { violations },
            })
        }
    }
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema_name", &self.schema_name)
            .finish_non_exhaustive()
    }
}

/// Copy of `document` with fragment-only `$id` locators removed.
///
/// Draft-07 validators read `$id: "#..."` as a location-independent anchor;
/// compiled locators are documentation and must not be registered as such.
fn without_locators(document: &Value) -> Value {
    let mut copy = document.clone();
    strip_locators(&mut copy);
    copy
}

fn strip_locators(node: &mut Value) {
    let Value::Object(map) = node else {
        return;
    };
    if map
        .get("$id")
        .and_then(Value::as_str)
        .is_some_and(|id| id.starts_with('#'))
    {
        map.remove("$id");
    }
    if let Some(items) = map.get_mut("items") {
        strip_locators(items);
    }
    for keyword in ["properties", "patternProperties"] {
        if let Some(Value::Object(children)) = map.get_mut(keyword) {
            for child in children.values_mut() {
                strip_locators(child);
            }
        }
    }
}
