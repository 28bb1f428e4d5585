//! # filecfg-schema — Schema Compilation & Validation
//!
//! Derives JSON-Schema draft-07 documents from record declarations and
//! validates generic-map encodings against them.
//!
//! ## Compilation (`compile`)
//!
//! [`SchemaCompiler::compile`] walks a record's fields in declaration
//! order, reading each field's shape from the shared
//! [`ShapeCache`](filecfg_core::ShapeCache), and emits one node per field.
//! Compilation is deterministic: the same record always yields the same
//! document, key order included.
//!
//! ## Validation (`validate`)
//!
//! [`SchemaValidator`] wraps a `jsonschema` validator built from a
//! compiled document and reports structured [`Violation`]s.
//!
//! ## Crate Policy
//!
//! - Depends on `filecfg-core` and `filecfg-codec` internally. The codec is
//!   used only to encode field defaults into the `default` keyword.
//! - Imperfect annotations never fail compilation; they produce
//!   [`Warning`](filecfg_core::Warning)s.

pub mod compile;
pub mod validate;

pub use compile::{CompiledSchema, SchemaCompiler, SchemaError, DRAFT_07};
pub use validate::{SchemaValidationError, SchemaValidator, ValidationViolations, Violation};
