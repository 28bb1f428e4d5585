//! # Error Types
//!
//! Errors raised while declaring records, classifying field types, and
//! decoding generic maps. All use `thiserror`.
//!
//! ## Design
//!
//! - Definition errors surface when a record or type is built, never later.
//! - Classification fails only on non-string mapping keys.
//! - Decode errors are limited to enum reverse-lookup misses and custom
//!   decoder hooks that fail; type mismatches are passed through instead.

use thiserror::Error;

/// A record, field, or type declaration is malformed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DefinitionError {
    /// Two fields of one record serialize under the same wire name.
    #[error("record '{record}' declares wire name '{wire_name}' more than once")]
    DuplicateWireName {
        /// Record name.
        record: String,
        /// The repeated wire name.
        wire_name: String,
    },

    /// A pattern type was declared with a regex that does not compile.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The regex source.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// An enumeration declaration is malformed.
    #[error("invalid enum '{name}': {reason}")]
    InvalidEnum {
        /// Enum name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An instance was given a value for a field its record does not declare.
    #[error("record '{record}' has no field named '{field}'")]
    UnknownField {
        /// Record name.
        record: String,
        /// The unknown field name.
        field: String,
    },
}

/// A field's declared type cannot be classified.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    /// Mapping key type cannot round-trip through a string.
    #[error("field '{field}' declares mapping key type '{key_type}', only string keys are supported")]
    UnsupportedKeyType {
        /// Qualified field name (`Record.field`).
        field: String,
        /// Rendered key type.
        key_type: String,
    },
}

/// A generic map could not be decoded into an instance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// No enum member has the given underlying value.
    #[error("field '{field}': value {value} is not a member of enum '{enum_name}'")]
    UnknownEnumValue {
        /// Qualified field name.
        field: String,
        /// Enum name.
        enum_name: String,
        /// The rendered raw value.
        value: String,
    },

    /// A field's custom decoder rejected its input.
    #[error("field '{field}': custom decoder failed: {reason}")]
    Hook {
        /// Qualified field name.
        field: String,
        /// Message returned by the decoder.
        reason: String,
    },
}
