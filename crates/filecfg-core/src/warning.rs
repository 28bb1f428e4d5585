//! Non-fatal diagnostics.
//!
//! Warnings never abort an operation. Producers return them alongside their
//! result and log each one through `tracing::warn!`.

use std::fmt;

/// A non-fatal event raised while compiling a schema or dispatching a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A modifier was set on a field whose shape gives it no meaning.
    ModifierNotApplicable {
        field: String,
        modifier: &'static str,
        shape: String,
    },
    /// A modifier value has the wrong type for the keyword it maps to.
    InvalidModifier {
        field: String,
        modifier: &'static str,
        reason: String,
    },
    /// A declared type had no classification rule; the schema node is empty.
    UnrecognizedType { field: String, type_name: String },
    /// The record asks for a JSON-Schema draft other than draft-07.
    UnsupportedSchemaDraft { record: String, draft: String },
    /// A dump or load option the selected backend does not support.
    UnsupportedOption {
        format: String,
        backend: String,
        option: String,
    },
}

impl Warning {
    /// Log this warning at `WARN` level.
    pub fn emit(&self) {
        tracing::warn!(warning = %self, "filecfg warning");
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModifierNotApplicable {
                field,
                modifier,
                shape,
            } => write!(
                f,
                "field modifier '{modifier}' has no effect on field '{field}' of shape {shape}"
            ),
            Self::InvalidModifier {
                field,
                modifier,
                reason,
            } => write!(f, "invalid modifier '{modifier}' on field '{field}': {reason}"),
            Self::UnrecognizedType { field, type_name } => write!(
                f,
                "unhandled translation for type '{type_name}' on field '{field}'"
            ),
            Self::UnsupportedSchemaDraft { record, draft } => write!(
                f,
                "record '{record}' requests schema draft {draft:?}; only draft-07 is supported"
            ),
            Self::UnsupportedOption {
                format,
                backend,
                option,
            } => write!(
                f,
                "handler '{format}' backend '{backend}' does not support option '{option}'"
            ),
        }
    }
}
