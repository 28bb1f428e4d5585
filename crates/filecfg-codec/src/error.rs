//! Codec error type.

use filecfg_core::{ClassifyError, DecodeError, DefinitionError};
use thiserror::Error;

/// Failure while encoding or decoding an instance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    /// A field's declared type could not be classified.
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    /// A raw value could not be decoded into its field.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A decoded value did not fit the record it was decoded into.
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}
