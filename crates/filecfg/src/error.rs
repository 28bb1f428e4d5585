//! Top-level error for [`FileConfig`](crate::FileConfig) operations.

use filecfg_codec::CodecError;
use filecfg_handlers::HandlerError;
use filecfg_schema::{SchemaError, SchemaValidationError};
use thiserror::Error;

/// Any failure of a `FileConfig` operation.
#[derive(Error, Debug)]
pub enum FileConfigError {
    /// The record's schema could not be compiled.
    #[error("schema: {0}")]
    Schema(#[from] SchemaError),

    /// Encoding or decoding an instance failed.
    #[error("codec: {0}")]
    Codec(#[from] CodecError),

    /// The instance or generic map does not conform to the record schema,
    /// or the schema could not be turned into a validator.
    #[error(transparent)]
    Validation(#[from] SchemaValidationError),

    /// Handler resolution or the backend itself failed.
    #[error("handler: {0}")]
    Handler(#[from] HandlerError),

    /// Loaded content is not a map at the document root.
    #[error("'{format}' content does not hold a map at its root (found {found})")]
    NotAMap { format: String, found: &'static str },

    /// Reading or writing the underlying stream failed.
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}
