//! # Error Types
//!
//! [`HandlerError`] is what callers of the registry see. [`BackendError`]
//! is what a single backend raises; the registry wraps it with the format
//! and backend names.
//!
//! Resolution failures surface only when a dump or load is attempted.
//! Building a registry never fails.

use thiserror::Error;

/// Failure inside one backend's dump or load.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "yaml")]
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[cfg(feature = "toml")]
    #[error("toml: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[cfg(feature = "toml")]
    #[error("toml: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[cfg(feature = "msgpack")]
    #[error("msgpack: {0}")]
    MsgpackEncode(#[from] rmp_serde::encode::Error),

    #[cfg(feature = "msgpack")]
    #[error("msgpack: {0}")]
    MsgpackDecode(#[from] rmp_serde::decode::Error),

    #[cfg(feature = "binary")]
    #[error("binary: {0}")]
    Bincode(#[from] bincode::Error),

    /// XML reader or writer failure.
    #[error("xml: {0}")]
    Xml(String),

    /// Malformed input for a hand-parsed format, with the 1-based line.
    #[error("line {line}: {reason}")]
    Syntax { line: usize, reason: String },

    /// The generic map holds something the format cannot represent.
    #[error("cannot represent {what}")]
    Unrepresentable { what: String },

    /// The backend was compiled out.
    #[error("backend '{backend}' requires the '{feature}' feature")]
    Disabled {
        backend: &'static str,
        feature: &'static str,
    },

    /// A text format was handed bytes that are not UTF-8.
    #[error("content is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

/// Error from the handler registry.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// No handler is registered for the format.
    #[error("no handler registered for format '{format}'")]
    UnknownFormat { format: String },

    /// A preferred backend is not one of the format's candidates.
    #[error("preferred backend '{backend}' does not exist for format '{format}', allowed are {allowed:?}")]
    UnknownBackend {
        format: String,
        backend: String,
        allowed: Vec<String>,
    },

    /// None of the tried backends is loadable in this build.
    #[error("no backend in {tried:?} is available for format '{format}'")]
    Unavailable { format: String, tried: Vec<String> },

    /// The resolved backend failed to dump.
    #[error("dumping '{format}' with backend '{backend}' failed: {source}")]
    Dump {
        format: String,
        backend: String,
        source: BackendError,
    },

    /// The resolved backend failed to load.
    #[error("loading '{format}' with backend '{backend}' failed: {source}")]
    Load {
        format: String,
        backend: String,
        source: BackendError,
    },
}
