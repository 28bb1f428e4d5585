//! # Backends
//!
//! A [`Backend`] is one library able to dump and load one format. A format
//! usually has a single bundled backend, but a handler may carry several
//! and pick between them at run time.
//!
//! Each backend declares the dump/load options it understands. The
//! registry strips every other option before the call and reports it as a
//! [`Warning::UnsupportedOption`](filecfg_core::Warning), so a backend only
//! ever sees keys from its own list.

use std::collections::BTreeMap;
use std::fmt;
use std::str;

use serde_json::Value;

use crate::error::BackendError;

/// Options for one dump or load call, by name.
pub type HandlerOptions = BTreeMap<String, Value>;

/// Serialized content: text formats produce `Text`, binary ones `Bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Bytes(Vec<u8>),
}

impl Content {
    /// The content as text.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Encoding` for bytes that are not UTF-8.
    pub fn as_text(&self) -> Result<&str, BackendError> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Bytes(bytes) => Ok(str::from_utf8(bytes)?),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

/// One serialization library for one format.
pub trait Backend: Send + Sync + fmt::Debug {
    /// Backend name, unique within its format.
    fn name(&self) -> &str;

    /// Whether the backend can run in this build.
    fn is_available(&self) -> bool {
        true
    }

    /// Option names this backend understands.
    fn supported_options(&self) -> &[&'static str] {
        &[]
    }

    /// Serialize a generic value.
    fn dumps(&self, value: &Value, options: &HandlerOptions) -> Result<Content, BackendError>;

    /// Deserialize content into a generic value.
    fn loads(&self, content: &Content, options: &HandlerOptions) -> Result<Value, BackendError>;
}

/// Placeholder for a backend whose Cargo feature is disabled.
///
/// It keeps its place in the candidate order so preferring it by name
/// fails with `Unavailable` rather than `UnknownBackend`.
#[derive(Debug, Clone)]
pub struct Disabled {
    name: &'static str,
    feature: &'static str,
}

impl Disabled {
    pub const fn new(name: &'static str, feature: &'static str) -> Self {
        Self { name, feature }
    }

    /// The Cargo feature that enables the real backend.
    pub fn feature(&self) -> &str {
        self.feature
    }

    fn disabled(&self) -> BackendError {
        BackendError::Disabled {
            backend: self.name,
            feature: self.feature,
        }
    }
}

impl Backend for Disabled {
    fn name(&self) -> &str {
        self.name
    }

    fn is_available(&self) -> bool {
        false
    }

    fn dumps(&self, _value: &Value, _options: &HandlerOptions) -> Result<Content, BackendError> {
        Err(self.disabled())
    }

    fn loads(&self, _content: &Content, _options: &HandlerOptions) -> Result<Value, BackendError> {
        Err(self.disabled())
    }
}

/// Read a boolean option, falling back to `default` for absent or
/// non-boolean values.
pub(crate) fn bool_option(options: &HandlerOptions, key: &str, default: bool) -> bool {
    options.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// Read a string option, falling back to `default`.
pub(crate) fn str_option<'a>(options: &'a HandlerOptions, key: &str, default: &'a str) -> &'a str {
    options.get(key).and_then(Value::as_str).unwrap_or(default)
}
