//! MessagePack through `rmp-serde`. Maps are written with string keys.

use serde_json::Value;

use crate::backend::{Backend, Content, HandlerOptions};
use crate::error::BackendError;

#[derive(Debug, Clone, Copy, Default)]
pub struct MsgpackBackend;

impl Backend for MsgpackBackend {
    fn name(&self) -> &str {
        "rmp_serde"
    }

    fn dumps(&self, value: &Value, _options: &HandlerOptions) -> Result<Content, BackendError> {
        Ok(Content::Bytes(rmp_serde::to_vec_named(value)?))
    }

    fn loads(&self, content: &Content, _options: &HandlerOptions) -> Result<Value, BackendError> {
        Ok(rmp_serde::from_slice(content.as_bytes())?)
    }
}
