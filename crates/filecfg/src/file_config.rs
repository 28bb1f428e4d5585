//! # FileConfig
//!
//! One object owning the shared classification cache, the codec, the
//! schema compiler, a per-record validator cache and the handler registry.
//!
//! ## Data Flow
//!
//! ```text
//! dumps: Instance ─ to_dict ─▶ generic map ─ registry ─▶ Content
//! loads: Content ─ registry ─▶ generic map ─ from_dict ─▶ Instance
//! ```
//!
//! Validation is explicit ([`FileConfig::validate`]) unless the builder
//! enables [`FileConfigBuilder::validate_on_load`], in which case every
//! generic map is checked against the record schema before decoding.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;

use filecfg_codec::{Codec, GenericMap};
use filecfg_core::{Instance, Record, RecordId, ShapeCache, Warning};
use filecfg_handlers::{Content, HandlerOptions, HandlerPreferences, HandlerRegistry};
use filecfg_schema::{CompiledSchema, SchemaCompiler, SchemaValidator};
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::FileConfigError;

/// Entry point tying records to schemas and formats.
#[derive(Debug)]
pub struct FileConfig {
    codec: Codec,
    compiler: SchemaCompiler,
    registry: HandlerRegistry,
    validators: RwLock<HashMap<RecordId, Arc<SchemaValidator>>>,
    validate_on_load: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FileConfig {
    /// A `FileConfig` with a private cache and the standard registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A `FileConfig` whose backend preferences come from
    /// `FILECFG_PREFER_<FORMAT>` environment variables.
    pub fn from_env() -> Self {
        Self::builder()
            .preferences(HandlerPreferences::from_env())
            .build()
    }

    pub fn builder() -> FileConfigBuilder {
        FileConfigBuilder::default()
    }

    /// The classification cache shared by codec and compiler.
    pub fn cache(&self) -> &Arc<ShapeCache> {
        self.codec.cache()
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Compile the schema document for `record`.
    ///
    /// # Errors
    ///
    /// Returns `FileConfigError::Schema` if a field cannot be classified or
    /// its default cannot be encoded.
    pub fn build_schema(&self, record: &Arc<Record>) -> Result<CompiledSchema, FileConfigError> {
        Ok(self.compiler.compile(record)?)
    }

    /// Encode `instance` into a generic map.
    ///
    /// # Errors
    ///
    /// Returns `FileConfigError::Codec` on classification failure.
    pub fn to_dict(&self, instance: &Instance) -> Result<GenericMap, FileConfigError> {
        Ok(self.codec.encode(instance)?)
    }

    /// Decode a generic map into an instance of `record`.
    ///
    /// # Errors
    ///
    /// Returns `FileConfigError::Codec` for unknown enum values or failing
    /// decoder hooks, and `FileConfigError::Validation` when validation on
    /// load is enabled and the map does not conform.
    pub fn from_dict(
        &self,
        map: &GenericMap,
        record: &Arc<Record>,
    ) -> Result<Instance, FileConfigError> {
        if self.validate_on_load {
            self.validate_dict(map, record)?;
        }
        Ok(self.codec.decode(map, record)?)
    }

    /// Validate `instance` against its record's schema.
    ///
    /// # Errors
    ///
    /// Returns `FileConfigError::Validation` with every violation found.
    pub fn validate(&self, instance: &Instance) -> Result<(), FileConfigError> {
        let map = self.to_dict(instance)?;
        self.validate_dict(&map, instance.record())
    }

    /// Validate a generic map against the schema of `record`.
    ///
    /// # Errors
    ///
    /// See [`Self::validate`].
    pub fn validate_dict(
        &self,
        map: &GenericMap,
        record: &Arc<Record>,
    ) -> Result<(), FileConfigError> {
        let validator = self.validator(record)?;
        validator.validate(&Value::Object(map.clone()))?;
        Ok(())
    }

    /// Serialize `instance` as `format`.
    ///
    /// `prefer` names a backend for this call only.
    ///
    /// # Errors
    ///
    /// Codec failures, or `FileConfigError::Handler` for unknown formats,
    /// unavailable backends and backend failures.
    pub fn dumps(
        &self,
        instance: &Instance,
        format: &str,
        prefer: Option<&str>,
        options: &HandlerOptions,
    ) -> Result<(Content, Vec<Warning>), FileConfigError> {
        let map = self.to_dict(instance)?;
        let dumped = self
            .registry
            .dumps(format, &Value::Object(map), prefer, options)?;
        tracing::debug!(
            record = %instance.record().name(),
            format,
            warnings = dumped.warnings.len(),
            "instance dumped"
        );
        Ok((dumped.content, dumped.warnings))
    }

    /// Deserialize `content` in `format` into an instance of `record`.
    /// Returns the instance and the load warnings.
    ///
    /// # Errors
    ///
    /// Handler failures, `FileConfigError::NotAMap` when the document root
    /// is not a map, then anything [`Self::from_dict`] returns.
    pub fn loads(
        &self,
        content: &Content,
        format: &str,
        record: &Arc<Record>,
        prefer: Option<&str>,
        options: &HandlerOptions,
    ) -> Result<(Instance, Vec<Warning>), FileConfigError> {
        let loaded = self.registry.loads(format, content, prefer, options)?;
        match loaded.value {
            Value::Object(map) => Ok((self.from_dict(&map, record)?, loaded.warnings)),
            other => Err(FileConfigError::NotAMap {
                format: format.to_string(),
                found: json_type(&other),
            }),
        }
    }

    /// [`Self::dumps`] into a writer. Returns the dump warnings.
    ///
    /// # Errors
    ///
    /// See [`Self::dumps`]; also `FileConfigError::Io`.
    pub fn dump<W: Write>(
        &self,
        instance: &Instance,
        format: &str,
        writer: &mut W,
        prefer: Option<&str>,
        options: &HandlerOptions,
    ) -> Result<Vec<Warning>, FileConfigError> {
        let (content, warnings) = self.dumps(instance, format, prefer, options)?;
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        Ok(warnings)
    }

    /// [`Self::loads`] from a reader, consumed to the end. Returns the
    /// instance and the load warnings.
    ///
    /// # Errors
    ///
    /// See [`Self::loads`]; also `FileConfigError::Io`.
    pub fn load<R: Read>(
        &self,
        reader: &mut R,
        format: &str,
        record: &Arc<Record>,
        prefer: Option<&str>,
        options: &HandlerOptions,
    ) -> Result<(Instance, Vec<Warning>), FileConfigError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.loads(&Content::Bytes(bytes), format, record, prefer, options)
    }

    fn validator(&self, record: &Arc<Record>) -> Result<Arc<SchemaValidator>, FileConfigError> {
        if let Some(validator) = self.validators.read().get(&record.id()) {
            return Ok(Arc::clone(validator));
        }
        let schema = self.build_schema(record)?;
        let validator = Arc::new(SchemaValidator::new(&schema)?);
        tracing::debug!(record = %record.name(), "validator cached");
        let mut validators = self.validators.write();
        let stored = validators.entry(record.id()).or_insert(validator);
        Ok(Arc::clone(stored))
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Builder for [`FileConfig`].
#[derive(Debug, Default)]
pub struct FileConfigBuilder {
    cache: Option<Arc<ShapeCache>>,
    preferences: HandlerPreferences,
    registry: Option<HandlerRegistry>,
    validate_on_load: bool,
}

impl FileConfigBuilder {
    /// Share an existing classification cache.
    pub fn cache(mut self, cache: Arc<ShapeCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Backend order per format for the standard registry.
    pub fn preferences(mut self, preferences: HandlerPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Use `registry` as is; preferences are then ignored.
    pub fn registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validate generic maps against the record schema before decoding.
    pub fn validate_on_load(mut self, enabled: bool) -> Self {
        self.validate_on_load = enabled;
        self
    }

    pub fn build(self) -> FileConfig {
        let cache = self.cache.unwrap_or_else(ShapeCache::shared);
        let registry = match self.registry {
            Some(registry) => registry,
            None if self.preferences.is_empty() => HandlerRegistry::standard(),
            None => HandlerRegistry::with_preferences(&self.preferences),
        };
        FileConfig {
            codec: Codec::new(Arc::clone(&cache)),
            compiler: SchemaCompiler::new(cache),
            registry,
            validators: RwLock::new(HashMap::new()),
            validate_on_load: self.validate_on_load,
        }
    }
}
