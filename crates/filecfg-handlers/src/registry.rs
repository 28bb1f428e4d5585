//! # Handler Registry
//!
//! A [`FormatHandler`] owns the ordered candidate backends for one format
//! and resolves the first available one, caching that choice. The
//! [`HandlerRegistry`] maps format names to handlers.
//!
//! ## Resolution
//!
//! - Without a preference, candidates are probed in order and the first
//!   available one is cached for the handler's lifetime. Failed probes are
//!   not cached.
//! - With a preference, only the named candidate is probed. The cache is
//!   neither read nor written, so a preference affects a single call.
//! - Two threads racing on first resolution probe the same deterministic
//!   order and agree; whichever stores first wins.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use filecfg_core::Warning;
use serde_json::Value;

use crate::backend::{Backend, Content, HandlerOptions};
use crate::backends;
use crate::config::HandlerPreferences;
use crate::error::HandlerError;

/// The outcome of a dump: content plus any non-fatal warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct Dumped {
    pub content: Content,
    pub warnings: Vec<Warning>,
}

/// The outcome of a load: the document plus any non-fatal warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub value: Value,
    pub warnings: Vec<Warning>,
}

/// A resolved backend bound to its format.
#[derive(Debug, Clone)]
pub struct BackendHandle {
    format: String,
    backend: Arc<dyn Backend>,
}

impl BackendHandle {
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Name of the resolved backend.
    pub fn name(&self) -> &str {
        self.backend.name()
    }

    /// Dump `value`, dropping options the backend does not support.
    ///
    /// # Errors
    ///
    /// Returns `HandlerError::Dump` if the backend fails.
    pub fn dumps(&self, value: &Value, options: &HandlerOptions) -> Result<Dumped, HandlerError> {
        let (options, warnings) = self.filter_options(options);
        let content = self
            .backend
            .dumps(value, &options)
            .map_err(|source| HandlerError::Dump {
                format: self.format.clone(),
                backend: self.name().to_string(),
                source,
            })?;
        Ok(Dumped { content, warnings })
    }

    /// Load `content`, dropping options the backend does not support.
    ///
    /// # Errors
    ///
    /// Returns `HandlerError::Load` if the backend fails.
    pub fn loads(&self, content: &Content, options: &HandlerOptions) -> Result<Loaded, HandlerError> {
        let (options, warnings) = self.filter_options(options);
        let value = self
            .backend
            .loads(content, &options)
            .map_err(|source| HandlerError::Load {
                format: self.format.clone(),
                backend: self.name().to_string(),
                source,
            })?;
        Ok(Loaded { value, warnings })
    }

    fn filter_options(&self, options: &HandlerOptions) -> (HandlerOptions, Vec<Warning>) {
        let supported = self.backend.supported_options();
        let mut kept = HandlerOptions::new();
        let mut warnings = Vec::new();
        for (key, value) in options {
            if supported.iter().any(|s| *s == key.as_str()) {
                kept.insert(key.clone(), value.clone());
            } else {
                let warning = Warning::UnsupportedOption {
                    format: self.format.clone(),
                    backend: self.name().to_string(),
                    option: key.clone(),
                };
                warning.emit();
                warnings.push(warning);
            }
        }
        (kept, warnings)
    }
}

/// Ordered backend candidates for one format, with a resolution cache.
#[derive(Debug)]
pub struct FormatHandler {
    format: String,
    candidates: Vec<Arc<dyn Backend>>,
    resolved: OnceLock<usize>,
}

impl FormatHandler {
    /// A handler trying `candidates` in order.
    pub fn new(format: &str, candidates: Vec<Arc<dyn Backend>>) -> Self {
        Self {
            format: format.to_string(),
            candidates,
            resolved: OnceLock::new(),
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// Candidate backend names, in preference order.
    pub fn candidates(&self) -> Vec<&str> {
        self.candidates.iter().map(|b| b.name()).collect()
    }

    /// Name of the cached backend, if resolution has happened.
    pub fn resolved(&self) -> Option<&str> {
        self.resolved.get().map(|&i| self.candidates[i].name())
    }

    /// Resolve a backend, honoring `prefer` for this call only.
    ///
    /// # Errors
    ///
    /// Returns `HandlerError::UnknownBackend` if `prefer` names no candidate
    /// and `HandlerError::Unavailable` if the preferred backend, or every
    /// candidate, is unavailable.
    pub fn resolve(&self, prefer: Option<&str>) -> Result<BackendHandle, HandlerError> {
        let index = match prefer {
            Some(name) => self.resolve_preferred(name)?,
            None => self.resolve_cached()?,
        };
        Ok(BackendHandle {
            format: self.format.clone(),
            backend: Arc::clone(&self.candidates[index]),
        })
    }

    fn resolve_preferred(&self, name: &str) -> Result<usize, HandlerError> {
        let index = self
            .candidates
            .iter()
            .position(|b| b.name() == name)
            .ok_or_else(|| HandlerError::UnknownBackend {
                format: self.format.clone(),
                backend: name.to_string(),
                allowed: self.candidates().into_iter().map(str::to_string).collect(),
            })?;
        if !self.candidates[index].is_available() {
            return Err(HandlerError::Unavailable {
                format: self.format.clone(),
                tried: vec![name.to_string()],
            });
        }
        Ok(index)
    }

    fn resolve_cached(&self) -> Result<usize, HandlerError> {
        if let Some(&index) = self.resolved.get() {
            return Ok(index);
        }
        let index = self
            .candidates
            .iter()
            .position(|b| b.is_available())
            .ok_or_else(|| HandlerError::Unavailable {
                format: self.format.clone(),
                tried: self.candidates().into_iter().map(str::to_string).collect(),
            })?;
        let index = *self.resolved.get_or_init(|| index);
        tracing::debug!(
            format = %self.format,
            backend = self.candidates[index].name(),
            "backend resolved"
        );
        Ok(index)
    }

    /// Dump through the resolved (or preferred) backend.
    ///
    /// # Errors
    ///
    /// Resolution errors as in [`Self::resolve`], or `HandlerError::Dump`.
    pub fn dumps(
        &self,
        value: &Value,
        prefer: Option<&str>,
        options: &HandlerOptions,
    ) -> Result<Dumped, HandlerError> {
        self.resolve(prefer)?.dumps(value, options)
    }

    /// Load through the resolved (or preferred) backend.
    ///
    /// # Errors
    ///
    /// Resolution errors as in [`Self::resolve`], or `HandlerError::Load`.
    pub fn loads(
        &self,
        content: &Content,
        prefer: Option<&str>,
        options: &HandlerOptions,
    ) -> Result<Loaded, HandlerError> {
        self.resolve(prefer)?.loads(content, options)
    }

    /// A fresh handler with candidates reordered: names in `order` first (in
    /// that order), the rest after in their original order. Unknown names
    /// are ignored.
    pub fn reordered(&self, order: &[String]) -> Self {
        let mut candidates: Vec<Arc<dyn Backend>> = Vec::with_capacity(self.candidates.len());
        for name in order {
            if let Some(b) = self.candidates.iter().find(|b| b.name() == name.as_str()) {
                if !candidates.iter().any(|c| c.name() == b.name()) {
                    candidates.push(Arc::clone(b));
                }
            } else {
                tracing::debug!(format = %self.format, backend = %name, "ignoring unknown preferred backend");
            }
        }
        for b in &self.candidates {
            if !candidates.iter().any(|c| c.name() == b.name()) {
                candidates.push(Arc::clone(b));
            }
        }
        Self::new(&self.format, candidates)
    }
}

/// Format name to handler.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, FormatHandler>,
}

impl HandlerRegistry {
    /// A registry with no handlers.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with every bundled format: `json`, `yaml`, `toml`, `ini`,
    /// `xml`, `msgpack` and `binary`.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for handler in backends::standard_handlers() {
            registry.register(handler);
        }
        registry
    }

    /// [`Self::standard`] with candidates reordered per `preferences`.
    pub fn with_preferences(preferences: &HandlerPreferences) -> Self {
        let mut registry = Self::empty();
        for handler in backends::standard_handlers() {
            let handler = match preferences.order(handler.format()) {
                Some(order) => handler.reordered(order),
                None => handler,
            };
            registry.register(handler);
        }
        registry
    }

    /// Add or replace the handler for its format.
    pub fn register(&mut self, handler: FormatHandler) -> &mut Self {
        self.handlers.insert(handler.format().to_string(), handler);
        self
    }

    /// Registered format names, sorted.
    pub fn formats(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// The handler for `format`.
    ///
    /// # Errors
    ///
    /// Returns `HandlerError::UnknownFormat` if none is registered.
    pub fn handler(&self, format: &str) -> Result<&FormatHandler, HandlerError> {
        self.handlers
            .get(format)
            .ok_or_else(|| HandlerError::UnknownFormat {
                format: format.to_string(),
            })
    }

    /// Resolve the backend for `format`.
    ///
    /// # Errors
    ///
    /// See [`FormatHandler::resolve`]; also `HandlerError::UnknownFormat`.
    pub fn resolve_backend(
        &self,
        format: &str,
        prefer: Option<&str>,
    ) -> Result<BackendHandle, HandlerError> {
        self.handler(format)?.resolve(prefer)
    }

    /// Dump `value` as `format`.
    ///
    /// # Errors
    ///
    /// See [`FormatHandler::dumps`]; also `HandlerError::UnknownFormat`.
    pub fn dumps(
        &self,
        format: &str,
        value: &Value,
        prefer: Option<&str>,
        options: &HandlerOptions,
    ) -> Result<Dumped, HandlerError> {
        self.handler(format)?.dumps(value, prefer, options)
    }

    /// Load `content` as `format`.
    ///
    /// # Errors
    ///
    /// See [`FormatHandler::loads`]; also `HandlerError::UnknownFormat`.
    pub fn loads(
        &self,
        format: &str,
        content: &Content,
        prefer: Option<&str>,
        options: &HandlerOptions,
    ) -> Result<Loaded, HandlerError> {
        self.handler(format)?.loads(content, prefer, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use serde_json::json;

    #[derive(Debug)]
    struct Stub {
        name: &'static str,
        available: bool,
    }

    impl Backend for Stub {
        fn name(&self) -> &str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn supported_options(&self) -> &[&'static str] {
            &["indent"]
        }

        fn dumps(&self, _value: &Value, options: &HandlerOptions) -> Result<Content, BackendError> {
            Ok(Content::Text(format!("{}:{}", self.name, options.len())))
        }

        fn loads(&self, _content: &Content, _options: &HandlerOptions) -> Result<Value, BackendError> {
            Ok(json!({"backend": self.name}))
        }
    }

    fn stub(name: &'static str, available: bool) -> Arc<dyn Backend> {
        Arc::new(Stub { name, available })
    }

    #[test]
    fn first_available_candidate_wins_and_is_cached() {
        let h = FormatHandler::new("fmt", vec![stub("a", false), stub("b", true)]);
        assert_eq!(h.resolved(), None);
        assert_eq!(h.resolve(None).unwrap().name(), "b");
        assert_eq!(h.resolved(), Some("b"));
    }

    #[test]
    fn nothing_available_is_unavailable_and_not_cached() {
        let h = FormatHandler::new("fmt", vec![stub("a", false), stub("b", false)]);
        match h.resolve(None).unwrap_err() {
            HandlerError::Unavailable { tried, .. } => assert_eq!(tried, vec!["a", "b"]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(h.resolved(), None);
    }

    #[test]
    fn preference_overrides_for_one_call_only() {
        let h = FormatHandler::new("fmt", vec![stub("a", true), stub("b", true)]);
        assert_eq!(h.resolve(Some("b")).unwrap().name(), "b");
        assert_eq!(h.resolved(), None);
        assert_eq!(h.resolve(None).unwrap().name(), "a");
        assert_eq!(h.resolve(Some("b")).unwrap().name(), "b");
        assert_eq!(h.resolved(), Some("a"));
    }

    #[test]
    fn unavailable_preference_fails_immediately() {
        let h = FormatHandler::new("fmt", vec![stub("a", false), stub("b", true)]);
        assert!(matches!(
            h.resolve(Some("a")),
            Err(HandlerError::Unavailable { .. })
        ));
        assert!(matches!(
            h.resolve(Some("zzz")),
            Err(HandlerError::UnknownBackend { .. })
        ));
    }

    #[test]
    fn unsupported_options_warn_and_are_dropped() {
        let h = FormatHandler::new("fmt", vec![stub("a", true)]);
        let mut options = HandlerOptions::new();
        options.insert("indent".into(), json!(2));
        options.insert("sort_keys".into(), json!(true));
        let dumped = h.dumps(&json!({}), None, &options).unwrap();
        assert_eq!(dumped.content, Content::from("a:1"));
        assert_eq!(
            dumped.warnings,
            vec![Warning::UnsupportedOption {
                format: "fmt".into(),
                backend: "a".into(),
                option: "sort_keys".into(),
            }]
        );
    }

    #[test]
    fn reordering_moves_named_candidates_first() {
        let h = FormatHandler::new("fmt", vec![stub("a", true), stub("b", true), stub("c", true)]);
        let r = h.reordered(&["c".to_string(), "nope".to_string(), "a".to_string()]);
        assert_eq!(r.candidates(), vec!["c", "a", "b"]);
    }

    #[test]
    fn unknown_format_is_reported_lazily() {
        let registry = HandlerRegistry::empty();
        assert!(matches!(
            registry.resolve_backend("json", None),
            Err(HandlerError::UnknownFormat { .. })
        ));
    }

    #[test]
    fn standard_registry_has_every_bundled_format() {
        let registry = HandlerRegistry::standard();
        assert_eq!(
            registry.formats(),
            vec!["binary", "ini", "json", "msgpack", "toml", "xml", "yaml"]
        );
    }
}
