//! # Classification Cache
//!
//! Memoizes each field's [`TypeShape`] by [`FieldId`]. The cache is an
//! explicit object, shared through `Arc` between the compiler and the codec,
//! never an implicit global, so tests can construct or clear their own.
//!
//! ## Concurrency
//!
//! Classification is a pure function of immutable input. Two threads racing
//! on the same field both compute the same shape; the first insert wins and
//! the loser returns the stored value. Failures are not cached.
//!
//! Descriptors not yet built into a record have no identity of their own and
//! are classified on every call.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ClassifyError;
use crate::field::{FieldDescriptor, FieldId};
use crate::shape::{classify, TypeShape};

/// Write-once-per-key memo of field shapes.
#[derive(Debug, Default)]
pub struct ShapeCache {
    shapes: RwLock<HashMap<FieldId, Arc<TypeShape>>>,
}

impl ShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new cache wrapped for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// The shape of `field`, classifying it on first use.
    ///
    /// # Errors
    ///
    /// Returns `ClassifyError::UnsupportedKeyType` if the field declares a
    /// mapping with a non-string key.
    pub fn shape_of(&self, field: &FieldDescriptor) -> Result<Arc<TypeShape>, ClassifyError> {
        if field.id() == FieldId::UNBOUND {
            return Ok(Arc::new(classify(field.qualified_name(), field.declared_type())?));
        }
        if let Some(shape) = self.shapes.read().get(&field.id()) {
            return Ok(Arc::clone(shape));
        }

        let shape = Arc::new(classify(field.qualified_name(), field.declared_type())?);
        let mut shapes = self.shapes.write();
        let stored = shapes.entry(field.id()).or_insert(shape);
        Ok(Arc::clone(stored))
    }

    /// Number of memoized shapes.
    pub fn len(&self) -> usize {
        self.shapes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.read().is_empty()
    }

    /// Drop every memoized shape.
    pub fn clear(&self) {
        self.shapes.write().clear();
    }
}
