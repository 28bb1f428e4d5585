//! # Type Shape Classifier
//!
//! Resolves a field's [`DeclaredType`] into a [`TypeShape`], the closed
//! tagged union every downstream recursion switches on. The schema compiler
//! and the value codec both read shapes through the same classifier (and the
//! same [`ShapeCache`](crate::ShapeCache)), so a value the codec accepts is
//! always judged by the schema built from the identical shape.
//!
//! ## Resolution order
//!
//! First match wins:
//!
//! 1. Pattern string
//! 2. Scalar primitive
//! 3. Sequence container with one parameter
//! 4. Set container with one parameter
//! 5. Mapping container with two parameters (key must be string-like)
//! 6. Record
//! 7. Enum
//! 8. Anything else is `Unrecognized`
//!
//! Only step 5 can fail. Unrecognized types classify successfully; the
//! caller decides whether to warn.

use std::fmt;
use std::sync::Arc;

use crate::error::ClassifyError;
use crate::record::Record;
use crate::types::{ContainerKind, DeclaredType, EnumType, PatternType, Primitive};

/// Scalar kinds. Same set as [`Primitive`].
pub type ScalarKind = Primitive;

/// The key kind of a mapping shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyKind {
    /// Any string.
    Any,
    /// Strings matching a pattern.
    Pattern(PatternType),
}

impl KeyKind {
    /// The `patternProperties` key for this key kind.
    pub fn schema_pattern(&self) -> &str {
        match self {
            Self::Any => "^(.*)$",
            Self::Pattern(p) => p.pattern(),
        }
    }
}

/// The classified category of a declared type.
#[derive(Debug, Clone)]
pub enum TypeShape {
    Scalar(ScalarKind),
    PatternString(PatternType),
    Sequence(Box<TypeShape>),
    SetOf(Box<TypeShape>),
    Mapping {
        key: KeyKind,
        value: Box<TypeShape>,
    },
    RecordRef(Arc<Record>),
    EnumRef(Arc<EnumType>),
    /// No rule matched. `type_name` is `None` for untyped declarations,
    /// which are never worth a warning.
    Unrecognized { type_name: Option<String> },
}

impl TypeShape {
    /// The shape of an untyped declaration.
    pub fn untyped() -> Self {
        Self::Unrecognized { type_name: None }
    }

    /// Short tag used in diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "Scalar",
            Self::PatternString(_) => "PatternString",
            Self::Sequence(_) => "Sequence",
            Self::SetOf(_) => "SetOf",
            Self::Mapping { .. } => "Mapping",
            Self::RecordRef(_) => "RecordRef",
            Self::EnumRef(_) => "EnumRef",
            Self::Unrecognized { .. } => "Unrecognized",
        }
    }
}

impl PartialEq for TypeShape {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::PatternString(a), Self::PatternString(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (Self::SetOf(a), Self::SetOf(b)) => a == b,
            (
                Self::Mapping { key: ka, value: va },
                Self::Mapping { key: kb, value: vb },
            ) => ka == kb && va == vb,
            (Self::RecordRef(a), Self::RecordRef(b)) => a.id() == b.id(),
            (Self::EnumRef(a), Self::EnumRef(b)) => a == b,
            (Self::Unrecognized { type_name: a }, Self::Unrecognized { type_name: b }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "Scalar({})", kind.schema_type()),
            Self::PatternString(p) => write!(f, "PatternString({:?})", p.pattern()),
            Self::Sequence(e) => write!(f, "Sequence({e})"),
            Self::SetOf(e) => write!(f, "SetOf({e})"),
            Self::Mapping { key, value } => {
                write!(f, "Mapping({:?}, {value})", key.schema_pattern())
            }
            Self::RecordRef(r) => write!(f, "RecordRef({})", r.name()),
            Self::EnumRef(e) => write!(f, "EnumRef({})", e.name()),
            Self::Unrecognized { type_name: Some(name) } => write!(f, "Unrecognized({name})"),
            Self::Unrecognized { type_name: None } => f.write_str("Untyped"),
        }
    }
}

/// Classify a declared type. `field` is the qualified field name, used only
/// for error messages.
///
/// # Errors
///
/// Returns `ClassifyError::UnsupportedKeyType` when a mapping, at any depth,
/// declares a key type other than a string or pattern string.
pub fn classify(field: &str, declared: Option<&DeclaredType>) -> Result<TypeShape, ClassifyError> {
    let Some(declared) = declared else {
        return Ok(TypeShape::untyped());
    };

    Ok(match declared {
        DeclaredType::Pattern(p) => TypeShape::PatternString(p.clone()),
        DeclaredType::Primitive(kind) => TypeShape::Scalar(*kind),
        DeclaredType::Container { kind, params } => classify_container(field, *kind, params)?,
        DeclaredType::Record(record) => TypeShape::RecordRef(Arc::clone(record)),
        DeclaredType::Enum(e) => TypeShape::EnumRef(Arc::clone(e)),
        DeclaredType::Opaque(name) => TypeShape::Unrecognized {
            type_name: Some(name.clone()),
        },
    })
}

fn classify_container(
    field: &str,
    kind: ContainerKind,
    params: &[DeclaredType],
) -> Result<TypeShape, ClassifyError> {
    let element = |p: Option<&DeclaredType>| classify(field, p).map(Box::new);

    match (kind, params) {
        (k, []) if k.is_sequence() => Ok(TypeShape::Sequence(element(None)?)),
        (k, [e]) if k.is_sequence() => Ok(TypeShape::Sequence(element(Some(e))?)),
        (k, []) if k.is_set() => Ok(TypeShape::SetOf(element(None)?)),
        (k, [e]) if k.is_set() => Ok(TypeShape::SetOf(element(Some(e))?)),
        (k, []) if k.is_mapping() => Ok(TypeShape::Mapping {
            key: KeyKind::Any,
            value: element(None)?,
        }),
        (k, [key, value]) if k.is_mapping() => Ok(TypeShape::Mapping {
            key: classify_key(field, key)?,
            value: element(Some(value))?,
        }),
        _ => Ok(TypeShape::Unrecognized {
            type_name: Some(
                DeclaredType::Container {
                    kind,
                    params: params.to_vec(),
                }
                .to_string(),
            ),
        }),
    }
}

fn classify_key(field: &str, key: &DeclaredType) -> Result<KeyKind, ClassifyError> {
    match key {
        DeclaredType::Primitive(Primitive::String) => Ok(KeyKind::Any),
        DeclaredType::Pattern(p) => Ok(KeyKind::Pattern(p.clone())),
        other => Err(ClassifyError::UnsupportedKeyType {
            field: field.to_string(),
            key_type: other.to_string(),
        }),
    }
}
