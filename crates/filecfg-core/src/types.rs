//! # Declared Types
//!
//! The raw type grammar a record field is declared with. This is the input
//! to the classifier in [`crate::shape`]; nothing downstream of
//! classification inspects a `DeclaredType` again.
//!
//! The grammar mirrors what a host-language field annotation can express:
//! four scalar primitives, regex-refined strings, generic containers with
//! their type parameters, nested records, enumerations, and opaque named
//! types the classifier has no rule for.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::error::DefinitionError;
use crate::record::Record;

/// The four scalar primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Integer,
    Number,
    Boolean,
}

impl Primitive {
    /// The JSON-Schema `type` keyword for this primitive.
    pub fn schema_type(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "str",
            Self::Integer => "int",
            Self::Number => "float",
            Self::Boolean => "bool",
        };
        f.write_str(name)
    }
}

/// Generic container constructors a field type may be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    List,
    Tuple,
    Set,
    FrozenSet,
    Dict,
    OrderedDict,
}

impl ContainerKind {
    /// True for ordered, duplicate-preserving containers.
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::List | Self::Tuple)
    }

    /// True for duplicate-free containers.
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set | Self::FrozenSet)
    }

    /// True for key-value containers.
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Dict | Self::OrderedDict)
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "List",
            Self::Tuple => "Tuple",
            Self::Set => "Set",
            Self::FrozenSet => "FrozenSet",
            Self::Dict => "Dict",
            Self::OrderedDict => "OrderedDict",
        };
        f.write_str(name)
    }
}

/// A string type refined by a regular expression.
///
/// The pattern is compiled once at declaration time. Patterns are expected
/// to carry explicit `^`/`$` anchors; an unanchored pattern is accepted but
/// the compiled schema will match any string that merely contains a match.
#[derive(Clone)]
pub struct PatternType {
    regex: Regex,
}

impl PatternType {
    /// Compile `pattern` into a new pattern type.
    ///
    /// # Errors
    ///
    /// Returns `DefinitionError::InvalidPattern` if the regex does not compile.
    pub fn new(pattern: &str) -> Result<Self, DefinitionError> {
        let regex = Regex::new(pattern).map_err(|e| DefinitionError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { regex })
    }

    /// The source pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// True if the pattern starts with `^` and ends with `$`.
    pub fn is_anchored(&self) -> bool {
        let p = self.pattern();
        p.starts_with('^') && p.ends_with('$')
    }

    /// Test a candidate string against the pattern.
    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

impl PartialEq for PatternType {
    fn eq(&self, other: &Self) -> bool {
        self.pattern() == other.pattern()
    }
}

impl Eq for PatternType {}

impl fmt::Debug for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PatternType").field(&self.pattern()).finish()
    }
}

/// One named member of an [`EnumType`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    /// The underlying scalar the member encodes to.
    pub value: Value,
}

/// A closed set of named scalar values.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    name: String,
    members: Vec<EnumMember>,
}

impl EnumType {
    /// Create an enumeration from `(member name, underlying value)` pairs.
    ///
    /// # Errors
    ///
    /// Returns `DefinitionError::InvalidEnum` if a member value is not a
    /// scalar or a member name repeats.
    pub fn new<I, S, V>(name: &str, members: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let mut out: Vec<EnumMember> = Vec::new();
        for (member, value) in members {
            let member = member.into();
            let value = value.into();
            if matches!(value, Value::Array(_) | Value::Object(_) | Value::Null) {
                return Err(DefinitionError::InvalidEnum {
                    name: name.to_string(),
                    reason: format!("member {member:?} has non-scalar value {value}"),
                });
            }
            if out.iter().any(|m| m.name == member) {
                return Err(DefinitionError::InvalidEnum {
                    name: name.to_string(),
                    reason: format!("member {member:?} declared twice"),
                });
            }
            out.push(EnumMember {
                name: member,
                value,
            });
        }
        Ok(Self {
            name: name.to_string(),
            members: out,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    /// Look up a member by name.
    pub fn member(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Reverse lookup: the member whose underlying value equals `value`.
    pub fn member_for_value(&self, value: &Value) -> Option<&EnumMember> {
        self.members.iter().find(|m| &m.value == value)
    }
}

/// A field's declared type, as handed to the classifier.
#[derive(Debug, Clone)]
pub enum DeclaredType {
    Primitive(Primitive),
    Pattern(PatternType),
    /// A generic container and its type parameters, possibly none.
    Container {
        kind: ContainerKind,
        params: Vec<DeclaredType>,
    },
    Record(Arc<Record>),
    Enum(Arc<EnumType>),
    /// A named host type with no classification rule (e.g. `datetime`).
    Opaque(String),
}

impl DeclaredType {
    pub fn string() -> Self {
        Self::Primitive(Primitive::String)
    }

    pub fn integer() -> Self {
        Self::Primitive(Primitive::Integer)
    }

    pub fn number() -> Self {
        Self::Primitive(Primitive::Number)
    }

    pub fn boolean() -> Self {
        Self::Primitive(Primitive::Boolean)
    }

    /// A regex-refined string.
    ///
    /// # Errors
    ///
    /// Returns `DefinitionError::InvalidPattern` if the regex does not compile.
    pub fn pattern(pattern: &str) -> Result<Self, DefinitionError> {
        PatternType::new(pattern).map(Self::Pattern)
    }

    pub fn list_of(element: DeclaredType) -> Self {
        Self::Container {
            kind: ContainerKind::List,
            params: vec![element],
        }
    }

    pub fn set_of(element: DeclaredType) -> Self {
        Self::Container {
            kind: ContainerKind::Set,
            params: vec![element],
        }
    }

    pub fn map_of(key: DeclaredType, value: DeclaredType) -> Self {
        Self::Container {
            kind: ContainerKind::Dict,
            params: vec![key, value],
        }
    }

    /// A container with no type parameters (e.g. a bare `list`).
    pub fn bare(kind: ContainerKind) -> Self {
        Self::Container {
            kind,
            params: Vec::new(),
        }
    }

    pub fn record(record: &Arc<Record>) -> Self {
        Self::Record(Arc::clone(record))
    }

    pub fn enumeration(enum_type: &Arc<EnumType>) -> Self {
        Self::Enum(Arc::clone(enum_type))
    }

    pub fn opaque(name: &str) -> Self {
        Self::Opaque(name.to_string())
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "{p}"),
            Self::Pattern(p) => write!(f, "Regex({:?})", p.pattern()),
            Self::Container { kind, params } => {
                write!(f, "{kind}")?;
                if !params.is_empty() {
                    f.write_str("[")?;
                    for (i, p) in params.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{p}")?;
                    }
                    f.write_str("]")?;
                }
                Ok(())
            }
            Self::Record(r) => f.write_str(r.name()),
            Self::Enum(e) => f.write_str(e.name()),
            Self::Opaque(name) => f.write_str(name),
        }
    }
}
