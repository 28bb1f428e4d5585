//! # filecfg-core — Records, Fields and Type Shapes
//!
//! The leaf crate of the filecfg workspace. It defines how a config record
//! is declared and how each field's declared type is classified into the
//! closed [`TypeShape`] union that the schema compiler (`filecfg-schema`)
//! and the value codec (`filecfg-codec`) both recurse on.
//!
//! ## Key Design Principles
//!
//! 1. **Declare once, freeze.** [`Record::builder`] checks wire-name
//!    uniqueness and assigns identities; the result is an immutable
//!    `Arc<Record>`.
//!
//! 2. **Classify once.** [`ShapeCache`] memoizes each field's shape for
//!    the cache's lifetime. Callers own the cache and decide its scope.
//!
//! 3. **One shape, two consumers.** Schema compilation and encode/decode
//!    read the same cached shape, so they can never disagree about a field.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `filecfg-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod cache;
pub mod error;
pub mod field;
pub mod record;
pub mod shape;
pub mod types;
pub mod value;
pub mod warning;

pub use cache::ShapeCache;
pub use error::{ClassifyError, DecodeError, DefinitionError};
pub use field::{DecodeFn, EncodeFn, FieldDescriptor, FieldHooks, FieldId};
pub use record::{Record, RecordBuilder, RecordId};
pub use shape::{classify, KeyKind, ScalarKind, TypeShape};
pub use types::{ContainerKind, DeclaredType, EnumMember, EnumType, PatternType, Primitive};
pub use value::{FieldMap, FieldValue, Instance};
pub use warning::Warning;
