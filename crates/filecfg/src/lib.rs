//! # filecfg — Typed Config Records
//!
//! Declare a config record once and get, from the same declaration:
//!
//! - a JSON-Schema draft-07 document ([`FileConfig::build_schema`]),
//! - conversion to and from plain string-keyed maps
//!   ([`FileConfig::to_dict`], [`FileConfig::from_dict`]),
//! - validation of instances ([`FileConfig::validate`]),
//! - serialization to JSON, YAML, TOML, INI, XML, MessagePack and a binary
//!   object graph ([`FileConfig::dumps`], [`FileConfig::loads`] and the
//!   stream variants `dump` / `load`).
//!
//! ```no_run
//! use filecfg::{DeclaredType, FieldDescriptor, FileConfig, HandlerOptions, Instance, Record};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let record = Record::builder("Server")
//!     .field(FieldDescriptor::new("host", DeclaredType::string()))
//!     .field(FieldDescriptor::new("port", DeclaredType::integer()).min(1))
//!     .build()?;
//! let fc = FileConfig::new();
//! let server = Instance::new(&record).with("host", "localhost")?.with("port", 8080)?;
//! fc.validate(&server)?;
//! let (toml, _warnings) = fc.dumps(&server, "toml", None, &HandlerOptions::new())?;
//! let (back, _warnings) = fc.loads(&toml, "toml", &record, None, &HandlerOptions::new())?;
//! assert_eq!(back, server);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Layout
//!
//! | Crate              | Role                                           |
//! |--------------------|------------------------------------------------|
//! | `filecfg-core`     | records, fields, type shapes, cache, values    |
//! | `filecfg-codec`    | instance ⇄ generic map                         |
//! | `filecfg-schema`   | schema compiler and validator                  |
//! | `filecfg-handlers` | format registry and backends                   |
//!
//! This crate re-exports what a caller needs from each.
//!
//! ## Logging
//!
//! Warnings and milestones go through `tracing`; install a subscriber in
//! the application to see them.

pub mod error;
pub mod file_config;

pub use error::FileConfigError;
pub use file_config::{FileConfig, FileConfigBuilder};

pub use filecfg_codec::GenericMap;
pub use filecfg_core::{
    ContainerKind, DeclaredType, DefinitionError, EnumType, FieldDescriptor, FieldHooks,
    FieldValue, Instance, PatternType, Primitive, Record, RecordBuilder, ShapeCache, TypeShape,
    Warning,
};
pub use filecfg_handlers::{Content, HandlerOptions, HandlerPreferences, HandlerRegistry, Loaded};
pub use filecfg_schema::{CompiledSchema, SchemaValidationError, Violation};
