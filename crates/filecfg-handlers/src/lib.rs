//! # filecfg-handlers — Format Handler Registry
//!
//! Turns generic maps into format bytes and back. Each format has a
//! [`FormatHandler`] holding an ordered list of candidate [`Backend`]s; the
//! first available one is used unless the caller names a preference.
//!
//! ## Bundled Formats
//!
//! | Format    | Backend      | Options                              | Feature   |
//! |-----------|--------------|--------------------------------------|-----------|
//! | `json`    | `serde_json` | `indent`, `sort_keys`                | always on |
//! | `yaml`    | `serde_yaml` |                                      | `yaml`    |
//! | `toml`    | `toml`       | `pretty`                             | `toml`    |
//! | `ini`     | `ini`        | `root_section`                       | always on |
//! | `xml`     | `quick_xml`  | `root`, `pretty`, `xml_declaration`  | `xml`     |
//! | `msgpack` | `rmp_serde`  |                                      | `msgpack` |
//! | `binary`  | `bincode`    |                                      | `binary`  |
//!
//! Options a backend does not list are dropped with a
//! [`Warning::UnsupportedOption`](filecfg_core::Warning); the call still
//! succeeds.
//!
//! ## Configuration
//!
//! [`HandlerPreferences`] reorders candidates per format, from code, serde
//! or `FILECFG_PREFER_<FORMAT>` environment variables.
//!
//! ## Crate Policy
//!
//! - Depends only on `filecfg-core` internally. Handlers see generic
//!   values, never typed instances.
//! - Building a registry never fails; resolution errors surface on use.
//! - No subscriber is installed here; warnings go through `tracing`.

pub mod backend;
pub mod backends;
pub mod config;
pub mod error;
pub mod registry;

pub use backend::{Backend, Content, Disabled, HandlerOptions};
pub use config::{HandlerPreferences, ENV_PREFIX};
pub use error::{BackendError, HandlerError};
pub use registry::{BackendHandle, Dumped, FormatHandler, HandlerRegistry, Loaded};
