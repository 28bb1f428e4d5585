//! Bundled backends.
//!
//! `json` and `ini` are always compiled in. The others sit behind Cargo
//! features of the same name (all on by default); with a feature off, the
//! format keeps a [`Disabled`] placeholder so resolution reports it as
//! unavailable.

use std::sync::Arc;

use crate::backend::Backend;
#[cfg(not(all(
    feature = "yaml",
    feature = "toml",
    feature = "xml",
    feature = "msgpack",
    feature = "binary"
)))]
use crate::backend::Disabled;
use crate::registry::FormatHandler;

#[cfg(feature = "binary")]
pub mod binary;
pub mod ini;
pub mod json;
#[cfg(feature = "msgpack")]
pub mod msgpack;
#[cfg(feature = "toml")]
pub mod toml;
#[cfg(feature = "xml")]
pub mod xml;
#[cfg(feature = "yaml")]
pub mod yaml;

/// One handler per bundled format, with its candidates in default order.
pub(crate) fn standard_handlers() -> Vec<FormatHandler> {
    vec![
        FormatHandler::new("json", vec![Arc::new(json::JsonBackend)]),
        FormatHandler::new("yaml", vec![yaml_backend()]),
        FormatHandler::new("toml", vec![toml_backend()]),
        FormatHandler::new("ini", vec![Arc::new(ini::IniBackend)]),
        FormatHandler::new("xml", vec![xml_backend()]),
        FormatHandler::new("msgpack", vec![msgpack_backend()]),
        FormatHandler::new("binary", vec![binary_backend()]),
    ]
}

fn yaml_backend() -> Arc<dyn Backend> {
    #[cfg(feature = "yaml")]
    return Arc::new(yaml::YamlBackend);
    #[cfg(not(feature = "yaml"))]
    return Arc::new(Disabled::new("serde_yaml", "yaml"));
}

fn toml_backend() -> Arc<dyn Backend> {
    #[cfg(feature = "toml")]
    return Arc::new(toml::TomlBackend);
    #[cfg(not(feature = "toml"))]
    return Arc::new(Disabled::new("toml", "toml"));
}

fn xml_backend() -> Arc<dyn Backend> {
    #[cfg(feature = "xml")]
    return Arc::new(xml::XmlBackend);
    #[cfg(not(feature = "xml"))]
    return Arc::new(Disabled::new("quick_xml", "xml"));
}

fn msgpack_backend() -> Arc<dyn Backend> {
    #[cfg(feature = "msgpack")]
    return Arc::new(msgpack::MsgpackBackend);
    #[cfg(not(feature = "msgpack"))]
    return Arc::new(Disabled::new("rmp_serde", "msgpack"));
}

fn binary_backend() -> Arc<dyn Backend> {
    #[cfg(feature = "binary")]
    return Arc::new(binary::BincodeBackend);
    #[cfg(not(feature = "binary"))]
    return Arc::new(Disabled::new("bincode", "binary"));
}
