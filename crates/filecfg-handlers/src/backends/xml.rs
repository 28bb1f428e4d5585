//! # XML
//!
//! XML through `quick-xml`.
//!
//! Every element carries a `type` attribute (`str`, `int`, `float`,
//! `bool`, `null`, `list` or `dict`) so loading restores the generic value
//! exactly. Object members become child elements named by their key;
//! sequence elements are `<item>` children. Empty values are written as
//! self-closing elements.
//!
//! Options:
//! - `root`: root element name (default `root`).
//! - `pretty`: two-space indentation.
//! - `xml_declaration`: prepend `<?xml version="1.0" encoding="utf-8"?>`.
//!
//! ## Untyped input
//!
//! Documents from other tools may omit `type`. Such an element loads as
//! its text when it has no children, as a sequence when it has several
//! children sharing one tag, and as an object otherwise. An untyped root
//! always loads as an object.

use std::fmt::Display;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Number, Value};

use crate::backend::{bool_option, str_option, Backend, Content, HandlerOptions};
use crate::error::BackendError;

const DEFAULT_ROOT: &str = "root";
const ITEM: &str = "item";
const TYPE_ATTR: &str = "type";

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlBackend;

impl Backend for XmlBackend {
    fn name(&self) -> &str {
        "quick_xml"
    }

    fn supported_options(&self) -> &[&'static str] {
        &["root", "pretty", "xml_declaration"]
    }

    fn dumps(&self, value: &Value, options: &HandlerOptions) -> Result<Content, BackendError> {
        let root = str_option(options, "root", DEFAULT_ROOT);
        let mut writer = if bool_option(options, "pretty", false) {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };
        if bool_option(options, "xml_declaration", false) {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
                .map_err(xml_error)?;
        }
        write_element(&mut writer, root, value)?;
        let text = String::from_utf8(writer.into_inner())
            .map_err(|e| BackendError::Xml(e.to_string()))?;
        Ok(Content::Text(text))
    }

    fn loads(&self, content: &Content, _options: &HandlerOptions) -> Result<Value, BackendError> {
        let root = read_tree(content.as_text()?)?;
        if root.kind.is_none() {
            return object_from_children(root.children).map(Value::Object);
        }
        node_value(root)
    }
}

fn xml_error(e: impl Display) -> BackendError {
    BackendError::Xml(e.to_string())
}

// Writing

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &Value,
) -> Result<(), BackendError> {
    check_name(name)?;
    let (kind, text) = match value {
        Value::Null => ("null", None),
        Value::Bool(b) => ("bool", Some(b.to_string())),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => ("float", Some(format!("{f:?}"))),
            _ => ("int", Some(n.to_string())),
        },
        Value::String(s) => ("str", Some(s.clone()).filter(|s| !s.is_empty())),
        Value::Array(_) => ("list", None),
        Value::Object(_) => ("dict", None),
    };
    let start = BytesStart::new(name).with_attributes([(TYPE_ATTR, kind)]);

    let is_empty = match value {
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => text.is_none(),
    };
    if is_empty {
        return writer.write_event(Event::Empty(start)).map_err(xml_error);
    }

    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    match value {
        Value::Array(items) => {
            for item in items {
                write_element(writer, ITEM, item)?;
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                write_element(writer, key, child)?;
            }
        }
        _ => {
            if let Some(text) = &text {
                writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(xml_error)?;
            }
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)
}

/// Accept plain element names: a letter or `_`, then letters, digits,
/// `-`, `_` or `.`. Namespaced names are rejected.
fn check_name(name: &str) -> Result<(), BackendError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(BackendError::Unrepresentable {
            what: format!("the key {name:?} as an XML element name"),
        })
    }
}

// Reading

#[derive(Debug)]
struct Node {
    tag: String,
    kind: Option<String>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn open(start: &BytesStart<'_>) -> Result<Self, BackendError> {
        let tag = std::str::from_utf8(start.name().as_ref())?.to_string();
        let kind = match start.try_get_attribute(TYPE_ATTR).map_err(xml_error)? {
            Some(attr) => Some(attr.unescape_value().map_err(xml_error)?.into_owned()),
            None => None,
        };
        Ok(Self {
            tag,
            kind,
            text: String::new(),
            children: Vec::new(),
        })
    }
}

fn read_tree(text: &str) -> Result<Node, BackendError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Node> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(start) => stack.push(Node::open(&start)?),
            Event::Empty(start) => {
                let node = Node::open(&start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| BackendError::Xml("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(text) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(data) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(std::str::from_utf8(&data.into_inner())?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(BackendError::Xml("unexpected end of document".to_string()));
    }
    root.ok_or_else(|| BackendError::Xml("document has no root element".to_string()))
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<(), BackendError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => {
            return Err(BackendError::Xml(
                "more than one root element".to_string(),
            ))
        }
    }
    Ok(())
}

fn node_value(mut node: Node) -> Result<Value, BackendError> {
    let Some(kind) = node.kind.take() else {
        return untyped_value(node);
    };
    let bad_scalar = |text: &str| BackendError::Xml(format!("<{}>: '{text}' is not a {kind}", node.tag));
    match kind.as_str() {
        "null" | "NoneType" => Ok(Value::Null),
        "str" => Ok(Value::String(node.text)),
        "bool" => match node.text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(bad_scalar(&node.text)),
        },
        "int" => {
            let text = node.text.trim();
            text.parse::<i64>()
                .map(Value::from)
                .or_else(|_| text.parse::<u64>().map(Value::from))
                .map_err(|_| bad_scalar(text))
        }
        "float" => {
            let text = node.text.trim();
            text.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| bad_scalar(text))
        }
        "list" => node
            .children
            .into_iter()
            .map(node_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        "dict" => object_from_children(node.children).map(Value::Object),
        other => Err(BackendError::Xml(format!(
            "<{}>: unknown type '{other}'",
            node.tag
        ))),
    }
}

fn untyped_value(node: Node) -> Result<Value, BackendError> {
    if node.children.is_empty() {
        return Ok(Value::String(node.text));
    }
    let first = &node.children[0].tag;
    let is_list = node.children.len() > 1 && node.children.iter().all(|c| &c.tag == first);
    if is_list {
        node.children
            .into_iter()
            .map(node_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    } else {
        object_from_children(node.children).map(Value::Object)
    }
}

fn object_from_children(children: Vec<Node>) -> Result<Map<String, Value>, BackendError> {
    let mut map = Map::new();
    for child in children {
        let key = child.tag.clone();
        map.insert(key, node_value(child)?);
    }
    Ok(map)
}
