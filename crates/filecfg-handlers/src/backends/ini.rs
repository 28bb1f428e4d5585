//! # INI
//!
//! A small Mozilla-style INI reader and writer, no external crate.
//!
//! ## Layout
//!
//! - The document root becomes the section named by the `root_section`
//!   option (default `root`), always written first.
//! - A nested object becomes the section `parent:child`. A nested object
//!   whose values are all objects gets no section of its own, only its
//!   children do.
//! - A sequence becomes a multi-line value: `key =` followed by one
//!   indented line per element.
//! - Scalars are written bare and decoded back by shape: digits are
//!   integers, `true`/`false` booleans, anything with a `.` or exponent
//!   that parses is a float. Strings that would decode as something else,
//!   or that contain spaces, tabs or `=`, are written in double quotes.
//!
//! ## Lossy cases
//!
//! Null members are dropped. An empty sequence loads back as an empty
//! string. Keys keep their case.
//!
//! On load, `root_section` picks the section to return; without it the
//! first section in the document is used.

use serde_json::{Map, Number, Value};

use crate::backend::{str_option, Backend, Content, HandlerOptions};
use crate::error::BackendError;

const DEFAULT_ROOT: &str = "root";
const NESTING: char = ':';

#[derive(Debug, Clone, Copy, Default)]
pub struct IniBackend;

impl Backend for IniBackend {
    fn name(&self) -> &str {
        "ini"
    }

    fn supported_options(&self) -> &[&'static str] {
        &["root_section"]
    }

    fn dumps(&self, value: &Value, options: &HandlerOptions) -> Result<Content, BackendError> {
        let Value::Object(map) = value else {
            return Err(unrepresentable("a non-object document root"));
        };
        let root = str_option(options, "root_section", DEFAULT_ROOT);
        check_key(root)?;

        let mut sections = Vec::new();
        collect_sections(map, root.to_string(), true, &mut sections)?;
        Ok(Content::Text(render(&sections)))
    }

    fn loads(&self, content: &Content, options: &HandlerOptions) -> Result<Value, BackendError> {
        let sections = parse(content.as_text()?)?;
        let Some(first) = sections.first() else {
            return Ok(Value::Object(Map::new()));
        };
        let root = options
            .get("root_section")
            .and_then(Value::as_str)
            .unwrap_or(first.name.as_str())
            .to_string();

        let mut tree = Map::new();
        for section in &sections {
            insert_section(&mut tree, section)?;
        }
        Ok(tree
            .remove(&root)
            .unwrap_or_else(|| Value::Object(Map::new())))
    }
}

// Writing

enum Entry {
    Scalar(String),
    List(Vec<String>),
}

struct SectionOut {
    name: String,
    entries: Vec<(String, Entry)>,
}

fn collect_sections(
    map: &Map<String, Value>,
    name: String,
    force: bool,
    sections: &mut Vec<SectionOut>,
) -> Result<(), BackendError> {
    let own_section = force || map.is_empty() || map.values().any(|v| !v.is_object());
    let index = sections.len();
    if own_section {
        sections.push(SectionOut {
            name: name.clone(),
            entries: Vec::new(),
        });
    }

    for (key, value) in map {
        check_key(key)?;
        let entry = match value {
            Value::Null => continue,
            Value::Object(child) => {
                collect_sections(child, format!("{name}{NESTING}{key}"), false, sections)?;
                continue;
            }
            Value::Array(items) => Entry::List(
                items
                    .iter()
                    .map(|item| {
                        if item.is_array() || item.is_object() || item.is_null() {
                            Err(unrepresentable(&format!(
                                "a nested or null element in the sequence '{key}'"
                            )))
                        } else {
                            encode_scalar(item)
                        }
                    })
                    .collect::<Result<_, _>>()?,
            ),
            scalar => Entry::Scalar(encode_scalar(scalar)?),
        };
        // Only objects without scalar members skip their section, and
        // those never reach this point.
        sections[index].entries.push((key.clone(), entry));
    }
    Ok(())
}

fn render(sections: &[SectionOut]) -> String {
    let mut out = String::new();
    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push('[');
        out.push_str(&section.name);
        out.push_str("]\n");
        for (key, entry) in &section.entries {
            out.push_str(key);
            match entry {
                Entry::Scalar(value) => {
                    out.push_str(" = ");
                    out.push_str(value);
                }
                Entry::List(items) => {
                    out.push_str(" =");
                    for item in items {
                        out.push_str("\n\t");
                        out.push_str(item);
                    }
                }
            }
            out.push('\n');
        }
    }
    out
}

fn encode_scalar(value: &Value) -> Result<String, BackendError> {
    match value {
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(match n.as_f64() {
            Some(f) if n.is_f64() => format!("{f:?}"),
            _ => n.to_string(),
        }),
        Value::String(s) => {
            if s.contains(['\n', '\r']) {
                return Err(unrepresentable("a multi-line string"));
            }
            let needs_quotes = s.is_empty()
                || s.contains([' ', '\t', '='])
                || decode_scalar(s) != Value::String(s.clone());
            Ok(if needs_quotes { quote(s) } else { s.clone() })
        }
        other => Err(unrepresentable(&format!("the value {other}"))),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn check_key(key: &str) -> Result<(), BackendError> {
    let bad = key.is_empty()
        || key.trim() != key
        || key.starts_with(['#', ';'])
        || key.contains(['=', NESTING, '[', ']', '\n', '\r']);
    if bad {
        Err(unrepresentable(&format!("the key {key:?}")))
    } else {
        Ok(())
    }
}

fn unrepresentable(what: &str) -> BackendError {
    BackendError::Unrepresentable {
        what: format!("{what} in INI"),
    }
}

// Reading

struct SectionIn {
    name: String,
    line: usize,
    entries: Vec<(String, String)>,
}

fn parse(text: &str) -> Result<Vec<SectionIn>, BackendError> {
    let mut sections: Vec<SectionIn> = Vec::new();
    let mut in_value = false;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let indented = raw.starts_with([' ', '\t']);

        if indented && in_value {
            if let Some((_, value)) = sections.last_mut().and_then(|s| s.entries.last_mut()) {
                value.push('\n');
                value.push_str(trimmed);
            }
            continue;
        }
        if trimmed.starts_with(['#', ';']) {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('[') {
            let name = rest
                .strip_suffix(']')
                .ok_or_else(|| syntax(line, "unterminated section header"))?
                .trim();
            if name.is_empty() {
                return Err(syntax(line, "empty section name"));
            }
            if sections.iter().any(|s| s.name == name) {
                return Err(syntax(line, &format!("duplicate section [{name}]")));
            }
            sections.push(SectionIn {
                name: name.to_string(),
                line,
                entries: Vec::new(),
            });
            in_value = false;
            continue;
        }

        let Some(section) = sections.last_mut() else {
            return Err(syntax(line, "key outside of any section"));
        };
        let split = trimmed
            .find(['=', ':'])
            .ok_or_else(|| syntax(line, "expected 'key = value'"))?;
        let key = trimmed[..split].trim();
        let value = trimmed[split + 1..].trim();
        if key.is_empty() {
            return Err(syntax(line, "empty key"));
        }
        if section.entries.iter().any(|(k, _)| k == key) {
            return Err(syntax(line, &format!("duplicate key '{key}'")));
        }
        section.entries.push((key.to_string(), value.to_string()));
        in_value = true;
    }
    Ok(sections)
}

fn insert_section(tree: &mut Map<String, Value>, section: &SectionIn) -> Result<(), BackendError> {
    let mut node = tree;
    for part in section.name.split(NESTING) {
        let slot = node
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        node = match slot {
            Value::Object(map) => map,
            _ => {
                return Err(syntax(
                    section.line,
                    &format!("section [{}] overlaps the value '{part}'", section.name),
                ))
            }
        };
    }
    for (key, raw) in &section.entries {
        node.insert(key.clone(), decode_value(raw));
    }
    Ok(())
}

fn decode_value(raw: &str) -> Value {
    if raw.contains('\n') {
        Value::Array(
            raw.trim_start_matches('\n')
                .split('\n')
                .map(decode_scalar)
                .collect(),
        )
    } else {
        decode_scalar(raw)
    }
}

fn decode_scalar(s: &str) -> Value {
    if let Some(inner) = unquote(s) {
        return Value::String(inner);
    }
    let digits = s.strip_prefix('-').unwrap_or(s);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(i) = s.parse::<i64>() {
            return Value::from(i);
        }
        if let Ok(u) = s.parse::<u64>() {
            return Value::from(u);
        }
        return Value::String(s.to_string());
    }
    match s.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    let numeric_start = digits.starts_with(|c: char| c.is_ascii_digit() || c == '.');
    if numeric_start && digits.contains(['.', 'e', 'E']) {
        if let Some(n) = s.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    }
    Value::String(s.to_string())
}

fn unquote(s: &str) -> Option<String> {
    let quote = s.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = s.strip_prefix(quote)?.strip_suffix(quote)?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    Some(out)
}

fn syntax(line: usize, reason: &str) -> BackendError {
    BackendError::Syntax {
        line,
        reason: reason.to_string(),
    }
}
