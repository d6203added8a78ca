//! Purpose: Serialize `Value` trees into canonical compact JSON request bodies.
//! Exports: `encode`, `encode_map`, `encode_pretty`, `escape`.
//! Role: Single encoder behind every request body the client sends.
//! Invariants: Output is UTF-8, no insignificant whitespace, no trailing newline.
//! Invariants: Only backslash, quote, newline, carriage return and tab are escaped.
//! Invariants: Non-finite numbers are rejected with the path of the offending value.

use std::fmt::Write as _;

use super::error::EncodeError;
use super::value::{Map, Number, Value};

pub fn encode(value: &Value) -> Result<String, EncodeError> {
    let mut out = String::new();
    let mut path = Vec::new();
    write_value(&mut out, value, &mut path, None)?;
    Ok(out)
}

/// Encodes a key/value payload; an empty map is `{}`.
pub fn encode_map(map: &Map) -> Result<String, EncodeError> {
    let mut out = String::new();
    let mut path = Vec::new();
    write_object(&mut out, map, &mut path, None)?;
    Ok(out)
}

/// Two-space indented rendering for humans; same escaping rules as `encode`.
pub fn encode_pretty(value: &Value) -> Result<String, EncodeError> {
    let mut out = String::new();
    let mut path = Vec::new();
    write_value(&mut out, value, &mut path, Some(0))?;
    Ok(out)
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    escape_into(&mut out, text);
    out
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
}

enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

fn render_path(path: &[Segment<'_>]) -> String {
    let mut rendered = String::new();
    for segment in path {
        match segment {
            Segment::Key(key) => {
                if !rendered.is_empty() {
                    rendered.push('.');
                }
                rendered.push_str(key);
            }
            Segment::Index(index) => {
                let _ = write!(rendered, "[{index}]");
            }
        }
    }
    rendered
}

fn write_value<'a>(
    out: &mut String,
    value: &'a Value,
    path: &mut Vec<Segment<'a>>,
    indent: Option<usize>,
) -> Result<(), EncodeError> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(number) => write_number(out, number, path)?,
        Value::Text(text) => {
            out.push('"');
            escape_into(out, text);
            out.push('"');
        }
        Value::Array(items) => write_array(out, items, path, indent)?,
        Value::Object(map) => write_object(out, map, path, indent)?,
    }
    Ok(())
}

fn write_number(out: &mut String, number: &Number, path: &[Segment<'_>]) -> Result<(), EncodeError> {
    match number.as_str() {
        Some(text) => {
            out.push_str(text);
            Ok(())
        }
        None => Err(EncodeError::UnsupportedValue {
            path: render_path(path),
            reason: "non-finite number has no json representation",
        }),
    }
}

fn write_array<'a>(
    out: &mut String,
    items: &'a [Value],
    path: &mut Vec<Segment<'a>>,
    indent: Option<usize>,
) -> Result<(), EncodeError> {
    out.push('[');
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        newline(out, indent.map(|level| level + 1));
        path.push(Segment::Index(idx));
        write_value(out, item, path, indent.map(|level| level + 1))?;
        path.pop();
    }
    if !items.is_empty() {
        newline(out, indent);
    }
    out.push(']');
    Ok(())
}

fn write_object<'a>(
    out: &mut String,
    map: &'a Map,
    path: &mut Vec<Segment<'a>>,
    indent: Option<usize>,
) -> Result<(), EncodeError> {
    out.push('{');
    for (idx, (key, value)) in map.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        newline(out, indent.map(|level| level + 1));
        out.push('"');
        escape_into(out, key);
        out.push_str("\":");
        if indent.is_some() {
            out.push(' ');
        }
        path.push(Segment::Key(key));
        write_value(out, value, path, indent.map(|level| level + 1))?;
        path.pop();
    }
    if !map.is_empty() {
        newline(out, indent);
    }
    out.push('}');
    Ok(())
}

fn newline(out: &mut String, indent: Option<usize>) {
    if let Some(level) = indent {
        out.push('\n');
        for _ in 0..level {
            out.push_str("  ");
        }
    }
}
