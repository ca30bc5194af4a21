//! JSON text layout used for merged site documents.
//!
//! Objects get one key per line. Arrays of scalars stay on one line, arrays of
//! objects get one object per line, and anything else falls back to regular
//! pretty printing. Non-ASCII text is written as-is.

use serde_json::{Map, Value};

const INDENT: &str = "  ";

pub fn to_compact_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out.push('\n');
    out
}

fn write_value(out: &mut String, value: &Value, level: usize) {
    match value {
        Value::Object(map) => write_object(out, map, level),
        Value::Array(items) => write_array(out, items, level),
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_object(out: &mut String, map: &Map<String, Value>, level: usize) {
    if map.is_empty() {
        out.push_str("{}");
        return;
    }

    let pad = INDENT.repeat(level);
    out.push_str("{\n");
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            out.push_str(",\n");
        }
        out.push_str(&pad);
        out.push_str(INDENT);
        out.push_str(&quote(key));
        out.push_str(": ");
        write_value(out, value, level + 1);
    }
    out.push('\n');
    out.push_str(&pad);
    out.push('}');
}

fn write_array(out: &mut String, items: &[Value], level: usize) {
    match ArrayShape::of(items) {
        ArrayShape::Scalars => {
            let rendered: Vec<String> = items.iter().map(Value::to_string).collect();
            out.push('[');
            out.push_str(&rendered.join(", "));
            out.push(']');
        }
        ArrayShape::Objects => {
            let pad = INDENT.repeat(level);
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                out.push_str(&pad);
                out.push_str(INDENT);
                write_inline(out, item);
            }
            out.push('\n');
            out.push_str(&pad);
            out.push(']');
        }
        ArrayShape::Mixed => {
            let pad = INDENT.repeat(level);
            let array = Value::Array(items.to_vec());
            let pretty = serde_json::to_string_pretty(&array).unwrap_or_else(|_| array.to_string());
            // Continuation lines shift right to sit under the owning key.
            out.push_str(&pretty.replace('\n', &format!("\n{}", pad)));
        }
    }
}

/// Single-line rendering with `,` between items and `: ` after keys.
fn write_inline(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            out.push('{');
            for (i, (key, value)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&quote(key));
                out.push_str(": ");
                write_inline(out, value);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_inline(out, item);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn quote(key: &str) -> String {
    Value::from(key).to_string()
}

#[derive(Debug, PartialEq)]
enum ArrayShape {
    Scalars,
    Objects,
    Mixed,
}

impl ArrayShape {
    fn of(items: &[Value]) -> Self {
        if items.iter().all(is_scalar) {
            ArrayShape::Scalars
        } else if items.iter().all(Value::is_object) {
            ArrayShape::Objects
        } else {
            ArrayShape::Mixed
        }
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}
