//! Canonical JSON emission for persisted payloads.
//!
//! The same payload must always serialize to the same bytes so that
//! external audit-log hashes stay stable across runs and machines. The
//! emitter follows the JCS rules: lexicographically sorted object keys,
//! no inter-token whitespace, minimal string escaping. Monetary amounts
//! arrive as fixed decimal strings, so numbers here are integers or the
//! shortest round-trip float form, both of which are deterministic.

use std::fmt::Write as _;

use serde_json::{Map, Number, Value};

/// Serializes a JSON value to its canonical byte form.
#[must_use]
pub fn to_canonical_string(value: &Value) -> String {
    let mut output = String::new();
    emit_value(value, &mut output);
    output
}

fn emit_value(value: &Value, output: &mut String) {
    match value {
        Value::Null => output.push_str("null"),
        Value::Bool(b) => output.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => emit_number(n, output),
        Value::String(s) => emit_string(s, output),
        Value::Array(items) => emit_array(items, output),
        Value::Object(fields) => emit_object(fields, output),
    }
}

fn emit_number(n: &Number, output: &mut String) {
    if let Some(i) = n.as_i64() {
        let _ = write!(output, "{i}");
    } else if let Some(u) = n.as_u64() {
        let _ = write!(output, "{u}");
    } else {
        // Shortest round-trip rendering; stable for a given f64.
        output.push_str(&n.to_string());
    }
}

/// Minimal escaping: only `"`, `\`, and control characters below U+0020
/// are escaped, with short escapes where JSON defines them.
fn emit_string(s: &str, output: &mut String) {
    output.push('"');
    for c in s.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\u{0008}' => output.push_str("\\b"),
            '\u{000C}' => output.push_str("\\f"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if ('\u{0000}'..='\u{001F}').contains(&c) => {
                let _ = write!(output, "\\u{:04x}", c as u32);
            },
            c => output.push(c),
        }
    }
    output.push('"');
}

fn emit_array(items: &[Value], output: &mut String) {
    output.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            output.push(',');
        }
        emit_value(item, output);
    }
    output.push(']');
}

fn emit_object(fields: &Map<String, Value>, output: &mut String) {
    let mut keys: Vec<&String> = fields.keys().collect();
    keys.sort();

    output.push('{');
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            output.push(',');
        }
        emit_string(key, output);
        output.push(':');
        emit_value(&fields[*key], output);
    }
    output.push('}');
}
