//! Serialization of the resolved schema for embedding in C/C++ source.
//!
//! The resolved document is pretty-printed, escaped as the body of a C string
//! literal, and (when too long for one literal) split into chunks that the
//! compiler concatenates back in order.

use anyhow::Result;
use serde_json::Value;
use std::fmt::Write as FmtWrite;

use crate::config::{OutputConfig, OutputFormat};

/// Pretty-print with two-space indentation and a trailing newline.
pub fn to_pretty_json(value: &Value) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
}

/// Escape `text` as the body of a C string literal (without the quotes).
pub fn escape_c_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => {
                // Fixed width so a following digit is never absorbed.
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Split an escaped body into chunks of at most `chunk_size` bytes.
///
/// Boundaries never fall inside an escape sequence or a UTF-8 character, so
/// every chunk is a valid literal on its own; concatenating the chunks gives
/// back `escaped` exactly. An empty body yields a single empty chunk.
pub fn split_chunks(escaped: &str, chunk_size: usize) -> Vec<&str> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while pos < escaped.len() {
        let unit = unit_len(escaped, pos);
        if pos > start && pos + unit - start > chunk_size {
            chunks.push(&escaped[start..pos]);
            start = pos;
        }
        pos += unit;
    }

    if start < escaped.len() || chunks.is_empty() {
        chunks.push(&escaped[start..]);
    }
    chunks
}

/// Length of the indivisible unit starting at `pos`.
fn unit_len(escaped: &str, pos: usize) -> usize {
    let bytes = escaped.as_bytes();
    let len = if bytes[pos] == b'\\' {
        match bytes.get(pos + 1) {
            Some(b) if b.is_ascii_digit() => 4,
            Some(_) => 2,
            None => 1,
        }
    } else {
        escaped[pos..].chars().next().map_or(1, char::len_utf8)
    };
    len.min(bytes.len() - pos)
}

/// Render the resolved schema in the configured format.
pub fn render(value: &Value, output: &OutputConfig) -> Result<String> {
    let json = to_pretty_json(value)?;
    if output.format == OutputFormat::Json {
        return Ok(json);
    }

    let escaped = escape_c_string(&json);
    let as_array = output.format == OutputFormat::CArray || escaped.len() > output.chunk_size;

    let mut out = String::new();
    writeln!(out, "// GENERATED FILE - DO NOT EDIT")?;
    writeln!(out, "// Source: {}", output.root)?;
    writeln!(out, "// Generator: tools/schema-gen")?;
    writeln!(out)?;

    if as_array {
        let chunks = split_chunks(&escaped, output.chunk_size);
        write_c_array(&mut out, &output.symbol, &chunks)?;
    } else {
        write_c_string(&mut out, &output.symbol, &escaped)?;
    }
    Ok(out)
}

/// `const char *<symbol> = "...";`
fn write_c_string(out: &mut String, symbol: &str, escaped: &str) -> std::fmt::Result {
    writeln!(out, "const char *{} = \"{}\";", symbol, escaped)
}

/// `const char *<symbol>s[] = { "...", "..." };` in chunk order.
fn write_c_array(out: &mut String, symbol: &str, chunks: &[&str]) -> std::fmt::Result {
    writeln!(out, "const char *{}s[] = {{", symbol)?;
    for (i, chunk) in chunks.iter().enumerate() {
        let sep = if i + 1 < chunks.len() { "," } else { "" };
        writeln!(out, "\"{}\"{}", chunk, sep)?;
    }
    writeln!(out, "}};")
}
