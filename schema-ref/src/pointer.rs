//! Minimal JSON-Pointer evaluation for `$ref` fragments.
//!
//! Fragments are plain slash-delimited chains of property names and array
//! indices; nothing richer is supported.

use serde_json::Value;

/// A fragment segment that could not be followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerError {
    /// The segment that was not found
    pub segment: String,
    /// Index of that segment within the fragment
    pub depth: usize,
}

/// Walk `segments` from `root`, one mapping key or array index at a time.
pub fn evaluate<'v>(root: &'v Value, segments: &[String]) -> Result<&'v Value, PointerError> {
    let mut current = root;
    for (depth, segment) in segments.iter().enumerate() {
        let next = match current {
            Value::Object(map) => map.get(segment.as_str()),
            Value::Array(items) => parse_index(segment).and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| PointerError {
            segment: segment.clone(),
            depth,
        })?;
    }
    Ok(current)
}

/// Array indices are canonical decimal: no sign, no leading zeros.
fn parse_index(segment: &str) -> Option<usize> {
    let canonical = segment == "0" || (!segment.starts_with('0') && !segment.is_empty());
    if canonical && segment.bytes().all(|b| b.is_ascii_digit()) {
        segment.parse().ok()
    } else {
        None
    }
}

/// Decode one pointer token (`~1` is `/`, `~0` is `~`).
pub fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Encode one pointer token.
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Render segments as a pointer string, e.g. `/definitions/Foo`.
pub fn format_pointer<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| format!("/{}", escape_token(s.as_ref())))
        .collect()
}
