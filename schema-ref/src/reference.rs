//! Parsed `$ref` strings.

use std::fmt;

use crate::pointer::{format_pointer, unescape_token};

/// Key that marks a reference node.
pub const REF_KEY: &str = "$ref";

/// A `$ref` value split into target document and fragment path.
///
/// `other.json#/definitions/Foo` has target `other.json` and fragment
/// `["definitions", "Foo"]`; `#/definitions/Foo` has no target and points
/// into the referencing document itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    raw: String,
    target: Option<String>,
    fragment: Vec<String>,
}

impl Reference {
    pub fn parse(raw: &str) -> Self {
        let (target, fragment) = raw.split_once('#').unwrap_or((raw, ""));

        // A leading slash is the pointer root, not an empty key.
        let pointer = fragment.strip_prefix('/').unwrap_or(fragment);
        let fragment = if fragment.is_empty() {
            Vec::new()
        } else {
            pointer
                .split('/')
                .map(|token| unescape_token(&percent_decode(token)))
                .collect()
        };

        Self {
            raw: raw.to_string(),
            target: (!target.is_empty()).then(|| target.to_string()),
            fragment,
        }
    }

    /// The `$ref` string exactly as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Target document, or `None` for the referencing document itself.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Decoded fragment segments.
    pub fn fragment(&self) -> &[String] {
        &self.fragment
    }

    /// Fragment re-encoded as a canonical pointer string.
    pub fn pointer(&self) -> String {
        format_pointer(&self.fragment)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Decode `%XX` escapes. Malformed escapes and invalid UTF-8 are kept as-is.
fn percent_decode(token: &str) -> String {
    if !token.contains('%') {
        return token.to_string();
    }

    let bytes = token.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8(out).unwrap_or_else(|_| token.to_string())
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}
