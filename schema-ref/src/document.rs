//! Parsed schema documents.

use serde_json::Value;

use crate::error::{ResolveError, ResolveResult};
use crate::identifier::Identifier;

/// A schema's JSON value together with the identifier it was loaded from.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    pub identifier: Identifier,
    /// Declared top-level `title`, if any
    pub title: Option<String>,
    pub value: Value,
}

impl SchemaDocument {
    pub fn new(identifier: Identifier, value: Value) -> Self {
        let title = value
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            identifier,
            title,
            value,
        }
    }

    /// Parse JSON loaded for `identifier`. Invalid UTF-8 is a parse error.
    pub fn parse(identifier: Identifier, bytes: &[u8]) -> ResolveResult<Self> {
        match serde_json::from_slice(bytes) {
            Ok(value) => Ok(Self::new(identifier, value)),
            Err(source) => Err(ResolveError::SchemaParse { identifier, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id() -> Identifier {
        Identifier::from_path("/schemas/node.schema.json")
    }

    #[test]
    fn test_title_is_extracted() {
        let doc = SchemaDocument::new(id(), json!({"title": "node", "type": "object"}));
        assert_eq!(doc.title.as_deref(), Some("node"));
    }

    #[test]
    fn test_non_string_title_ignored() {
        let doc = SchemaDocument::new(id(), json!({"title": 5}));
        assert_eq!(doc.title, None);
    }

    #[test]
    fn test_parse_error_carries_identifier() {
        let err = SchemaDocument::parse(id(), b"{ not json").unwrap_err();
        match err {
            ResolveError::SchemaParse { identifier, .. } => assert_eq!(identifier, id()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let err = SchemaDocument::parse(id(), b"{\"title\": \"\xff\xfe\"}").unwrap_err();
        assert!(matches!(err, ResolveError::SchemaParse { .. }));
    }

    #[test]
    fn test_parse_bytes() {
        let doc = SchemaDocument::parse(id(), br#"{"title": "n\u00f6de"}"#).unwrap();
        assert_eq!(doc.title.as_deref(), Some("nöde"));
    }
}
