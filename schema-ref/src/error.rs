//! Error type for schema loading and reference resolution.

use std::fmt;
use std::path::{Path, PathBuf};

use reqwest::Url;

use crate::identifier::Identifier;

/// Result alias used across the crate.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Everything that can go wrong while flattening a schema bundle.
///
/// Every variant names the document (and, where one exists, the `$ref`
/// string) that caused it, so a diagnostic can point at the exact file.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Schema file not found: {}", path.display())]
    SchemaFileNotFound { path: PathBuf },

    #[error("Failed to parse schema {identifier}: {source}")]
    SchemaParse {
        identifier: Identifier,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot resolve {identifier}: {reason}")]
    ReferenceUnresolvable { identifier: Location, reason: String },

    #[error("Reference \"{reference}\" in {identifier}: path segment \"{segment}\" not found")]
    ReferencePathNotFound {
        identifier: Identifier,
        reference: String,
        segment: String,
    },

    #[error("Cyclic reference \"{reference}\" from {from} to {to}")]
    CyclicReferenceDetected {
        from: Identifier,
        to: Identifier,
        reference: String,
    },
}

/// What an unresolvable reference pointed at.
///
/// Targets that never became a document identifier (an unsupported scheme,
/// a URL that failed to join) are kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Document(Identifier),
    Raw(String),
}

impl Location {
    /// The document identifier, if the target got that far.
    pub fn identifier(&self) -> Option<&Identifier> {
        match self {
            Self::Document(identifier) => Some(identifier),
            Self::Raw(_) => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document(identifier) => write!(f, "{}", identifier),
            Self::Raw(raw) => f.write_str(raw),
        }
    }
}

impl From<&Identifier> for Location {
    fn from(identifier: &Identifier) -> Self {
        Self::Document(identifier.clone())
    }
}

impl From<&Path> for Location {
    fn from(path: &Path) -> Self {
        Self::Document(Identifier::File(path.to_path_buf()))
    }
}

impl From<&Url> for Location {
    fn from(url: &Url) -> Self {
        match url.scheme() {
            "http" | "https" => Self::Document(Identifier::Remote(url.clone())),
            _ => Self::Raw(url.to_string()),
        }
    }
}

impl From<&str> for Location {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

impl ResolveError {
    pub(crate) fn unresolvable(identifier: impl Into<Location>, reason: impl Into<String>) -> Self {
        Self::ReferenceUnresolvable {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    /// True for cycles reported under strict cycle handling.
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::CyclicReferenceDetected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_path() {
        let err = ResolveError::SchemaFileNotFound {
            path: PathBuf::from("/schemas/glTF.schema.json"),
        };
        assert_eq!(
            err.to_string(),
            "Schema file not found: /schemas/glTF.schema.json"
        );
    }

    #[test]
    fn test_path_not_found_message() {
        let err = ResolveError::ReferencePathNotFound {
            identifier: Identifier::File(PathBuf::from("/schemas/a.json")),
            reference: "#/definitions/Missing".to_string(),
            segment: "Missing".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("#/definitions/Missing"));
        assert!(msg.contains("/schemas/a.json"));
        assert!(msg.contains("\"Missing\""));
        assert!(!err.is_cycle());
    }

    #[test]
    fn test_unresolvable_helper() {
        let err = ResolveError::unresolvable("ftp://example.com/a.json", "unsupported scheme");
        assert_eq!(
            err.to_string(),
            "Cannot resolve ftp://example.com/a.json: unsupported scheme"
        );
    }

    #[test]
    fn test_unresolvable_keeps_document_identifier() {
        let url = Url::parse("https://example.com/a.json").unwrap();
        let err = ResolveError::unresolvable(&url, "HTTP 404 Not Found");
        match err {
            ResolveError::ReferenceUnresolvable { identifier, .. } => {
                assert_eq!(
                    identifier.identifier(),
                    Some(&Identifier::Remote(url.clone()))
                );
            }
            other => panic!("unexpected error: {other}"),
        }

        let path = Path::new("/schemas/a.json");
        let err = ResolveError::unresolvable(path, "not a regular file");
        assert!(matches!(
            err,
            ResolveError::ReferenceUnresolvable {
                identifier: Location::Document(Identifier::File(_)),
                ..
            }
        ));
    }

    #[test]
    fn test_unsupported_url_stays_raw() {
        let url = Url::parse("ftp://example.com/a.json").unwrap();
        assert_eq!(
            Location::from(&url),
            Location::Raw("ftp://example.com/a.json".to_string())
        );
        assert_eq!(Location::from(&url).identifier(), None);
    }
}
