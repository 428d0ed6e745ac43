//! Canonical document identifiers.
//!
//! A schema document is keyed either by an absolute filesystem path or by an
//! absolute `http(s)` URL. Relative `$ref` targets are joined against the
//! identifier of the document that contains them.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use reqwest::Url;

use crate::error::{ResolveError, ResolveResult};

/// Identity of a schema document, used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// Absolute, lexically normalized filesystem path
    File(PathBuf),
    /// Absolute `http`/`https` URL without fragment
    Remote(Url),
}

impl Identifier {
    /// Identifier for a local file. Relative paths are made absolute against
    /// the current directory.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        Self::File(normalize_path(&absolute))
    }

    /// Identifier for a remote document. The fragment, if any, is dropped.
    pub fn from_url(mut url: Url) -> ResolveResult<Self> {
        match url.scheme() {
            "http" | "https" => {
                url.set_fragment(None);
                Ok(Self::Remote(url))
            }
            "file" => url
                .to_file_path()
                .map(Self::from_path)
                .map_err(|_| ResolveError::unresolvable(&url, "invalid file URL")),
            other => Err(ResolveError::unresolvable(
                &url,
                format!("unsupported scheme '{}'", other),
            )),
        }
    }

    /// Parse a free-form identifier: an absolute URL or a filesystem path.
    pub fn parse(input: &str) -> ResolveResult<Self> {
        match parse_absolute_url(input) {
            Some(url) => Self::from_url(url),
            None => Ok(Self::from_path(input)),
        }
    }

    /// Resolve a `$ref` target (the part before `#`) relative to this document.
    pub fn join(&self, target: &str) -> ResolveResult<Self> {
        if let Some(url) = parse_absolute_url(target) {
            return Self::from_url(url);
        }

        match self {
            Self::Remote(base) => {
                let joined = base
                    .join(target)
                    .map_err(|e| ResolveError::unresolvable(target, e.to_string()))?;
                Self::from_url(joined)
            }
            Self::File(path) => {
                let dir = path.parent().unwrap_or_else(|| Path::new(""));
                Ok(Self::File(normalize_path(&dir.join(target))))
            }
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Absolute URI naming this document from anywhere: a `file://` URL for
    /// local files. Joining it against any base gives back `self`.
    pub fn to_uri(&self) -> String {
        match self {
            Self::File(path) => Url::from_file_path(path)
                .map(String::from)
                .unwrap_or_else(|()| path.display().to_string()),
            Self::Remote(url) => url.to_string(),
        }
    }

    /// Filesystem path, for file identifiers.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Remote(_) => None,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// Parse `input` as an absolute URL. Single-letter schemes are Windows drive
/// letters, not URLs.
fn parse_absolute_url(input: &str) -> Option<Url> {
    Url::parse(input).ok().filter(|url| url.scheme().len() > 1)
}

/// Remove `.` and `..` components without touching the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                );
                if !at_root {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
