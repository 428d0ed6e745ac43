//! Raw document retrieval from disk and over HTTP(S).
//!
//! The cache talks to storage only through [`DocumentLoader`], so tests (or
//! embedders with their own schema store) can swap the I/O out entirely.

use std::io;
use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use tracing::{debug, warn};

use crate::error::{ResolveError, ResolveResult};
use crate::identifier::Identifier;
use crate::options::ResolverOptions;

/// Source of raw schema bytes.
///
/// Bytes are handed to the JSON parser untouched, so a document that is not
/// valid UTF-8 surfaces as [`ResolveError::SchemaParse`].
pub trait DocumentLoader {
    /// Return the contents of the document named by `identifier`.
    fn load(&self, identifier: &Identifier) -> ResolveResult<Vec<u8>>;
}

/// Default loader: local files plus optional `http`/`https` fetches.
#[derive(Debug, Clone)]
pub struct SchemaLoader {
    max_bytes: u64,
    remote: Option<RemoteFetcher>,
}

impl SchemaLoader {
    pub fn new(options: &ResolverOptions) -> Self {
        let remote = options.allow_remote.then(|| RemoteFetcher {
            timeout: options.request_timeout(),
            retries: options.network_retries,
            max_bytes: options.max_document_bytes,
        });
        Self {
            max_bytes: options.max_document_bytes,
            remote,
        }
    }
}

impl Default for SchemaLoader {
    fn default() -> Self {
        Self::new(&ResolverOptions::default())
    }
}

impl DocumentLoader for SchemaLoader {
    fn load(&self, identifier: &Identifier) -> ResolveResult<Vec<u8>> {
        match identifier {
            Identifier::File(path) => read_file_with_limit(path, self.max_bytes),
            Identifier::Remote(url) => match &self.remote {
                Some(fetcher) => fetcher.fetch(url),
                None => Err(ResolveError::unresolvable(
                    url,
                    "remote references are disabled",
                )),
            },
        }
    }
}

/// Read a file into memory with a size cap.
pub fn read_file_with_limit(path: &Path, max_bytes: u64) -> ResolveResult<Vec<u8>> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ResolveError::SchemaFileNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(ResolveError::unresolvable(path, e.to_string())),
    };

    if !metadata.is_file() {
        return Err(ResolveError::unresolvable(path, "not a regular file"));
    }

    let len = metadata.len();
    if len > max_bytes {
        return Err(ResolveError::unresolvable(
            path,
            format!("file too large ({} bytes, max {} bytes)", len, max_bytes),
        ));
    }

    debug!("Reading schema file {}", path.display());
    std::fs::read(path).map_err(|e| ResolveError::unresolvable(path, e.to_string()))
}

/// Blocking wrapper around an async HTTP GET with timeout and retry.
#[derive(Debug, Clone)]
struct RemoteFetcher {
    timeout: Duration,
    retries: u32,
    max_bytes: u64,
}

/// Outcome of a single failed request.
enum FetchFailure {
    /// Worth another attempt (timeout, connection error, 5xx)
    Transient(String),
    Fatal(String),
}

impl RemoteFetcher {
    fn fetch(&self, url: &Url) -> ResolveResult<Vec<u8>> {
        // Create a runtime for this single async operation
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                ResolveError::unresolvable(url, format!("failed to create runtime: {}", e))
            })?;

        rt.block_on(self.fetch_async(url))
    }

    async fn fetch_async(&self, url: &Url) -> ResolveResult<Vec<u8>> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                ResolveError::unresolvable(url, format!("failed to create HTTP client: {}", e))
            })?;

        let mut attempt = 0;
        loop {
            match self.request(&client, url).await {
                Ok(body) => return Ok(body),
                Err(FetchFailure::Transient(reason)) if attempt < self.retries => {
                    attempt += 1;
                    warn!("Fetching {} failed ({}), retrying", url, reason);
                }
                Err(FetchFailure::Transient(reason) | FetchFailure::Fatal(reason)) => {
                    return Err(ResolveError::unresolvable(url, reason));
                }
            }
        }
    }

    async fn request(
        &self,
        client: &reqwest::Client,
        url: &Url,
    ) -> Result<Vec<u8>, FetchFailure> {
        debug!("GET {}", url);

        let request = client.get(url.clone()).send();
        let response = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) if e.is_timeout() || e.is_connect() => {
                return Err(FetchFailure::Transient(format!("network error: {}", e)));
            }
            Ok(Err(e)) => return Err(FetchFailure::Fatal(format!("network error: {}", e))),
            Err(_) => return Err(FetchFailure::Transient("request timed out".to_string())),
        };

        let status = response.status();
        if status.is_server_error() {
            return Err(FetchFailure::Transient(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(FetchFailure::Fatal(format!("HTTP {}", status)));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(FetchFailure::Fatal(format!(
                    "document too large ({} bytes, max {} bytes)",
                    len, self.max_bytes
                )));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchFailure::Transient(format!("failed to read body: {}", e)))?;

        if body.len() as u64 > self.max_bytes {
            return Err(FetchFailure::Fatal(format!(
                "document too large ({} bytes, max {} bytes)",
                body.len(),
                self.max_bytes
            )));
        }

        Ok(body.to_vec())
    }
}
