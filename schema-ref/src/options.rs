//! Resolver configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for loading and resolving a schema bundle.
///
/// Every field has a default, so an empty `[resolver]` TOML table (or none at
/// all) yields [`ResolverOptions::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverOptions {
    /// Follow `http`/`https` references.
    #[serde(default = "default_true")]
    pub allow_remote: bool,

    /// Per-request timeout for remote fetches, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Extra attempts after a transient network failure.
    #[serde(default = "default_network_retries")]
    pub network_retries: u32,

    /// Largest schema document accepted, in bytes.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: u64,

    /// Treat a reference cycle as a fatal error instead of substituting the
    /// partially resolved value.
    #[serde(default)]
    pub fail_on_cycle: bool,
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_network_retries() -> u32 {
    1
}

fn default_max_document_bytes() -> u64 {
    16 * 1024 * 1024 // 16 MiB
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            allow_remote: default_true(),
            request_timeout_secs: default_timeout_secs(),
            network_retries: default_network_retries(),
            max_document_bytes: default_max_document_bytes(),
            fail_on_cycle: false,
        }
    }
}

impl ResolverOptions {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
