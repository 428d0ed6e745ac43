//! schema-gen.toml configuration
//!
//! Every field is optional; command-line flags override whatever the file
//! sets.

use anyhow::{Context, Result};
use clap::ValueEnum;
use schema_ref::ResolverOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest accepted chunk size. Keeps every chunk larger than the longest
/// escape sequence.
pub const MIN_CHUNK_SIZE: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenConfig {
    #[serde(default)]
    pub resolver: ResolverOptions,
    #[serde(default)]
    pub output: OutputConfig,
}

/// What to generate and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root schema file name inside the schema directory
    #[serde(default = "default_root")]
    pub root: String,

    #[serde(default)]
    pub format: OutputFormat,

    /// Maximum bytes per string literal before the C output is split.
    /// MSVC rejects literals over 16K, so the default stays well below.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// C symbol name; the array form appends `s`
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Accept output that still contains `$ref` nodes left by cycles
    #[serde(default)]
    pub allow_cycles: bool,
}

/// Output artifact kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Pretty-printed resolved JSON
    Json,
    /// C string literal, split into an array when it exceeds the chunk size
    #[default]
    C,
    /// C array of string literals, even when one chunk would do
    CArray,
}

fn default_root() -> String {
    "glTF.schema.json".to_string()
}

fn default_chunk_size() -> usize {
    8000
}

fn default_symbol() -> String {
    "kglTFSchemaString".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            format: OutputFormat::default(),
            chunk_size: default_chunk_size(),
            symbol: default_symbol(),
            allow_cycles: false,
        }
    }
}

impl GenConfig {
    /// Load a config file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let output = &self.output;
        if output.chunk_size < MIN_CHUNK_SIZE {
            anyhow::bail!(
                "chunk_size must be at least {} (got {})",
                MIN_CHUNK_SIZE,
                output.chunk_size
            );
        }
        if !is_c_identifier(&output.symbol) {
            anyhow::bail!("symbol '{}' is not a valid C identifier", output.symbol);
        }
        if output.root.is_empty() {
            anyhow::bail!("root schema file name is empty");
        }
        Ok(())
    }
}

fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
