//! Generation pipeline: resolve the root schema, render it, write or check.

use anyhow::{Context, Result};
use schema_ref::{resolve_file, unresolved_references, ResolvedSchema};
use std::path::{Path, PathBuf};

use crate::config::GenConfig;
use crate::embed;

/// Path of the root schema inside `schema_dir`.
pub fn root_schema_path(schema_dir: &Path, config: &GenConfig) -> PathBuf {
    schema_dir.join(&config.output.root)
}

/// Resolve the root schema of `schema_dir` completely.
///
/// Fails if the root file is missing, if any reference cannot be resolved,
/// or if `$ref` nodes remain after resolution (unless cycles are allowed).
pub fn resolve_schema_dir(schema_dir: &Path, config: &GenConfig) -> Result<ResolvedSchema> {
    let root = root_schema_path(schema_dir, config);
    if !root.is_file() {
        anyhow::bail!("Schema file not found: {}", root.display());
    }

    let resolved = resolve_file(&root, &config.resolver)
        .with_context(|| format!("Failed to resolve {}", root.display()))?;

    tracing::info!(
        "Resolved {} ({} document(s) loaded)",
        root.display(),
        resolved.documents_loaded
    );

    for cycle in &resolved.resolution.cycles {
        tracing::warn!(
            "Cycle: \"{}\" in {} points back into {}",
            cycle.reference,
            cycle.from,
            cycle.to
        );
    }

    let remaining = unresolved_references(&resolved.document.value);
    if !remaining.is_empty() {
        if config.output.allow_cycles {
            tracing::warn!("{} unresolved reference(s) kept", remaining.len());
        } else {
            anyhow::bail!(
                "{} unresolved reference(s) in {}: {}",
                remaining.len(),
                root.display(),
                remaining.join(", ")
            );
        }
    }

    Ok(resolved)
}

/// Resolve and render `schema_dir` into the configured artifact.
pub fn generate(schema_dir: &Path, config: &GenConfig) -> Result<String> {
    let resolved = resolve_schema_dir(schema_dir, config)?;
    embed::render(&resolved.document.value, &config.output).context("Failed to render schema")
}

/// Write `contents` to `path` through a temporary sibling file, so a failed
/// write never leaves a truncated artifact behind.
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Output path has no file name: {}", path.display()))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    std::fs::write(&tmp, contents)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("Failed to write {}", path.display()));
    }
    Ok(())
}

/// Compare freshly generated output with an existing file.
pub fn check_output(path: &Path, fresh: &str) -> Result<bool> {
    let existing = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(existing == fresh)
}
