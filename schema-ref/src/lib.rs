//! JSON-Schema `$ref` resolution for schema bundles.
//!
//! A bundle such as the glTF 2.0 schema is a graph of JSON files linked by
//! `$ref` pointers: fragments within one file, sibling files, and remote
//! URLs. This crate flattens such a graph into a single self-contained value.
//!
//! # Example
//!
//! ```ignore
//! use schema_ref::{resolve_file, ResolverOptions};
//!
//! let resolved = resolve_file("schema/glTF.schema.json".as_ref(), &ResolverOptions::default())?;
//! println!("{}", serde_json::to_string_pretty(&resolved.document.value)?);
//! ```

pub mod cache;
pub mod document;
pub mod error;
pub mod identifier;
pub mod loader;
pub mod options;
pub mod pointer;
pub mod reference;
pub mod resolver;

use std::path::Path;

pub use cache::{DocumentCache, DocumentState};
pub use document::SchemaDocument;
pub use error::{Location, ResolveError, ResolveResult};
pub use identifier::Identifier;
pub use loader::{DocumentLoader, SchemaLoader};
pub use options::ResolverOptions;
pub use reference::Reference;
pub use resolver::{unresolved_references, CycleRecord, ReferenceResolver, Resolution};

/// A fully processed root schema.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    /// Root document with every resolvable reference substituted
    pub document: SchemaDocument,
    pub resolution: Resolution,
    /// Distinct documents read from disk or network, root included
    pub documents_loaded: usize,
}

/// Load the schema at `path` and resolve it against its own directory.
pub fn resolve_file(path: &Path, options: &ResolverOptions) -> ResolveResult<ResolvedSchema> {
    let mut cache = DocumentCache::with_options(options);
    resolve_with_cache(&mut cache, &Identifier::from_path(path), options)
}

/// Load and resolve the document named by `identifier` using `cache`.
///
/// The root goes through the cache like any other document, so a sibling
/// that refers back to it sees it as `Resolving` and a second call for the
/// same identifier returns the cached result without loading again. The
/// cycles recorded for the entry come back with it on every call.
pub fn resolve_with_cache(
    cache: &mut DocumentCache,
    identifier: &Identifier,
    options: &ResolverOptions,
) -> ResolveResult<ResolvedSchema> {
    let loads_before = cache.load_count();

    let document = cache
        .get_or_load(identifier, |cache, identifier, value| {
            let resolution = ReferenceResolver::new(cache)
                .fail_on_cycle(options.fail_on_cycle)
                .resolve(value, identifier)?;
            Ok(resolution.cycles)
        })?
        .clone();
    let resolution = Resolution {
        cycles: cache.cycles(identifier).to_vec(),
    };

    if resolution.has_cycles() {
        tracing::warn!(
            "{} reference cycle(s) left partially resolved in {}",
            resolution.cycles.len(),
            identifier
        );
    }

    Ok(ResolvedSchema {
        document,
        resolution,
        documents_loaded: cache.load_count() - loads_before,
    })
}
