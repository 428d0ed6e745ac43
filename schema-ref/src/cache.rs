//! Per-run cache of schema documents keyed by identifier.
//!
//! Each distinct identifier is loaded at most once for the lifetime of a
//! [`DocumentCache`]. An entry moves through
//! `Loading -> Resolving -> Resolved`; while it is `Resolving` the entry holds
//! the document as parsed (its placeholder), which is what a reference cycle
//! observes. A `Resolved` entry keeps the cycles that were cut short while it
//! was resolved, so a later reader can tell a partial value from a final one.

use hashbrown::HashMap;
use serde_json::Value;
use tracing::{debug, info};

use crate::document::SchemaDocument;
use crate::error::{ResolveError, ResolveResult};
use crate::identifier::Identifier;
use crate::loader::{DocumentLoader, SchemaLoader};
use crate::options::ResolverOptions;
use crate::resolver::CycleRecord;

/// Lifecycle of a cached document. Absence from the cache means unloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// Load in progress; no value yet
    Loading,
    /// Parsed; its own references are being resolved
    Resolving,
    /// Every resolvable reference has been substituted
    Resolved,
}

struct CacheEntry {
    state: DocumentState,
    document: SchemaDocument,
    cycles: Vec<CycleRecord>,
}

/// Owner of every schema document loaded during a resolution run.
pub struct DocumentCache {
    loader: Box<dyn DocumentLoader>,
    entries: HashMap<Identifier, CacheEntry>,
    loads: usize,
}

impl DocumentCache {
    pub fn new(loader: impl DocumentLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            entries: HashMap::new(),
            loads: 0,
        }
    }

    /// Cache backed by the default file/HTTP loader.
    pub fn with_options(options: &ResolverOptions) -> Self {
        Self::new(SchemaLoader::new(options))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of loader calls made so far.
    pub fn load_count(&self) -> usize {
        self.loads
    }

    pub fn state(&self, identifier: &Identifier) -> Option<DocumentState> {
        self.entries.get(identifier).map(|entry| entry.state)
    }

    /// Current document for `identifier`, whatever its state.
    pub fn get(&self, identifier: &Identifier) -> Option<&SchemaDocument> {
        self.entries.get(identifier).map(|entry| &entry.document)
    }

    /// Cycles cut short while `identifier` was resolved, including those met
    /// in the documents it pulled in. Empty unless the entry is `Resolved`.
    pub fn cycles(&self, identifier: &Identifier) -> &[CycleRecord] {
        self.entries
            .get(identifier)
            .map(|entry| entry.cycles.as_slice())
            .unwrap_or_default()
    }

    /// Whether the resolved value of `identifier` holds partial data.
    pub fn is_partial(&self, identifier: &Identifier) -> bool {
        !self.cycles(identifier).is_empty()
    }

    /// Drop every entry. The load counter is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Load and parse a document without caching it.
    pub fn load_document(&mut self, identifier: &Identifier) -> ResolveResult<SchemaDocument> {
        self.loads += 1;
        debug!("Loading {}", identifier);
        let bytes = self.loader.load(identifier)?;
        SchemaDocument::parse(identifier.clone(), &bytes)
    }

    /// Return the document for `identifier`, loading it on first use.
    ///
    /// On a miss the document is loaded, stored as a `Resolving` placeholder,
    /// handed to `resolve` (which may re-enter the cache for other
    /// documents), and finally stored as `Resolved` together with the cycles
    /// `resolve` reports. A hit returns the entry as it stands, without
    /// reloading or re-resolving. Failures remove the entry.
    pub fn get_or_load<F>(
        &mut self,
        identifier: &Identifier,
        resolve: F,
    ) -> ResolveResult<&SchemaDocument>
    where
        F: FnOnce(&mut Self, &Identifier, &mut Value) -> ResolveResult<Vec<CycleRecord>>,
    {
        if !self.entries.contains_key(identifier) {
            self.insert(
                SchemaDocument::new(identifier.clone(), Value::Null),
                DocumentState::Loading,
            );

            let document = match self.load_document(identifier) {
                Ok(document) => document,
                Err(e) => {
                    self.entries.remove(identifier);
                    return Err(e);
                }
            };

            let mut value = document.value.clone();
            self.insert(document, DocumentState::Resolving);

            match resolve(self, identifier, &mut value) {
                Ok(cycles) => self.finish(identifier, value, cycles),
                Err(e) => {
                    self.entries.remove(identifier);
                    return Err(e);
                }
            }
        }

        self.get(identifier)
            .ok_or_else(|| ResolveError::unresolvable(identifier, "evicted during resolution"))
    }

    /// Register a document supplied by the caller as `Resolving`. Returns
    /// `false` (and changes nothing) if the identifier is already cached.
    pub(crate) fn begin(&mut self, document: SchemaDocument) -> bool {
        if self.entries.contains_key(&document.identifier) {
            return false;
        }
        self.insert(document, DocumentState::Resolving);
        true
    }

    /// Overwrite the placeholder with the resolved value.
    pub(crate) fn finish(
        &mut self,
        identifier: &Identifier,
        value: Value,
        cycles: Vec<CycleRecord>,
    ) {
        if cycles.is_empty() {
            info!("Resolved {}", identifier);
        } else {
            info!("Resolved {} ({} cycle(s) left partial)", identifier, cycles.len());
        }
        let document = SchemaDocument::new(identifier.clone(), value);
        self.entries.insert(
            identifier.clone(),
            CacheEntry {
                state: DocumentState::Resolved,
                document,
                cycles,
            },
        );
    }

    pub(crate) fn abandon(&mut self, identifier: &Identifier) {
        self.entries.remove(identifier);
    }

    fn insert(&mut self, document: SchemaDocument, state: DocumentState) {
        let entry = CacheEntry {
            state,
            document,
            cycles: Vec::new(),
        };
        self.entries.insert(entry.document.identifier.clone(), entry);
    }
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new(SchemaLoader::default())
    }
}
