//! Depth-first `$ref` substitution.
//!
//! The resolver walks a JSON value in document order. A mapping with a string
//! `$ref` is replaced wholesale by the value the reference points at (sibling
//! keys are dropped); every other mapping or array is descended into.
//!
//! # Cycles
//!
//! Two kinds of cycle are recognised and never followed:
//!
//! - a cross-document reference to a document that is still `Loading` or
//!   `Resolving` in the cache: the fragment is taken from that document's
//!   placeholder and substituted without further resolution;
//! - an in-document reference that re-enters a fragment already being
//!   expanded (a recursive definition): the `$ref` node is left in place.
//!
//! Both are recorded in the returned [`Resolution`] and kept with the cache
//! entry of the document being resolved, so a later cache hit reports them
//! too. With strict cycle handling they become
//! [`ResolveError::CyclicReferenceDetected`] instead.
//!
//! A value copied out of another document may still hold `$ref` nodes (left
//! by a cycle). Those are rewritten so they name the same target from their
//! new position: relative targets become absolute URIs, and targets inside
//! the receiving document become plain `#` fragments.

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{DocumentCache, DocumentState};
use crate::document::SchemaDocument;
use crate::error::{ResolveError, ResolveResult};
use crate::identifier::Identifier;
use crate::pointer::{self, escape_token};
use crate::reference::{Reference, REF_KEY};

/// A reference cycle that was cut short during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleRecord {
    /// Document containing the reference
    pub from: Identifier,
    /// Document the reference points into
    pub to: Identifier,
    /// The `$ref` string as written
    pub reference: String,
}

/// Outcome of a successful [`ReferenceResolver::resolve`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub cycles: Vec<CycleRecord>,
}

impl Resolution {
    /// Whether the result may still contain partial values or `$ref` nodes.
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }
}

/// Replaces `$ref` nodes with their targets, loading documents through a
/// [`DocumentCache`].
pub struct ReferenceResolver<'c> {
    cache: &'c mut DocumentCache,
    walk: Walk,
}

impl<'c> ReferenceResolver<'c> {
    pub fn new(cache: &'c mut DocumentCache) -> Self {
        Self {
            cache,
            walk: Walk::default(),
        }
    }

    /// Report cycles as errors rather than resolving them partially.
    pub fn fail_on_cycle(mut self, strict: bool) -> Self {
        self.walk.fail_on_cycle = strict;
        self
    }

    /// Resolve every reference in `document` in place.
    ///
    /// `base` is the document's own identifier: relative targets are joined
    /// against it and in-document fragments are looked up in it. On error the
    /// document may be partially rewritten and must be discarded.
    pub fn resolve(
        &mut self,
        document: &mut Value,
        base: &Identifier,
    ) -> ResolveResult<Resolution> {
        let Self { cache, walk } = self;

        let registered = cache.begin(SchemaDocument::new(base.clone(), document.clone()));
        match walk.resolve_value(cache, document, base) {
            Ok(()) => {
                if registered {
                    cache.finish(base, document.clone(), walk.cycles.clone());
                }
            }
            Err(e) => {
                if registered {
                    cache.abandon(base);
                }
                walk.expanding.clear();
                walk.cycles.clear();
                return Err(e);
            }
        }

        Ok(Resolution {
            cycles: std::mem::take(&mut walk.cycles),
        })
    }
}

/// Traversal state for one resolver. Kept apart from the cache so the cache
/// can be handed back into the walk while a document is being loaded.
#[derive(Default)]
struct Walk {
    fail_on_cycle: bool,
    /// In-document fragments currently being expanded
    expanding: Vec<(Identifier, String)>,
    cycles: Vec<CycleRecord>,
}

impl Walk {
    fn resolve_value(
        &mut self,
        cache: &mut DocumentCache,
        node: &mut Value,
        current: &Identifier,
    ) -> ResolveResult<()> {
        let reference = match node {
            Value::Object(map) => map.get(REF_KEY).and_then(Value::as_str).map(Reference::parse),
            _ => None,
        };
        if let Some(reference) = reference {
            return self.substitute(cache, node, &reference, current);
        }

        match node {
            Value::Object(map) => {
                for child in map.values_mut() {
                    self.resolve_value(cache, child, current)?;
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.resolve_value(cache, item, current)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn substitute(
        &mut self,
        cache: &mut DocumentCache,
        node: &mut Value,
        reference: &Reference,
        current: &Identifier,
    ) -> ResolveResult<()> {
        let target = match reference.target() {
            Some(target) => current.join(target)?,
            None => current.clone(),
        };

        if target == *current {
            return self.expand_local(cache, node, reference, current);
        }

        if matches!(
            cache.state(&target),
            Some(DocumentState::Loading | DocumentState::Resolving)
        ) {
            self.record_cycle(current, &target, reference)?;
            let mut partial = match cache.get(&target) {
                Some(document) => lookup(document, reference)?.clone(),
                None => return Err(ResolveError::unresolvable(&target, "not in cache")),
            };
            rebase_references(&mut partial, &target, current);
            *node = partial;
            return Ok(());
        }

        debug!("Substituting {} from {}", reference, target);
        let mut resolved = {
            let document = cache.get_or_load(&target, |cache, identifier, value| {
                let start = self.cycles.len();
                self.resolve_value(cache, value, identifier)?;
                Ok(self.cycles[start..].to_vec())
            })?;
            lookup(document, reference)?.clone()
        };
        self.inherit_cycles(cache.cycles(&target));
        rebase_references(&mut resolved, &target, current);
        *node = resolved;
        Ok(())
    }

    /// Carry the cycles of an already resolved document into this walk.
    fn inherit_cycles(&mut self, cycles: &[CycleRecord]) {
        for cycle in cycles {
            if !self.cycles.contains(cycle) {
                self.cycles.push(cycle.clone());
            }
        }
    }

    /// Substitute a fragment of the current document, then resolve what was
    /// substituted in the same document's context.
    fn expand_local(
        &mut self,
        cache: &mut DocumentCache,
        node: &mut Value,
        reference: &Reference,
        current: &Identifier,
    ) -> ResolveResult<()> {
        let key = (current.clone(), reference.pointer());
        if self.expanding.contains(&key) {
            return self.record_cycle(current, current, reference);
        }

        let value = match cache.get(current) {
            Some(document) => lookup(document, reference)?.clone(),
            None => return Err(ResolveError::unresolvable(current, "not in cache")),
        };
        *node = value;

        self.expanding.push(key);
        let result = self.resolve_value(cache, node, current);
        self.expanding.pop();
        result
    }

    fn record_cycle(
        &mut self,
        from: &Identifier,
        to: &Identifier,
        reference: &Reference,
    ) -> ResolveResult<()> {
        if self.fail_on_cycle {
            return Err(ResolveError::CyclicReferenceDetected {
                from: from.clone(),
                to: to.clone(),
                reference: reference.to_string(),
            });
        }

        warn!(
            "Cyclic reference \"{}\" from {} to {}; using partial value",
            reference, from, to
        );
        self.cycles.push(CycleRecord {
            from: from.clone(),
            to: to.clone(),
            reference: reference.to_string(),
        });
        Ok(())
    }
}

fn lookup<'d>(document: &'d SchemaDocument, reference: &Reference) -> ResolveResult<&'d Value> {
    pointer::evaluate(&document.value, reference.fragment()).map_err(|e| {
        ResolveError::ReferencePathNotFound {
            identifier: document.identifier.clone(),
            reference: reference.to_string(),
            segment: e.segment,
        }
    })
}

/// Rewrite every `$ref` in `value`, copied out of `source`, so it names the
/// same target from inside `destination`.
fn rebase_references(value: &mut Value, source: &Identifier, destination: &Identifier) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(raw)) = map.get_mut(REF_KEY) {
                if let Some(rebased) = rebase(raw, source, destination) {
                    *raw = rebased;
                }
                return;
            }
            for child in map.values_mut() {
                rebase_references(child, source, destination);
            }
        }
        Value::Array(items) => {
            for item in items {
                rebase_references(item, source, destination);
            }
        }
        _ => {}
    }
}

/// New spelling of `raw` when moved from `source` to `destination`, or
/// `None` if it is unchanged or its target cannot be joined.
fn rebase(raw: &str, source: &Identifier, destination: &Identifier) -> Option<String> {
    let reference = Reference::parse(raw);
    let target = match reference.target() {
        Some(target) => source.join(target).ok()?,
        None => source.clone(),
    };

    // Decoded segments may hold '%'; keep it from reading as an escape.
    let fragment = if reference.fragment().is_empty() {
        String::new()
    } else {
        format!("#{}", reference.pointer().replace('%', "%25"))
    };

    let rebased = if target == *destination {
        if fragment.is_empty() {
            "#".to_string()
        } else {
            fragment
        }
    } else {
        format!("{}{}", target.to_uri(), fragment)
    };
    (rebased != raw).then_some(rebased)
}

/// Pointer paths of every string-valued `$ref` left in `value`.
pub fn unresolved_references(value: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect_unresolved(value, &mut String::new(), &mut found);
    found
}

fn collect_unresolved(value: &Value, path: &mut String, found: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if map.get(REF_KEY).is_some_and(Value::is_string) {
                found.push(path.clone());
                return;
            }
            for (key, child) in map {
                let len = path.len();
                path.push('/');
                path.push_str(&escape_token(key));
                collect_unresolved(child, path, found);
                path.truncate(len);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let len = path.len();
                path.push('/');
                path.push_str(&i.to_string());
                collect_unresolved(item, path, found);
                path.truncate(len);
            }
        }
        _ => {}
    }
}
