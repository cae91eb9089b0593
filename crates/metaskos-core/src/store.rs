//! Canonical concept store.
//!
//! Append-only registry of [`CanonicalConcept`]s keyed by [`CanonicalId`],
//! plus the per-run source-key cache that makes identity resolution monotone:
//! once a source node has been mapped to a canonical id it keeps that id for
//! the rest of the run.

use crate::crosswalk::CrosswalkTable;
use crate::model::{CanonicalConcept, CanonicalId, ConceptFields, ConceptScheme};
use crate::query::local_name;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A source node to resolve.
#[derive(Debug, Clone, Copy)]
pub enum SourceRef<'a> {
    /// A thesaurus node, addressed by one or more equivalent source URIs
    /// (a descriptor and its preferred concept). The first key that hits
    /// the cache or the crosswalk wins; every key is cached afterwards.
    Thesaurus { keys: &'a [&'a str] },
    /// An ontology class and, if it has one, the thesaurus URI it
    /// cross-references.
    Ontology {
        uri: &'a str,
        thesaurus_xref: Option<&'a str>,
    },
}

/// How a resolved id was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Already resolved earlier in this run (or rebuilt from a resumed graph).
    Cached,
    /// Pre-assigned by the crosswalk table.
    Preassigned,
    /// Shared with an already-resolved thesaurus node via a cross-reference.
    Inherited,
    /// Freshly allocated from the counter.
    Allocated,
}

/// Serializable image of a store (JSON snapshot output / resume input).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomySnapshot {
    pub next_id: u64,
    pub concepts: Vec<CanonicalConcept>,
    pub schemes: Vec<ConceptScheme>,
}

#[derive(Debug, Default)]
pub struct ConceptStore {
    concepts: BTreeMap<CanonicalId, CanonicalConcept>,
    schemes: BTreeMap<String, ConceptScheme>,
    resolved: HashMap<String, CanonicalId>,
    next_id: u64,
    unlabeled: BTreeSet<CanonicalId>,
    resumed: BTreeSet<CanonicalId>,
}

impl ConceptStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Resolve a source node to its canonical id, caching the mapping before
    /// returning so recursive callers observe it.
    pub fn resolve_id(
        &mut self,
        crosswalk: &CrosswalkTable,
        source: SourceRef<'_>,
    ) -> (CanonicalId, Resolution) {
        match source {
            SourceRef::Thesaurus { keys } => self.resolve_thesaurus_keys(crosswalk, keys),
            SourceRef::Ontology {
                uri,
                thesaurus_xref,
            } => self.resolve_ontology_class(crosswalk, uri, thesaurus_xref),
        }
    }

    pub fn resolve_thesaurus(&mut self, crosswalk: &CrosswalkTable, keys: &[&str]) -> CanonicalId {
        self.resolve_thesaurus_keys(crosswalk, keys).0
    }

    pub fn resolve_ontology(
        &mut self,
        crosswalk: &CrosswalkTable,
        uri: &str,
        thesaurus_xref: Option<&str>,
    ) -> CanonicalId {
        self.resolve_ontology_class(crosswalk, uri, thesaurus_xref).0
    }

    fn resolve_thesaurus_keys(
        &mut self,
        crosswalk: &CrosswalkTable,
        keys: &[&str],
    ) -> (CanonicalId, Resolution) {
        let cached = keys.iter().find_map(|k| self.resolved.get(*k).cloned());
        let (id, how) = match cached {
            Some(id) => (id, Resolution::Cached),
            None => {
                let preassigned = keys.iter().find_map(|k| {
                    crosswalk
                        .lookup_by_thesaurus_id(&local_name(k))
                        .and_then(|r| r.canonical_id.as_deref())
                        .map(CanonicalId::concept)
                });
                match preassigned {
                    Some(id) => (id, Resolution::Preassigned),
                    None => (self.allocate(crosswalk), Resolution::Allocated),
                }
            }
        };
        for key in keys {
            self.register(key, id.clone());
        }
        (id, how)
    }

    fn resolve_ontology_class(
        &mut self,
        crosswalk: &CrosswalkTable,
        uri: &str,
        thesaurus_xref: Option<&str>,
    ) -> (CanonicalId, Resolution) {
        if let Some(id) = self.resolved.get(uri) {
            return (id.clone(), Resolution::Cached);
        }
        let inherited = thesaurus_xref.and_then(|x| self.resolved.get(x).cloned());
        let (id, how) = match inherited {
            Some(id) => (id, Resolution::Inherited),
            None => (self.allocate(crosswalk), Resolution::Allocated),
        };
        self.register(uri, id.clone());
        (id, how)
    }

    /// Next counter value that collides with neither an existing concept nor
    /// a canonical id the crosswalk may still hand out.
    fn allocate(&mut self, crosswalk: &CrosswalkTable) -> CanonicalId {
        loop {
            let n = self.next_id;
            self.next_id += 1;
            let id = CanonicalId::concept(n);
            if self.concepts.contains_key(&id)
                || crosswalk.lookup_by_canonical_id(&n.to_string()).is_some()
            {
                continue;
            }
            return id;
        }
    }

    /// Record `key -> id` unless `key` is already mapped. Mappings are never
    /// reassigned; a conflicting request is logged and ignored.
    pub fn register(&mut self, key: &str, id: CanonicalId) -> bool {
        match self.resolved.get(key) {
            Some(existing) if *existing == id => false,
            Some(existing) => {
                tracing::warn!(
                    key,
                    existing = %existing,
                    requested = %id,
                    "source key already resolved to a different canonical concept; keeping the first"
                );
                false
            }
            None => {
                self.resolved.insert(key.to_string(), id);
                true
            }
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&CanonicalId> {
        self.resolved.get(key)
    }

    pub fn is_resolved(&self, key: &str) -> bool {
        self.resolved.contains_key(key)
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Raise the allocation counter; it never moves down.
    pub fn reserve_ids_below(&mut self, next_id: u64) {
        self.next_id = self.next_id.max(next_id);
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    pub fn get(&self, id: &CanonicalId) -> Option<&CanonicalConcept> {
        self.concepts.get(id)
    }

    pub fn get_or_create(&mut self, id: &CanonicalId) -> &mut CanonicalConcept {
        self.concepts
            .entry(id.clone())
            .or_insert_with(|| CanonicalConcept::new(id.clone()))
    }

    pub fn contains(&self, id: &CanonicalId) -> bool {
        self.concepts.contains_key(id)
    }

    pub fn is_labeled(&self, id: &CanonicalId) -> bool {
        self.concepts.get(id).is_some_and(|c| c.is_labeled())
    }

    /// Fill the core fields of a concept unless it already has a label.
    ///
    /// Returns `true` when the fields were written. A concept populated
    /// without a label is remembered in [`ConceptStore::unlabeled`] and may
    /// still receive a label from a later resolution.
    pub fn populate_once(&mut self, id: &CanonicalId, fields: ConceptFields) -> bool {
        let concept = self.get_or_create(id);
        if concept.is_labeled() {
            return false;
        }

        let ConceptFields {
            label,
            definition,
            alt_labels,
        } = fields;
        let labeled = label.is_some();
        concept.label = label;
        if concept.definition.is_none() {
            concept.definition = definition.filter(|d| !d.trim().is_empty());
        }
        concept
            .alt_labels
            .extend(alt_labels.into_iter().filter(|l| !l.trim().is_empty()));

        if labeled {
            self.unlabeled.remove(id);
        } else {
            self.unlabeled.insert(id.clone());
        }
        true
    }

    pub fn add_alt_label(&mut self, id: &CanonicalId, alt_label: &str) -> bool {
        let concept = self.get_or_create(id);
        if concept.label.as_deref() == Some(alt_label) {
            return false;
        }
        concept.alt_labels.insert(alt_label.to_string())
    }

    pub fn add_cross_reference(&mut self, id: &CanonicalId, xref: &str) -> bool {
        self.get_or_create(id)
            .cross_references
            .insert(xref.to_string())
    }

    /// Insert the `broader(child, parent)` / `narrower(parent, child)` pair.
    ///
    /// Returns whether the pair was newly added. Self-loops are refused.
    pub fn link(&mut self, parent: &CanonicalId, child: &CanonicalId) -> bool {
        if parent == child {
            tracing::warn!(concept = %parent, "refusing to link a concept to itself");
            return false;
        }
        let added_down = self.get_or_create(parent).narrower.insert(child.clone());
        let added_up = self.get_or_create(child).broader.insert(parent.clone());
        added_down || added_up
    }

    pub fn has_edge(&self, parent: &CanonicalId, child: &CanonicalId) -> bool {
        self.concepts
            .get(parent)
            .is_some_and(|p| p.narrower.contains(child))
    }

    // ------------------------------------------------------------------
    // Schemes
    // ------------------------------------------------------------------

    pub fn ensure_scheme(&mut self, scheme_id: &str, label: &str) -> &mut ConceptScheme {
        self.schemes
            .entry(scheme_id.to_string())
            .or_insert_with(|| ConceptScheme::new(scheme_id, label))
    }

    pub fn scheme(&self, scheme_id: &str) -> Option<&ConceptScheme> {
        self.schemes.get(scheme_id)
    }

    pub fn add_to_scheme(&mut self, id: &CanonicalId, scheme_id: &str) -> bool {
        self.get_or_create(id).schemes.insert(scheme_id.to_string())
    }

    /// Mark `id` as a top concept of `scheme_id` (and a member of it).
    pub fn set_top_concept(&mut self, scheme_id: &str, id: &CanonicalId) {
        if let Some(scheme) = self.schemes.get_mut(scheme_id) {
            scheme.top_concepts.insert(id.clone());
        }
        self.add_to_scheme(id, scheme_id);
    }

    // ------------------------------------------------------------------
    // Resume bookkeeping
    // ------------------------------------------------------------------

    pub fn mark_resumed(&mut self, id: &CanonicalId) {
        self.resumed.insert(id.clone());
    }

    pub fn is_resumed(&self, id: &CanonicalId) -> bool {
        self.resumed.contains(id)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn concepts(&self) -> impl Iterator<Item = &CanonicalConcept> {
        self.concepts.values()
    }

    pub fn schemes(&self) -> impl Iterator<Item = &ConceptScheme> {
        self.schemes.values()
    }

    pub fn unlabeled(&self) -> &BTreeSet<CanonicalId> {
        &self.unlabeled
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.concepts.values().map(|c| c.narrower.len()).sum()
    }

    pub fn snapshot(&self) -> TaxonomySnapshot {
        TaxonomySnapshot {
            next_id: self.next_id,
            concepts: self.concepts.values().cloned().collect(),
            schemes: self.schemes.values().cloned().collect(),
        }
    }

    /// Rebuild a store from a snapshot. Every loaded concept is marked as
    /// resumed and the counter is moved above the largest numeric suffix.
    /// The source-key cache is left empty; see the resume pass.
    pub fn from_snapshot(snapshot: TaxonomySnapshot) -> Self {
        let mut store = Self::new();
        let max_suffix = snapshot
            .concepts
            .iter()
            .filter_map(|c| c.id.numeric_suffix())
            .max();
        store.next_id = snapshot
            .next_id
            .max(max_suffix.map_or(0, |n| n.saturating_add(1)));

        for concept in snapshot.concepts {
            if !concept.is_labeled() {
                store.unlabeled.insert(concept.id.clone());
            }
            store.resumed.insert(concept.id.clone());
            store.concepts.insert(concept.id.clone(), concept);
        }
        for scheme in snapshot.schemes {
            store.schemes.insert(scheme.id.clone(), scheme);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crosswalk::{CrosswalkBatch, CrosswalkRecord};

    fn crosswalk() -> CrosswalkTable {
        CrosswalkTable::from_batches([(
            CrosswalkBatch::All,
            vec![
                CrosswalkRecord::new(Some("100"), Some("D1"), Some("C0004096")),
                CrosswalkRecord::new(Some("1"), Some("D7"), None),
                CrosswalkRecord::new(None, Some("D8"), Some("C0000008")),
            ],
        )])
    }

    const D1: &str = "http://id.nlm.nih.gov/mesh/2020/D1";
    const M1: &str = "http://id.nlm.nih.gov/mesh/2020/M1";

    #[test]
    fn preassigned_id_comes_from_the_crosswalk() {
        let mut store = ConceptStore::new();
        let (id, how) = store.resolve_id(&crosswalk(), SourceRef::Thesaurus { keys: &[D1, M1] });
        assert_eq!(id, CanonicalId::concept(100));
        assert_eq!(how, Resolution::Preassigned);
        assert_eq!(store.next_id(), 0);
        assert_eq!(store.lookup(M1), Some(&id));
    }

    #[test]
    fn second_resolution_hits_the_cache() {
        let table = crosswalk();
        let mut store = ConceptStore::new();
        let first = store.resolve_thesaurus(&table, &[M1]);
        let (second, how) = store.resolve_id(&table, SourceRef::Thesaurus { keys: &[D1, M1] });
        assert_eq!(first, second);
        assert_eq!(how, Resolution::Cached);
        // D1 now follows M1 even though the crosswalk would pre-assign 100.
        assert_eq!(store.lookup(D1), Some(&first));
    }

    #[test]
    fn allocation_skips_ids_the_crosswalk_reserves() {
        let table = crosswalk();
        let mut store = ConceptStore::new();
        let a = store.resolve_thesaurus(&table, &["http://x/D_unknown"]);
        let b = store.resolve_ontology(&table, "http://obo/MONDO_1", None);
        assert_eq!(a, CanonicalId::concept(0));
        // `1` is pre-assigned to D7, so the counter moves past it.
        assert_eq!(b, CanonicalId::concept(2));
        assert_eq!(store.next_id(), 3);
    }

    #[test]
    fn record_without_canonical_id_allocates() {
        let mut store = ConceptStore::new();
        let (_, how) = store.resolve_id(
            &crosswalk(),
            SourceRef::Thesaurus {
                keys: &["http://id.nlm.nih.gov/mesh/2020/D8"],
            },
        );
        assert_eq!(how, Resolution::Allocated);
    }

    #[test]
    fn ontology_class_inherits_from_resolved_thesaurus_xref() {
        let table = crosswalk();
        let mut store = ConceptStore::new();
        let thesaurus = store.resolve_thesaurus(&table, &[D1, M1]);
        let (ontology, how) = store.resolve_id(
            &table,
            SourceRef::Ontology {
                uri: "http://obo/MONDO_4979",
                thesaurus_xref: Some(D1),
            },
        );
        assert_eq!(ontology, thesaurus);
        assert_eq!(how, Resolution::Inherited);
    }

    #[test]
    fn populate_once_keeps_the_first_label() {
        let mut store = ConceptStore::new();
        let id = CanonicalId::concept(5);
        assert!(store.populate_once(
            &id,
            ConceptFields::labeled("Asthma").with_definition(Some("A disease".into()))
        ));
        assert!(!store.populate_once(
            &id,
            ConceptFields::labeled("Something else").with_definition(Some("Other".into()))
        ));
        let concept = store.get(&id).unwrap();
        assert_eq!(concept.label.as_deref(), Some("Asthma"));
        assert_eq!(concept.definition.as_deref(), Some("A disease"));
    }

    #[test]
    fn unlabeled_concepts_are_tracked_until_labeled() {
        let mut store = ConceptStore::new();
        let id = CanonicalId::concept(9);
        store.populate_once(&id, ConceptFields::default());
        assert!(store.unlabeled().contains(&id));
        store.populate_once(&id, ConceptFields::labeled("Late label"));
        assert!(store.unlabeled().is_empty());
    }

    #[test]
    fn link_adds_both_directions_once_and_refuses_self_loops() {
        let mut store = ConceptStore::new();
        let parent = CanonicalId::concept(1);
        let child = CanonicalId::concept(2);
        assert!(store.link(&parent, &child));
        assert!(!store.link(&parent, &child));
        assert!(store.get(&child).unwrap().broader.contains(&parent));
        assert!(store.get(&parent).unwrap().narrower.contains(&child));
        assert!(!store.link(&parent, &parent));
        assert!(store.get(&parent).unwrap().broader.is_empty());
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn register_never_reassigns() {
        let mut store = ConceptStore::new();
        assert!(store.register("k", CanonicalId::concept(1)));
        assert!(!store.register("k", CanonicalId::concept(2)));
        assert_eq!(store.lookup("k"), Some(&CanonicalId::concept(1)));
    }

    #[test]
    fn snapshot_restores_counter_above_max_suffix() {
        let mut store = ConceptStore::new();
        store.populate_once(&CanonicalId::concept(41), ConceptFields::labeled("a"));
        store.populate_once(&CanonicalId::concept("C0001"), ConceptFields::labeled("b"));
        let restored = ConceptStore::from_snapshot(store.snapshot());
        assert_eq!(restored.next_id(), 42);
        assert!(restored.is_resumed(&CanonicalId::concept(41)));
        assert_eq!(restored.len(), 2);
    }
}
