//! Rebuild a store from a previously written taxonomy.
//!
//! The allocation counter resumes above the largest numeric suffix, every
//! loaded concept is marked as resumed, and the source-key cache is rebuilt
//! from cross-references so later passes treat persisted concepts as already
//! resolved.

use metaskos_core::query::preferred_literal;
use metaskos_core::{
    CanonicalConcept, ConceptScheme, ConceptStore, GraphQuery, MergeConfig, NodeClass, Relation,
    TaxonomySnapshot,
};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResumeReport {
    pub concepts: usize,
    pub schemes: usize,
    pub cached_keys: usize,
    pub next_id: u64,
}

pub fn resume_from_graph<G: GraphQuery + ?Sized>(
    graph: &G,
    config: &MergeConfig,
) -> (ConceptStore, ResumeReport) {
    resume_from_snapshot(snapshot_from_graph(graph, config), config)
}

pub fn resume_from_snapshot(
    snapshot: TaxonomySnapshot,
    config: &MergeConfig,
) -> (ConceptStore, ResumeReport) {
    let mut store = ConceptStore::from_snapshot(snapshot);
    let ontology_prefix = ontology_class_prefix(&config.ontology_root);

    let mut keys = Vec::new();
    for concept in store.concepts() {
        for xref in &concept.cross_references {
            let thesaurus = xref.starts_with(&config.thesaurus_namespace);
            let ontology = ontology_prefix.is_some_and(|p| xref.starts_with(p));
            if thesaurus || ontology {
                keys.push((xref.clone(), concept.id.clone()));
            }
        }
    }
    let mut cached_keys = 0;
    for (key, id) in keys {
        if store.register(&key, id) {
            cached_keys += 1;
        }
    }

    let report = ResumeReport {
        concepts: store.len(),
        schemes: store.schemes().count(),
        cached_keys,
        next_id: store.next_id(),
    };
    tracing::info!(
        concepts = report.concepts,
        schemes = report.schemes,
        cached = report.cached_keys,
        next_id = report.next_id,
        "resumed taxonomy"
    );
    (store, report)
}

/// Read canonical concepts and schemes back from a SKOS graph.
pub fn snapshot_from_graph<G: GraphQuery + ?Sized>(graph: &G, config: &MergeConfig) -> TaxonomySnapshot {
    let language = config.label_language.as_str();
    let mut snapshot = TaxonomySnapshot::default();

    for iri in graph.instances_of(NodeClass::SkosConcept) {
        let Some(id) = config.canonical_id_from_iri(&iri) else {
            tracing::debug!(iri = %iri, "skipping concept outside the canonical namespace");
            continue;
        };
        let mut concept = CanonicalConcept::new(id);
        concept.label = preferred_literal(graph, &iri, Relation::Label, language);
        concept.definition = preferred_literal(graph, &iri, Relation::Definition, language);
        concept.alt_labels = graph
            .literals(&iri, Relation::AltLabel)
            .into_iter()
            .map(|l| l.lexical)
            .collect();
        concept.cross_references = graph.objects(&iri, Relation::ExactMatch).into_iter().collect();
        concept.broader = graph
            .objects(&iri, Relation::Broader)
            .iter()
            .filter_map(|b| config.canonical_id_from_iri(b))
            .collect();
        concept.narrower = graph
            .objects(&iri, Relation::Narrower)
            .iter()
            .filter_map(|n| config.canonical_id_from_iri(n))
            .collect();
        concept.schemes = graph
            .objects(&iri, Relation::InScheme)
            .iter()
            .filter_map(|s| config.scheme_id_from_iri(s))
            .collect();
        snapshot.concepts.push(concept);
    }

    for iri in graph.instances_of(NodeClass::SkosConceptScheme) {
        let Some(scheme_id) = config.scheme_id_from_iri(&iri) else {
            continue;
        };
        let label = preferred_literal(graph, &iri, Relation::Label, language).unwrap_or_default();
        let mut scheme = ConceptScheme::new(scheme_id, label);
        scheme.top_concepts = graph
            .objects(&iri, Relation::HasTopConcept)
            .iter()
            .filter_map(|t| config.canonical_id_from_iri(t))
            .collect();
        snapshot.schemes.push(scheme);
    }

    snapshot
}

/// `http://purl.obolibrary.org/obo/MONDO_0000001` -> `http://purl.obolibrary.org/obo/MONDO_`.
fn ontology_class_prefix(root: &str) -> Option<&str> {
    let underscore = root.rfind('_')?;
    let slash = root.rfind(['/', '#']).unwrap_or(0);
    (underscore > slash).then(|| &root[..=underscore])
}
