//! Thesaurus hierarchy builder.
//!
//! Descriptors are visited in IRI order. Each descriptor's preferred concept
//! becomes (or joins) a canonical concept, the pre-descriptor `narrowerConcept`
//! tree below it is copied, and every broader descriptor is linked as a parent
//! after passing the label agreement check.

use crate::consistency::{check_parent_label, ParentClaim};
use crate::error::MergeError;
use crate::MergeContext;
use metaskos_core::query::{literal_values, local_name, preferred_literal};
use metaskos_core::{
    CanonicalId, ConceptFields, GraphQuery, MergeEvent, NodeClass, Relation, Resolution,
    SourceKind, SourceRef,
};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThesaurusReport {
    pub descriptors: usize,
    pub skipped_descriptors: usize,
    pub concepts_populated: usize,
    pub edges_added: usize,
    pub unanchored: usize,
}

pub fn build_thesaurus<G: GraphQuery + ?Sized>(
    ctx: &mut MergeContext<'_>,
    graph: &G,
) -> Result<ThesaurusReport, MergeError> {
    let mut report = ThesaurusReport::default();
    let language = ctx.config.label_language.clone();

    for descriptor in graph.instances_of(NodeClass::TopicalDescriptor) {
        let Some(descriptor_label) = labeled_in(graph, &descriptor, &language) else {
            report.skipped_descriptors += 1;
            tracing::debug!(descriptor = %descriptor, "descriptor has no label in the merge language");
            continue;
        };
        merge_descriptor(ctx, graph, &descriptor, &descriptor_label, &mut report)?;
        report.descriptors += 1;
    }

    tracing::info!(
        descriptors = report.descriptors,
        populated = report.concepts_populated,
        edges = report.edges_added,
        unanchored = report.unanchored,
        "thesaurus merged"
    );
    Ok(report)
}

fn merge_descriptor<G: GraphQuery + ?Sized>(
    ctx: &mut MergeContext<'_>,
    graph: &G,
    descriptor: &str,
    descriptor_label: &str,
    report: &mut ThesaurusReport,
) -> Result<CanonicalId, MergeError> {
    let preferred = preferred_concept(graph, descriptor, descriptor_label)?;
    let id = resolve_thesaurus_node(ctx, graph, Some(descriptor), &preferred, &mut report.concepts_populated);
    ctx.store.add_alt_label(&id, descriptor_label);

    let mut visited = HashSet::from([preferred.clone()]);
    copy_narrower_concepts(ctx, graph, &id, &preferred, &mut visited, report);

    for unanchored in graph.objects(&preferred, Relation::BroaderConcept) {
        report.unanchored += 1;
        tracing::debug!(
            concept = %unanchored,
            descriptor,
            "unanchored concept without a discernible parent"
        );
        ctx.sink.record(&MergeEvent::Unanchored {
            source: unanchored,
            concept: id.clone(),
        });
    }

    let language = ctx.config.label_language.clone();
    for parent_descriptor in graph.objects(descriptor, Relation::BroaderDescriptor) {
        let parent_label = labeled_in(graph, &parent_descriptor, &language).unwrap_or_default();
        let parent_preferred = preferred_concept(graph, &parent_descriptor, &parent_label)?;
        let parent_id = resolve_thesaurus_node(
            ctx,
            graph,
            Some(&parent_descriptor),
            &parent_preferred,
            &mut report.concepts_populated,
        );

        if ctx.store.link(&parent_id, &id) {
            report.edges_added += 1;
            ctx.sink.record(&MergeEvent::Linked {
                parent: parent_id.clone(),
                child: id.clone(),
            });
        }

        let parent_source_label = labeled_in(graph, &parent_preferred, &language);
        check_parent_label(
            ctx,
            ParentClaim {
                child_source: descriptor,
                child_id: &id,
                parent_source: &parent_descriptor,
                parent_source_label: parent_source_label.as_deref(),
                parent_id: &parent_id,
            },
        )?;
    }

    Ok(id)
}

/// Depth-first copy of the `narrowerConcept` tree rooted at `node`.
fn copy_narrower_concepts<G: GraphQuery + ?Sized>(
    ctx: &mut MergeContext<'_>,
    graph: &G,
    id: &CanonicalId,
    node: &str,
    visited: &mut HashSet<String>,
    report: &mut ThesaurusReport,
) {
    for narrower in graph.objects(node, Relation::NarrowerConcept) {
        if !visited.insert(narrower.clone()) {
            continue;
        }
        let narrower_id = resolve_thesaurus_node(ctx, graph, None, &narrower, &mut report.concepts_populated);
        if ctx.store.link(id, &narrower_id) {
            report.edges_added += 1;
            ctx.sink.record(&MergeEvent::Linked {
                parent: id.clone(),
                child: narrower_id.clone(),
            });
        }
        copy_narrower_concepts(ctx, graph, &narrower_id, &narrower, visited, report);
    }
}

pub(crate) fn preferred_concept<G: GraphQuery + ?Sized>(
    graph: &G,
    descriptor: &str,
    descriptor_label: &str,
) -> Result<String, MergeError> {
    graph
        .objects(descriptor, Relation::PreferredConcept)
        .into_iter()
        .next()
        .ok_or_else(|| MergeError::MissingPreferredConcept {
            descriptor: descriptor.to_string(),
            label: descriptor_label.to_string(),
        })
}

pub(crate) fn labeled_in<G: GraphQuery + ?Sized>(graph: &G, node: &str, language: &str) -> Option<String> {
    preferred_literal(graph, node, Relation::Label, language)
}

/// Resolve a thesaurus concept node (optionally reached through its
/// descriptor), populate it on first sight and attach its cross-references.
pub(crate) fn resolve_thesaurus_node<G: GraphQuery + ?Sized>(
    ctx: &mut MergeContext<'_>,
    graph: &G,
    descriptor: Option<&str>,
    concept: &str,
    populated: &mut usize,
) -> CanonicalId {
    let keys: Vec<&str> = descriptor.into_iter().chain(std::iter::once(concept)).collect();
    let (id, resolution) = ctx
        .store
        .resolve_id(ctx.crosswalk, SourceRef::Thesaurus { keys: &keys });

    let language = ctx.config.label_language.as_str();
    let alt_labels: Vec<String> = graph
        .objects(concept, Relation::Term)
        .iter()
        .flat_map(|term| literal_values(graph, term, Relation::Label, language))
        .collect();
    let fields = ConceptFields {
        label: preferred_literal(graph, concept, Relation::Label, language),
        definition: preferred_literal(graph, concept, Relation::ScopeNote, language),
        alt_labels,
    };
    if ctx.store.populate_once(&id, fields) {
        *populated += 1;
    }

    for key in &keys {
        ctx.store.add_cross_reference(&id, key);
        let cui = ctx
            .crosswalk
            .lookup_by_thesaurus_id(&local_name(key))
            .and_then(|record| record.metathesaurus_id.as_deref());
        if let Some(cui) = cui {
            let uri = ctx.config.metathesaurus_uri(cui);
            ctx.store.add_cross_reference(&id, &uri);
        }
    }

    if resolution != Resolution::Cached {
        let label = ctx
            .store
            .get(&id)
            .map(|c| c.display_label().to_string())
            .unwrap_or_default();
        ctx.sink.record(&MergeEvent::Resolved {
            kind: SourceKind::Thesaurus,
            source: concept.to_string(),
            concept: id.clone(),
            label,
            resolution,
        });
    }
    id
}

/// Tree numbers of a descriptor, read from tree-number nodes (their label, or
/// their local name) or from literal values.
pub(crate) fn tree_numbers<G: GraphQuery + ?Sized>(graph: &G, descriptor: &str) -> Vec<String> {
    let mut numbers: Vec<String> = graph
        .objects(descriptor, Relation::TreeNumber)
        .into_iter()
        .map(|node| {
            graph
                .literals(&node, Relation::Label)
                .into_iter()
                .next()
                .map(|l| l.lexical)
                .unwrap_or_else(|| local_name(&node))
        })
        .chain(
            graph
                .literals(descriptor, Relation::TreeNumber)
                .into_iter()
                .map(|l| l.lexical),
        )
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    numbers.sort();
    numbers.dedup();
    numbers
}
