//! Ontology anchor-merge engine.
//!
//! Grafts the disease ontology's class DAG onto the thesaurus-derived tree.
//! An *anchor* is an ontology class whose thesaurus cross-reference is
//! already resolved; its canonical concept is the thesaurus one. Two
//! strategies are available (see [`AnchorStrategy`]); both finish with a
//! sweep that gives every class under the root a canonical concept and
//! links whatever subclass edges the strategy left out.

mod depth_first;
mod path_tracing;

use crate::error::MergeError;
use crate::MergeContext;
use metaskos_core::query::{literal_values, preferred_literal, reachable_subjects};
use metaskos_core::{
    AnchorStrategy, CanonicalId, ConceptFields, GraphQuery, MergeEvent, NodeClass, Relation,
    SourceKind, SourceRef,
};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OntologyReport {
    pub strategy: &'static str,
    pub leaves: usize,
    pub classes_resolved: usize,
    pub concepts_populated: usize,
    pub edges_added: usize,
    pub unlabeled: usize,
    pub skipped_groups: usize,
    /// Classes only reached by the final sweep.
    pub swept: usize,
}

pub fn merge_ontology<G: GraphQuery + ?Sized>(
    ctx: &mut MergeContext<'_>,
    graph: &G,
    strategy: AnchorStrategy,
) -> Result<OntologyReport, MergeError> {
    let mut merger = OntologyMerger::new(graph, &ctx.config.ontology_root);
    merger.report.strategy = strategy.as_str();
    let leaves = merger.leaves(ctx);
    merger.report.leaves = leaves.len();
    tracing::info!(
        strategy = strategy.as_str(),
        classes = merger.under_root.len(),
        leaves = leaves.len(),
        "merging ontology"
    );

    match strategy {
        AnchorStrategy::DepthFirst => depth_first::run(ctx, &mut merger, &leaves),
        AnchorStrategy::PathTracing => path_tracing::run(ctx, &mut merger, &leaves),
    }
    merger.sweep(ctx);

    let report = merger.report;
    tracing::info!(
        resolved = report.classes_resolved,
        populated = report.concepts_populated,
        edges = report.edges_added,
        unlabeled = report.unlabeled,
        skipped_groups = report.skipped_groups,
        swept = report.swept,
        "ontology merged"
    );
    Ok(report)
}

/// Shared state of one ontology merge.
pub(crate) struct OntologyMerger<'g, G: ?Sized> {
    pub(crate) graph: &'g G,
    pub(crate) root: String,
    /// Descendants-or-self of the root.
    pub(crate) under_root: BTreeSet<String>,
    resolved: HashMap<String, CanonicalId>,
    pub(crate) report: OntologyReport,
}

impl<'g, G: GraphQuery + ?Sized> OntologyMerger<'g, G> {
    fn new(graph: &'g G, root: &str) -> Self {
        Self {
            graph,
            root: root.to_string(),
            under_root: reachable_subjects(graph, root, Relation::SubClassOf),
            resolved: HashMap::new(),
            report: OntologyReport::default(),
        }
    }

    /// Labeled classes under the root with no subclass.
    fn leaves(&self, ctx: &MergeContext<'_>) -> Vec<String> {
        let language = ctx.config.label_language.as_str();
        self.graph
            .instances_of(NodeClass::OwlClass)
            .into_iter()
            .filter(|c| self.under_root.contains(c))
            .filter(|c| self.graph.subjects(Relation::SubClassOf, c).is_empty())
            .filter(|c| preferred_literal(self.graph, c, Relation::Label, language).is_some())
            .collect()
    }

    /// Direct superclasses that stay inside the root's subtree.
    pub(crate) fn parents(&self, class: &str) -> Vec<String> {
        self.graph
            .objects(class, Relation::SubClassOf)
            .into_iter()
            .filter(|p| self.under_root.contains(p))
            .collect()
    }

    /// The thesaurus URI this class cross-references, if any.
    pub(crate) fn thesaurus_xref(&self, ctx: &MergeContext<'_>, class: &str) -> Option<String> {
        self.graph
            .objects(class, Relation::ExactMatch)
            .iter()
            .find_map(|x| ctx.config.thesaurus_uri_for_xref(x))
    }

    /// True when the class's thesaurus cross-reference is already resolved.
    pub(crate) fn is_anchor(&self, ctx: &MergeContext<'_>, class: &str) -> bool {
        self.thesaurus_xref(ctx, class)
            .is_some_and(|x| ctx.store.is_resolved(&x))
    }

    /// Whether the class would resolve to an already-labeled canonical
    /// concept, without allocating anything.
    pub(crate) fn is_populated(&self, ctx: &MergeContext<'_>, class: &str) -> bool {
        let existing = ctx.store.lookup(class).cloned().or_else(|| {
            self.thesaurus_xref(ctx, class)
                .and_then(|x| ctx.store.lookup(&x).cloned())
        });
        existing.is_some_and(|id| ctx.store.is_labeled(&id))
    }

    /// Resolve an ontology class, populating its concept on first sight.
    pub(crate) fn resolve(&mut self, ctx: &mut MergeContext<'_>, class: &str) -> CanonicalId {
        if let Some(id) = self.resolved.get(class) {
            return id.clone();
        }

        let xref = self.thesaurus_xref(ctx, class);
        let (id, resolution) = ctx.store.resolve_id(
            ctx.crosswalk,
            SourceRef::Ontology {
                uri: class,
                thesaurus_xref: xref.as_deref(),
            },
        );

        let language = ctx.config.label_language.as_str();
        let label = preferred_literal(self.graph, class, Relation::Label, language);
        let fields = ConceptFields {
            label: label.clone(),
            definition: preferred_literal(self.graph, class, Relation::Definition, language),
            alt_labels: literal_values(self.graph, class, Relation::ExactSynonym, language),
        };
        if ctx.store.populate_once(&id, fields) {
            self.report.concepts_populated += 1;
        }
        if label.is_none() {
            self.report.unlabeled += 1;
            tracing::warn!(class, concept = %id, "ontology class has no label");
            ctx.sink.record(&MergeEvent::UnlabeledClass {
                source: class.to_string(),
                concept: id.clone(),
            });
        }

        ctx.store.add_cross_reference(&id, class);
        if ctx.config.import_ontology_equivalences {
            for equivalent in self.graph.objects(class, Relation::ExactMatch) {
                if ctx.config.thesaurus_uri_for_xref(&equivalent).is_none() {
                    ctx.store.add_cross_reference(&id, &equivalent);
                }
            }
        }

        let display = ctx
            .store
            .get(&id)
            .map(|c| c.display_label().to_string())
            .unwrap_or_default();
        ctx.sink.record(&MergeEvent::Resolved {
            kind: SourceKind::Ontology,
            source: class.to_string(),
            concept: id.clone(),
            label: display,
            resolution,
        });

        self.report.classes_resolved += 1;
        self.resolved.insert(class.to_string(), id.clone());
        id
    }

    pub(crate) fn link(&mut self, ctx: &mut MergeContext<'_>, parent: &CanonicalId, child: &CanonicalId) {
        if ctx.store.link(parent, child) {
            self.report.edges_added += 1;
            ctx.sink.record(&MergeEvent::Linked {
                parent: parent.clone(),
                child: child.clone(),
            });
        }
    }

    pub(crate) fn has_resolved(&self, class: &str) -> bool {
        self.resolved.contains_key(class)
    }

    /// True for an anchor that has subclasses of its own: its upward edges
    /// come from the thesaurus, not the ontology.
    pub(crate) fn is_inner_anchor(&self, ctx: &MergeContext<'_>, class: &str) -> bool {
        self.is_anchor(ctx, class) && !self.graph.subjects(Relation::SubClassOf, class).is_empty()
    }

    /// Give every remaining OWL class under the root a canonical concept,
    /// then link every direct subclass edge between resolved classes whose
    /// child is not an inner anchor.
    fn sweep(&mut self, ctx: &mut MergeContext<'_>) {
        let pending: Vec<String> = self
            .graph
            .instances_of(NodeClass::OwlClass)
            .into_iter()
            .filter(|c| self.under_root.contains(c) && !self.has_resolved(c))
            .collect();
        for class in pending {
            self.resolve(ctx, &class);
            self.report.swept += 1;
        }

        let children: Vec<String> = self
            .under_root
            .iter()
            .filter(|c| self.has_resolved(c))
            .cloned()
            .collect();
        for class in children {
            if class == self.root || self.is_inner_anchor(ctx, &class) {
                continue;
            }
            let Some(id) = self.resolved.get(&class).cloned() else {
                continue;
            };
            for parent in self.parents(&class) {
                match self.resolved.get(&parent).cloned() {
                    // Two classes cross-referencing one descriptor share a concept.
                    Some(parent_id) if parent_id != id => self.link(ctx, &parent_id, &id),
                    _ => {}
                }
            }
        }
    }
}
