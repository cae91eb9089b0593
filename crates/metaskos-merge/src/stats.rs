//! Cross-reference coverage of the ontology below its root.

use metaskos_core::query::{preferred_literal, reachable_subjects};
use metaskos_core::{GraphQuery, MergeConfig, NodeClass, Relation};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct XrefStats {
    /// Labeled OWL classes strictly below the root.
    pub labeled_classes: usize,
    /// `(vocabulary, classes with at least one matching cross-reference)`.
    pub per_vocabulary: Vec<(String, usize)>,
}

pub fn xref_stats<G: GraphQuery + ?Sized>(
    graph: &G,
    config: &MergeConfig,
    vocabularies: &[String],
) -> XrefStats {
    let language = config.label_language.as_str();
    let under_root = reachable_subjects(graph, &config.ontology_root, Relation::SubClassOf);

    let classes: Vec<String> = graph
        .instances_of(NodeClass::OwlClass)
        .into_iter()
        .filter(|c| *c != config.ontology_root && under_root.contains(c))
        .filter(|c| preferred_literal(graph, c, Relation::Label, language).is_some())
        .collect();

    let per_vocabulary = vocabularies
        .iter()
        .map(|vocabulary| {
            let count = classes
                .iter()
                .filter(|c| {
                    graph
                        .objects(c, Relation::ExactMatch)
                        .iter()
                        .any(|x| x.contains(vocabulary.as_str()))
                })
                .count();
            (vocabulary.clone(), count)
        })
        .collect();

    XrefStats {
        labeled_classes: classes.len(),
        per_vocabulary,
    }
}
