//! Load RDF into a [`MemoryGraph`], keeping only what the merge reads.

use crate::parse::{for_each_statement, RdfFormat, RdfNode, RdfObject};
use crate::vocab::{
    class_for_type, relation_for_predicate, relation_for_restriction, OWL_ON_PROPERTY_IRI,
    OWL_RESTRICTION_IRI, OWL_SOME_VALUES_FROM_IRI, RDFS_SUBCLASS_OF_IRI, RDF_TYPE_IRI,
};
use anyhow::{Context, Result};
use metaskos_core::{Literal, MemoryGraph};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub statements: usize,
    pub kept: usize,
    /// Statements with a blank-node subject or object (OWL restrictions,
    /// axiom annotations).
    pub blank_nodes: usize,
    /// Predicates and types the merge never reads.
    pub ignored: usize,
    /// `C ⊑ ∃P.V` axioms folded into a direct `C -> V` edge.
    pub restrictions: usize,
}

/// Parts of anonymous `owl:Restriction` nodes seen while streaming. Blank
/// node labels are only unique within one document, so this never outlives
/// a single load.
#[derive(Default)]
struct Restrictions {
    typed: HashSet<String>,
    on_property: HashMap<String, String>,
    some_values_from: HashMap<String, String>,
    /// `(class, restriction node)` from `class rdfs:subClassOf _:node`.
    superclass_axioms: Vec<(String, String)>,
}

impl Restrictions {
    fn observe_blank_subject(&mut self, node: String, predicate: &str, object: &RdfObject) {
        let RdfObject::Node(RdfNode::Iri(object)) = object else {
            return;
        };
        match predicate {
            RDF_TYPE_IRI if object == OWL_RESTRICTION_IRI => {
                self.typed.insert(node);
            }
            OWL_ON_PROPERTY_IRI => {
                self.on_property.insert(node, object.clone());
            }
            OWL_SOME_VALUES_FROM_IRI => {
                self.some_values_from.insert(node, object.clone());
            }
            _ => {}
        }
    }

    /// Add one edge per complete restriction whose property the merge reads.
    fn fold_into(self, graph: &mut MemoryGraph) -> usize {
        let mut folded = 0;
        for (class, node) in &self.superclass_axioms {
            if !self.typed.contains(node) {
                continue;
            }
            let relation = self
                .on_property
                .get(node)
                .and_then(|p| relation_for_restriction(p));
            if let (Some(relation), Some(filler)) = (relation, self.some_values_from.get(node)) {
                graph.add_iri(class, relation, filler);
                folded += 1;
            }
        }
        folded
    }
}

pub fn load_graph<R: BufRead>(reader: R, format: RdfFormat) -> Result<(MemoryGraph, LoadStats)> {
    let mut graph = MemoryGraph::new();
    let mut stats = LoadStats::default();
    let mut restrictions = Restrictions::default();

    for_each_statement(reader, format, |statement| {
        stats.statements += 1;
        let subject = match statement.subject {
            RdfNode::Iri(subject) => subject,
            RdfNode::BlankNode(node) => {
                stats.blank_nodes += 1;
                restrictions.observe_blank_subject(node, &statement.predicate_iri, &statement.object);
                return Ok(());
            }
        };

        match statement.object {
            RdfObject::Node(RdfNode::BlankNode(node)) => {
                stats.blank_nodes += 1;
                if statement.predicate_iri == RDFS_SUBCLASS_OF_IRI {
                    restrictions.superclass_axioms.push((subject, node));
                }
            }
            RdfObject::Node(RdfNode::Iri(object)) => {
                if statement.predicate_iri == RDF_TYPE_IRI {
                    match class_for_type(&object) {
                        Some(class) => {
                            graph.add_type(&subject, class);
                            stats.kept += 1;
                        }
                        None => stats.ignored += 1,
                    }
                } else if let Some(relation) = relation_for_predicate(&statement.predicate_iri) {
                    graph.add_iri(&subject, relation, &object);
                    stats.kept += 1;
                } else {
                    stats.ignored += 1;
                }
            }
            RdfObject::Literal(literal) => match relation_for_predicate(&statement.predicate_iri) {
                Some(relation) => {
                    let value = match literal.language {
                        Some(language) => Literal::tagged(literal.lexical, language),
                        None => Literal::plain(literal.lexical),
                    };
                    graph.add_literal(&subject, relation, value);
                    stats.kept += 1;
                }
                None => stats.ignored += 1,
            },
        }
        Ok(())
    })?;

    stats.restrictions = restrictions.fold_into(&mut graph);
    Ok((graph, stats))
}

pub fn load_graph_bytes(bytes: &[u8], format: RdfFormat) -> Result<(MemoryGraph, LoadStats)> {
    load_graph(bytes, format)
}

/// Load a file, inferring the format from its extension.
pub fn load_graph_file(path: &Path) -> Result<(MemoryGraph, LoadStats)> {
    let format = RdfFormat::for_path(path)?;
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let (graph, stats) = load_graph(BufReader::new(file), format)
        .with_context(|| format!("failed to load {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        format = format.as_str(),
        statements = stats.statements,
        kept = stats.kept,
        blank_nodes = stats.blank_nodes,
        restrictions = stats.restrictions,
        "loaded graph"
    );
    Ok((graph, stats))
}
