//! Narrow, typed graph-query interface.
//!
//! The merge passes never see a generic RDF API. They ask a [`GraphQuery`]
//! for direct edges of a named [`Relation`], literal properties, reverse
//! edges and class instances; everything else (transitive closures, language
//! selection) is built on top of those four calls.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

// ============================================================================
// Vocabulary
// ============================================================================

/// The relations the merge engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    /// `rdfs:label` / `skos:prefLabel`.
    Label,
    /// Descriptor -> its preferred concept.
    PreferredConcept,
    /// Descriptor -> broader descriptor.
    BroaderDescriptor,
    /// Concept -> narrower concept (pre-descriptor hierarchy).
    NarrowerConcept,
    /// Concept -> broader concept (pre-descriptor hierarchy).
    BroaderConcept,
    TreeNumber,
    /// Concept -> term node.
    Term,
    ScopeNote,
    SubClassOf,
    ExactMatch,
    Definition,
    ExactSynonym,
    AltLabel,
    Broader,
    Narrower,
    InScheme,
    HasTopConcept,
    /// Class -> filler of a `has modifier` existential restriction on one of
    /// its superclass axioms.
    HasModifier,
}

/// Node types the merge engine enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeClass {
    TopicalDescriptor,
    OwlClass,
    SkosConcept,
    SkosConceptScheme,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub lexical: String,
    pub language: Option<String>,
}

impl Literal {
    pub fn plain(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            language: None,
        }
    }

    pub fn tagged(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            language: Some(language.into()),
        }
    }

    /// `en` matches `en`, `EN` and `en-US`.
    pub fn has_language(&self, language: &str) -> bool {
        match &self.language {
            None => false,
            Some(tag) => {
                let tag = tag.to_ascii_lowercase();
                let wanted = language.to_ascii_lowercase();
                tag == wanted || tag.starts_with(&format!("{wanted}-"))
            }
        }
    }

    /// Tagged with `language`, or untagged.
    pub fn is_usable_in(&self, language: &str) -> bool {
        self.language.is_none() || self.has_language(language)
    }
}

/// Local name of an IRI (the part after the last `#` or `/`).
pub fn local_name(iri: &str) -> String {
    iri.rsplit(['#', '/'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(iri)
        .to_string()
}

// ============================================================================
// Query trait
// ============================================================================

/// Read-only access to a source graph. Results are sorted and deduplicated.
pub trait GraphQuery {
    /// Direct `node --relation--> ?` IRI objects.
    fn objects(&self, node: &str, relation: Relation) -> Vec<String>;

    /// Direct `node --relation--> "literal"` values.
    fn literals(&self, node: &str, relation: Relation) -> Vec<Literal>;

    /// Direct `? --relation--> object` subjects.
    fn subjects(&self, relation: Relation, object: &str) -> Vec<String>;

    /// All nodes typed as `class`.
    fn instances_of(&self, class: NodeClass) -> Vec<String>;
}

/// The label in `language`, falling back to an untagged one.
pub fn preferred_literal<G: GraphQuery + ?Sized>(
    graph: &G,
    node: &str,
    relation: Relation,
    language: &str,
) -> Option<String> {
    let literals = graph.literals(node, relation);
    literals
        .iter()
        .find(|l| l.has_language(language))
        .or_else(|| literals.iter().find(|l| l.language.is_none()))
        .map(|l| l.lexical.clone())
}

/// Every value of `relation` usable in `language`, deduplicated.
pub fn literal_values<G: GraphQuery + ?Sized>(
    graph: &G,
    node: &str,
    relation: Relation,
    language: &str,
) -> Vec<String> {
    let values: BTreeSet<String> = graph
        .literals(node, relation)
        .into_iter()
        .filter(|l| l.is_usable_in(language))
        .map(|l| l.lexical)
        .collect();
    values.into_iter().collect()
}

/// Reflexive-transitive closure following `relation` forwards.
pub fn reachable_objects<G: GraphQuery + ?Sized>(
    graph: &G,
    start: &str,
    relation: Relation,
) -> BTreeSet<String> {
    closure(start, |node| graph.objects(node, relation))
}

/// Reflexive-transitive closure following `relation` backwards.
pub fn reachable_subjects<G: GraphQuery + ?Sized>(
    graph: &G,
    start: &str,
    relation: Relation,
) -> BTreeSet<String> {
    closure(start, |node| graph.subjects(relation, node))
}

fn closure(start: &str, mut step: impl FnMut(&str) -> Vec<String>) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::new();
    seen.insert(start.to_string());
    queue.push_back(start.to_string());
    while let Some(node) = queue.pop_front() {
        for next in step(&node) {
            if seen.insert(next.clone()) {
                queue.push_back(next);
            }
        }
    }
    seen
}

// ============================================================================
// In-memory implementation
// ============================================================================

/// Indexed in-memory graph; the RDF loader produces one of these.
#[derive(Debug, Default, Clone)]
pub struct MemoryGraph {
    forward: BTreeMap<String, BTreeMap<Relation, BTreeSet<String>>>,
    backward: BTreeMap<String, BTreeMap<Relation, BTreeSet<String>>>,
    literals: BTreeMap<String, BTreeMap<Relation, BTreeSet<Literal>>>,
    types: BTreeMap<NodeClass, BTreeSet<String>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_iri(&mut self, subject: &str, relation: Relation, object: &str) -> &mut Self {
        self.forward
            .entry(subject.to_string())
            .or_default()
            .entry(relation)
            .or_default()
            .insert(object.to_string());
        self.backward
            .entry(object.to_string())
            .or_default()
            .entry(relation)
            .or_default()
            .insert(subject.to_string());
        self
    }

    pub fn add_literal(&mut self, subject: &str, relation: Relation, literal: Literal) -> &mut Self {
        self.literals
            .entry(subject.to_string())
            .or_default()
            .entry(relation)
            .or_default()
            .insert(literal);
        self
    }

    pub fn add_type(&mut self, node: &str, class: NodeClass) -> &mut Self {
        self.types.entry(class).or_default().insert(node.to_string());
        self
    }

    /// Number of stored edges, literal values and type assertions.
    pub fn len(&self) -> usize {
        let edges: usize = self
            .forward
            .values()
            .flat_map(|m| m.values())
            .map(|s| s.len())
            .sum();
        let literals: usize = self
            .literals
            .values()
            .flat_map(|m| m.values())
            .map(|s| s.len())
            .sum();
        let types: usize = self.types.values().map(|s| s.len()).sum();
        edges + literals + types
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GraphQuery for MemoryGraph {
    fn objects(&self, node: &str, relation: Relation) -> Vec<String> {
        self.forward
            .get(node)
            .and_then(|m| m.get(&relation))
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn literals(&self, node: &str, relation: Relation) -> Vec<Literal> {
        self.literals
            .get(node)
            .and_then(|m| m.get(&relation))
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn subjects(&self, relation: Relation, object: &str) -> Vec<String> {
        self.backward
            .get(object)
            .and_then(|m| m.get(&relation))
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn instances_of(&self, class: NodeClass) -> Vec<String> {
        self.types
            .get(&class)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }
}
