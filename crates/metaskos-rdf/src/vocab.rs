//! Predicate and class IRIs understood by the loader and used by the writer.

use metaskos_core::{NodeClass, Relation};

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";
pub const MESHV: &str = "http://id.nlm.nih.gov/mesh/vocab#";
pub const OBO: &str = "http://purl.obolibrary.org/obo/";
pub const OBO_IN_OWL: &str = "http://www.geneontology.org/formats/oboInOwl#";

pub const RDF_TYPE_IRI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_SUBCLASS_OF_IRI: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
pub const OWL_RESTRICTION_IRI: &str = "http://www.w3.org/2002/07/owl#Restriction";
pub const OWL_ON_PROPERTY_IRI: &str = "http://www.w3.org/2002/07/owl#onProperty";
pub const OWL_SOME_VALUES_FROM_IRI: &str = "http://www.w3.org/2002/07/owl#someValuesFrom";

/// Relation carried by a predicate IRI, if the merge reads it.
pub fn relation_for_predicate(iri: &str) -> Option<Relation> {
    let relation = if let Some(local) = iri.strip_prefix(RDFS) {
        match local {
            "label" => Relation::Label,
            "subClassOf" => Relation::SubClassOf,
            _ => return None,
        }
    } else if let Some(local) = iri.strip_prefix(SKOS) {
        match local {
            "prefLabel" => Relation::Label,
            "altLabel" => Relation::AltLabel,
            "definition" => Relation::Definition,
            "exactMatch" => Relation::ExactMatch,
            "broader" => Relation::Broader,
            "narrower" => Relation::Narrower,
            "inScheme" => Relation::InScheme,
            "hasTopConcept" => Relation::HasTopConcept,
            _ => return None,
        }
    } else if let Some(local) = iri.strip_prefix(MESHV) {
        match local {
            "prefLabel" => Relation::Label,
            "preferredConcept" => Relation::PreferredConcept,
            "broaderDescriptor" | "broader" => Relation::BroaderDescriptor,
            "narrowerConcept" => Relation::NarrowerConcept,
            "broaderConcept" => Relation::BroaderConcept,
            "treeNumber" => Relation::TreeNumber,
            // `meshv:concept` (non-preferred concepts) is reached through
            // `narrowerConcept` instead.
            "preferredTerm" | "term" => Relation::Term,
            "scopeNote" => Relation::ScopeNote,
            _ => return None,
        }
    } else if iri == format!("{OBO}IAO_0000115") {
        Relation::Definition
    } else if iri == format!("{OBO_IN_OWL}hasExactSynonym") {
        Relation::ExactSynonym
    } else {
        return None;
    };
    Some(relation)
}

/// Relation a `someValuesFrom` restriction on `property` is folded into.
pub fn relation_for_restriction(property: &str) -> Option<Relation> {
    if property == format!("{OBO}RO_0002573") {
        Some(Relation::HasModifier)
    } else {
        None
    }
}

/// Node class named by an `rdf:type` object.
pub fn class_for_type(iri: &str) -> Option<NodeClass> {
    if iri == format!("{MESHV}TopicalDescriptor") {
        Some(NodeClass::TopicalDescriptor)
    } else if iri == format!("{OWL}Class") {
        Some(NodeClass::OwlClass)
    } else if iri == format!("{SKOS}Concept") {
        Some(NodeClass::SkosConcept)
    } else if iri == format!("{SKOS}ConceptScheme") {
        Some(NodeClass::SkosConceptScheme)
    } else {
        None
    }
}
