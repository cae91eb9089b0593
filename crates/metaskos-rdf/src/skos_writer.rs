//! SKOS Turtle rendering of a [`ConceptStore`].
//!
//! Output is deterministic: schemes then concepts, each in id order, and
//! every multi-valued property sorted. Node IRIs are written in full so the
//! file reads back through any Turtle parser without prefix resolution.

use crate::vocab::{OWL, RDFS, SKOS};
use metaskos_core::{CanonicalConcept, ConceptScheme, ConceptStore, MergeConfig};
use std::io::Write;

pub const ONTOLOGY_LABEL: &str = "META SKOS CONCEPT TAXONOMY";
pub const ONTOLOGY_COMMENT: &str = "This is a SKOS representation that captures both hierarchical \
and synonym information for concepts in the Meta Knowledge Graph.";
pub const ONTOLOGY_VERSION: &str = "0.0.1";

const SKOS_ONTOLOGY: &str = "http://www.w3.org/2004/02/skos/core";

/// Escape a string for a Turtle double-quoted literal.
fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

fn iri(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('<');
    for c in s.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                out.push_str(&format!("\\u{:04X}", c as u32))
            }
            c if c <= ' ' => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('>');
    out
}

fn literal(value: &str, language: &str) -> String {
    if language.is_empty() {
        format!("\"{}\"", escape_literal(value))
    } else {
        format!("\"{}\"@{language}", escape_literal(value))
    }
}

/// Render a subject block: `subject p1 o1 ;\n    p2 o2 .`
fn push_block(out: &mut String, subject: &str, properties: &[(String, String)]) {
    out.push_str(subject);
    for (i, (predicate, object)) in properties.iter().enumerate() {
        let sep = if i == 0 { " " } else { " ;\n    " };
        out.push_str(sep);
        out.push_str(predicate);
        out.push(' ');
        out.push_str(object);
    }
    out.push_str(" .\n\n");
}

fn header(config: &MergeConfig) -> String {
    let ns = &config.canonical_namespace;
    let mut out = String::new();
    out.push_str(&format!("@prefix : {} .\n", iri(ns)));
    out.push_str(&format!("@prefix metaskos: {} .\n", iri(ns)));
    out.push_str(&format!("@prefix owl: {} .\n", iri(OWL)));
    out.push_str(&format!("@prefix rdfs: {} .\n", iri(RDFS)));
    out.push_str(&format!("@prefix skos: {} .\n\n", iri(SKOS)));

    push_block(
        &mut out,
        &iri(ns),
        &[
            ("a".to_string(), "owl:Ontology".to_string()),
            ("owl:imports".to_string(), iri(SKOS_ONTOLOGY)),
            ("rdfs:label".to_string(), literal(ONTOLOGY_LABEL, "en")),
            ("rdfs:comment".to_string(), literal(ONTOLOGY_COMMENT, "en")),
            ("owl:versionInfo".to_string(), literal(ONTOLOGY_VERSION, "")),
        ],
    );
    out
}

fn scheme_block(out: &mut String, scheme: &ConceptScheme, config: &MergeConfig) {
    let mut props = vec![
        ("a".to_string(), "skos:ConceptScheme , owl:NamedIndividual".to_string()),
        ("rdfs:label".to_string(), literal(&scheme.label, &config.label_language)),
    ];
    for top in &scheme.top_concepts {
        props.push(("skos:hasTopConcept".to_string(), iri(&config.concept_iri(top))));
    }
    push_block(out, &iri(&config.scheme_iri(&scheme.id)), &props);
}

fn concept_block(out: &mut String, concept: &CanonicalConcept, config: &MergeConfig) {
    let language = config.label_language.as_str();
    let mut props = vec![("a".to_string(), "skos:Concept , owl:NamedIndividual".to_string())];
    if let Some(label) = &concept.label {
        props.push(("rdfs:label".to_string(), literal(label, language)));
    }
    if let Some(definition) = &concept.definition {
        props.push(("skos:definition".to_string(), literal(definition, language)));
    }
    for alt in &concept.alt_labels {
        props.push(("skos:altLabel".to_string(), literal(alt, language)));
    }
    for xref in &concept.cross_references {
        props.push(("skos:exactMatch".to_string(), iri(xref)));
    }
    for parent in &concept.broader {
        props.push(("skos:broader".to_string(), iri(&config.concept_iri(parent))));
    }
    for child in &concept.narrower {
        props.push(("skos:narrower".to_string(), iri(&config.concept_iri(child))));
    }
    for scheme in &concept.schemes {
        props.push(("skos:inScheme".to_string(), iri(&config.scheme_iri(scheme))));
    }
    push_block(out, &iri(&config.concept_iri(&concept.id)), &props);
}

pub fn render_skos_turtle(store: &ConceptStore, config: &MergeConfig) -> String {
    let mut out = header(config);
    for scheme in store.schemes() {
        scheme_block(&mut out, scheme, config);
    }
    for concept in store.concepts() {
        concept_block(&mut out, concept, config);
    }
    out
}

pub fn write_skos_turtle<W: Write + ?Sized>(
    store: &ConceptStore,
    config: &MergeConfig,
    writer: &mut W,
) -> std::io::Result<()> {
    writer.write_all(render_skos_turtle(store, config).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaskos_core::{CanonicalId, ConceptFields};

    #[test]
    fn escapes_literals_and_iris() {
        assert_eq!(escape_literal("a \"b\"\n\\"), "a \\\"b\\\"\\n\\\\");
        assert_eq!(iri("http://x/a b"), "<http://x/a\\u0020b>");
    }

    #[test]
    fn renders_header_schemes_and_concepts() {
        let config = MergeConfig::default();
        let mut store = ConceptStore::new();
        let id = CanonicalId::concept(100);
        store.populate_once(
            &id,
            ConceptFields::labeled("Asthma").with_definition(Some("Airway \"disease\"".into())),
        );
        store.ensure_scheme("scheme_C", "Diseases");
        store.add_to_scheme(&id, "scheme_C");
        store.set_top_concept("scheme_C", &id);

        let text = render_skos_turtle(&store, &config);
        assert!(text.contains("owl:versionInfo \"0.0.1\""));
        assert!(text.contains("<http://meta.org/skos#scheme_C> a skos:ConceptScheme"));
        assert!(text.contains("skos:hasTopConcept <http://meta.org/skos#concept_100>"));
        assert!(text.contains("rdfs:label \"Asthma\"@en"));
        assert!(text.contains("skos:definition \"Airway \\\"disease\\\"\"@en"));
        assert!(text.contains("skos:inScheme <http://meta.org/skos#scheme_C>"));
        assert!(text.find("scheme_C> a").unwrap() < text.find("concept_100> a").unwrap());
    }

    #[test]
    fn unlabeled_concepts_carry_no_label() {
        let config = MergeConfig::default();
        let mut store = ConceptStore::new();
        store.get_or_create(&CanonicalId::concept(7));
        let text = render_skos_turtle(&store, &config);
        assert!(text.contains("<http://meta.org/skos#concept_7> a skos:Concept , owl:NamedIndividual ."));
    }
}
