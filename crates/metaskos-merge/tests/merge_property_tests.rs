use metaskos_core::crosswalk::{CrosswalkBatch, CrosswalkRecord};
use metaskos_core::{
    verify_invariants, AnchorStrategy, ConceptStore, CrosswalkTable, GraphQuery, Literal,
    MemoryGraph, MemorySink, MergeConfig, NodeClass, Relation,
};
use metaskos_merge::{build_thesaurus, merge_ontology, MergeContext};
use proptest::prelude::*;

const MAX_CLASSES: usize = 12;

fn class_iri(i: usize) -> String {
    if i == 0 {
        "http://purl.obolibrary.org/obo/MONDO_0000001".to_string()
    } else {
        format!("http://purl.obolibrary.org/obo/MONDO_{i:07}")
    }
}

/// Class `i > 0` is a subclass of one to three classes in `0..i`, so every
/// class sits under the root and the hierarchy is acyclic.
fn ontology_strategy() -> impl Strategy<Value = MemoryGraph> {
    (2usize..=MAX_CLASSES)
        .prop_flat_map(|n| {
            let parents = (1..n)
                .map(|i| prop::collection::btree_set(0..i, 1..=3.min(i)))
                .collect::<Vec<_>>();
            let xrefs = prop::collection::vec(prop::option::of(prop::bool::ANY), n);
            (parents, xrefs)
        })
        .prop_map(|(parents, xrefs)| {
            let mut g = MemoryGraph::new();
            for (i, xref) in xrefs.iter().enumerate() {
                let iri = class_iri(i);
                g.add_type(&iri, NodeClass::OwlClass)
                    .add_literal(&iri, Relation::Label, Literal::plain(format!("class {i}")));
                // Some(true): resolvable descriptor, Some(false): unknown descriptor.
                match xref {
                    Some(true) if i > 0 => {
                        g.add_iri(&iri, Relation::ExactMatch, "http://identifiers.org/mesh/D1");
                    }
                    Some(false) => {
                        g.add_iri(&iri, Relation::ExactMatch, "http://identifiers.org/mesh/D999");
                    }
                    _ => {}
                }
            }
            for (offset, ps) in parents.into_iter().enumerate() {
                let child = class_iri(offset + 1);
                for p in ps {
                    g.add_iri(&child, Relation::SubClassOf, &class_iri(p));
                }
            }
            g
        })
}

fn thesaurus() -> MemoryGraph {
    let mut g = MemoryGraph::new();
    let d = "http://id.nlm.nih.gov/mesh/2020/D1";
    let m = "http://id.nlm.nih.gov/mesh/2020/M1";
    g.add_type(d, NodeClass::TopicalDescriptor)
        .add_literal(d, Relation::Label, Literal::tagged("Asthma", "en"))
        .add_iri(d, Relation::PreferredConcept, m)
        .add_literal(m, Relation::Label, Literal::tagged("Asthma", "en"));
    g
}

fn merged(ontology: &MemoryGraph, strategy: AnchorStrategy) -> (ConceptStore, usize) {
    let crosswalk = CrosswalkTable::from_batches([(
        CrosswalkBatch::All,
        vec![CrosswalkRecord::new(Some("100"), Some("D1"), None)],
    )]);
    let config = MergeConfig::default();
    let mut store = ConceptStore::new();
    let mut sink = MemorySink::default();
    let mut ctx = MergeContext::new(&mut store, &crosswalk, &config, &mut sink);
    build_thesaurus(&mut ctx, &thesaurus()).unwrap();
    merge_ontology(&mut ctx, ontology, strategy).unwrap();
    let again = merge_ontology(&mut ctx, ontology, strategy).unwrap();
    (store, again.edges_added)
}

/// Direct `child ⊑ parent` edges missing from the store. The upward edges
/// of an anchor with subclasses of its own come from the thesaurus, and two
/// classes sharing a concept need no edge.
fn missing_subclass_edges(ontology: &MemoryGraph, store: &ConceptStore) -> Vec<(String, String)> {
    let is_anchor = |class: &str| {
        ontology
            .objects(class, Relation::ExactMatch)
            .iter()
            .any(|x| x.ends_with("/D1"))
    };
    let mut missing = Vec::new();
    for child in ontology.instances_of(NodeClass::OwlClass) {
        if is_anchor(&child) && !ontology.subjects(Relation::SubClassOf, &child).is_empty() {
            continue;
        }
        for parent in ontology.objects(&child, Relation::SubClassOf) {
            let (Some(p), Some(c)) = (store.lookup(&parent), store.lookup(&child)) else {
                missing.push((parent.clone(), child.clone()));
                continue;
            };
            if p != c && !store.has_edge(p, c) {
                missing.push((parent.clone(), child.clone()));
            }
        }
    }
    missing
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn depth_first_merge_is_structurally_sound_and_idempotent(ontology in ontology_strategy()) {
        let (store, edges_on_rerun) = merged(&ontology, AnchorStrategy::DepthFirst);
        prop_assert!(verify_invariants(&store).iter().all(|v| !v.is_structural()));
        for class in ontology.instances_of(NodeClass::OwlClass) {
            prop_assert!(store.lookup(&class).is_some(), "class {} was never resolved", class);
        }
        prop_assert_eq!(missing_subclass_edges(&ontology, &store), Vec::<(String, String)>::new());
        prop_assert_eq!(edges_on_rerun, 0);
    }

    #[test]
    fn path_tracing_merge_is_structurally_sound(ontology in ontology_strategy()) {
        let (store, _) = merged(&ontology, AnchorStrategy::PathTracing);
        prop_assert!(verify_invariants(&store).iter().all(|v| !v.is_structural()));
        for class in ontology.instances_of(NodeClass::OwlClass) {
            prop_assert!(store.lookup(&class).is_some(), "class {} was never resolved", class);
        }
        prop_assert_eq!(missing_subclass_edges(&ontology, &store), Vec::<(String, String)>::new());
    }
}
