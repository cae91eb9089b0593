//! Integration tests for the complete merge pipeline
//!
//! These tests run the fixtures in `fixtures/` across crates:
//! - RDF loading → crosswalk → thesaurus/scheme/ontology passes
//! - SKOS Turtle output → reload → invariant check
//! - resuming a written taxonomy and merging more sources into it
//!
//! Run with: cargo test --test integration_tests

use metaskos_core::{
    verify_invariants, AnchorStrategy, CanonicalConcept, CanonicalId, ConceptStore,
    CrosswalkTable, GraphQuery, MemoryGraph, MemorySink, MergeConfig, MergeEvent,
};
use metaskos_merge::{resume_from_snapshot, MergeReport, Pipeline, PipelineSources};
use metaskos_rdf::{load_graph_file, load_snapshot, write_taxonomy, OutputFormat};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}

struct Fixtures {
    config: MergeConfig,
    crosswalk: CrosswalkTable,
    thesaurus: MemoryGraph,
    ontology: MemoryGraph,
}

fn fixtures(strategy: AnchorStrategy) -> Fixtures {
    let config = MergeConfig {
        anchor_strategy: strategy,
        ..MergeConfig::default()
    };
    let crosswalk = CrosswalkTable::load_dir(&fixture("crosswalk"), &config.crosswalk_files)
        .expect("load crosswalk");
    let (thesaurus, _) = load_graph_file(&fixture("mesh_mini.ttl")).expect("load thesaurus");
    let (ontology, _) = load_graph_file(&fixture("mondo_mini.ttl")).expect("load ontology");
    Fixtures {
        config,
        crosswalk,
        thesaurus,
        ontology,
    }
}

fn run(
    f: &Fixtures,
    store: ConceptStore,
    thesaurus: bool,
    ontology: bool,
) -> (ConceptStore, MergeReport, MemorySink) {
    let sources = PipelineSources {
        thesaurus: thesaurus.then_some(&f.thesaurus as &dyn GraphQuery),
        ontology: ontology.then_some(&f.ontology as &dyn GraphQuery),
    };
    let mut sink = MemorySink::default();
    let (store, report) = Pipeline::new(&f.config, &f.crosswalk)
        .run(store, sources, &mut sink)
        .expect("merge");
    (store, report, sink)
}

fn by_label<'a>(store: &'a ConceptStore, label: &str) -> &'a CanonicalConcept {
    store
        .concepts()
        .find(|c| c.label.as_deref() == Some(label))
        .unwrap_or_else(|| panic!("no concept labeled {label:?}"))
}

fn label_of(store: &ConceptStore, id: &CanonicalId) -> String {
    store
        .get(id)
        .and_then(|c| c.label.clone())
        .unwrap_or_else(|| id.to_string())
}

/// `(label, sorted broader labels)` for every concept: the taxonomy shape
/// independent of which ids were allocated.
fn shape(store: &ConceptStore) -> BTreeSet<(String, Vec<String>)> {
    store
        .concepts()
        .map(|c| {
            let mut broader: Vec<String> = c.broader.iter().map(|b| label_of(store, b)).collect();
            broader.sort();
            (c.display_label().to_string(), broader)
        })
        .collect()
}

// ============================================================================
// Full build
// ============================================================================

#[test]
fn test_full_build_grafts_ontology_under_thesaurus() {
    for strategy in [AnchorStrategy::DepthFirst, AnchorStrategy::PathTracing] {
        let f = fixtures(strategy);
        let (store, report, _) = run(&f, ConceptStore::new(), true, true);

        let respiratory = by_label(&store, "Respiratory Tract Diseases");
        let asthma = by_label(&store, "Asthma");
        assert_eq!(respiratory.id, CanonicalId::concept(102));
        assert_eq!(asthma.id, CanonicalId::concept(100));
        assert_eq!(by_label(&store, "Bronchitis").id, CanonicalId::concept(101));
        assert!(asthma.broader.contains(&respiratory.id));

        // Descriptor and concept keys, the CUI, the ontology class and its
        // non-thesaurus equivalences all point at concept_100.
        for xref in [
            "http://id.nlm.nih.gov/mesh/2020/D001249",
            "http://id.nlm.nih.gov/mesh/2020/M0001861",
            "http://linkedlifedata.com/resource/umls/id/C0004096",
            "http://purl.obolibrary.org/obo/MONDO_0004979",
            "http://purl.obolibrary.org/obo/DOID_2841",
        ] {
            assert!(asthma.cross_references.contains(xref), "{strategy:?}: missing {xref}");
        }
        assert!(asthma.alt_labels.contains("Asthma, Bronchial"));

        // The thesaurus label wins over the ontology's lower-case one.
        assert!(store.concepts().all(|c| c.label.as_deref() != Some("asthma")));

        let atopic = by_label(&store, "atopic asthma");
        let allergic = by_label(&store, "allergic asthma");
        let intrinsic = by_label(&store, "intrinsic asthma");
        assert!(atopic.broader.contains(&asthma.id), "{strategy:?}");
        assert!(allergic.broader.contains(&atopic.id), "{strategy:?}");
        assert!(intrinsic.broader.contains(&asthma.id), "{strategy:?}");
        assert!(allergic.alt_labels.contains("allergic asthma disease"));

        // Classes outside the root never become concepts.
        assert!(store.concepts().all(|c| c.label.as_deref() != Some("rare")));

        assert!(verify_invariants(&store).is_empty(), "{strategy:?}");
        assert_eq!(report.concepts, store.len());
        assert_eq!(report.ontology.as_ref().map(|o| o.leaves), Some(2));
    }
}

#[test]
fn test_schemes_follow_tree_numbers() {
    let f = fixtures(AnchorStrategy::DepthFirst);
    let (store, report, _) = run(&f, ConceptStore::new(), true, false);

    let scheme = store.scheme("scheme_102").expect("tree scheme for C08");
    assert_eq!(scheme.label, "Respiratory Tract Diseases");
    assert!(scheme.top_concepts.contains(&CanonicalId::concept(102)));

    let respiratory = store.get(&CanonicalId::concept(102)).unwrap();
    assert!(respiratory.schemes.contains("scheme_C"));
    for id in [100, 101] {
        let concept = store.get(&CanonicalId::concept(id)).unwrap();
        assert!(concept.schemes.contains("scheme_102"), "concept_{id}");
    }
    // The narrower concept of Asthma joins its descriptor's scheme.
    assert!(by_label(&store, "Asthma, Exercise-Induced")
        .schemes
        .contains("scheme_102"));

    let schemes = report.schemes.expect("scheme report");
    assert_eq!(schemes.category_schemes, 16);
    assert_eq!(schemes.tree_schemes, 1);
}

#[test]
fn test_diagnostics_record_every_resolution_once() {
    let f = fixtures(AnchorStrategy::DepthFirst);
    let (_, _, sink) = run(&f, ConceptStore::new(), true, true);

    let resolved_sources: Vec<&str> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            MergeEvent::Resolved { source, .. } => Some(source.as_str()),
            _ => None,
        })
        .collect();
    let unique: BTreeSet<&str> = resolved_sources.iter().copied().collect();
    assert_eq!(unique.len(), resolved_sources.len());
    assert!(unique.contains("http://purl.obolibrary.org/obo/MONDO_0004784"));
}

// ============================================================================
// Output and resume
// ============================================================================

#[test]
fn test_turtle_output_reloads_and_checks_clean() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("meta_skos.ttl");
    let f = fixtures(AnchorStrategy::DepthFirst);
    let (store, _, _) = run(&f, ConceptStore::new(), true, true);

    write_taxonomy(&store, &f.config, &out, OutputFormat::Turtle).unwrap();
    let reloaded = ConceptStore::from_snapshot(load_snapshot(&out, &f.config).unwrap());

    assert_eq!(reloaded.len(), store.len());
    assert_eq!(reloaded.edge_count(), store.edge_count());
    assert_eq!(shape(&reloaded), shape(&store));
    assert!(verify_invariants(&reloaded).is_empty());
}

#[test]
fn test_resumed_ontology_merge_matches_single_run() {
    let dir = tempdir().unwrap();
    let stage = dir.path().join("thesaurus_only.ttl");
    let f = fixtures(AnchorStrategy::DepthFirst);

    let (single, _, _) = run(&f, ConceptStore::new(), true, true);

    let (thesaurus_only, _, _) = run(&f, ConceptStore::new(), true, false);
    write_taxonomy(&thesaurus_only, &f.config, &stage, OutputFormat::Turtle).unwrap();

    let (resumed, resume_report) =
        resume_from_snapshot(load_snapshot(&stage, &f.config).unwrap(), &f.config);
    assert!(resume_report.cached_keys > 0);
    assert!(resume_report.next_id > 102);

    let (combined, _, _) = run(&f, resumed, false, true);
    assert_eq!(shape(&combined), shape(&single));
    assert!(verify_invariants(&combined).is_empty());
}

#[test]
fn test_rerunning_on_resumed_output_adds_nothing() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("meta_skos.json");
    let f = fixtures(AnchorStrategy::DepthFirst);

    let (first, first_report, _) = run(&f, ConceptStore::new(), true, true);
    write_taxonomy(&first, &f.config, &out, OutputFormat::Json).unwrap();

    let (resumed, _) = resume_from_snapshot(load_snapshot(&out, &f.config).unwrap(), &f.config);
    let (second, second_report, _) = run(&f, resumed, true, true);

    assert_eq!(second.len(), first.len());
    assert_eq!(second_report.edges, first_report.edges);
    assert_eq!(second_report.schemes_total, first_report.schemes_total);
    assert_eq!(shape(&second), shape(&first));
}
