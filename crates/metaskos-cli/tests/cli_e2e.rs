use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .canonicalize()
        .expect("canonicalize repo root")
}

fn fixture(name: &str) -> PathBuf {
    repo_root().join("fixtures").join(name)
}

fn metaskos(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_metaskos"))
        .args(args)
        .env("RUST_LOG", "metaskos=warn")
        .output()
        .expect("run metaskos")
}

fn path_arg(p: &PathBuf) -> &str {
    p.to_str().expect("utf-8 path")
}

#[test]
fn build_then_check_then_resume() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("meta_skos.ttl");
    let report = dir.path().join("report.json");
    let diagnostics = dir.path().join("logs").join("merge.log");
    let (thesaurus, ontology, crosswalk) = (
        fixture("mesh_mini.ttl"),
        fixture("mondo_mini.ttl"),
        fixture("crosswalk"),
    );

    let build = metaskos(&[
        "build",
        "--thesaurus",
        path_arg(&thesaurus),
        "--ontology",
        path_arg(&ontology),
        "--crosswalk-dir",
        path_arg(&crosswalk),
        "--out",
        path_arg(&out),
        "--report",
        path_arg(&report),
        "--diagnostics",
        path_arg(&diagnostics),
        "--strategy",
        "path-tracing",
    ]);
    assert!(build.status.success(), "{}", String::from_utf8_lossy(&build.stderr));

    let turtle = fs::read_to_string(&out).unwrap();
    assert!(turtle.contains("\"META SKOS CONCEPT TAXONOMY\"@en"));
    assert!(turtle.contains("<http://meta.org/skos#concept_100> a skos:Concept"));

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(report["ontology"]["strategy"], "path_tracing");
    assert_eq!(report["unlabeled"], 0);

    let log = fs::read_to_string(&diagnostics).unwrap();
    assert!(log.lines().any(|l| l.starts_with("resolved\t")));

    let check = metaskos(&["check", path_arg(&out), "--strict"]);
    assert!(check.status.success(), "{}", String::from_utf8_lossy(&check.stdout));

    // Resume in place with nothing new: the taxonomy is rewritten unchanged.
    let resume = metaskos(&[
        "build",
        "--crosswalk-dir",
        path_arg(&crosswalk),
        "--out",
        path_arg(&out),
        "--resume",
    ]);
    assert!(resume.status.success(), "{}", String::from_utf8_lossy(&resume.stderr));
    assert_eq!(fs::read_to_string(&out).unwrap(), turtle);
}

#[test]
fn xref_stats_counts_vocabularies() {
    let ontology = fixture("mondo_mini.ttl");
    let output = metaskos(&["xref-stats", "--ontology", path_arg(&ontology), "--json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    // respiratory system disease, asthma, atopic, allergic, intrinsic.
    assert_eq!(stats["labeled_classes"], 5);
    let counts: std::collections::HashMap<String, u64> = stats["per_vocabulary"]
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| (pair[0].as_str().unwrap().to_string(), pair[1].as_u64().unwrap()))
        .collect();
    assert_eq!(counts["mesh"], 2);
    assert_eq!(counts["umls"], 1);
    assert_eq!(counts["DOID"], 2);
    assert_eq!(counts["Orphanet"], 1);
}

#[test]
fn export_diseases_writes_five_tables() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("tables").join("mondo_");
    let ontology = fixture("mondo_mini.ttl");

    let output = metaskos(&[
        "export-diseases",
        "--ontology",
        path_arg(&ontology),
        "--out-stem",
        path_arg(&stem),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let read = |name: &str| {
        fs::read_to_string(dir.path().join("tables").join(format!("mondo_{name}.tsv"))).unwrap()
    };
    let rows = |text: &str| text.lines().count() - 1;

    let disease = read("disease");
    assert!(disease.starts_with("mondo_id\tname\n"));
    assert!(disease.contains("http://purl.obolibrary.org/obo/MONDO_0004979\tasthma\n"));
    assert_eq!(rows(&disease), 5);

    let parent = read("parent");
    assert!(parent.starts_with("mondo_id\tname\tparent_id\tparent_name\n"));
    assert!(parent.contains(
        "http://purl.obolibrary.org/obo/MONDO_0005087\trespiratory system disease\thttp://purl.obolibrary.org/obo/MONDO_0000001\tdisease\n"
    ));
    assert_eq!(rows(&parent), 5);
    assert_eq!(rows(&read("xref")), 6);
    assert_eq!(rows(&read("synonym")), 2);

    // Atopic asthma carries the rare modifier; allergic asthma inherits it.
    let rare = read("rare");
    assert_eq!(
        rare,
        "mondo_id\nhttp://purl.obolibrary.org/obo/MONDO_0004784\nhttp://purl.obolibrary.org/obo/MONDO_0005405\n"
    );
}

#[test]
fn missing_crosswalk_fails_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("meta_skos.ttl");
    let thesaurus = fixture("mesh_mini.ttl");
    let empty = dir.path().join("no_crosswalk");
    fs::create_dir_all(&empty).unwrap();

    let output = metaskos(&[
        "build",
        "--thesaurus",
        path_arg(&thesaurus),
        "--crosswalk-dir",
        path_arg(&empty),
        "--out",
        path_arg(&out),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("crosswalk"));
    assert!(!out.exists());
}
