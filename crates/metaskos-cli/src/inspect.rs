//! `metaskos xref-stats`, `metaskos export-diseases` and `metaskos check`

use crate::build::load_config;
use anyhow::{bail, Result};
use colored::Colorize;
use metaskos_core::{verify_invariants, ConceptStore};
use metaskos_merge::{disease_tables, xref_stats};
use metaskos_rdf::{load_graph_file, load_snapshot, write_output_atomic};
use std::path::{Path, PathBuf};

pub(crate) fn cmd_xref_stats(
    ontology: &Path,
    vocabularies: &[String],
    config: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let vocabularies = if vocabularies.is_empty() {
        config.xref_vocabularies.clone()
    } else {
        vocabularies.to_vec()
    };

    let (graph, _) = load_graph_file(ontology)?;
    let stats = xref_stats(&graph, &config, &vocabularies);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!(
        "{} {} labeled classes under {}",
        "Counted".green().bold(),
        stats.labeled_classes,
        config.ontology_root
    );
    for (vocabulary, count) in &stats.per_vocabulary {
        println!("  {} {vocabulary}\t{count}", "→".yellow());
    }
    Ok(())
}

fn table_path(stem: &Path, name: &str) -> PathBuf {
    let mut path = stem.as_os_str().to_owned();
    path.push(name);
    path.push(".tsv");
    PathBuf::from(path)
}

pub(crate) fn cmd_export_diseases(ontology: &Path, out_stem: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let (graph, _) = load_graph_file(ontology)?;
    let tables = disease_tables(&graph, &config);

    println!("{} {}", "Exporting".green().bold(), ontology.display());
    for table in tables.iter() {
        let path = table_path(out_stem, table.name);
        write_output_atomic(&path, |out| Ok(table.write_tsv(out)?))?;
        println!("  {} {}\t{} rows", "→".yellow(), path.display(), table.rows.len());
    }
    Ok(())
}

pub(crate) fn cmd_check(graph: &Path, config: Option<&Path>, strict: bool) -> Result<()> {
    let config = load_config(config)?;
    println!("{} {}", "Checking".green().bold(), graph.display());

    let store = ConceptStore::from_snapshot(load_snapshot(graph, &config)?);
    let violations = verify_invariants(&store);
    let (structural, unlabeled): (Vec<_>, Vec<_>) =
        violations.iter().partition(|v| v.is_structural());

    for violation in &structural {
        println!("  {} {violation}", "error:".red().bold());
    }
    for violation in &unlabeled {
        println!("  {} {violation}", "warning:".yellow().bold());
    }
    println!(
        "  {} {} concepts, {} edges, {} schemes",
        "→".yellow(),
        store.len(),
        store.edge_count(),
        store.schemes().count()
    );

    if !structural.is_empty() {
        bail!("{} structural violations in {}", structural.len(), graph.display());
    }
    if strict && !unlabeled.is_empty() {
        bail!("{} unlabeled concepts in {}", unlabeled.len(), graph.display());
    }
    println!("{}", "Valid.".green());
    Ok(())
}
