//! `metaskos build`

use crate::BuildArgs;
use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;
use metaskos_core::{
    verify_invariants, ConceptStore, CrosswalkTable, DiagnosticSink, FileSink, GraphQuery,
    MemoryGraph, MergeConfig, NullSink,
};
use metaskos_merge::{resume_from_snapshot, MergeReport, Pipeline, PipelineSources};
use metaskos_rdf::{load_graph_file, load_snapshot, write_output_atomic, write_taxonomy, OutputFormat};
use std::path::Path;

pub(crate) fn load_config(path: Option<&Path>) -> Result<MergeConfig> {
    match path {
        Some(path) => MergeConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(MergeConfig::default()),
    }
}

fn load_source(kind: &str, path: &Path) -> Result<MemoryGraph> {
    println!("{} {} {}", "Loading".green().bold(), kind, path.display());
    let (graph, stats) = load_graph_file(path)?;
    println!(
        "  {} {} statements kept of {}",
        "→".yellow(),
        stats.kept,
        stats.statements
    );
    Ok(graph)
}

pub(crate) fn cmd_build(args: &BuildArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(strategy) = args.strategy {
        config.anchor_strategy = strategy.into();
    }

    let resume_from = args
        .resume
        .as_ref()
        .map(|path| path.clone().unwrap_or_else(|| args.out.clone()));
    if args.thesaurus.is_none() && args.ontology.is_none() && resume_from.is_none() {
        bail!("nothing to merge: pass --thesaurus, --ontology or --resume");
    }

    let crosswalk = CrosswalkTable::load_dir(&args.crosswalk_dir, &config.crosswalk_files)
        .with_context(|| format!("failed to load crosswalk from {}", args.crosswalk_dir.display()))?;
    println!(
        "{} {} crosswalk records from {}",
        "Loaded".green().bold(),
        crosswalk.len(),
        args.crosswalk_dir.display()
    );

    let store = match &resume_from {
        Some(path) => {
            let snapshot = load_snapshot(path, &config)
                .with_context(|| format!("failed to resume from {}", path.display()))?;
            let (store, report) = resume_from_snapshot(snapshot, &config);
            println!(
                "{} {} concepts, {} schemes from {} (next id {})",
                "Resumed".green().bold(),
                report.concepts,
                report.schemes,
                path.display(),
                report.next_id
            );
            store
        }
        None => ConceptStore::new(),
    };

    let thesaurus = args
        .thesaurus
        .as_deref()
        .map(|p| load_source("thesaurus", p))
        .transpose()?;
    let ontology = args
        .ontology
        .as_deref()
        .map(|p| load_source("ontology", p))
        .transpose()?;
    let sources = PipelineSources {
        thesaurus: thesaurus.as_ref().map(|g| g as &dyn GraphQuery),
        ontology: ontology.as_ref().map(|g| g as &dyn GraphQuery),
    };

    let mut sink: Box<dyn DiagnosticSink> = match &args.diagnostics {
        Some(path) => Box::new(
            FileSink::create(path)
                .with_context(|| format!("failed to open diagnostics file {}", path.display()))?,
        ),
        None => Box::new(NullSink),
    };

    let (store, report) = Pipeline::new(&config, &crosswalk).run(store, sources, sink.as_mut())?;
    drop(sink);

    let violations = verify_invariants(&store);
    let structural: Vec<_> = violations.iter().filter(|v| v.is_structural()).collect();
    if let Some(first) = structural.first() {
        return Err(anyhow!(
            "merged taxonomy is inconsistent ({} violations, first: {first}); nothing written",
            structural.len()
        ));
    }

    let format = args
        .format
        .map(OutputFormat::from)
        .unwrap_or_else(|| OutputFormat::for_path(&args.out));
    write_taxonomy(&store, &config, &args.out, format)?;

    if let Some(path) = &args.report {
        write_output_atomic(path, |w| Ok(serde_json::to_writer_pretty(w, &report)?))?;
    }

    print_summary(&report);
    eprintln!(
        "{} {} ({})",
        "wrote".green().bold(),
        args.out.display().to_string().bold(),
        format.as_str()
    );
    Ok(())
}

fn print_summary(report: &MergeReport) {
    if let Some(t) = &report.thesaurus {
        println!(
            "  {} thesaurus: {} descriptors ({} skipped), {} concepts populated, {} edges, {} unanchored",
            "→".yellow(),
            t.descriptors,
            t.skipped_descriptors,
            t.concepts_populated,
            t.edges_added,
            t.unanchored
        );
    }
    if let Some(s) = &report.schemes {
        println!(
            "  {} schemes: {} category, {} tree, {} memberships",
            "→".yellow(),
            s.category_schemes,
            s.tree_schemes,
            s.memberships_added
        );
    }
    if let Some(o) = &report.ontology {
        println!(
            "  {} ontology ({}): {} leaves, {} classes, {} populated, {} edges, {} unlabeled, {} skipped groups, {} swept",
            "→".yellow(),
            o.strategy,
            o.leaves,
            o.classes_resolved,
            o.concepts_populated,
            o.edges_added,
            o.unlabeled,
            o.skipped_groups,
            o.swept
        );
    }
    println!(
        "{} {} concepts, {} edges, {} schemes, next id {}",
        "Merged".green().bold(),
        report.concepts,
        report.edges,
        report.schemes_total,
        report.next_id
    );
    if report.unlabeled > 0 {
        println!(
            "  {} {} concepts have no label",
            "warning:".yellow().bold(),
            report.unlabeled
        );
    }
}
