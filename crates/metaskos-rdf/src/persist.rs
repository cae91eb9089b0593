//! Writing and re-reading the merged taxonomy.
//!
//! Output goes to a temporary sibling of the destination and is renamed into
//! place only once it is completely written, so a failed run never leaves a
//! truncated taxonomy behind.

use crate::loader::load_graph_file;
use crate::skos_writer::write_skos_turtle;
use anyhow::{anyhow, Context, Result};
use metaskos_core::{ConceptStore, MergeConfig, TaxonomySnapshot};
use metaskos_merge::resume::snapshot_from_graph;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// SKOS Turtle.
    Turtle,
    /// [`TaxonomySnapshot`] as JSON.
    Json,
}

impl OutputFormat {
    /// `.json` selects JSON; anything else is Turtle.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Turtle,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Turtle => "turtle",
            Self::Json => "json",
        }
    }
}

fn temp_sibling(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("output path has no file name: {}", path.display()))?;
    Ok(path.with_file_name(format!(".{name}.tmp-{}", std::process::id())))
}

/// Write `path` through `write`, atomically replacing any existing file.
pub fn write_output_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let tmp = temp_sibling(path)?;

    let result = (|| -> Result<()> {
        let file = File::create(&tmp).with_context(|| format!("failed to create {}", tmp.display()))?;
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        let file = writer
            .into_inner()
            .map_err(|e| anyhow!("failed to flush {}: {}", tmp.display(), e.error()))?;
        file.sync_all()
            .with_context(|| format!("failed to sync {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("failed to move output into place at {}", path.display()))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Persist the store in `format`.
pub fn write_taxonomy(
    store: &ConceptStore,
    config: &MergeConfig,
    path: &Path,
    format: OutputFormat,
) -> Result<()> {
    write_output_atomic(path, |w| match format {
        OutputFormat::Turtle => Ok(write_skos_turtle(store, config, w)?),
        OutputFormat::Json => Ok(serde_json::to_writer_pretty(w, &store.snapshot())?),
    })?;
    tracing::info!(
        path = %path.display(),
        format = format.as_str(),
        concepts = store.len(),
        "wrote taxonomy"
    );
    Ok(())
}

/// Read a previously written taxonomy, JSON snapshot or any RDF format.
pub fn load_snapshot(path: &Path, config: &MergeConfig) -> Result<TaxonomySnapshot> {
    match OutputFormat::for_path(path) {
        OutputFormat::Json => {
            let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("failed to parse snapshot {}", path.display()))
        }
        OutputFormat::Turtle => {
            let (graph, _) = load_graph_file(path)?;
            Ok(snapshot_from_graph(&graph, config))
        }
    }
}
