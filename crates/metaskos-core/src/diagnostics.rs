//! Append-only audit trail of merge decisions.
//!
//! One tab-separated line per event. Sinks are best-effort: a failing write
//! is logged once and otherwise ignored, it never aborts a merge.

use crate::model::CanonicalId;
use crate::store::Resolution;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Thesaurus,
    Ontology,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Thesaurus => "thesaurus",
            SourceKind::Ontology => "ontology",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeEvent {
    Resolved {
        kind: SourceKind,
        source: String,
        concept: CanonicalId,
        label: String,
        resolution: Resolution,
    },
    Linked {
        parent: CanonicalId,
        child: CanonicalId,
    },
    /// A concept with a `broaderConcept` the descriptor hierarchy does not explain.
    Unanchored { source: String, concept: CanonicalId },
    UnlabeledClass { source: String, concept: CanonicalId },
    AnchorGroupSkipped { anchor: String, leaf: String },
    ResumeLabelConflict {
        concept: CanonicalId,
        stored_label: String,
        source_label: String,
    },
}

impl fmt::Display for MergeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeEvent::Resolved {
                kind,
                source,
                concept,
                label,
                resolution,
            } => write!(
                f,
                "resolved\t{}\t{source}\t{label}\t{concept}\t{resolution:?}",
                kind.as_str()
            ),
            MergeEvent::Linked { parent, child } => write!(f, "linked\t{parent}\t{child}"),
            MergeEvent::Unanchored { source, concept } => {
                write!(f, "unanchored\t{source}\t{concept}")
            }
            MergeEvent::UnlabeledClass { source, concept } => {
                write!(f, "unlabeled\t{source}\t{concept}")
            }
            MergeEvent::AnchorGroupSkipped { anchor, leaf } => {
                write!(f, "skipped-group\t{anchor}\t{leaf}")
            }
            MergeEvent::ResumeLabelConflict {
                concept,
                stored_label,
                source_label,
            } => write!(f, "resume-conflict\t{concept}\t{stored_label}\t{source_label}"),
        }
    }
}

pub trait DiagnosticSink {
    fn record(&mut self, event: &MergeEvent);

    fn flush(&mut self) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&mut self, _event: &MergeEvent) {}
}

/// Keeps events in memory (tests, reports).
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub events: Vec<MergeEvent>,
}

impl DiagnosticSink for MemorySink {
    fn record(&mut self, event: &MergeEvent) {
        self.events.push(event.clone());
    }
}

/// Appends events to a file.
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    failed: bool,
}

impl FileSink {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
            failed: false,
        })
    }

    fn give_up(&mut self, err: std::io::Error) {
        if !self.failed {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "diagnostic sink write failed; further diagnostics are dropped"
            );
        }
        self.failed = true;
        self.writer = None;
    }
}

impl DiagnosticSink for FileSink {
    fn record(&mut self, event: &MergeEvent) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        if let Err(err) = writeln!(writer, "{event}") {
            self.give_up(err);
        }
    }

    fn flush(&mut self) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        if let Err(err) = writer.flush() {
            self.give_up(err);
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        DiagnosticSink::flush(self);
    }
}
