//! Merge passes that turn the thesaurus, the crosswalk and the disease
//! ontology into one canonical concept taxonomy.
//!
//! Order matters: [`build_thesaurus`] then [`assign_schemes`] then
//! [`merge_ontology`]. [`Pipeline`] runs them in that order, optionally on top
//! of a store rebuilt by [`resume_from_graph`] / [`resume_from_snapshot`].
//! [`xref_stats`] and [`disease_tables`] read the ontology on its own.

pub mod anchor;
pub mod consistency;
pub mod diseases;
pub mod error;
pub mod pipeline;
pub mod resume;
pub mod schemes;
pub mod stats;
pub mod thesaurus;

pub use anchor::{merge_ontology, OntologyReport};
pub use diseases::{disease_tables, DiseaseTable, DiseaseTables};
pub use error::MergeError;
pub use pipeline::{MergeReport, Pipeline, PipelineSources};
pub use resume::{resume_from_graph, resume_from_snapshot, ResumeReport};
pub use schemes::{assign_schemes, SchemeReport};
pub use stats::{xref_stats, XrefStats};
pub use thesaurus::{build_thesaurus, ThesaurusReport};

use metaskos_core::{ConceptStore, CrosswalkTable, DiagnosticSink, MergeConfig};

/// Mutable state threaded through every merge pass.
pub struct MergeContext<'a> {
    pub store: &'a mut ConceptStore,
    pub crosswalk: &'a CrosswalkTable,
    pub config: &'a MergeConfig,
    pub sink: &'a mut dyn DiagnosticSink,
}

impl<'a> MergeContext<'a> {
    pub fn new(
        store: &'a mut ConceptStore,
        crosswalk: &'a CrosswalkTable,
        config: &'a MergeConfig,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            store,
            crosswalk,
            config,
            sink,
        }
    }
}
