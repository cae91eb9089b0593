//! End-to-end merge: thesaurus, schemes, ontology.

use crate::anchor::{merge_ontology, OntologyReport};
use crate::error::MergeError;
use crate::schemes::{assign_schemes, SchemeReport};
use crate::thesaurus::{build_thesaurus, ThesaurusReport};
use crate::MergeContext;
use metaskos_core::{ConceptStore, CrosswalkTable, DiagnosticSink, GraphQuery, MergeConfig};
use serde::Serialize;

/// The source graphs of one run. Either may be absent (e.g. a resumed run
/// that only adds the ontology).
#[derive(Clone, Copy, Default)]
pub struct PipelineSources<'g> {
    pub thesaurus: Option<&'g dyn GraphQuery>,
    pub ontology: Option<&'g dyn GraphQuery>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub thesaurus: Option<ThesaurusReport>,
    pub schemes: Option<SchemeReport>,
    pub ontology: Option<OntologyReport>,
    pub concepts: usize,
    pub edges: usize,
    pub schemes_total: usize,
    pub unlabeled: usize,
    pub next_id: u64,
}

pub struct Pipeline<'a> {
    config: &'a MergeConfig,
    crosswalk: &'a CrosswalkTable,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a MergeConfig, crosswalk: &'a CrosswalkTable) -> Self {
        Self { config, crosswalk }
    }

    /// Run every pass against `store`. On error the store is dropped with
    /// the partial merge; nothing is returned to be written.
    pub fn run(
        &self,
        mut store: ConceptStore,
        sources: PipelineSources<'_>,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(ConceptStore, MergeReport), MergeError> {
        let mut report = MergeReport::default();
        {
            let mut ctx = MergeContext::new(&mut store, self.crosswalk, self.config, sink);

            if let Some(thesaurus) = sources.thesaurus {
                report.thesaurus = Some(build_thesaurus(&mut ctx, thesaurus)?);
                report.schemes = Some(assign_schemes(&mut ctx, thesaurus)?);
            }
            if let Some(ontology) = sources.ontology {
                report.ontology = Some(merge_ontology(
                    &mut ctx,
                    ontology,
                    self.config.anchor_strategy,
                )?);
            }
            ctx.sink.flush();
        }

        report.concepts = store.len();
        report.edges = store.edge_count();
        report.schemes_total = store.schemes().count();
        report.unlabeled = store.unlabeled().len();
        report.next_id = store.next_id();
        tracing::info!(
            concepts = report.concepts,
            edges = report.edges,
            schemes = report.schemes_total,
            unlabeled = report.unlabeled,
            "merge finished"
        );
        Ok((store, report))
    }
}
