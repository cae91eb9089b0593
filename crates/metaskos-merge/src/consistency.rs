//! Parent-label agreement check.
//!
//! A broader descriptor resolves to a canonical concept that may already have
//! been labeled through a different source path. If the two labels disagree
//! the crosswalk has merged two different concepts under one canonical id.

use crate::error::MergeError;
use crate::MergeContext;
use metaskos_core::{CanonicalId, MergeEvent};

/// The source side of a `child -> broader parent` statement.
pub struct ParentClaim<'s> {
    pub child_source: &'s str,
    pub child_id: &'s CanonicalId,
    pub parent_source: &'s str,
    pub parent_source_label: Option<&'s str>,
    pub parent_id: &'s CanonicalId,
}

pub fn check_parent_label(ctx: &mut MergeContext<'_>, claim: ParentClaim<'_>) -> Result<(), MergeError> {
    let Some(source_label) = claim.parent_source_label else {
        return Ok(());
    };
    let Some(stored_label) = ctx
        .store
        .get(claim.parent_id)
        .and_then(|c| c.label.clone())
    else {
        return Ok(());
    };
    if stored_label == source_label {
        return Ok(());
    }

    if ctx.store.is_resumed(claim.parent_id) && !ctx.config.strict_resume_labels {
        tracing::warn!(
            concept = %claim.parent_id,
            stored = %stored_label,
            source = %source_label,
            parent = claim.parent_source,
            "resumed concept label differs from thesaurus label; keeping the stored one"
        );
        ctx.sink.record(&MergeEvent::ResumeLabelConflict {
            concept: claim.parent_id.clone(),
            stored_label,
            source_label: source_label.to_string(),
        });
        return Ok(());
    }

    let child_label = ctx
        .store
        .get(claim.child_id)
        .map(|c| c.display_label().to_string())
        .unwrap_or_default();
    Err(MergeError::ParentLabelMismatch {
        child_source: claim.child_source.to_string(),
        child_label,
        child_id: claim.child_id.clone(),
        parent_source: claim.parent_source.to_string(),
        parent_source_label: source_label.to_string(),
        parent_id: claim.parent_id.clone(),
        parent_stored_label: stored_label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaskos_core::{ConceptFields, ConceptStore, CrosswalkTable, MemorySink, MergeConfig};

    fn claim<'s>(parent_id: &'s CanonicalId, child_id: &'s CanonicalId, label: &'s str) -> ParentClaim<'s> {
        ParentClaim {
            child_source: "http://id.nlm.nih.gov/mesh/2020/D2",
            child_id,
            parent_source: "http://id.nlm.nih.gov/mesh/2020/D1",
            parent_source_label: Some(label),
            parent_id,
        }
    }

    #[test]
    fn mismatch_is_fatal_and_names_both_sides() {
        let mut store = ConceptStore::new();
        let parent = CanonicalId::concept(100);
        let child = CanonicalId::concept(101);
        store.populate_once(&parent, ConceptFields::labeled("Asthma"));
        store.populate_once(&child, ConceptFields::labeled("Asthma, Occupational"));
        let crosswalk = CrosswalkTable::new();
        let config = MergeConfig::default();
        let mut sink = MemorySink::default();
        let mut ctx = MergeContext::new(&mut store, &crosswalk, &config, &mut sink);

        let err = check_parent_label(&mut ctx, claim(&parent, &child, "Bronchitis")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Bronchitis"));
        assert!(message.contains("Asthma, Occupational"));
        assert!(message.contains("concept_100"));
        assert!(matches!(err, MergeError::ParentLabelMismatch { .. }));
    }

    #[test]
    fn resumed_mismatch_is_tolerated_when_lenient() {
        let mut store = ConceptStore::new();
        let parent = CanonicalId::concept(100);
        let child = CanonicalId::concept(101);
        store.populate_once(&parent, ConceptFields::labeled("Asthma"));
        store.mark_resumed(&parent);
        let crosswalk = CrosswalkTable::new();
        let config = MergeConfig {
            strict_resume_labels: false,
            ..MergeConfig::default()
        };
        let mut sink = MemorySink::default();
        let mut ctx = MergeContext::new(&mut store, &crosswalk, &config, &mut sink);

        check_parent_label(&mut ctx, claim(&parent, &child, "Asthma, Bronchial")).unwrap();
        assert_eq!(sink.events.len(), 1);
    }

    #[test]
    fn matching_or_missing_labels_pass() {
        let mut store = ConceptStore::new();
        let parent = CanonicalId::concept(1);
        let child = CanonicalId::concept(2);
        let crosswalk = CrosswalkTable::new();
        let config = MergeConfig::default();
        let mut sink = MemorySink::default();
        let mut ctx = MergeContext::new(&mut store, &crosswalk, &config, &mut sink);
        check_parent_label(&mut ctx, claim(&parent, &child, "anything")).unwrap();

        ctx.store.populate_once(&parent, ConceptFields::labeled("Asthma"));
        check_parent_label(&mut ctx, claim(&parent, &child, "Asthma")).unwrap();
    }
}
