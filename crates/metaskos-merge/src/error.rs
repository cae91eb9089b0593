use metaskos_core::CanonicalId;

/// Fatal merge failures. Any of these aborts the batch before output is written.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("thesaurus descriptor {descriptor} (`{label}`) declares no preferred concept")]
    MissingPreferredConcept { descriptor: String, label: String },

    #[error(
        "parent label mismatch: {child_source} (`{child_label}`, {child_id}) has broader \
         descriptor {parent_source} labeled `{parent_source_label}`, but its canonical concept \
         {parent_id} is already labeled `{parent_stored_label}`"
    )]
    ParentLabelMismatch {
        child_source: String,
        child_label: String,
        child_id: CanonicalId,
        parent_source: String,
        parent_source_label: String,
        parent_id: CanonicalId,
        parent_stored_label: String,
    },
}
