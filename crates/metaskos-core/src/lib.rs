//! Core types for building the meta SKOS concept taxonomy.
//!
//! - [`crosswalk`]: the metathesaurus identifier crosswalk (four TSV batches)
//! - [`store`]: canonical concept registry and identity resolution
//! - [`query`]: the typed graph-query seam the merge passes read through
//! - [`diagnostics`]: best-effort audit trail of merge decisions
//! - [`config`]: namespaces, crosswalk file names, merge policy
//! - [`invariants`]: structural checks over a store

pub mod config;
pub mod crosswalk;
pub mod diagnostics;
pub mod invariants;
pub mod model;
pub mod query;
pub mod store;

pub use config::{AnchorStrategy, ConfigError, MergeConfig};
pub use crosswalk::{CrosswalkBatch, CrosswalkError, CrosswalkFiles, CrosswalkRecord, CrosswalkTable};
pub use diagnostics::{DiagnosticSink, FileSink, MemorySink, MergeEvent, NullSink, SourceKind};
pub use invariants::{verify_invariants, InvariantViolation};
pub use model::{
    category_label, category_scheme_id, CanonicalConcept, CanonicalId, ConceptFields,
    ConceptScheme, THESAURUS_CATEGORIES,
};
pub use query::{GraphQuery, Literal, MemoryGraph, NodeClass, Relation};
pub use store::{ConceptStore, Resolution, SourceRef, TaxonomySnapshot};
