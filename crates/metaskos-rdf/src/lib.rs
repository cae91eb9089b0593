//! RDF boundary for the meta SKOS taxonomy.
//!
//! - [`loader`] parses N-Triples, Turtle, N-Quads, TriG and RDF/XML with
//!   `sophia` into the typed [`metaskos_core::MemoryGraph`] the merge passes
//!   query. Only the predicates and types in [`vocab`] are kept.
//! - [`skos_writer`] renders a concept store as SKOS Turtle.
//! - [`persist`] writes output atomically and reads a previous run back for
//!   resuming, from Turtle or a JSON snapshot.

pub mod loader;
pub mod parse;
pub mod persist;
pub mod skos_writer;
pub mod vocab;

pub use loader::{load_graph, load_graph_bytes, load_graph_file, LoadStats};
pub use parse::{for_each_statement, RdfFormat, RdfStatement};
pub use persist::{load_snapshot, write_output_atomic, write_taxonomy, OutputFormat};
pub use skos_writer::{render_skos_turtle, write_skos_turtle};
