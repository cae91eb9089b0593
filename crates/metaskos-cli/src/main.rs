//! Meta SKOS CLI
//!
//! Builds the canonical concept taxonomy from the MeSH thesaurus, the UMLS
//! crosswalk and the MONDO ontology, and inspects what it produced:
//! - `build`: run the merge and write SKOS Turtle or a JSON snapshot
//! - `xref-stats`: cross-reference coverage of the ontology
//! - `export-diseases`: the ontology below its root as TSV tables
//! - `check`: structural invariants of a written taxonomy

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use metaskos_core::AnchorStrategy;
use metaskos_rdf::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod build;
mod inspect;

#[derive(Parser)]
#[command(name = "metaskos")]
#[command(
    author,
    version,
    about = "Merge MeSH, the UMLS crosswalk and MONDO into one SKOS taxonomy"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the sources into a canonical taxonomy.
    ///
    /// Either source graph may be omitted when resuming from a previous
    /// output; the crosswalk is always required.
    Build(BuildArgs),

    /// Count ontology classes cross-referenced to each vocabulary.
    XrefStats {
        /// Ontology (OWL/RDF) file
        #[arg(long)]
        ontology: PathBuf,
        /// Vocabulary marker to count (repeatable; defaults from config)
        #[arg(long = "vocab")]
        vocabularies: Vec<String>,
        /// JSON merge configuration
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write disease, parent, xref, synonym and rare-disease TSV tables.
    ExportDiseases {
        /// Ontology (OWL/RDF) file
        #[arg(long)]
        ontology: PathBuf,
        /// Path prefix; `<stem>disease.tsv` and so on are written
        #[arg(long)]
        out_stem: PathBuf,
        /// JSON merge configuration
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Verify broader/narrower symmetry, self-loops and labels of a taxonomy.
    Check {
        /// Taxonomy written by `build` (Turtle or `.json` snapshot)
        graph: PathBuf,
        /// JSON merge configuration
        #[arg(long)]
        config: Option<PathBuf>,
        /// Fail on unlabeled concepts too
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Args)]
pub struct BuildArgs {
    /// Thesaurus (MeSH RDF) file
    #[arg(long)]
    thesaurus: Option<PathBuf>,
    /// Directory holding the four crosswalk TSV batches
    #[arg(long)]
    crosswalk_dir: PathBuf,
    /// Ontology (MONDO OWL/RDF) file
    #[arg(long)]
    ontology: Option<PathBuf>,
    /// Output taxonomy
    #[arg(short, long)]
    out: PathBuf,
    /// Resume from a previous output (defaults to `--out`)
    #[arg(long, value_name = "GRAPH", num_args = 0..=1)]
    resume: Option<Option<PathBuf>>,
    /// JSON merge configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Append one line per merge decision to this file
    #[arg(long)]
    diagnostics: Option<PathBuf>,
    /// Ontology anchor-merge strategy (overrides the config)
    #[arg(long)]
    strategy: Option<StrategyArg>,
    /// Output format (default: from the `--out` extension)
    #[arg(long)]
    format: Option<FormatArg>,
    /// Write the merge report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    DepthFirst,
    PathTracing,
}

impl From<StrategyArg> for AnchorStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::DepthFirst => AnchorStrategy::DepthFirst,
            StrategyArg::PathTracing => AnchorStrategy::PathTracing,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Turtle,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Turtle => OutputFormat::Turtle,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "metaskos=debug" } else { "metaskos=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Build(args) => build::cmd_build(&args),
        Commands::XrefStats {
            ontology,
            vocabularies,
            config,
            json,
        } => inspect::cmd_xref_stats(&ontology, &vocabularies, config.as_deref(), json),
        Commands::ExportDiseases {
            ontology,
            out_stem,
            config,
        } => inspect::cmd_export_diseases(&ontology, &out_stem, config.as_deref()),
        Commands::Check {
            graph,
            config,
            strict,
        } => inspect::cmd_check(&graph, config.as_deref(), strict),
    }
}
