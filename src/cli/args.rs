//! Command line argument parsing: two subcommand trees, one per core, in
//! the teacher's `clap`-derive style.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "rag-agent")]
#[command(author = "RAG Agent Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Autonomous coding-agent loop and philosophical-corpus RAG service")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run Core A's autonomous session loop against a tracked project
    Agent {
        /// Project directory; holds the project marker and session logs
        #[arg(long = "project-dir", short = 'p')]
        project_dir: PathBuf,
        /// Parse and apply a new/extension spec before looping (required on
        /// first run; optional on resume, where it extends instead)
        #[arg(long = "new-spec")]
        new_spec: Option<PathBuf>,
        /// Cap on coding-session iterations before the loop terminates
        #[arg(long = "max-iterations")]
        max_iterations: Option<u32>,
        /// LLM CLI model identifier, overriding the configured default
        #[arg(long = "model")]
        model: Option<String>,
    },
    /// Drive Core B's document-ingestion and retrieval pipeline
    Corpus {
        #[command(subcommand)]
        command: CorpusCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum CorpusCommands {
    /// Run the ten-stage ingestion pipeline over one PDF
    Ingest {
        /// Path to the source PDF
        pdf: PathBuf,
        /// Output root directory (defaults to the PDF's parent directory)
        #[arg(long = "output-dir")]
        output_dir: Option<PathBuf>,
        /// Reuse a cached OCR response instead of calling the OCR provider
        #[arg(long = "skip-ocr")]
        skip_ocr: bool,
        /// Request page/table/figure OCR annotations (higher cost, more
        /// reliable TOC extraction)
        #[arg(long = "use-annotations")]
        use_annotations: bool,
        /// Skip structured-LLM stages (metadata, classification, cleaning,
        /// keywording, summarisation)
        #[arg(long = "no-llm")]
        no_llm: bool,
        /// Skip generating section summaries
        #[arg(long = "no-summaries")]
        no_summaries: bool,
        /// Skip ingesting the pipeline's output into the vector store
        #[arg(long = "no-store")]
        no_store: bool,
        /// Structured-LLM endpoint URL (overrides config)
        #[arg(long = "llm-endpoint")]
        llm_endpoint: Option<String>,
        /// OCR vendor endpoint URL (overrides config)
        #[arg(long = "ocr-endpoint")]
        ocr_endpoint: Option<String>,
    },
    /// Query the retrieval engine
    Query {
        /// Retrieval mode: simple, summary, hierarchical, or auto
        #[arg(long = "mode", default_value = "auto")]
        mode: String,
        /// Query text
        #[arg(long = "query", short = 'q')]
        query: String,
        /// Maximum hits to return
        #[arg(long = "limit", default_value_t = 10)]
        limit: usize,
        #[arg(long = "author")]
        author: Option<String>,
        #[arg(long = "work")]
        work: Option<String>,
        #[arg(long = "language")]
        language: Option<String>,
        #[arg(long = "unit-type")]
        unit_type: Option<String>,
        #[arg(long = "section-prefix")]
        section_prefix: Option<String>,
        #[arg(long = "min-similarity")]
        min_similarity: Option<f32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_agent_subcommand_with_long_flags() {
        let args = Args::try_parse_from(["rag-agent", "agent", "--project-dir", "/tmp/proj", "--max-iterations", "5"]).unwrap();
        match args.command {
            Commands::Agent { project_dir, max_iterations, .. } => {
                assert_eq!(project_dir, PathBuf::from("/tmp/proj"));
                assert_eq!(max_iterations, Some(5));
            }
            _ => panic!("expected Agent command"),
        }
    }

    #[test]
    fn parses_corpus_ingest_with_flags() {
        let args = Args::try_parse_from(["rag-agent", "corpus", "ingest", "book.pdf", "--skip-ocr", "--use-annotations"]).unwrap();
        match args.command {
            Commands::Corpus { command: CorpusCommands::Ingest { pdf, skip_ocr, use_annotations, .. } } => {
                assert_eq!(pdf, PathBuf::from("book.pdf"));
                assert!(skip_ocr);
                assert!(use_annotations);
            }
            _ => panic!("expected Corpus Ingest command"),
        }
    }

    #[test]
    fn corpus_query_defaults_mode_to_auto() {
        let args = Args::try_parse_from(["rag-agent", "corpus", "query", "--query", "what is virtue"]).unwrap();
        match args.command {
            Commands::Corpus { command: CorpusCommands::Query { mode, limit, .. } } => {
                assert_eq!(mode, "auto");
                assert_eq!(limit, 10);
            }
            _ => panic!("expected Corpus Query command"),
        }
    }
}
