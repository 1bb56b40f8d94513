//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::flow::{DEFAULT_CONTRACTS_DIR, DEFAULT_QUERY};
use crate::vectorstore::config::DEFAULT_SEARCH_LIMIT;

/// contract-flow: question answering over contract PDFs.
///
/// Ingests contracts into a Weaviate collection, retrieves passages relevant
/// to a question with a tool-using agent, and writes a cited report.
#[derive(Parser, Debug)]
#[command(name = "contract-flow")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose (debug) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full workflow: ingest, retrieve, report.
    ///
    /// Requires OPENAI_API_KEY before any step starts; the run fails early
    /// without it.
    #[command(after_help = r#"Environment:
  OPENAI_API_KEY       required, checked before ingestion
  WEAVIATE_URL         cluster URL (a bare cloud host gets https://)
  CONTRACTS_DIR        default for --contracts-dir

Examples:
  contract-flow run                                         # Default question
  contract-flow run -q "what is the termination notice?"   # Custom question
  contract-flow run --contracts-dir ./contracts --no-eval  # Skip scoring
  contract-flow --format json run | jq '.state.report'
"#)]
    Run {
        /// Question to answer.
        #[arg(short, long, default_value = DEFAULT_QUERY)]
        query: String,

        /// Folder containing contract PDFs.
        #[arg(short, long, env = "CONTRACTS_DIR", default_value = DEFAULT_CONTRACTS_DIR)]
        contracts_dir: PathBuf,

        /// Skip hallucination scoring of the report.
        #[arg(long)]
        no_eval: bool,
    },

    /// Render the workflow graph without running it.
    #[command(after_help = r#"Examples:
  contract-flow plot                          # Mermaid to stdout
  contract-flow plot --graph dot -o flow.dot  # Graphviz to file
"#)]
    Plot {
        /// Graph format: mermaid, dot.
        #[arg(short, long, default_value = "mermaid")]
        graph: String,

        /// Write the graph to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ingest contract PDFs into the vector store only.
    Ingest {
        /// Folder containing contract PDFs.
        #[arg(short, long, env = "CONTRACTS_DIR", default_value = DEFAULT_CONTRACTS_DIR)]
        contracts_dir: PathBuf,
    },

    /// Search the contracts collection directly.
    #[command(after_help = r#"Examples:
  contract-flow search "warranty period"
  contract-flow search "indemnification" -k 5
"#)]
    Search {
        /// Search query text.
        query: String,

        /// Maximum number of passages.
        #[arg(short = 'k', long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },

    /// Prompt template operations.
    #[command(subcommand)]
    Prompts(PromptCommands),
}

/// Prompt template subcommands.
#[derive(Subcommand, Debug)]
pub enum PromptCommands {
    /// Write the default prompt templates for customisation.
    ///
    /// Existing files are left untouched.
    Init {
        /// Target directory (default: ~/.config/contract-flow/prompts).
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}
