//! # contract-flow
//!
//! Question answering over a folder of contract PDFs.
//!
//! The workflow runs three steps in sequence:
//!
//! 1. **Ingestion**: PDFs are converted, chunked by heading, and uploaded to
//!    a Weaviate collection vectorised with `text2vec-openai`.
//! 2. **Retrieval**: an agent with a vector search tool gathers the passages
//!    relevant to the question, with file, section and page citations.
//! 3. **Report**: a second agent writes a [`flow::Report`] from those
//!    passages using schema-constrained output.
//!
//! An optional evaluation hook scores the report for hallucinations against
//! the retrieved passages.
//!
//! ## Example
//!
//! ```no_run
//! use contract_flow::flow::{ContractAnalysisFlow, FlowConfig};
//!
//! # async fn demo() -> contract_flow::Result<()> {
//! let config = FlowConfig::from_env()?.with_query("what is the warranty period?");
//! let outcome = ContractAnalysisFlow::from_config(config)?.run().await?;
//! println!("{}", outcome.state.report.body);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod error;
pub mod eval;
pub mod flow;
pub mod ingest;
pub mod vectorstore;

pub use error::{Error, Result};
pub use flow::{ContractAnalysisFlow, FlowConfig, Report, WorkflowState};
