//! LLM agents for the contract analysis workflow.
//!
//! Provides the retrieval and report agents on top of a pluggable provider
//! abstraction backed by OpenAI-compatible APIs.
//!
//! # Architecture
//!
//! ```text
//! query → RetrievalAgent ──tool calls──▶ weaviate_vector_search
//!            │
//!            ▼ contract analysis (verbatim passages + citations)
//!         ReportAgent ──JSON schema──▶ Report { report, source_citations }
//! ```

pub mod agentic_loop;
pub mod client;
pub mod config;
pub mod executor;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod report;
pub mod retrieval;
pub mod tool;
pub mod traits;

// Re-export key types
pub use client::create_provider;
pub use config::AgentConfig;
pub use executor::ToolExecutor;
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, StructuredOutput, TokenUsage};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use report::ReportAgent;
pub use retrieval::RetrievalAgent;
pub use tool::{Tool, ToolCall, ToolDefinition, ToolResult};
pub use traits::{Agent, AgentResponse, execute_with_tools};
