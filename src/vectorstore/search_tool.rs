//! Vector search exposed as an agent tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::weaviate::{SearchHit, VectorStore};
use crate::agent::tool::{Tool, ToolDefinition};
use crate::error::AgentError;

/// Name the model uses to call the tool.
pub const SEARCH_TOOL_NAME: &str = "weaviate_vector_search";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

/// Semantic search over the contracts collection.
pub struct VectorSearchTool {
    store: Arc<dyn VectorStore>,
    limit: usize,
}

impl VectorSearchTool {
    /// Creates a tool returning at most `limit` passages per call.
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, limit: usize) -> Self {
        Self {
            store,
            limit: limit.max(1),
        }
    }

    /// Runs a search and returns the matching passages.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ToolExecution`] if the store fails.
    pub async fn hits(&self, query: &str) -> Result<Vec<SearchHit>, AgentError> {
        let hits = self
            .store
            .near_text(query, self.limit)
            .await
            .map_err(|e| tool_error(e.to_string()))?;
        debug!(query, hits = hits.len(), "vector search complete");
        Ok(hits)
    }

    /// Runs a search and returns the hits as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ToolExecution`] if the store fails.
    pub async fn search(&self, query: &str) -> Result<String, AgentError> {
        let hits = self.hits(query).await?;
        serde_json::to_string(&hits).map_err(|e| tool_error(e.to_string()))
    }
}

fn tool_error(message: String) -> AgentError {
    AgentError::ToolExecution {
        name: SEARCH_TOOL_NAME.to_string(),
        message,
    }
}

#[async_trait]
impl Tool for VectorSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Searches the contracts collection for passages semantically similar \
                          to the query. Returns matching text with source file, section heading \
                          and page number."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Natural-language text to search for"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn invoke(&self, arguments: &str) -> Result<String, AgentError> {
        let args: SearchArgs = serde_json::from_str(arguments)
            .map_err(|e| tool_error(format!("invalid arguments: {e}")))?;
        if args.query.trim().is_empty() {
            return Err(tool_error("query must not be empty".to_string()));
        }
        self.search(&args.query).await
    }
}
