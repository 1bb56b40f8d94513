//! Retrieval agent.
//!
//! Answers the user query by calling the vector search tool and returning
//! the retrieved passages with their citations, unsummarised.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::config::AgentConfig;
use super::executor::ToolExecutor;
use super::prompt::build_retrieval_task;
use super::provider::LlmProvider;
use super::tool::Tool;
use super::traits::{Agent, execute_with_tools};
use crate::error::AgentError;

/// Agent bound to the vector search tool.
pub struct RetrievalAgent {
    model: String,
    max_tokens: u32,
    max_tool_iterations: usize,
    system_prompt: String,
    executor: ToolExecutor,
}

impl RetrievalAgent {
    /// Creates a retrieval agent with `search` as its only tool.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String, search: Arc<dyn Tool>) -> Self {
        Self {
            model: config.retrieval_model.clone(),
            max_tokens: config.retrieval_max_tokens,
            max_tool_iterations: config.max_tool_iterations,
            system_prompt,
            executor: ToolExecutor::new().with_tool(search),
        }
    }

    /// Runs the retrieval task for `query` and returns the agent's raw output.
    ///
    /// # Errors
    ///
    /// Returns provider errors or [`AgentError::ToolLoopExceeded`].
    pub async fn retrieve(
        &self,
        provider: &dyn LlmProvider,
        query: &str,
    ) -> Result<String, AgentError> {
        let response =
            execute_with_tools(self, provider, &build_retrieval_task(query), &self.executor)
                .await?;
        debug!(
            tokens = response.usage.total_tokens,
            chars = response.content.len(),
            "retrieval agent responded"
        );
        Ok(response.content)
    }
}

#[async_trait]
impl Agent for RetrievalAgent {
    fn name(&self) -> &'static str {
        "retrieval"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn max_tool_iterations(&self) -> usize {
        self.max_tool_iterations
    }
}
