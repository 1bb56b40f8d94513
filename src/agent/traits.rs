//! The [`Agent`] trait shared by the retrieval and report agents.

use async_trait::async_trait;

use super::executor::ToolExecutor;
use super::message::{
    ChatRequest, ChatResponse, StructuredOutput, TokenUsage, system_message, user_message,
};
use super::provider::LlmProvider;
use crate::error::AgentError;

/// Final answer of an agent run.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// Text produced by the last model call.
    pub content: String,
    /// Usage of the last model call.
    pub usage: TokenUsage,
    /// Stop reason of the last model call.
    pub finish_reason: Option<String>,
}

impl From<ChatResponse> for AgentResponse {
    fn from(response: ChatResponse) -> Self {
        Self {
            content: response.content,
            usage: response.usage,
            finish_reason: response.finish_reason,
        }
    }
}

/// A role bound to a model.
///
/// Implementors supply the identity; request construction and the plain
/// single-call path come for free. Tool use goes through
/// [`execute_with_tools`].
#[async_trait]
pub trait Agent: Send + Sync {
    /// Name used in log lines.
    fn name(&self) -> &'static str;

    /// Model the agent calls.
    fn model(&self) -> &str;

    /// Rendered role, goal and backstory.
    fn system_prompt(&self) -> &str;

    /// Schema the answer must satisfy, if any.
    fn output_schema(&self) -> Option<StructuredOutput> {
        None
    }

    /// Sampling temperature.
    fn temperature(&self) -> f32 {
        0.0
    }

    /// Completion token cap.
    fn max_tokens(&self) -> u32 {
        2048
    }

    /// Tool rounds allowed before giving up.
    fn max_tool_iterations(&self) -> usize {
        10
    }

    /// System turn plus the task as the user turn.
    fn build_request(&self, task: &str) -> ChatRequest {
        ChatRequest {
            model: self.model().to_string(),
            messages: vec![system_message(self.system_prompt()), user_message(task)],
            temperature: Some(self.temperature()),
            max_tokens: Some(self.max_tokens()),
            json_mode: false,
            structured_output: self.output_schema(),
            tools: Vec::new(),
        }
    }

    /// Sends the task in a single call without tools.
    ///
    /// # Errors
    ///
    /// Whatever the provider returns.
    async fn execute(
        &self,
        provider: &dyn LlmProvider,
        task: &str,
    ) -> Result<AgentResponse, AgentError> {
        let request = self.build_request(task);
        Ok(provider.chat(&request).await?.into())
    }
}

/// Runs `agent` on `task`, letting it call the tools bound in `executor`.
///
/// With no tools bound this is [`Agent::execute`].
///
/// # Errors
///
/// Provider failures, or [`AgentError::ToolLoopExceeded`] when the agent
/// keeps calling tools past its round limit.
pub async fn execute_with_tools(
    agent: &dyn Agent,
    provider: &dyn LlmProvider,
    task: &str,
    executor: &ToolExecutor,
) -> Result<AgentResponse, AgentError> {
    if executor.is_empty() {
        return agent.execute(provider, task).await;
    }

    let mut request = agent.build_request(task);
    request.tools = executor.definitions();
    tracing::debug!(agent = agent.name(), tools = request.tools.len(), "running with tools");

    super::agentic_loop::agentic_loop(
        provider,
        &mut request,
        executor,
        agent.max_tool_iterations(),
    )
    .await
    .map(AgentResponse::from)
}
