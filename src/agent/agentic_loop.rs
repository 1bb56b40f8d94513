//! Tool-calling rounds between a model and the tools bound to an agent.
//!
//! Each round sends the conversation, answers every requested tool call and
//! appends both sides to the request. The first text answer ends the loop.

use tracing::debug;

use super::executor::ToolExecutor;
use super::message::{ChatRequest, ChatResponse, assistant_tool_calls_message, tool_message};
use super::provider::LlmProvider;
use super::tool::ToolCall;
use crate::error::AgentError;

/// Runs tool rounds until the model answers in text.
///
/// `request` accumulates the assistant and tool turns of every round, so a
/// caller can inspect the full exchange afterwards.
///
/// # Errors
///
/// [`AgentError::ToolLoopExceeded`] once `max_iterations` rounds all ended in
/// tool calls. Provider errors pass through unchanged.
pub async fn agentic_loop(
    provider: &dyn LlmProvider,
    request: &mut ChatRequest,
    executor: &ToolExecutor,
    max_iterations: usize,
) -> Result<ChatResponse, AgentError> {
    for round in 0..max_iterations {
        let mut response = provider.chat(request).await?;
        if response.tool_calls.is_empty() {
            debug!(round, "model answered without tools");
            return Ok(response);
        }

        let calls = std::mem::take(&mut response.tool_calls);
        debug!(round, calls = calls.len(), "model requested tools");
        answer_calls(request, executor, calls).await;
    }

    Err(AgentError::ToolLoopExceeded { max_iterations })
}

async fn answer_calls(
    request: &mut ChatRequest,
    executor: &ToolExecutor,
    calls: Vec<ToolCall>,
) {
    let mut replies = Vec::with_capacity(calls.len());
    for call in &calls {
        let result = executor.execute(call).await;
        debug!(
            tool = call.name,
            call_id = call.id,
            is_error = result.is_error,
            "tool answered"
        );
        replies.push(tool_message(&result.tool_call_id, &result.content));
    }
    request.messages.push(assistant_tool_calls_message(calls));
    request.messages.extend(replies);
}
