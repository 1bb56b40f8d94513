//! Tool executor that dispatches tool calls to registered [`Tool`]s.
//!
//! Tool failures never abort the agent: they come back to the model as
//! error results so it can correct its arguments.

use std::sync::Arc;

use tracing::debug;

use super::tool::{Tool, ToolCall, ToolDefinition, ToolResult};
use crate::error::AgentError;

/// Maximum raw byte length of tool argument JSON from the LLM.
const MAX_TOOL_ARGS_LEN: usize = 100_000;

/// Dispatches tool calls by name to the tools bound to an agent.
#[derive(Clone, Default)]
pub struct ToolExecutor {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolExecutor {
    /// Creates an executor with no tools.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a tool to this executor.
    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Returns `true` if no tools are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions of every bound tool, in binding order.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Dispatches a tool call to the matching tool.
    ///
    /// Validates raw argument size before dispatch to prevent oversized payloads.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        if call.arguments.len() > MAX_TOOL_ARGS_LEN {
            return ToolResult {
                tool_call_id: call.id.clone(),
                content: format!(
                    "tool arguments too large ({} bytes, max {MAX_TOOL_ARGS_LEN})",
                    call.arguments.len()
                ),
                is_error: true,
            };
        }

        let tool = self.tools.iter().find(|t| t.definition().name == call.name);
        let result = match tool {
            Some(tool) => tool.invoke(&call.arguments).await,
            None => Err(AgentError::ToolExecution {
                name: call.name.clone(),
                message: "unknown tool".to_string(),
            }),
        };

        match result {
            Ok(content) => ToolResult {
                tool_call_id: call.id.clone(),
                content,
                is_error: false,
            },
            Err(e) => {
                debug!(tool = call.name, error = %e, "tool call failed");
                ToolResult {
                    tool_call_id: call.id.clone(),
                    content: e.to_string(),
                    is_error: true,
                }
            }
        }
    }
}

impl std::fmt::Debug for ToolExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.tools.iter().map(|t| t.definition().name).collect();
        f.debug_struct("ToolExecutor").field("tools", &names).finish()
    }
}
