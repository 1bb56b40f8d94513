//! Function-calling types and the [`Tool`] trait.
//!
//! The retrieval agent's vector search is the one tool in the pipeline; it
//! implements [`Tool`] so the executor can advertise and dispatch it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// How a tool is advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name the model uses to call it and the executor dispatches on.
    pub name: String,
    /// Shown to the model when it decides whether to call the tool.
    pub description: String,
    /// JSON Schema of the argument object.
    pub parameters: serde_json::Value,
}

/// One invocation the model asked for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned id, echoed back in the reply.
    pub id: String,
    /// Tool to run.
    pub name: String,
    /// Raw JSON argument text as the model wrote it.
    pub arguments: String,
}

/// What goes back to the model for one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Id of the call being answered.
    pub tool_call_id: String,
    /// Serialized hits, or the error text.
    pub content: String,
    /// Set when `content` is an error message.
    pub is_error: bool,
}

/// A capability an agent can invoke through function-calling.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Schema advertised to the model.
    fn definition(&self) -> ToolDefinition;

    /// Runs the tool with the model-supplied JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ToolExecution`] for invalid arguments or
    /// backend failures. The executor turns these into error results.
    async fn invoke(&self, arguments: &str) -> Result<String, AgentError>;
}
