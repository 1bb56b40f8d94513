//! Conversation types shared by the agents and the hallucination judge.
//!
//! Nothing here depends on a vendor SDK; the provider backends translate
//! these into their own request types.

use serde::{Deserialize, Serialize};

use super::tool::{ToolCall, ToolDefinition};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Agent profile.
    System,
    /// Task text.
    User,
    /// Model output.
    Assistant,
    /// Search results handed back to the model.
    Tool,
}

/// One turn of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author.
    pub role: Role,
    /// Turn text; empty for tool-call-only assistant turns.
    pub content: String,
    /// Set on assistant turns that request tools.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Set on tool turns; names the call being answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// A JSON schema the model output must conform to.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredOutput {
    /// Schema name sent to the provider.
    pub name: String,
    /// JSON Schema object.
    pub schema: serde_json::Value,
}

/// Everything a backend needs for one completion.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model identifier (e.g., "gpt-4o").
    pub model: String,
    /// Conversation so far, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature (0.0-2.0).
    pub temperature: Option<f32>,
    /// Completion token cap.
    pub max_tokens: Option<u32>,
    /// Ask for a bare JSON object (the judge uses this).
    pub json_mode: bool,
    /// Constrain output to a JSON schema. Takes precedence over `json_mode`.
    pub structured_output: Option<StructuredOutput>,
    /// Tools the model may call.
    pub tools: Vec<ToolDefinition>,
}

/// Token counts reported for one completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt side.
    pub prompt_tokens: u32,
    /// Generated side.
    pub completion_tokens: u32,
    /// Sum of both.
    pub total_tokens: u32,
}

/// What the model sent back for one request.
///
/// A response carries either text or tool calls. The retrieval loop keeps
/// going while `tool_calls` is non-empty.
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    /// Text answer, empty when the model asked for tools.
    pub content: String,
    /// Token accounting for this call.
    pub usage: TokenUsage,
    /// Requested tool invocations, in the order the model listed them.
    pub tool_calls: Vec<ToolCall>,
    /// Lowercased stop reason, e.g. `"stop"` or `"tool_calls"`.
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    /// Replaces the usage figures.
    #[must_use]
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }
}

impl ChatMessage {
    fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

/// System turn carrying an agent's role, goal and backstory.
#[must_use]
pub fn system_message(content: &str) -> ChatMessage {
    ChatMessage::new(Role::System, content)
}

/// User turn carrying a task.
#[must_use]
pub fn user_message(content: &str) -> ChatMessage {
    ChatMessage::new(Role::User, content)
}

/// Assistant turn that only requests tool invocations.
#[must_use]
pub fn assistant_tool_calls_message(tool_calls: Vec<ToolCall>) -> ChatMessage {
    ChatMessage {
        tool_calls,
        ..ChatMessage::new(Role::Assistant, "")
    }
}

/// Tool turn answering the call identified by `tool_call_id`.
#[must_use]
pub fn tool_message(tool_call_id: &str, content: &str) -> ChatMessage {
    ChatMessage {
        tool_call_id: Some(tool_call_id.to_string()),
        ..ChatMessage::new(Role::Tool, content)
    }
}

/// Returns the JSON inside a Markdown code fence, or the trimmed input.
#[must_use]
pub fn strip_json_fence(content: &str) -> &str {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    trimmed
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}
