//! The seam between agents and whichever model vendor serves them.

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse};
use crate::error::AgentError;

/// A chat-completion backend.
///
/// Agents, the hallucination judge and the tests' scripted models all talk
/// through this trait, so none of them depends on a vendor SDK.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Backend identifier, e.g. `"openai"`.
    fn name(&self) -> &'static str;

    /// Sends one request and returns the model's turn.
    ///
    /// # Errors
    ///
    /// [`AgentError::ApiRequest`] when the backend call fails.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError>;
}
