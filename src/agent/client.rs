//! Backend selection from configuration.

use crate::agent::config::AgentConfig;
use crate::agent::provider::LlmProvider;
use crate::agent::providers::OpenAiProvider;
use crate::error::AgentError;

/// Returns the backend named by [`AgentConfig::provider`].
///
/// Only `"openai"` is known; it also covers compatible endpoints reached
/// through `base_url`.
///
/// # Errors
///
/// [`AgentError::UnsupportedProvider`] for any other name.
pub fn create_provider(config: &AgentConfig) -> Result<Box<dyn LlmProvider>, AgentError> {
    if config.provider == "openai" {
        return Ok(Box::new(OpenAiProvider::new(config)));
    }
    Err(AgentError::UnsupportedProvider {
        name: config.provider.clone(),
    })
}
