//! Settings for the two pipeline agents and the hallucination judge.
//!
//! Values set on the builder win over the environment, which wins over the
//! defaults below. Each role has its own model; models are never read from
//! the environment.

use std::path::PathBuf;

use crate::error::AgentError;

/// Model used by the retrieval agent.
pub const DEFAULT_RETRIEVAL_MODEL: &str = "gpt-4o";
/// Model used by the report generation agent.
pub const DEFAULT_REPORT_MODEL: &str = "gpt-4o-mini";
/// Model used by the hallucination judge.
pub const DEFAULT_EVAL_MODEL: &str = "gpt-4o";

/// Default retrieval max tokens. Retrieval output is verbatim contract text,
/// so it is allowed to run long.
const DEFAULT_RETRIEVAL_MAX_TOKENS: u32 = 8192;
/// Default report max tokens.
const DEFAULT_REPORT_MAX_TOKENS: u32 = 4096;
/// Default judge max tokens.
const DEFAULT_EVAL_MAX_TOKENS: u32 = 1024;
/// Search rounds the retrieval agent may take.
const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;

/// Model access and per-role limits.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Backend name; only `"openai"` is built in.
    pub provider: String,
    /// `OPENAI_API_KEY`.
    pub api_key: String,
    /// `OPENAI_BASE_URL`, for proxies and compatible servers.
    pub base_url: Option<String>,
    /// Model for the retrieval agent.
    pub retrieval_model: String,
    /// Model for the report generation agent.
    pub report_model: String,
    /// Model for the hallucination judge.
    pub eval_model: String,
    /// Maximum tokens for retrieval responses.
    pub retrieval_max_tokens: u32,
    /// Maximum tokens for report responses.
    pub report_max_tokens: u32,
    /// Maximum tokens for judge responses.
    pub eval_max_tokens: u32,
    /// Search rounds allowed before the retrieval step fails.
    pub max_tool_iterations: usize,
    /// Folder of prompt overrides (`retrieval.md`, `report.md`, `hallucination.md`).
    ///
    /// Missing files fall back to the compiled-in prompts.
    pub prompt_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Starts an empty builder.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Reads the environment and fills in defaults.
    ///
    /// # Errors
    ///
    /// [`AgentError::ApiKeyMissing`] when `OPENAI_API_KEY` is unset.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Incremental [`AgentConfig`] construction.
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    retrieval_model: Option<String>,
    report_model: Option<String>,
    eval_model: Option<String>,
    retrieval_max_tokens: Option<u32>,
    report_max_tokens: Option<u32>,
    eval_max_tokens: Option<u32>,
    max_tool_iterations: Option<usize>,
    prompt_dir: Option<PathBuf>,
}

impl AgentConfigBuilder {
    /// Fills fields still unset from `CONTRACT_FLOW_PROVIDER`, `OPENAI_API_KEY`,
    /// `OPENAI_BASE_URL` and `CONTRACT_FLOW_PROMPT_DIR`.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        self.provider = self.provider.or_else(|| var("CONTRACT_FLOW_PROVIDER"));
        self.api_key = self.api_key.or_else(|| var("OPENAI_API_KEY"));
        self.base_url = self.base_url.or_else(|| var("OPENAI_BASE_URL"));
        self.prompt_dir = self
            .prompt_dir
            .or_else(|| var("CONTRACT_FLOW_PROMPT_DIR").map(PathBuf::from));
        self
    }

    /// Backend name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Key sent with every model call.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Endpoint replacing the public `OpenAI` API.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the retrieval model.
    #[must_use]
    pub fn retrieval_model(mut self, model: impl Into<String>) -> Self {
        self.retrieval_model = Some(model.into());
        self
    }

    /// Sets the report model.
    #[must_use]
    pub fn report_model(mut self, model: impl Into<String>) -> Self {
        self.report_model = Some(model.into());
        self
    }

    /// Sets the hallucination judge model.
    #[must_use]
    pub fn eval_model(mut self, model: impl Into<String>) -> Self {
        self.eval_model = Some(model.into());
        self
    }

    /// Sets the retrieval max tokens.
    #[must_use]
    pub const fn retrieval_max_tokens(mut self, n: u32) -> Self {
        self.retrieval_max_tokens = Some(n);
        self
    }

    /// Sets the report max tokens.
    #[must_use]
    pub const fn report_max_tokens(mut self, n: u32) -> Self {
        self.report_max_tokens = Some(n);
        self
    }

    /// Sets the judge max tokens.
    #[must_use]
    pub const fn eval_max_tokens(mut self, n: u32) -> Self {
        self.eval_max_tokens = Some(n);
        self
    }

    /// Search round limit.
    #[must_use]
    pub const fn max_tool_iterations(mut self, n: usize) -> Self {
        self.max_tool_iterations = Some(n);
        self
    }

    /// Prompt override folder.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Finishes the configuration.
    ///
    /// # Errors
    ///
    /// [`AgentError::ApiKeyMissing`] without a key.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self.api_key.ok_or(AgentError::ApiKeyMissing)?;

        Ok(AgentConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self.base_url,
            retrieval_model: self
                .retrieval_model
                .unwrap_or_else(|| DEFAULT_RETRIEVAL_MODEL.to_string()),
            report_model: self
                .report_model
                .unwrap_or_else(|| DEFAULT_REPORT_MODEL.to_string()),
            eval_model: self
                .eval_model
                .unwrap_or_else(|| DEFAULT_EVAL_MODEL.to_string()),
            retrieval_max_tokens: self
                .retrieval_max_tokens
                .unwrap_or(DEFAULT_RETRIEVAL_MAX_TOKENS),
            report_max_tokens: self.report_max_tokens.unwrap_or(DEFAULT_REPORT_MAX_TOKENS),
            eval_max_tokens: self.eval_max_tokens.unwrap_or(DEFAULT_EVAL_MAX_TOKENS),
            max_tool_iterations: self
                .max_tool_iterations
                .unwrap_or(DEFAULT_MAX_TOOL_ITERATIONS),
            prompt_dir: self.prompt_dir,
        })
    }
}
