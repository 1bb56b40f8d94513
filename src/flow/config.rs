//! Workflow configuration.

use std::path::PathBuf;

use crate::agent::config::AgentConfig;
use crate::error::AgentError;
use crate::vectorstore::VectorStoreConfig;

/// Question asked when none is given.
pub const DEFAULT_QUERY: &str = "how are warranties defined in digitalcinemadestination?";

/// Folder scanned for contract PDFs when none is given.
pub const DEFAULT_CONTRACTS_DIR: &str = "knowledge/contracts/";

/// Settings for one workflow run.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Agent layer settings.
    pub agent: AgentConfig,
    /// Vector store settings.
    pub store: VectorStoreConfig,
    /// Folder containing the contract PDFs.
    pub contracts_dir: PathBuf,
    /// Question to answer.
    pub query: String,
    /// Whether to register the hallucination listener.
    pub evaluate: bool,
}

impl FlowConfig {
    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no OpenAI key is set.
    pub fn from_env() -> Result<Self, AgentError> {
        Ok(Self::new(AgentConfig::from_env()?, VectorStoreConfig::from_env()))
    }

    /// Creates configuration with the default query and folder.
    #[must_use]
    pub fn new(agent: AgentConfig, store: VectorStoreConfig) -> Self {
        Self {
            agent,
            store,
            contracts_dir: PathBuf::from(DEFAULT_CONTRACTS_DIR),
            query: DEFAULT_QUERY.to_string(),
            evaluate: true,
        }
    }

    /// Replaces the query.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Replaces the contracts folder.
    #[must_use]
    pub fn with_contracts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.contracts_dir = dir.into();
        self
    }

    /// Enables or disables hallucination scoring.
    #[must_use]
    pub const fn with_evaluation(mut self, evaluate: bool) -> Self {
        self.evaluate = evaluate;
        self
    }
}
