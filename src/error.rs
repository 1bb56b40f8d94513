//! Error types for contract-flow.
//!
//! Each layer has its own error enum; [`Error`] unifies them for the CLI
//! and the workflow driver.

use thiserror::Error;

/// Result type alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// LLM agent failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Vector store failure.
    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),

    /// Document ingestion failure.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Hallucination evaluation failure.
    #[error(transparent)]
    Eval(#[from] EvalError),

    /// Workflow sequencing failure.
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// CLI command failure.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// I/O failure outside of ingestion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the agent layer.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key configured for the LLM provider.
    #[error("no API key configured (set OPENAI_API_KEY)")]
    ApiKeyMissing,

    /// Unknown provider name in configuration.
    #[error("unsupported LLM provider: {name}")]
    UnsupportedProvider {
        /// Provider name that was requested.
        name: String,
    },

    /// The provider rejected or failed the request.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Provider error message.
        message: String,
        /// HTTP status, when known.
        status: Option<u16>,
    },

    /// A tool call could not be executed.
    #[error("tool '{name}' failed: {message}")]
    ToolExecution {
        /// Tool name.
        name: String,
        /// Failure description.
        message: String,
    },

    /// The model kept requesting tools past the iteration limit.
    #[error("tool-calling loop exceeded {max_iterations} iterations")]
    ToolLoopExceeded {
        /// Configured iteration limit.
        max_iterations: usize,
    },

    /// The model output did not match the expected shape.
    #[error("failed to parse response: {message}")]
    ResponseParse {
        /// Parse failure description.
        message: String,
        /// Raw model output.
        content: String,
    },

    /// The parsed report violates a content rule.
    #[error("invalid report: {message}")]
    InvalidReport {
        /// Validation failure description.
        message: String,
    },
}

/// Errors raised by the vector store client.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    /// The service could not be reached or is misconfigured.
    #[error("failed to connect to vector store: {message}")]
    Connection {
        /// Failure description.
        message: String,
    },

    /// The service answered but reported it is not ready.
    #[error("vector store at {url} is not ready")]
    NotReady {
        /// Cluster URL that was checked.
        url: String,
    },

    /// The service returned an unexpected HTTP status.
    #[error("vector store request to {endpoint} failed with status {status}: {body}")]
    Status {
        /// Endpoint path.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// A query returned errors or an unreadable payload.
    #[error("vector store query failed: {message}")]
    Query {
        /// Failure description.
        message: String,
    },

    /// The connection was used after being released.
    #[error("vector store connection is closed")]
    Closed,
}

impl From<reqwest::Error> for VectorStoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Connection {
            message: err.to_string(),
        }
    }
}

/// Errors raised while ingesting contract documents.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Reading the contracts folder or a file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path being read.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The document converter could not process a file.
    #[error("failed to convert {path}: {message}")]
    Conversion {
        /// Path of the document.
        path: String,
        /// Converter error message.
        message: String,
    },

    /// Vector store failure during ingestion.
    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),
}

/// Errors raised by the hallucination evaluator.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The judge model call failed.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// The judge output could not be read as a score.
    #[error("unreadable hallucination score: {message}")]
    Score {
        /// Failure description.
        message: String,
        /// Raw judge output.
        content: String,
    },
}

/// Errors raised by the workflow driver.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A step was started before its inputs were written.
    #[error("step '{step}' cannot run: {missing} has not been produced")]
    StepOrder {
        /// Step that was about to run.
        step: &'static str,
        /// State field that is missing.
        missing: &'static str,
    },
}

/// Errors raised by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command failed to execute.
    #[error("{0}")]
    ExecutionFailed(String),

    /// An argument value was not recognised.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
