//! Workflow driver.
//!
//! Runs the three pipeline steps as an explicit state machine:
//!
//! ```text
//! Ingesting ──pre_process_documents──▶ Retrieving
//! Retrieving ──generate_contract_analysis──▶ Reporting
//! Reporting ──generate_report──▶ Done
//! ```
//!
//! Each step completes before the next begins and any step error ends the
//! run. Hooks are notified after every step.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info};

use super::config::FlowConfig;
use super::events::{HookChain, StepEvent, StepHook};
use super::state::{StepName, StepOutput, WorkflowState};
use crate::agent::client::create_provider;
use crate::agent::prompt::PromptSet;
use crate::agent::provider::LlmProvider;
use crate::agent::report::ReportAgent;
use crate::agent::retrieval::RetrievalAgent;
use crate::error::{Error, FlowError, Result};
use crate::eval::{EvalListener, HallucinationMetric};
use crate::ingest::ContractProcessingService;
use crate::vectorstore::{ConnectionGuard, StoreConnector, VectorSearchTool};

/// Phase of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPhase {
    /// Loading contracts into the vector store.
    Ingesting,
    /// Running the retrieval agent.
    Retrieving,
    /// Running the report agent.
    Reporting,
    /// Run finished.
    Done,
}

/// An edge of the workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Phase the step runs in.
    pub from: FlowPhase,
    /// Step run in that phase.
    pub step: StepName,
    /// Phase entered once the step completes.
    pub to: FlowPhase,
}

/// Every transition, in execution order. The graph is a linear chain.
pub const TRANSITIONS: [Transition; 3] = [
    Transition {
        from: FlowPhase::Ingesting,
        step: StepName::PreProcessDocuments,
        to: FlowPhase::Retrieving,
    },
    Transition {
        from: FlowPhase::Retrieving,
        step: StepName::GenerateContractAnalysis,
        to: FlowPhase::Reporting,
    },
    Transition {
        from: FlowPhase::Reporting,
        step: StepName::GenerateReport,
        to: FlowPhase::Done,
    },
];

/// Returns the transition leaving `phase`, or `None` once done.
#[must_use]
pub fn transition_from(phase: FlowPhase) -> Option<Transition> {
    TRANSITIONS.iter().copied().find(|t| t.from == phase)
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct FlowOutcome {
    /// Final workflow state.
    pub state: WorkflowState,
    /// Chunks submitted during ingestion.
    pub chunks_ingested: usize,
    /// Wall-clock duration in milliseconds.
    pub elapsed_ms: u64,
}

/// Contract analysis workflow.
pub struct ContractAnalysisFlow {
    config: FlowConfig,
    provider: Arc<dyn LlmProvider>,
    connector: Arc<dyn StoreConnector>,
    ingestion: ContractProcessingService,
    prompts: PromptSet,
    hooks: HookChain,
}

impl ContractAnalysisFlow {
    /// Creates a workflow with explicit provider and store connector.
    ///
    /// Loads prompt templates from [`crate::agent::AgentConfig::prompt_dir`],
    /// falling back to compiled-in defaults. No hooks are registered.
    pub fn new(
        config: FlowConfig,
        provider: Arc<dyn LlmProvider>,
        connector: Arc<dyn StoreConnector>,
    ) -> Self {
        let prompts = PromptSet::load(config.agent.prompt_dir.as_deref());
        Self {
            config,
            provider,
            connector,
            ingestion: ContractProcessingService::default(),
            prompts,
            hooks: HookChain::new(),
        }
    }

    /// Creates a workflow backed by the configured LLM provider and Weaviate
    /// cluster, with the hallucination listener registered when
    /// [`FlowConfig::evaluate`] is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unsupported.
    pub fn from_config(config: FlowConfig) -> Result<Self> {
        let provider: Arc<dyn LlmProvider> = Arc::from(create_provider(&config.agent)?);
        let connector: Arc<dyn StoreConnector> = Arc::new(config.store.clone());
        let evaluate = config.evaluate;

        let mut flow = Self::new(config, provider, connector);
        if evaluate {
            let metric = HallucinationMetric::new(
                Arc::clone(&flow.provider),
                &flow.config.agent,
                flow.prompts.hallucination.clone(),
            );
            flow.add_hook(EvalListener::new(metric).shared());
        }
        Ok(flow)
    }

    /// Replaces the ingestion service.
    #[must_use]
    pub fn with_ingestion(mut self, ingestion: ContractProcessingService) -> Self {
        self.ingestion = ingestion;
        self
    }

    /// Registers a hook notified after every step.
    pub fn add_hook(&mut self, hook: Arc<dyn StepHook>) {
        self.hooks.push(hook);
    }

    /// Configuration the workflow was built with.
    #[must_use]
    pub const fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Runs every step in order.
    ///
    /// # Errors
    ///
    /// Returns the first step error. Hook errors are logged and ignored.
    pub async fn run(&self) -> Result<FlowOutcome> {
        let start = Instant::now();
        let mut state = WorkflowState::new(self.config.query.clone());
        let mut phase = FlowPhase::Ingesting;
        let mut chunks_ingested = 0;

        info!(query = %state.query, "starting contract analysis");

        while let Some(transition) = transition_from(phase) {
            let output = match self.run_step(transition.step, &mut state).await {
                Ok(output) => output,
                Err(e) => {
                    error!(step = %transition.step, error = %e, "step failed");
                    return Err(e);
                }
            };
            if let StepOutput::Ingested { chunks } = output {
                chunks_ingested = chunks;
            }

            let event = StepEvent {
                step: transition.step,
                output,
            };
            self.hooks.dispatch(&event, &state).await;
            phase = transition.to;
        }

        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(elapsed_ms, "contract analysis complete");

        Ok(FlowOutcome {
            state,
            chunks_ingested,
            elapsed_ms,
        })
    }

    async fn run_step(&self, step: StepName, state: &mut WorkflowState) -> Result<StepOutput> {
        info!(step = %step, "running step");
        match step {
            StepName::PreProcessDocuments => self.pre_process_documents().await,
            StepName::GenerateContractAnalysis => self.generate_contract_analysis(state).await,
            StepName::GenerateReport => self.generate_report(state).await,
        }
    }

    /// Ingests the contracts folder into the vector store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Ingest`] on connection, folder or conversion failures.
    pub async fn pre_process_documents(&self) -> Result<StepOutput> {
        let chunks = self
            .ingestion
            .process_contracts(&self.config.contracts_dir, self.connector.as_ref())
            .await?;
        Ok(StepOutput::Ingested { chunks })
    }

    /// Runs the retrieval agent and stores its raw output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VectorStore`] if no connection can be opened, or
    /// [`Error::Agent`] if the agent fails.
    pub async fn generate_contract_analysis(
        &self,
        state: &mut WorkflowState,
    ) -> Result<StepOutput> {
        let guard = ConnectionGuard::new(self.connector.connect()?);
        let tool = VectorSearchTool::new(
            Arc::clone(guard.store()),
            self.config.store.search_limit,
        );
        let agent = RetrievalAgent::new(
            &self.config.agent,
            self.prompts.retrieval.clone(),
            Arc::new(tool),
        );

        let analysis = agent.retrieve(self.provider.as_ref(), &state.query).await?;
        state.contract_analysis.clone_from(&analysis);
        Ok(StepOutput::Analysis { text: analysis })
    }

    /// Runs the report agent on the stored analysis and stores the report.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::StepOrder`] if no analysis has been produced, or
    /// [`Error::Agent`] if generation or validation fails.
    pub async fn generate_report(&self, state: &mut WorkflowState) -> Result<StepOutput> {
        if state.contract_analysis.trim().is_empty() {
            return Err(Error::Flow(FlowError::StepOrder {
                step: StepName::GenerateReport.as_str(),
                missing: "contract_analysis",
            }));
        }

        let agent = ReportAgent::new(&self.config.agent, self.prompts.report.clone());
        let report = agent
            .generate(self.provider.as_ref(), &state.contract_analysis)
            .await?;
        state.report = report.clone();
        Ok(StepOutput::Report(report))
    }
}

impl std::fmt::Debug for ContractAnalysisFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractAnalysisFlow")
            .field("config", &self.config)
            .field("provider", &self.provider.name())
            .field("store", &self.connector.location())
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::AgentConfig;
    use crate::agent::message::{ChatRequest, ChatResponse, Role, TokenUsage};
    use crate::agent::tool::ToolCall;
    use crate::error::{AgentError, VectorStoreError};
    use crate::ingest::{ConvertedDocument, DocItem, DocumentConverter, HybridChunker};
    use crate::vectorstore::{
        BatchSummary, ContractChunk, SearchHit, VectorStore, VectorStoreConfig,
    };
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct MemoryStore {
        chunks: Mutex<Vec<ContractChunk>>,
        closes: AtomicUsize,
        not_ready: AtomicBool,
    }

    #[async_trait]
    impl VectorStore for MemoryStore {
        async fn is_ready(&self) -> std::result::Result<bool, VectorStoreError> {
            Ok(!self.not_ready.load(Ordering::SeqCst))
        }

        async fn collection_exists(&self) -> std::result::Result<bool, VectorStoreError> {
            Ok(true)
        }

        async fn create_collection(&self) -> std::result::Result<(), VectorStoreError> {
            Ok(())
        }

        async fn insert_many(
            &self,
            chunks: &[ContractChunk],
        ) -> std::result::Result<BatchSummary, VectorStoreError> {
            if let Ok(mut stored) = self.chunks.lock() {
                stored.extend_from_slice(chunks);
            }
            Ok(BatchSummary {
                submitted: chunks.len(),
                failed: 0,
            })
        }

        async fn near_text(
            &self,
            _query: &str,
            limit: usize,
        ) -> std::result::Result<Vec<SearchHit>, VectorStoreError> {
            let stored = self.chunks.lock().map(|c| c.clone()).unwrap_or_default();
            Ok(stored
                .into_iter()
                .take(limit)
                .map(|c| SearchHit {
                    text: c.text,
                    source_file: c.source_file,
                    heading: c.heading,
                    page_number: c.page_number,
                    distance: Some(0.1),
                })
                .collect())
        }

        fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct MemoryConnector(Arc<MemoryStore>);

    impl StoreConnector for MemoryConnector {
        fn connect(&self) -> std::result::Result<Arc<dyn VectorStore>, VectorStoreError> {
            Ok(self.0.clone())
        }

        fn location(&self) -> String {
            "memory".to_string()
        }
    }

    struct OneDocConverter;

    impl DocumentConverter for OneDocConverter {
        fn convert(
            &self,
            _path: &Path,
        ) -> std::result::Result<ConvertedDocument, crate::error::IngestError> {
            Ok(ConvertedDocument {
                source: "digitalcinemadestination.pdf".to_string(),
                items: vec![
                    DocItem::heading(1, "7. Warranties", 4),
                    DocItem::paragraph("Licensor warrants the system for 12 months.", 4),
                ],
            })
        }
    }

    /// Scripted model: the retrieval agent searches once and echoes the
    /// results; the report agent answers with a fixed report.
    struct ScriptedModel {
        requests: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl LlmProvider for ScriptedModel {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn chat(
            &self,
            request: &ChatRequest,
        ) -> std::result::Result<ChatResponse, AgentError> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            let content = if request.structured_output.is_some() {
                r#"{"report": "Warranties last 12 months.", "source_citations": ["digitalcinemadestination.pdf, 7. Warranties, page 4"]}"#
                    .to_string()
            } else if let Some(tool_msg) = request.messages.iter().rfind(|m| m.role == Role::Tool) {
                format!("Retrieved passages: {}", tool_msg.content)
            } else {
                return Ok(ChatResponse {
                    content: String::new(),
                    usage: TokenUsage::default(),
                    tool_calls: vec![ToolCall {
                        id: "call_1".to_string(),
                        name: "weaviate_vector_search".to_string(),
                        arguments: r#"{"query":"warranty definition"}"#.to_string(),
                    }],
                    finish_reason: Some("tool_calls".to_string()),
                });
            };
            Ok(ChatResponse {
                content,
                usage: TokenUsage::default(),
                tool_calls: Vec::new(),
                finish_reason: Some("stop".to_string()),
            })
        }
    }

    /// Records every event with a snapshot of the state it saw.
    struct Snapshotter {
        seen: Mutex<Vec<(StepName, WorkflowState)>>,
    }

    #[async_trait]
    impl StepHook for Snapshotter {
        fn name(&self) -> &'static str {
            "snapshot"
        }

        async fn on_step_finished(
            &self,
            event: &StepEvent,
            state: &WorkflowState,
        ) -> Result<()> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push((event.step, state.clone()));
            }
            Ok(())
        }
    }

    fn flow(store: Arc<MemoryStore>, model: Arc<ScriptedModel>) -> (ContractAnalysisFlow, TempDir) {
        let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join("digitalcinemadestination.pdf"), b"%PDF")
            .unwrap_or_else(|_| unreachable!());

        let agent = AgentConfig::builder()
            .api_key("test")
            .prompt_dir("/nonexistent/prompts")
            .build()
            .unwrap_or_else(|_| unreachable!());
        let config = FlowConfig::new(agent, VectorStoreConfig::builder().build())
            .with_contracts_dir(dir.path())
            .with_query("what is the warranty period?");

        let flow = ContractAnalysisFlow::new(config, model, Arc::new(MemoryConnector(store)))
            .with_ingestion(ContractProcessingService::new(
                Box::new(OneDocConverter),
                Box::new(HybridChunker::default()),
            ));
        (flow, dir)
    }

    fn model() -> Arc<ScriptedModel> {
        Arc::new(ScriptedModel {
            requests: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn test_transitions_form_linear_chain() {
        let mut phase = FlowPhase::Ingesting;
        let mut steps = Vec::new();
        while let Some(t) = transition_from(phase) {
            steps.push(t.step);
            phase = t.to;
        }
        assert_eq!(phase, FlowPhase::Done);
        assert_eq!(steps, StepName::ALL);
    }

    #[tokio::test]
    async fn test_run_executes_steps_in_order() {
        let store = Arc::new(MemoryStore::default());
        let model = model();
        let snapshots = Arc::new(Snapshotter {
            seen: Mutex::new(Vec::new()),
        });
        let (mut flow, _dir) = flow(store.clone(), model.clone());
        flow.add_hook(snapshots.clone());

        let outcome = flow.run().await.unwrap_or_else(|e| panic!("run failed: {e}"));

        assert_eq!(outcome.chunks_ingested, 1);
        assert_eq!(outcome.state.query, "what is the warranty period?");
        assert!(outcome.state.contract_analysis.contains("Licensor warrants"));
        assert_eq!(outcome.state.report.body, "Warranties last 12 months.");

        let seen = snapshots.seen.lock().unwrap_or_else(|_| unreachable!());
        let steps: Vec<StepName> = seen.iter().map(|(s, _)| *s).collect();
        assert_eq!(steps, StepName::ALL);
        // Ingestion leaves analysis and report untouched.
        assert!(seen[0].1.contract_analysis.is_empty());
        // Retrieval leaves the report untouched.
        assert!(!seen[1].1.contract_analysis.is_empty());
        assert!(seen[1].1.report.body.is_empty());

        // One connection for ingestion, one for retrieval, both closed.
        assert_eq!(store.closes.load(Ordering::SeqCst), 2);

        let requests = model.requests.lock().unwrap_or_else(|_| unreachable!());
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].model, "gpt-4o");
        assert_eq!(requests[2].model, "gpt-4o-mini");
        assert!(requests[2].tools.is_empty());
    }

    #[tokio::test]
    async fn test_ingestion_failure_aborts_run() {
        let store = Arc::new(MemoryStore::default());
        store.not_ready.store(true, Ordering::SeqCst);
        let model = model();
        let (flow, _dir) = flow(store, model.clone());

        let result = flow.run().await;
        assert!(matches!(result, Err(Error::Ingest(_))));
        assert!(model.requests.lock().map(|r| r.is_empty()).unwrap_or(false));
    }

    #[tokio::test]
    async fn test_report_requires_analysis() {
        let (flow, _dir) = flow(Arc::new(MemoryStore::default()), model());
        let mut state = WorkflowState::new("q");
        let result = flow.generate_report(&mut state).await;
        assert!(matches!(
            result,
            Err(Error::Flow(FlowError::StepOrder {
                step: "generate_report",
                missing: "contract_analysis"
            }))
        ));
    }
}
