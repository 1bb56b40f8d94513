//! Evaluation hook that scores the final report for hallucinations.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;

use super::hallucination::{HallucinationMetric, HallucinationScore};
use crate::error::Error;
use crate::flow::events::{StepEvent, StepHook};
use crate::flow::state::{StepName, WorkflowState};

/// Logs every finished step and scores the report step's output against the
/// retrieval output it was generated from.
pub struct EvalListener {
    metric: HallucinationMetric,
    scores: Mutex<Vec<HallucinationScore>>,
}

impl EvalListener {
    /// Creates a listener using `metric`.
    #[must_use]
    pub fn new(metric: HallucinationMetric) -> Self {
        Self {
            metric,
            scores: Mutex::new(Vec::new()),
        }
    }

    /// Wraps the listener for registration on a hook chain.
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Scores recorded so far, in run order.
    #[must_use]
    pub fn scores(&self) -> Vec<HallucinationScore> {
        self.scores
            .lock()
            .map(|scores| scores.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StepHook for EvalListener {
    fn name(&self) -> &'static str {
        "hallucination"
    }

    async fn on_step_finished(
        &self,
        event: &StepEvent,
        state: &WorkflowState,
    ) -> Result<(), Error> {
        info!(step = %event.step, "running hallucination metric for {}", event.step);

        if event.step != StepName::GenerateReport {
            return Ok(());
        }

        let score = self
            .metric
            .score(&state.contract_analysis, &event.output.as_text())
            .await?;
        info!(
            step = %event.step,
            model = self.metric.model(),
            score = score.value,
            reason = %score.reason,
            "hallucination score"
        );

        if let Ok(mut scores) = self.scores.lock() {
            scores.push(score);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::config::AgentConfig;
    use crate::agent::message::{ChatRequest, ChatResponse, TokenUsage};
    use crate::agent::prompt::HALLUCINATION_SYSTEM_PROMPT;
    use crate::agent::provider::LlmProvider;
    use crate::error::{AgentError, EvalError};
    use crate::flow::state::{Report, StepOutput};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJudge {
        calls: AtomicUsize,
        answer: &'static str,
    }

    #[async_trait]
    impl LlmProvider for CountingJudge {
        fn name(&self) -> &'static str {
            "judge"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ChatResponse {
                content: self.answer.to_string(),
                usage: TokenUsage::default(),
                tool_calls: Vec::new(),
                finish_reason: Some("stop".to_string()),
            })
        }
    }

    fn listener(judge: Arc<CountingJudge>) -> EvalListener {
        let config = AgentConfig::builder()
            .api_key("test")
            .build()
            .unwrap_or_else(|_| unreachable!());
        EvalListener::new(HallucinationMetric::new(
            judge,
            &config,
            HALLUCINATION_SYSTEM_PROMPT.to_string(),
        ))
    }

    fn events() -> Vec<StepEvent> {
        vec![
            StepEvent {
                step: StepName::PreProcessDocuments,
                output: StepOutput::Ingested { chunks: 3 },
            },
            StepEvent {
                step: StepName::GenerateContractAnalysis,
                output: StepOutput::Analysis {
                    text: "Section 7".to_string(),
                },
            },
            StepEvent {
                step: StepName::GenerateReport,
                output: StepOutput::Report(Report {
                    body: "Warranties in Section 7.".to_string(),
                    source_citations: vec!["dcd.pdf p4".to_string()],
                }),
            },
        ]
    }

    #[tokio::test]
    async fn test_scores_only_report_step() {
        let judge = Arc::new(CountingJudge {
            calls: AtomicUsize::new(0),
            answer: r#"{"score": 0.1, "reason": "grounded"}"#,
        });
        let listener = listener(judge.clone());
        let state = WorkflowState {
            contract_analysis: "Section 7".to_string(),
            ..WorkflowState::default()
        };

        for event in events() {
            listener
                .on_step_finished(&event, &state)
                .await
                .unwrap_or_else(|e| panic!("hook failed: {e}"));
        }

        assert_eq!(judge.calls.load(Ordering::SeqCst), 1);
        let scores = listener.scores();
        assert_eq!(scores.len(), 1);
        assert!((scores[0].value - 0.1).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_unreadable_score_is_error() {
        let judge = Arc::new(CountingJudge {
            calls: AtomicUsize::new(0),
            answer: "I think it is fine",
        });
        let listener = listener(judge);
        let report_event = events().remove(2);

        let result = listener
            .on_step_finished(&report_event, &WorkflowState::default())
            .await;
        assert!(matches!(result, Err(Error::Eval(EvalError::Score { .. }))));
        assert!(listener.scores().is_empty());
    }
}
