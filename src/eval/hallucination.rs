//! LLM-as-judge hallucination metric.
//!
//! The judge compares an output with the context it was generated from and
//! returns a score in `[0, 1]`, where higher means more hallucinated.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::config::AgentConfig;
use crate::agent::message::{ChatRequest, strip_json_fence, system_message, user_message};
use crate::agent::prompt::build_hallucination_prompt;
use crate::agent::provider::LlmProvider;
use crate::error::EvalError;

/// Result of one hallucination evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallucinationScore {
    /// Score in `[0, 1]`; 0 means fully grounded.
    pub value: f64,
    /// Judge's explanation.
    pub reason: String,
}

/// Hallucination metric backed by a judge model.
pub struct HallucinationMetric {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl HallucinationMetric {
    /// Creates a metric using the configured evaluation model.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            provider,
            model: config.eval_model.clone(),
            max_tokens: config.eval_max_tokens,
            system_prompt,
        }
    }

    /// Judge model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Scores `output` against `context`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Agent`] if the judge call fails or
    /// [`EvalError::Score`] if its answer is not a valid score.
    pub async fn score(&self, context: &str, output: &str) -> Result<HallucinationScore, EvalError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                system_message(&self.system_prompt),
                user_message(&build_hallucination_prompt(context, output)),
            ],
            temperature: Some(0.0),
            max_tokens: Some(self.max_tokens),
            json_mode: true,
            structured_output: None,
            tools: Vec::new(),
        };

        let response = self.provider.chat(&request).await?;
        parse_score(&response.content)
    }
}

/// Parses the judge's JSON answer.
///
/// `reason` may be a string or a list of strings.
///
/// # Errors
///
/// Returns [`EvalError::Score`] if the JSON is malformed or the score is
/// missing or outside `[0, 1]`.
pub fn parse_score(content: &str) -> Result<HallucinationScore, EvalError> {
    let json_str = strip_json_fence(content);

    let score_err = |message: String| EvalError::Score {
        message,
        content: content.to_string(),
    };

    let value: Value =
        serde_json::from_str(json_str).map_err(|e| score_err(format!("invalid JSON: {e}")))?;

    let score = value
        .get("score")
        .and_then(Value::as_f64)
        .ok_or_else(|| score_err("missing numeric `score`".to_string()))?;
    if !(0.0..=1.0).contains(&score) {
        return Err(score_err(format!("score {score} outside [0, 1]")));
    }

    let reason = match value.get("reason") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    };

    Ok(HallucinationScore {
        value: score,
        reason,
    })
}
