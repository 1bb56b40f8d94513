//! Report generation agent.
//!
//! Turns the retrieval output into a [`Report`] via a schema-constrained
//! completion, then validates the result before it reaches the workflow.

use async_trait::async_trait;
use tracing::debug;

use super::config::AgentConfig;
use super::message::{StructuredOutput, strip_json_fence};
use super::prompt::build_report_task;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::error::AgentError;
use crate::flow::state::Report;

/// Schema name sent with the structured-output request.
const REPORT_SCHEMA_NAME: &str = "Report";

/// Agent that writes the final report. Has no tools.
pub struct ReportAgent {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl ReportAgent {
    /// Creates a report agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.report_model.clone(),
            max_tokens: config.report_max_tokens,
            system_prompt,
        }
    }

    /// Generates a report from the contract analysis.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ResponseParse`] if the output does not match the
    /// report shape, [`AgentError::InvalidReport`] if the body is blank, or
    /// any provider error.
    pub async fn generate(
        &self,
        provider: &dyn LlmProvider,
        contract_analysis: &str,
    ) -> Result<Report, AgentError> {
        let response = self
            .execute(provider, &build_report_task(contract_analysis))
            .await?;
        debug!(
            tokens = response.usage.total_tokens,
            finish_reason = ?response.finish_reason,
            "report agent responded"
        );
        parse_report(&response.content)
    }
}

#[async_trait]
impl Agent for ReportAgent {
    fn name(&self) -> &'static str {
        "report"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn output_schema(&self) -> Option<StructuredOutput> {
        Some(report_schema())
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// JSON schema for [`Report`] in the form strict structured output accepts.
#[must_use]
pub fn report_schema() -> StructuredOutput {
    let mut schema = serde_json::to_value(schemars::schema_for!(Report)).unwrap_or_default();
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
        object.insert(
            "additionalProperties".to_string(),
            serde_json::Value::Bool(false),
        );
    }
    StructuredOutput {
        name: REPORT_SCHEMA_NAME.to_string(),
        schema,
    }
}

/// Parses and validates the model output as a [`Report`].
///
/// # Errors
///
/// Returns [`AgentError::ResponseParse`] on a shape mismatch and
/// [`AgentError::InvalidReport`] when the body is blank.
pub fn parse_report(content: &str) -> Result<Report, AgentError> {
    let json_str = strip_json_fence(content);

    let report: Report =
        serde_json::from_str(json_str).map_err(|e| AgentError::ResponseParse {
            message: format!("report does not match schema: {e}"),
            content: content.to_string(),
        })?;

    if report.body.trim().is_empty() {
        return Err(AgentError::InvalidReport {
            message: "report body is empty".to_string(),
        });
    }

    Ok(report)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::message::{ChatRequest, ChatResponse, TokenUsage};
    use crate::agent::prompt::REPORT_PROFILE;
    use std::sync::Mutex;

    struct CannedProvider {
        content: String,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl CannedProvider {
        fn new(content: &str) -> Self {
            Self {
                content: content.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request.clone());
            }
            Ok(ChatResponse {
                content: self.content.clone(),
                usage: TokenUsage::default(),
                tool_calls: Vec::new(),
                finish_reason: Some("stop".to_string()),
            })
        }
    }

    fn agent() -> ReportAgent {
        let config = AgentConfig::builder()
            .api_key("test")
            .build()
            .unwrap_or_else(|_| unreachable!());
        ReportAgent::new(&config, REPORT_PROFILE.system_prompt())
    }

    #[test]
    fn test_parse_report_valid() {
        let report = parse_report(
            r#"{"report": "Warranties last 12 months.", "source_citations": ["dcd.pdf, 7.1, p4"]}"#,
        )
        .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(report.body, "Warranties last 12 months.");
        assert_eq!(report.source_citations, vec!["dcd.pdf, 7.1, p4"]);
    }

    #[test]
    fn test_parse_report_code_block() {
        let content = "```json\n{\"report\": \"ok\", \"source_citations\": []}\n```";
        let report = parse_report(content).unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(report.body, "ok");
        assert!(report.source_citations.is_empty());
    }

    #[test]
    fn test_parse_report_missing_citations() {
        let result = parse_report(r#"{"report": "no citations"}"#);
        assert!(matches!(result, Err(AgentError::ResponseParse { .. })));
    }

    #[test]
    fn test_parse_report_wrong_type() {
        let result = parse_report(r#"{"report": "x", "source_citations": "dcd.pdf"}"#);
        assert!(matches!(result, Err(AgentError::ResponseParse { .. })));
    }

    #[test]
    fn test_parse_report_blank_body() {
        let result = parse_report(r#"{"report": "  ", "source_citations": []}"#);
        assert!(matches!(result, Err(AgentError::InvalidReport { .. })));
    }

    #[test]
    fn test_schema_is_strict_object() {
        let schema = report_schema();
        assert_eq!(schema.name, "Report");
        assert_eq!(schema.schema["type"], "object");
        assert_eq!(schema.schema["additionalProperties"], false);
        assert!(schema.schema.get("$schema").is_none());
        assert!(schema.schema["properties"]["source_citations"].is_object());
    }

    #[tokio::test]
    async fn test_generate_sends_schema_and_analysis() {
        let provider = CannedProvider::new(
            r#"{"report": "Section 7 covers warranties.", "source_citations": ["a.pdf"]}"#,
        );
        let report = agent()
            .generate(&provider, "Section 7.1 Warranty text")
            .await
            .unwrap_or_else(|e| panic!("generate failed: {e}"));
        assert_eq!(report.source_citations, vec!["a.pdf"]);

        let seen = provider.seen.lock().unwrap_or_else(|_| unreachable!());
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "gpt-4o-mini");
        assert!(seen[0].tools.is_empty());
        assert!(seen[0].structured_output.is_some());
        assert!(seen[0].messages[1].content.contains("Section 7.1 Warranty text"));
    }
}
