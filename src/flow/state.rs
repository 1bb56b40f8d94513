//! Workflow state threaded through every pipeline step.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Structured report produced by the report generation step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Report {
    /// Free-text report body.
    #[serde(rename = "report")]
    pub body: String,
    /// File, section and page references backing the report, in citation order.
    pub source_citations: Vec<String>,
}

/// Mutable record owned by the workflow for the duration of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Natural-language question being answered.
    pub query: String,
    /// Metadata filter expression. Carried but not applied to searches.
    pub metadata_filters: String,
    /// Raw retrieval output.
    pub contract_analysis: String,
    /// Final report; default until the report step runs.
    pub report: Report,
}

impl WorkflowState {
    /// Creates a fresh state for `query`.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

/// Identifier of a pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    /// Document ingestion into the vector store.
    PreProcessDocuments,
    /// Retrieval agent run.
    GenerateContractAnalysis,
    /// Report agent run.
    GenerateReport,
}

impl StepName {
    /// Every step in execution order.
    pub const ALL: [Self; 3] = [
        Self::PreProcessDocuments,
        Self::GenerateContractAnalysis,
        Self::GenerateReport,
    ];

    /// Stable snake-case name used in logs, events and graphs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreProcessDocuments => "pre_process_documents",
            Self::GenerateContractAnalysis => "generate_contract_analysis",
            Self::GenerateReport => "generate_report",
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value returned by a completed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepOutput {
    /// Number of chunks submitted to the vector store.
    Ingested {
        /// Chunk count.
        chunks: usize,
    },
    /// Raw retrieval output.
    Analysis {
        /// Text returned by the retrieval agent.
        text: String,
    },
    /// Report summary.
    Report(Report),
}

impl StepOutput {
    /// Text the evaluation layer scores for this step.
    ///
    /// Reports render their citations below the body so that invented
    /// sources count against the score too.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Ingested { chunks } => chunks.to_string(),
            Self::Analysis { text } => text.clone(),
            Self::Report(report) => {
                let mut text = report.body.clone();
                if !report.source_citations.is_empty() {
                    text.push_str("\n\nSources:");
                    for citation in &report.source_citations {
                        text.push_str("\n- ");
                        text.push_str(citation);
                    }
                }
                text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_wire_names() {
        let report = Report {
            body: "Warranties are defined in Section 7.".to_string(),
            source_citations: vec!["dcd.pdf, Section 7.1, page 4".to_string()],
        };
        let json = serde_json::to_value(&report).unwrap_or_default();
        assert_eq!(json["report"], "Warranties are defined in Section 7.");
        assert_eq!(json["source_citations"][0], "dcd.pdf, Section 7.1, page 4");
    }

    #[test]
    fn test_report_schema_requires_both_fields() {
        let schema = serde_json::to_value(schemars::schema_for!(Report)).unwrap_or_default();
        let required = schema["required"].as_array().cloned().unwrap_or_default();
        assert!(required.contains(&serde_json::json!("report")));
        assert!(required.contains(&serde_json::json!("source_citations")));
    }

    #[test]
    fn test_new_state_is_empty_except_query() {
        let state = WorkflowState::new("what is the term?");
        assert_eq!(state.query, "what is the term?");
        assert!(state.metadata_filters.is_empty());
        assert!(state.contract_analysis.is_empty());
        assert_eq!(state.report, Report::default());
    }

    #[test]
    fn test_step_names_in_order() {
        let names: Vec<&str> = StepName::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            ["pre_process_documents", "generate_contract_analysis", "generate_report"]
        );
    }

    #[test]
    fn test_step_output_text() {
        let output = StepOutput::Report(Report {
            body: "body".to_string(),
            source_citations: Vec::new(),
        });
        assert_eq!(output.as_text(), "body");
        let output = StepOutput::Report(Report {
            body: "body".to_string(),
            source_citations: vec!["a.pdf p1".to_string(), "b.pdf p2".to_string()],
        });
        assert_eq!(output.as_text(), "body\n\nSources:\n- a.pdf p1\n- b.pdf p2");
        assert_eq!(StepOutput::Ingested { chunks: 4 }.as_text(), "4");
    }
}
