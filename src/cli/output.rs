//! Output formatting for CLI commands.

use serde::Serialize;
use std::fmt::Write;

use crate::flow::{FlowOutcome, GraphFormat};
use crate::vectorstore::SearchHit;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name. Unknown names fall back to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes `value` as pretty JSON.
    #[must_use]
    pub fn to_json<T: Serialize>(self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

/// Formats the result of a workflow run.
#[must_use]
pub fn format_outcome(outcome: &FlowOutcome, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let report = &outcome.state.report;
            let mut out = format!("{}\n", report.body.trim_end());
            if !report.source_citations.is_empty() {
                out.push_str("\nSources:\n");
                for (i, citation) in report.source_citations.iter().enumerate() {
                    let _ = writeln!(out, "  [{}] {citation}", i + 1);
                }
            }
            let _ = write!(
                out,
                "\n---\nChunks ingested: {} | Time: {:.1}s",
                outcome.chunks_ingested,
                outcome.elapsed_ms as f64 / 1000.0
            );
            out
        }
        OutputFormat::Json => format.to_json(outcome),
    }
}

/// Formats search hits.
#[must_use]
pub fn format_hits(query: &str, hits: &[SearchHit], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if hits.is_empty() {
                return format!("No passages found for: {query}\n");
            }
            let mut out = format!("{} passage(s) for: {query}\n", hits.len());
            for (i, hit) in hits.iter().enumerate() {
                let page = hit
                    .page_number
                    .map_or_else(|| "?".to_string(), |p| p.to_string());
                let distance = hit
                    .distance
                    .map_or_else(String::new, |d| format!(" (distance {d:.3})"));
                let _ = writeln!(
                    out,
                    "\n[{}] {} | {} | page {page}{distance}",
                    i + 1,
                    hit.source_file,
                    if hit.heading.is_empty() { "-" } else { &hit.heading },
                );
                let _ = writeln!(out, "{}", hit.text.trim());
            }
            out
        }
        OutputFormat::Json => format.to_json(&serde_json::json!({
            "query": query,
            "count": hits.len(),
            "hits": hits,
        })),
    }
}

/// Formats the outcome of an ingestion run.
#[must_use]
pub fn format_ingest(folder: &str, chunks: usize, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("Ingested {chunks} chunk(s) from {folder}\n"),
        OutputFormat::Json => format.to_json(&serde_json::json!({
            "folder": folder,
            "chunks": chunks,
        })),
    }
}

/// Formats a rendered graph, or the path it was written to.
#[must_use]
pub fn format_graph(
    graph: &str,
    graph_format: GraphFormat,
    written_to: Option<&str>,
    format: OutputFormat,
) -> String {
    let kind = match graph_format {
        GraphFormat::Mermaid => "mermaid",
        GraphFormat::Dot => "dot",
    };
    match (format, written_to) {
        (OutputFormat::Text, None) => graph.to_string(),
        (OutputFormat::Text, Some(path)) => format!("Wrote {kind} graph to {path}\n"),
        (OutputFormat::Json, path) => format.to_json(&serde_json::json!({
            "format": kind,
            "graph": graph,
            "path": path,
        })),
    }
}
