//! Renders the workflow graph.
//!
//! Rendering reads the static transition table only; it never runs a step.

use std::fmt::Write;

use super::orchestrator::{FlowPhase, TRANSITIONS};
use crate::error::CommandError;

/// Output format for the workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphFormat {
    /// Mermaid flowchart.
    #[default]
    Mermaid,
    /// Graphviz DOT.
    Dot,
}

impl GraphFormat {
    /// Parses a format name (`mermaid` or `dot`, case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidArgument`] for unknown names.
    pub fn parse(s: &str) -> Result<Self, CommandError> {
        match s.to_lowercase().as_str() {
            "mermaid" | "mmd" => Ok(Self::Mermaid),
            "dot" | "graphviz" => Ok(Self::Dot),
            other => Err(CommandError::InvalidArgument(format!(
                "unknown graph format '{other}' (expected mermaid or dot)"
            ))),
        }
    }
}

const START: &str = "start";
const END: &str = "done";

fn first_step() -> &'static str {
    TRANSITIONS
        .iter()
        .find(|t| t.from == FlowPhase::Ingesting)
        .map_or(END, |t| t.step.as_str())
}

/// Edges between node names, from the start node to the end node.
fn edges() -> Vec<(&'static str, &'static str)> {
    let mut edges = vec![(START, first_step())];
    for transition in &TRANSITIONS {
        let next = TRANSITIONS
            .iter()
            .find(|t| t.from == transition.to)
            .map_or(END, |t| t.step.as_str());
        edges.push((transition.step.as_str(), next));
    }
    edges
}

/// Renders the workflow graph in `format`.
#[must_use]
pub fn render(format: GraphFormat) -> String {
    match format {
        GraphFormat::Mermaid => render_mermaid(),
        GraphFormat::Dot => render_dot(),
    }
}

fn render_mermaid() -> String {
    let mut out = String::from("flowchart TD\n");
    let _ = writeln!(out, "    {START}(([start]))");
    for transition in &TRANSITIONS {
        let name = transition.step.as_str();
        let _ = writeln!(out, "    {name}[{name}]");
    }
    let _ = writeln!(out, "    {END}(([done]))");
    for (from, to) in edges() {
        let _ = writeln!(out, "    {from} --> {to}");
    }
    out
}

fn render_dot() -> String {
    let mut out = String::from("digraph contract_flow {\n    rankdir=TB;\n");
    let _ = writeln!(out, "    {START} [shape=circle];");
    for transition in &TRANSITIONS {
        let _ = writeln!(out, "    {} [shape=box];", transition.step.as_str());
    }
    let _ = writeln!(out, "    {END} [shape=doublecircle];");
    for (from, to) in edges() {
        let _ = writeln!(out, "    {from} -> {to};");
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_mermaid_chain() {
        let graph = render(GraphFormat::Mermaid);
        assert!(graph.starts_with("flowchart TD"));
        assert!(graph.contains("start --> pre_process_documents"));
        assert!(graph.contains("pre_process_documents --> generate_contract_analysis"));
        assert!(graph.contains("generate_contract_analysis --> generate_report"));
        assert!(graph.contains("generate_report --> done"));
        assert_eq!(graph.matches("-->").count(), 4);
    }

    #[test]
    fn test_dot_chain() {
        let graph = render(GraphFormat::Dot);
        assert!(graph.starts_with("digraph contract_flow {"));
        assert!(graph.contains("generate_contract_analysis -> generate_report;"));
        assert!(graph.trim_end().ends_with('}'));
    }

    #[test_case("mermaid", GraphFormat::Mermaid ; "mermaid")]
    #[test_case("DOT", GraphFormat::Dot ; "dot uppercase")]
    #[test_case("graphviz", GraphFormat::Dot ; "graphviz alias")]
    fn test_parse_format(input: &str, expected: GraphFormat) {
        assert_eq!(GraphFormat::parse(input).ok(), Some(expected));
    }

    #[test]
    fn test_parse_unknown_format() {
        assert!(GraphFormat::parse("png").is_err());
    }
}
