//! CLI command implementations.
//!
//! Each command returns its formatted output; `main` prints it. Async work
//! runs on a runtime created per command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::agent::prompt::PromptSet;
use crate::cli::output::{
    OutputFormat, format_graph, format_hits, format_ingest, format_outcome,
};
use crate::cli::parser::{Cli, Commands, PromptCommands};
use crate::error::{CommandError, Error, Result};
use crate::flow::{ContractAnalysisFlow, FlowConfig, GraphFormat, render};
use crate::ingest::ContractProcessingService;
use crate::vectorstore::{ConnectionGuard, StoreConnector, VectorSearchTool, VectorStoreConfig};

/// Executes the parsed command and returns its output.
///
/// # Errors
///
/// Returns an error if the command fails.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Run {
            query,
            contracts_dir,
            no_eval,
        } => cmd_run(query, contracts_dir, !*no_eval, format),
        Commands::Plot { graph, output } => cmd_plot(graph, output.as_deref(), format),
        Commands::Ingest { contracts_dir } => cmd_ingest(contracts_dir, format),
        Commands::Search { query, limit } => cmd_search(query, *limit, format),
        Commands::Prompts(PromptCommands::Init { dir }) => cmd_init_prompts(dir.as_deref(), format),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
    })
}

fn cmd_run(query: &str, contracts_dir: &Path, evaluate: bool, format: OutputFormat) -> Result<String> {
    if query.trim().is_empty() {
        return Err(CommandError::InvalidArgument("query cannot be empty".to_string()).into());
    }

    let config = FlowConfig::from_env()
        .map_err(|e| CommandError::ExecutionFailed(format!("Agent configuration error: {e}")))?
        .with_query(query)
        .with_contracts_dir(contracts_dir)
        .with_evaluation(evaluate);

    let flow = ContractAnalysisFlow::from_config(config)?;
    let outcome = runtime()?.block_on(flow.run())?;

    Ok(format_outcome(&outcome, format))
}

fn cmd_plot(graph: &str, output: Option<&Path>, format: OutputFormat) -> Result<String> {
    let graph_format = GraphFormat::parse(graph)?;
    let rendered = render(graph_format);

    if let Some(path) = output {
        std::fs::write(path, &rendered)?;
        info!(path = %path.display(), "wrote workflow graph");
    }

    let written_to = output.map(|p| p.display().to_string());
    Ok(format_graph(
        &rendered,
        graph_format,
        written_to.as_deref(),
        format,
    ))
}

fn cmd_ingest(contracts_dir: &Path, format: OutputFormat) -> Result<String> {
    let store = VectorStoreConfig::from_env();
    let service = ContractProcessingService::default();

    let chunks = runtime()?.block_on(service.process_contracts(contracts_dir, &store))?;

    Ok(format_ingest(
        &contracts_dir.display().to_string(),
        chunks,
        format,
    ))
}

fn cmd_search(query: &str, limit: usize, format: OutputFormat) -> Result<String> {
    if query.trim().is_empty() {
        return Err(CommandError::InvalidArgument("query cannot be empty".to_string()).into());
    }

    let config = VectorStoreConfig::builder()
        .search_limit(limit)
        .from_env()
        .build();

    let hits = runtime()?.block_on(async {
        let guard = ConnectionGuard::new(config.connect()?);
        let tool = VectorSearchTool::new(Arc::clone(guard.store()), config.search_limit);
        let hits = tool.hits(query).await?;
        Ok::<_, Error>(hits)
    })?;

    Ok(format_hits(query, &hits, format))
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                return Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ));
            }
            let mut output = format!(
                "Wrote {} prompt template(s) to: {}\n",
                written.len(),
                target_dir.display()
            );
            for path in &written {
                output.push_str("  ");
                output.push_str(
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("unknown"),
                );
                output.push('\n');
            }
            output.push_str("\nEdit these files to customize agent system prompts.\n");
            Ok(output)
        }
        OutputFormat::Json => Ok(format.to_json(&serde_json::json!({
            "directory": target_dir.to_string_lossy(),
            "written": written
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect::<Vec<_>>(),
            "count": written.len(),
        }))),
    }
}
