//! System prompts and task builders for agents.
//!
//! Each agent is described by a role, a goal and a backstory; the system
//! prompt is composed from those three. Prompts can be overridden per file
//! from a template directory.

use std::path::{Path, PathBuf};

/// Role, goal and backstory of an agent.
#[derive(Debug, Clone, Copy)]
pub struct AgentProfile {
    /// Short role title.
    pub role: &'static str,
    /// What the agent is trying to achieve.
    pub goal: &'static str,
    /// Behavioral instructions and context.
    pub backstory: &'static str,
}

impl AgentProfile {
    /// Renders the profile as a system prompt.
    #[must_use]
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {role}. {backstory}\nYour personal goal is: {goal}",
            role = self.role,
            backstory = self.backstory,
            goal = self.goal,
        )
    }
}

/// Profile of the retrieval agent.
pub const RETRIEVAL_PROFILE: AgentProfile = AgentProfile {
    role: "Retrieval Agent",
    goal: "Retrieve the contract analysis for the given query",
    backstory: "You are a contract analysis agent that retrieves the most relevant contracts \
                based on the given query. Be sure to include the source citations such as the \
                file name, sections and page numbers of the contract. When you use the vector \
                search tool, pass the argument 'query' as the query to search for.",
};

/// Profile of the report generation agent.
pub const REPORT_PROFILE: AgentProfile = AgentProfile {
    role: "Report Generation Agent",
    goal: "Generate a report based on the contract analysis. Be sure to include the source \
           citations such as the file name, sections and page numbers of the contract.",
    backstory: "You are a report generation agent that generates a report based on the \
                contract analysis.",
};

/// System prompt for the hallucination judge.
pub const HALLUCINATION_SYSTEM_PROMPT: &str = r#"You are an expert judge evaluating whether an OUTPUT is faithful to the CONTEXT it was generated from.

## Instructions

1. Read the CONTEXT carefully. It is the only source of truth.
2. Check every claim in the OUTPUT against the CONTEXT, including names, dates, figures, section numbers, page numbers and file names in citations.
3. A claim is hallucinated if it contradicts the CONTEXT or introduces facts the CONTEXT does not contain.
4. Paraphrase and summarisation are acceptable when they preserve meaning.

## Scoring

- 0.0: every claim is supported by the CONTEXT.
- 1.0: the OUTPUT is entirely unsupported or contradicts the CONTEXT.
- Use intermediate values in proportion to the share of unsupported claims.

## Output Format (JSON)

```json
{"score": <float between 0.0 and 1.0>, "reason": ["short explanation", "..."]}
```

Return ONLY the JSON object, no surrounding text."#;

/// Default prompt directory under the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/contract-flow/prompts";

/// Filename for the retrieval prompt template.
const RETRIEVAL_FILENAME: &str = "retrieval.md";
/// Filename for the report prompt template.
const REPORT_FILENAME: &str = "report.md";
/// Filename for the hallucination judge prompt template.
const HALLUCINATION_FILENAME: &str = "hallucination.md";

/// System prompts for every LLM call the workflow makes.
#[derive(Debug, Clone)]
pub struct PromptSet {
    /// System prompt for the retrieval agent.
    pub retrieval: String,
    /// System prompt for the report generation agent.
    pub report: String,
    /// System prompt for the hallucination judge.
    pub hallucination: String,
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// Resolution order for the directory:
    /// 1. Explicit `prompt_dir` argument
    /// 2. `CONTRACT_FLOW_PROMPT_DIR` environment variable
    /// 3. `~/.config/contract-flow/prompts/`
    ///
    /// Each file is loaded independently; a missing file uses its default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir
            .map(PathBuf::from)
            .or_else(|| std::env::var("CONTRACT_FLOW_PROMPT_DIR").ok().map(PathBuf::from))
            .or_else(Self::default_dir);

        let defaults = Self::defaults();
        let load_file = |filename: &str, default: String| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(path).ok())
                .unwrap_or(default)
        };

        Self {
            retrieval: load_file(RETRIEVAL_FILENAME, defaults.retrieval),
            report: load_file(REPORT_FILENAME, defaults.report),
            hallucination: load_file(HALLUCINATION_FILENAME, defaults.hallucination),
        }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            retrieval: RETRIEVAL_PROFILE.system_prompt(),
            report: REPORT_PROFILE.system_prompt(),
            hallucination: HALLUCINATION_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Writes the compiled-in default prompts to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let defaults = Self::defaults();
        let templates = [
            (RETRIEVAL_FILENAME, defaults.retrieval),
            (REPORT_FILENAME, defaults.report),
            (HALLUCINATION_FILENAME, defaults.hallucination),
        ];

        let mut written = Vec::new();
        for (filename, content) in &templates {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

/// Builds the retrieval task for a user query.
///
/// The task asks for every retrieved passage verbatim; summarisation is left
/// to the report step.
#[must_use]
pub fn build_retrieval_task(query: &str) -> String {
    format!(
        "Retrieve the most relevant contracts for the given query: {query}. \
         The output should show all the retrieved data, including the source file name, \
         section heading and page number of each passage. Do not summarize the retrieved data."
    )
}

/// Builds the report task from the retrieval output.
#[must_use]
pub fn build_report_task(contract_analysis: &str) -> String {
    format!(
        "Generate a report based on the contract analysis: {contract_analysis}.\n\n\
         Respond with a JSON object with a `report` string and a `source_citations` array \
         of strings naming the file, section and page of each cited passage."
    )
}

/// Builds the judge message for scoring `output` against `context`.
#[must_use]
pub fn build_hallucination_prompt(context: &str, output: &str) -> String {
    format!("<context>\n{context}\n</context>\n\n<output>\n{output}\n</output>")
}
