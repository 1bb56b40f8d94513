//! CLI layer for contract-flow.
//!
//! Provides the command-line interface using clap, with commands for
//! running the workflow, plotting it, and driving its parts individually.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands, PromptCommands};
