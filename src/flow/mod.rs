//! Contract analysis workflow: state, step events, driver and graph.

pub mod config;
pub mod events;
pub mod orchestrator;
pub mod plot;
pub mod state;

pub use config::{DEFAULT_CONTRACTS_DIR, DEFAULT_QUERY, FlowConfig};
pub use events::{HookChain, StepEvent, StepHook};
pub use orchestrator::{ContractAnalysisFlow, FlowOutcome, FlowPhase, TRANSITIONS, Transition};
pub use plot::{GraphFormat, render};
pub use state::{Report, StepName, StepOutput, WorkflowState};
