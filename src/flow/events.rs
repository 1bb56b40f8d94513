//! Post-step notifications.
//!
//! Hooks observe each finished step with read-only access to the state. A
//! failing hook is logged and skipped; it never aborts the run.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::state::{StepName, StepOutput, WorkflowState};
use crate::error::Error;

/// A step that has just finished.
#[derive(Debug, Clone)]
pub struct StepEvent {
    /// Step that finished.
    pub step: StepName,
    /// Value the step returned.
    pub output: StepOutput,
}

/// Observer invoked after every step.
#[async_trait]
pub trait StepHook: Send + Sync {
    /// Hook name for logging.
    fn name(&self) -> &'static str;

    /// Called once per finished step, in step order.
    ///
    /// # Errors
    ///
    /// Any error is logged by the caller and otherwise ignored.
    async fn on_step_finished(&self, event: &StepEvent, state: &WorkflowState)
    -> Result<(), Error>;
}

/// Ordered list of hooks.
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Vec<Arc<dyn StepHook>>,
}

impl HookChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook.
    pub fn push(&mut self, hook: Arc<dyn StepHook>) {
        self.hooks.push(hook);
    }

    /// Number of registered hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns `true` if no hooks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Notifies every hook in registration order.
    pub async fn dispatch(&self, event: &StepEvent, state: &WorkflowState) {
        for hook in &self.hooks {
            if let Err(e) = hook.on_step_finished(event, state).await {
                warn!(
                    hook = hook.name(),
                    step = %event.step,
                    error = %e,
                    "step hook failed"
                );
            }
        }
    }
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.hooks.iter().map(|h| h.name()).collect();
        f.debug_struct("HookChain").field("hooks", &names).finish()
    }
}
