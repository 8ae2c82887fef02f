//! Per-turn execution trace.
//!
//! Every turn records the state transitions it took, with a short
//! human-readable detail per step. The REPL prints this under
//! `--trace`; tests use it to assert routing decisions.

use serde::Serialize;

/// State names, matching the orchestrator's transitions.
pub mod states {
    pub const POLICY_INJECTION: &str = "PolicyInjection";
    pub const MODEL_INVOKE: &str = "ModelInvoke";
    pub const CLASSIFY: &str = "Classify";
    pub const RESPOND: &str = "Respond";
    pub const EXECUTE_AND_GROUND: &str = "ExecuteAndGround";
    pub const DONE: &str = "Done";
}

/// One recorded state transition.
#[derive(Debug, Clone, Serialize)]
pub struct TraceStep {
    pub state: String,
    pub detail: String,
}

/// Ordered record of one turn's transitions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TurnTrace {
    pub steps: Vec<TraceStep>,
}

impl TurnTrace {
    pub fn push(&mut self, state: impl Into<String>, detail: impl Into<String>) {
        self.steps.push(TraceStep {
            state: state.into(),
            detail: detail.into(),
        });
    }

    /// True if any step was recorded for the given state.
    pub fn visited(&self, state: &str) -> bool {
        self.steps.iter().any(|step| step.state == state)
    }

    /// One line per step, for terminal output.
    pub fn render(&self) -> String {
        self.steps
            .iter()
            .map(|step| format!("  [{}] {}", step.state, step.detail))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
