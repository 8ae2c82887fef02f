//! Conversational agent loop: classification, grounding, and turn
//! orchestration.
//!
//! The crate wires three pieces around a [`manta_core::ChatModel`]:
//!
//! 1. [`Classifier`] decides what a model response *is*: a structured
//!    tool call, a fenced textual invocation, plain prose, or noise.
//! 2. [`GroundingExecutor`] runs the requested tool, escalates empty
//!    document retrieval to the vision tool, and asks the model for
//!    one grounded follow-up answer.
//! 3. [`Agent`] drives a whole turn through a fixed state machine and
//!    appends exactly one assistant message to the session, absorbing
//!    every failure into explanatory text on the way.
//!
//! Tools, models, and session stores are all injected, so the loop is
//! testable without a live model server.

pub mod classify;
pub mod ground;
pub mod trace;
pub mod turn;

pub use classify::{Classification, Classifier};
pub use ground::{EscalationPolicy, GroundingExecutor};
pub use trace::{states, TraceStep, TurnTrace};
pub use turn::{Agent, AgentBuilder, TurnOutcome};
