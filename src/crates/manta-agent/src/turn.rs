//! Turn orchestration.
//!
//! One user turn walks a fixed state machine:
//!
//! ```text
//! PolicyInjection -> ModelInvoke -> Classify -> Respond          -> Done
//!                                            \-> ExecuteAndGround -> Done
//! ```
//!
//! The topology never changes at runtime; the only branching is the
//! classification outcome. Per turn, at most two model invocations
//! happen (the tool-bound routing call, plus at most one grounded
//! follow-up inside [`GroundingExecutor`]), and exactly one assistant
//! message is appended to the session, whatever goes wrong along the
//! way.

use std::sync::Arc;
use tracing::{debug, warn};

use manta_core::{
    latest_user_text, ChatModel, ChatRequest, CoreError, Message, Result, SessionStore, Tool,
    ToolInvocation, ToolRegistry,
};

use crate::classify::{Classification, Classifier};
use crate::ground::{EscalationPolicy, GroundingExecutor};
use crate::trace::{states, TurnTrace};

/// Result of one conversational turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Final assistant text, always non-empty on normal paths
    pub reply: String,
    /// State transitions taken this turn
    pub trace: TurnTrace,
}

/// The conversational agent: model, tools, classifier, and session log.
///
/// Construct via [`AgentBuilder`]; all collaborators are injected, so
/// tests swap in scripted models and tools freely.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    registry: ToolRegistry,
    classifier: Classifier,
    executor: GroundingExecutor,
    sessions: SessionStore,
    policy_text: String,
    temperature: Option<f32>,
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Read access to the session log, for REPL display and tests.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Runs one user turn against the given session.
    ///
    /// Never fails: model and tool errors degrade to explanatory text.
    /// The user message and exactly one assistant message are appended
    /// to the session.
    pub async fn run_turn(&self, session_id: &str, user_text: &str) -> TurnOutcome {
        let mut trace = TurnTrace::default();

        self.sessions.append(session_id, Message::user(user_text)).await;
        let history = self.sessions.history(session_id).await;
        debug!(session_id, turn_messages = history.len(), "turn started");

        // The policy instruction is prepended for this invocation only,
        // never persisted to the session log.
        trace.push(states::POLICY_INJECTION, "tool-usage instruction prepended");
        let mut bound_messages = Vec::with_capacity(history.len() + 1);
        bound_messages.push(Message::system(self.policy_text.clone()));
        bound_messages.extend(history.iter().cloned());

        let mut request =
            ChatRequest::new(bound_messages).with_tools(self.registry.definitions());
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        let reply = match self.model.chat(request).await {
            Ok(response) => {
                trace.push(states::MODEL_INVOKE, "tool-bound model call succeeded");
                self.route(response.message, &history, &mut trace).await
            }
            Err(e) => {
                warn!(error = %e, "tool-bound model call failed");
                trace.push(states::MODEL_INVOKE, format!("model call failed: {}", e));
                Message::assistant(
                    "The language model is unavailable right now; please try again shortly.",
                )
            }
        };

        self.sessions.append(session_id, reply.clone()).await;
        trace.push(states::DONE, "assistant message appended");

        TurnOutcome {
            reply: reply.text().unwrap_or("").to_string(),
            trace,
        }
    }

    async fn route(
        &self,
        response: Message,
        history: &[Message],
        trace: &mut TurnTrace,
    ) -> Message {
        let classification = self.classifier.classify(&response);
        trace.push(states::CLASSIFY, classification.label());

        match classification {
            Classification::PlainText(text) => {
                trace.push(states::RESPOND, "answer stands as-is");
                Message::assistant(text)
            }
            Classification::StructuredCall(invocation)
            | Classification::FencedInvocation(invocation) => {
                trace.push(
                    states::EXECUTE_AND_GROUND,
                    format!("routing to '{}'", invocation.name),
                );
                self.executor.execute(&invocation, history, trace).await
            }
            Classification::FencedUnparseable | Classification::Blank => {
                self.soft_fallback(response, history, trace).await
            }
        }
    }

    /// The model produced nothing routable. Retry as a plain document
    /// retrieval on the user's own words; with no user words to use,
    /// hand back the original response unchanged.
    async fn soft_fallback(
        &self,
        response: Message,
        history: &[Message],
        trace: &mut TurnTrace,
    ) -> Message {
        let original = response.text().unwrap_or("");
        if !original.trim().is_empty() {
            // Keep the discarded response visible in the trace for
            // debugging; it does not reach the session log.
            trace.push(
                states::CLASSIFY,
                format!("discarding unroutable response: {:?}", truncate(original, 120)),
            );
        }

        match latest_user_text(history) {
            Some(query) => {
                trace.push(
                    states::EXECUTE_AND_GROUND,
                    "soft fallback to document retrieval",
                );
                let invocation =
                    ToolInvocation::with_query(self.executor.retrieval_tool(), query);
                self.executor.execute(&invocation, history, trace).await
            }
            None => {
                trace.push(states::RESPOND, "no user text to fall back on");
                Message::assistant(original.to_string())
            }
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}

/// Builder for [`Agent`]. The model and escalation policy are
/// required; everything else has defaults.
#[derive(Default)]
pub struct AgentBuilder {
    model: Option<Arc<dyn ChatModel>>,
    registry: ToolRegistry,
    sessions: Option<SessionStore>,
    escalation: Option<EscalationPolicy>,
    policy_text: Option<String>,
    temperature: Option<f32>,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chat model used for both the tool-bound and follow-up calls.
    pub fn with_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Registers a tool; registration order is classification order.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.registry.register(tool);
        self
    }

    /// Shares an existing session store instead of creating one.
    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Wires which tools the escalation path routes between.
    pub fn with_escalation(mut self, escalation: EscalationPolicy) -> Self {
        self.escalation = Some(escalation);
        self
    }

    /// Replaces the default per-turn system instruction.
    pub fn with_policy_text(mut self, text: impl Into<String>) -> Self {
        self.policy_text = Some(text.into());
        self
    }

    /// Sampling temperature for both model calls.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let model = self
            .model
            .ok_or_else(|| CoreError::configuration("a chat model is required"))?;
        let escalation = self
            .escalation
            .ok_or_else(|| CoreError::configuration("an escalation policy is required"))?;

        let classifier = Classifier::new(self.registry.tool_names())?;
        let policy_text = self.policy_text.unwrap_or_else(|| {
            default_policy_text(&escalation.retrieval_tool, &escalation.vision_tool)
        });
        let executor = GroundingExecutor::new(
            self.registry.clone(),
            Arc::clone(&model),
            escalation,
            self.temperature,
        );

        Ok(Agent {
            model,
            registry: self.registry,
            classifier,
            executor,
            sessions: self.sessions.unwrap_or_default(),
            policy_text,
            temperature: self.temperature,
        })
    }
}

fn default_policy_text(retrieval_tool: &str, vision_tool: &str) -> String {
    format!(
        "You are a helpful assistant with access to tools. For questions about \
         document content, call {retrieval} with a focused query instead of \
         guessing. If the documents are scanned or unreadable as text, \
         {vision} can read page images. For greetings, small talk, or \
         questions you can answer from the conversation alone, answer \
         directly without any tool.",
        retrieval = retrieval_tool,
        vision = vision_tool,
    )
}
