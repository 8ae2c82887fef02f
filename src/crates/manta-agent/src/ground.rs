//! Tool execution and grounding.
//!
//! Runs one resolved tool invocation, applies the text-to-vision
//! escalation policy, folds the tool output into the history as a
//! system grounding message, and makes exactly one plain (not
//! tool-bound) follow-up model call to compose the final answer.
//!
//! Nothing here propagates an error: every failure mode degrades to
//! some assistant-visible text, because a conversational turn that
//! crashes is strictly worse than one that says what went wrong.

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use manta_core::{latest_user_text, ChatModel, ChatRequest, Message, ToolInvocation, ToolRegistry};

use crate::trace::{states, TurnTrace};

/// Names and markers the executor routes on.
///
/// The executor never hardcodes tool names; the caller wires in which
/// registered tool is the text retriever, which is the vision fallback,
/// and which substring marks an empty retrieval result.
#[derive(Debug, Clone)]
pub struct EscalationPolicy {
    /// Tool whose empty results trigger escalation
    pub retrieval_tool: String,
    /// Tool invoked as the escalation target
    pub vision_tool: String,
    /// Substring marking a "no relevant context" result
    pub no_context_marker: String,
}

/// Executes tool invocations and produces grounded final answers.
pub struct GroundingExecutor {
    registry: ToolRegistry,
    model: Arc<dyn ChatModel>,
    policy: EscalationPolicy,
    temperature: Option<f32>,
}

impl GroundingExecutor {
    pub fn new(
        registry: ToolRegistry,
        model: Arc<dyn ChatModel>,
        policy: EscalationPolicy,
        temperature: Option<f32>,
    ) -> Self {
        Self {
            registry,
            model,
            policy,
            temperature,
        }
    }

    /// Name of the tool used for the soft-fallback retrieval path.
    pub fn retrieval_tool(&self) -> &str {
        &self.policy.retrieval_tool
    }

    /// Runs `invocation`, escalates if needed, and returns the final
    /// assistant message. `history` is the session history the
    /// follow-up call is grounded on.
    pub async fn execute(
        &self,
        invocation: &ToolInvocation,
        history: &[Message],
        trace: &mut TurnTrace,
    ) -> Message {
        if !self.registry.has_tool(&invocation.name) {
            warn!(tool = %invocation.name, "model requested an unregistered tool");
            trace.push(
                states::EXECUTE_AND_GROUND,
                format!("unknown tool '{}'; answering directly", invocation.name),
            );
            return Message::assistant(format!("Unknown tool requested: {}", invocation.name));
        }

        let mut result = match self.registry.invoke(&invocation.name, &invocation.args_value()).await
        {
            Ok(text) => {
                trace.push(
                    states::EXECUTE_AND_GROUND,
                    format!("invoked '{}'", invocation.name),
                );
                text
            }
            Err(e) => {
                // An erroring retriever reads the same as an empty one,
                // which keeps the vision escalation reachable.
                warn!(tool = %invocation.name, error = %e, "tool invocation failed");
                trace.push(
                    states::EXECUTE_AND_GROUND,
                    format!("'{}' failed: {}", invocation.name, e),
                );
                if invocation.name == self.policy.retrieval_tool {
                    format!("CONTEXT:\n{}", self.policy.no_context_marker)
                } else {
                    format!("(Tool '{}' failed: {})", invocation.name, e)
                }
            }
        };

        if invocation.name == self.policy.retrieval_tool
            && result.contains(&self.policy.no_context_marker)
        {
            result = self.escalate(invocation, history, result, trace).await;
        }

        self.grounded_followup(history, &result, trace).await
    }

    /// Retries an empty text retrieval through the vision tool, using
    /// the user's own words as the query. A failing vision tool leaves
    /// the original result in place, annotated.
    async fn escalate(
        &self,
        invocation: &ToolInvocation,
        history: &[Message],
        original: String,
        trace: &mut TurnTrace,
    ) -> String {
        let Some(query) = latest_user_text(history).or_else(|| invocation.query()) else {
            trace.push(
                states::EXECUTE_AND_GROUND,
                "empty retrieval but no query text to escalate with",
            );
            return original;
        };

        debug!(query, "empty retrieval; escalating to vision");
        trace.push(
            states::EXECUTE_AND_GROUND,
            format!("empty retrieval; escalating to '{}'", self.policy.vision_tool),
        );

        match self
            .registry
            .invoke(&self.policy.vision_tool, &json!({ "query": query }))
            .await
        {
            Ok(vision_result) => {
                trace.push(states::EXECUTE_AND_GROUND, "vision context produced");
                vision_result
            }
            Err(e) => {
                warn!(error = %e, "vision fallback failed");
                trace.push(
                    states::EXECUTE_AND_GROUND,
                    format!("vision fallback failed: {}", e),
                );
                format!("{}\n(Note: vision fallback failed: {})", original, e)
            }
        }
    }

    /// Appends the grounding context as a system message and makes the
    /// single plain follow-up call.
    async fn grounded_followup(
        &self,
        history: &[Message],
        context: &str,
        trace: &mut TurnTrace,
    ) -> Message {
        let grounding = format!(
            "Use the following retrieved context to answer the user's question.\n\n{}",
            context
        );
        let mut messages: Vec<Message> = history.to_vec();
        messages.push(Message::system(grounding));

        let mut request = ChatRequest::new(messages);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        trace.push(states::EXECUTE_AND_GROUND, "grounded follow-up model call");
        match self.model.chat(request).await {
            Ok(response) => {
                let text = response.message.text().unwrap_or("").to_string();
                if text.trim().is_empty() {
                    return Message::assistant(format!(
                        "(No answer was produced; the retrieved context follows.)\n\n{}",
                        context
                    ));
                }
                Message::assistant(text)
            }
            Err(e) => {
                warn!(error = %e, "follow-up model call failed");
                trace.push(
                    states::EXECUTE_AND_GROUND,
                    format!("follow-up model call failed: {}", e),
                );
                Message::assistant(format!(
                    "(The model was unavailable to compose a final answer; the retrieved context follows.)\n\n{}",
                    context
                ))
            }
        }
    }
}
