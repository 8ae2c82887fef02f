//! Response classification.
//!
//! One raw assistant response comes in; one routing decision comes out.
//! The model can request a tool three ways, in decreasing order of
//! reliability:
//!
//! 1. a native structured `tool_calls` entry,
//! 2. a fenced ` ```tool_code ` block containing
//!    `{"name": ..., "parameters": ...}` JSON,
//! 3. a fenced block containing a call-like text pattern such as
//!    `rag_search(query="...")`.
//!
//! Structured calls always win, and only the first one counts. The
//! text patterns are an explicit ordered table built per known tool at
//! construction time; nothing else in the workspace parses response
//! text. Anything fenced that fails every parse is reported as
//! [`Classification::FencedUnparseable`] so the orchestrator can fall
//! back, and classification itself never fails.

use regex::Regex;
use serde_json::{Map, Value};

use manta_core::{CoreError, Message, Result, ToolInvocation};

/// Routing decision for one assistant response.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Native structured tool call (first one, if several)
    StructuredCall(ToolInvocation),
    /// Tool call recovered from a fenced block
    FencedInvocation(ToolInvocation),
    /// A fence was present but nothing usable could be read from it
    FencedUnparseable,
    /// Ordinary answer; stands as the final text
    PlainText(String),
    /// No usable content at all
    Blank,
}

impl Classification {
    /// Short label for traces and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Classification::StructuredCall(_) => "structured call",
            Classification::FencedInvocation(_) => "fenced invocation",
            Classification::FencedUnparseable => "fenced unparseable",
            Classification::PlainText(_) => "plain text",
            Classification::Blank => "blank",
        }
    }
}

/// Classifies assistant responses against a fixed set of known tools.
#[derive(Debug, Clone)]
pub struct Classifier {
    fence: Regex,
    patterns: Vec<(Regex, String)>,
    known_tools: Vec<String>,
}

impl Classifier {
    /// Builds the pattern table for the given tool names, in order.
    /// Pattern order is the routing order: for each tool,
    /// `name(query="...")`, then `name("...")`, then
    /// `print(name.method(query="..."))`.
    pub fn new<I, S>(tool_names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fence = Regex::new(r"(?s)```tool_code\s*(.*?)```")
            .map_err(|e| CoreError::configuration(format!("invalid fence pattern: {}", e)))?;

        let known_tools: Vec<String> = tool_names.into_iter().map(Into::into).collect();
        let mut patterns = Vec::with_capacity(known_tools.len() * 3);
        for tool in &known_tools {
            let escaped = regex::escape(tool);
            let shapes = [
                format!(r#"\b{}\(\s*query\s*=\s*"([^"]*)""#, escaped),
                format!(r#"\b{}\(\s*"([^"]*)""#, escaped),
                format!(r#"print\(\s*{}\s*\.\s*\w+\s*\(\s*query\s*=\s*"([^"]*)""#, escaped),
            ];
            for shape in shapes {
                let regex = Regex::new(&shape).map_err(|e| {
                    CoreError::configuration(format!("invalid pattern for tool '{}': {}", tool, e))
                })?;
                patterns.push((regex, tool.clone()));
            }
        }

        Ok(Self {
            fence,
            patterns,
            known_tools,
        })
    }

    /// Classifies one assistant response. Never fails; malformed input
    /// degrades to [`Classification::FencedUnparseable`] or
    /// [`Classification::Blank`].
    pub fn classify(&self, message: &Message) -> Classification {
        // Structured calls take precedence over anything in the text,
        // and only the first call is honored.
        if let Some(call) = message.tool_calls.as_ref().and_then(|calls| calls.first()) {
            let args = normalize_args(&call.args);
            return Classification::StructuredCall(ToolInvocation::new(&call.name, args));
        }

        let text = message.text().unwrap_or("");
        if text.trim().is_empty() {
            return Classification::Blank;
        }

        if let Some(captures) = self.fence.captures(text) {
            let body = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            return self.classify_fence(body);
        }

        Classification::PlainText(text.to_string())
    }

    fn classify_fence(&self, body: &str) -> Classification {
        // JSON first. A body that parses as JSON is never re-read as a
        // call pattern: an object naming a known tool routes, everything
        // else JSON-shaped is unparseable.
        if let Ok(value) = serde_json::from_str::<Value>(body) {
            if let Value::Object(map) = value {
                if let Some(name) = map.get("name").and_then(Value::as_str) {
                    if self.known_tools.iter().any(|t| t == name) {
                        let args = map
                            .get("parameters")
                            .map(normalize_args)
                            .unwrap_or_default();
                        return Classification::FencedInvocation(ToolInvocation::new(name, args));
                    }
                }
            }
            return Classification::FencedUnparseable;
        }

        for (pattern, tool) in &self.patterns {
            if let Some(captures) = pattern.captures(body) {
                let query = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                return Classification::FencedInvocation(ToolInvocation::with_query(tool, query));
            }
        }

        Classification::FencedUnparseable
    }
}

/// Normalizes a raw args value into a mapping. String-encoded JSON
/// objects are decoded; anything undecodable degrades to
/// `{"query": <raw>}` rather than erroring.
fn normalize_args(args: &Value) -> Map<String, Value> {
    match args {
        Value::Object(map) => map.clone(),
        Value::String(raw) => match serde_json::from_str::<Map<String, Value>>(raw) {
            Ok(map) => map,
            Err(_) => {
                let mut map = Map::new();
                map.insert("query".to_string(), Value::String(raw.clone()));
                map
            }
        },
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("query".to_string(), Value::String(other.to_string()));
            map
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manta_core::ToolCall;
    use serde_json::json;

    fn classifier() -> Classifier {
        Classifier::new(["rag_search", "vision_pdf_search"]).unwrap()
    }

    fn assistant_with_calls(text: &str, calls: Vec<ToolCall>) -> Message {
        Message::assistant(text).with_tool_calls(calls)
    }

    // ========================================================================
    // Structured Call Tests
    // ========================================================================

    #[test]
    fn test_structured_call_with_object_args() {
        let message = assistant_with_calls(
            "",
            vec![ToolCall::new("c1", "rag_search", json!({"query": "refund policy"}))],
        );
        let result = classifier().classify(&message);
        assert_eq!(
            result,
            Classification::StructuredCall(ToolInvocation::with_query(
                "rag_search",
                "refund policy"
            ))
        );
    }

    #[test]
    fn test_structured_call_beats_fenced_content() {
        let message = assistant_with_calls(
            "```tool_code\nvision_pdf_search(query=\"ignored\")\n```",
            vec![ToolCall::new("c1", "rag_search", json!({"query": "kept"}))],
        );
        match classifier().classify(&message) {
            Classification::StructuredCall(invocation) => {
                assert_eq!(invocation.name, "rag_search");
                assert_eq!(invocation.query(), Some("kept"));
            }
            other => panic!("expected structured call, got {:?}", other),
        }
    }

    #[test]
    fn test_only_first_structured_call_is_honored() {
        let message = assistant_with_calls(
            "",
            vec![
                ToolCall::new("c1", "rag_search", json!({"query": "first"})),
                ToolCall::new("c2", "vision_pdf_search", json!({"query": "second"})),
            ],
        );
        match classifier().classify(&message) {
            Classification::StructuredCall(invocation) => {
                assert_eq!(invocation.name, "rag_search");
                assert_eq!(invocation.query(), Some("first"));
            }
            other => panic!("expected structured call, got {:?}", other),
        }
    }

    #[test]
    fn test_structured_call_with_string_encoded_args() {
        let message = assistant_with_calls(
            "",
            vec![ToolCall::new(
                "c1",
                "rag_search",
                json!("{\"query\": \"opening hours\"}"),
            )],
        );
        match classifier().classify(&message) {
            Classification::StructuredCall(invocation) => {
                assert_eq!(invocation.query(), Some("opening hours"));
            }
            other => panic!("expected structured call, got {:?}", other),
        }
    }

    #[test]
    fn test_structured_call_args_degrade_on_bad_json() {
        let message = assistant_with_calls(
            "",
            vec![ToolCall::new("c1", "rag_search", json!("{not json"))],
        );
        match classifier().classify(&message) {
            Classification::StructuredCall(invocation) => {
                assert_eq!(invocation.query(), Some("{not json"));
            }
            other => panic!("expected structured call, got {:?}", other),
        }
    }

    #[test]
    fn test_structured_call_with_null_args() {
        let message =
            assistant_with_calls("", vec![ToolCall::new("c1", "rag_search", Value::Null)]);
        match classifier().classify(&message) {
            Classification::StructuredCall(invocation) => {
                assert!(invocation.args.is_empty());
            }
            other => panic!("expected structured call, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_call_list_falls_through_to_text() {
        let message = assistant_with_calls("just an answer", vec![]);
        assert_eq!(
            classifier().classify(&message),
            Classification::PlainText("just an answer".to_string())
        );
    }

    // ========================================================================
    // Fenced JSON Tests
    // ========================================================================

    #[test]
    fn test_fenced_json_known_tool() {
        let message = Message::assistant(
            "```tool_code\n{\"name\": \"rag_search\", \"parameters\": {\"query\": \"warranty\"}}\n```",
        );
        assert_eq!(
            classifier().classify(&message),
            Classification::FencedInvocation(ToolInvocation::with_query("rag_search", "warranty"))
        );
    }

    #[test]
    fn test_fenced_json_unknown_tool() {
        let message = Message::assistant(
            "```tool_code\n{\"name\": \"teleport\", \"parameters\": {\"query\": \"x\"}}\n```",
        );
        assert_eq!(
            classifier().classify(&message),
            Classification::FencedUnparseable
        );
    }

    #[test]
    fn test_fenced_json_without_parameters() {
        let message = Message::assistant("```tool_code\n{\"name\": \"rag_search\"}\n```");
        match classifier().classify(&message) {
            Classification::FencedInvocation(invocation) => {
                assert_eq!(invocation.name, "rag_search");
                assert!(invocation.args.is_empty());
            }
            other => panic!("expected fenced invocation, got {:?}", other),
        }
    }

    #[test]
    fn test_fenced_json_string_parameters_normalized() {
        let message = Message::assistant(
            "```tool_code\n{\"name\": \"rag_search\", \"parameters\": \"{\\\"query\\\": \\\"fees\\\"}\"}\n```",
        );
        match classifier().classify(&message) {
            Classification::FencedInvocation(invocation) => {
                assert_eq!(invocation.query(), Some("fees"));
            }
            other => panic!("expected fenced invocation, got {:?}", other),
        }
    }

    // ========================================================================
    // Fenced Pattern Tests
    // ========================================================================

    #[test]
    fn test_pattern_query_keyword() {
        let message =
            Message::assistant("```tool_code\nrag_search(query=\"refund\")\n```");
        assert_eq!(
            classifier().classify(&message),
            Classification::FencedInvocation(ToolInvocation::with_query("rag_search", "refund"))
        );
    }

    #[test]
    fn test_pattern_positional_string() {
        let message =
            Message::assistant("```tool_code\nvision_pdf_search(\"read the scan\")\n```");
        assert_eq!(
            classifier().classify(&message),
            Classification::FencedInvocation(ToolInvocation::with_query(
                "vision_pdf_search",
                "read the scan"
            ))
        );
    }

    #[test]
    fn test_pattern_print_wrapped() {
        let message = Message::assistant(
            "```tool_code\nprint(rag_search.invoke(query=\"shipping times\"))\n```",
        );
        assert_eq!(
            classifier().classify(&message),
            Classification::FencedInvocation(ToolInvocation::with_query(
                "rag_search",
                "shipping times"
            ))
        );
    }

    #[test]
    fn test_pattern_capture_is_verbatim() {
        let message = Message::assistant(
            "```tool_code\nrag_search(query=\"what's the fee? 100%, right...\")\n```",
        );
        match classifier().classify(&message) {
            Classification::FencedInvocation(invocation) => {
                assert_eq!(invocation.query(), Some("what's the fee? 100%, right..."));
            }
            other => panic!("expected fenced invocation, got {:?}", other),
        }
    }

    #[test]
    fn test_pattern_unknown_tool_is_unparseable() {
        let message = Message::assistant("```tool_code\nteleport(query=\"moon\")\n```");
        assert_eq!(
            classifier().classify(&message),
            Classification::FencedUnparseable
        );
    }

    #[test]
    fn test_fence_with_free_text_is_unparseable() {
        let message =
            Message::assistant("```tool_code\nI think the answer is probably 42.\n```");
        assert_eq!(
            classifier().classify(&message),
            Classification::FencedUnparseable
        );
    }

    #[test]
    fn test_tool_name_must_match_whole_word() {
        let message =
            Message::assistant("```tool_code\nmy_rag_search(query=\"x\")\n```");
        assert_eq!(
            classifier().classify(&message),
            Classification::FencedUnparseable
        );
    }

    // ========================================================================
    // Plain / Blank Tests
    // ========================================================================

    #[test]
    fn test_plain_text_response() {
        let message = Message::assistant("The store opens at nine.");
        assert_eq!(
            classifier().classify(&message),
            Classification::PlainText("The store opens at nine.".to_string())
        );
    }

    #[test]
    fn test_unclosed_fence_is_plain_text() {
        let text = "```tool_code\nrag_search(query=\"x\")";
        let message = Message::assistant(text);
        assert_eq!(
            classifier().classify(&message),
            Classification::PlainText(text.to_string())
        );
    }

    #[test]
    fn test_empty_response_is_blank() {
        assert_eq!(classifier().classify(&Message::assistant("")), Classification::Blank);
        assert_eq!(
            classifier().classify(&Message::assistant("   \n ")),
            Classification::Blank
        );
    }

    #[test]
    fn test_fence_mid_prose_still_routes() {
        let message = Message::assistant(
            "Let me look that up.\n```tool_code\nrag_search(query=\"deposits\")\n```\nOne moment.",
        );
        assert_eq!(
            classifier().classify(&message),
            Classification::FencedInvocation(ToolInvocation::with_query("rag_search", "deposits"))
        );
    }
}
