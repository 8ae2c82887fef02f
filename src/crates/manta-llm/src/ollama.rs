//! Ollama provider implementation.
//!
//! Talks to a local Ollama server over its REST API:
//!
//! - `/api/chat` for chat completion (streaming disabled), with optional
//!   tool bindings and base64 image attachments
//! - `/api/embeddings` for embedding vectors
//! - `/api/tags` for health checks and model discovery
//!
//! Tool definitions are serialized only when the request carries them, so
//! the same client serves both the tool-bound first call of a turn and the
//! plain follow-up call.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use manta_core::{
    ChatModel, ChatRequest, ChatResponse, ContentPart, EmbeddingModel, Message, MessageContent,
    MessageRole, ToolCall, ToolDefinition, UsageMetadata,
};

use crate::config::OllamaConfig;
use crate::error::{LlmError, Result};

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OllamaToolDef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<HashMap<&'static str, Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Serialize)]
struct OllamaToolDef {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OllamaFunctionDef,
}

#[derive(Debug, Serialize)]
struct OllamaFunctionDef {
    name: String,
    description: String,
    parameters: Value,
}

impl From<&ToolDefinition> for OllamaToolDef {
    fn from(def: &ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: OllamaFunctionDef {
                name: def.name.clone(),
                description: def.description.clone(),
                parameters: def.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

/// Ollama usually emits `arguments` as a JSON object, but some models
/// return a string-encoded object instead. The raw value is passed
/// through untouched and normalized downstream.
#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    model: String,
    message: OllamaMessage,
    #[allow(dead_code)]
    done: bool,
    #[serde(default)]
    total_duration: Option<u64>,
    #[serde(default)]
    prompt_eval_count: Option<usize>,
    #[serde(default)]
    eval_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModelTag>,
}

#[derive(Debug, Deserialize)]
struct OllamaModelTag {
    name: String,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

// ============================================================================
// Chat Model
// ============================================================================

/// Chat model backed by an Ollama server.
///
/// The same type serves text-only and multimodal models; image parts in a
/// message are read from disk and sent base64-encoded in the `images`
/// field, which vision-capable models consume.
#[derive(Debug, Clone)]
pub struct OllamaChatModel {
    config: OllamaConfig,
    client: Client,
}

impl OllamaChatModel {
    /// Creates a new client for the configured endpoint and model.
    pub fn new(config: OllamaConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { config, client }
    }

    /// The model identifier this client sends requests to.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Checks whether the Ollama server is reachable.
    pub async fn check_health(&self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Lists the models installed on the server.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.config.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::ServiceUnavailable(format!(
                "Ollama returned status {}",
                status
            )));
        }
        let tags: OllamaTagsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse model list: {}", e)))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn convert_message(&self, message: &Message) -> Result<OllamaMessage> {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            // Ollama has no first-class tool role for local models;
            // tool output goes back in as user content.
            MessageRole::Tool => "user",
        };

        let (content, images) = match &message.content {
            MessageContent::Text(text) => (text.clone(), None),
            MessageContent::Parts(parts) => {
                let mut text_parts: Vec<&str> = Vec::new();
                let mut encoded = Vec::new();
                for part in parts {
                    match part {
                        ContentPart::Text { text } => text_parts.push(text),
                        ContentPart::Image { path } => {
                            let bytes = tokio::fs::read(path).await.map_err(|e| {
                                LlmError::InvalidRequest(format!(
                                    "Failed to read image '{}': {}",
                                    path, e
                                ))
                            })?;
                            encoded.push(BASE64.encode(&bytes));
                        }
                    }
                }
                let images = if encoded.is_empty() { None } else { Some(encoded) };
                (text_parts.join("\n"), images)
            }
        };

        Ok(OllamaMessage {
            role: role.to_string(),
            content,
            images,
            tool_calls: None,
        })
    }

    async fn build_messages(&self, messages: &[Message]) -> Result<Vec<OllamaMessage>> {
        let mut wire = Vec::with_capacity(messages.len());
        for message in messages {
            wire.push(self.convert_message(message).await?);
        }
        Ok(wire)
    }

    fn build_request(&self, request: &ChatRequest, messages: Vec<OllamaMessage>) -> OllamaRequest {
        let mut options: HashMap<&'static str, Value> = HashMap::new();
        if let Some(temperature) = request.config.temperature {
            options.insert("temperature", json!(temperature));
        }
        if let Some(top_p) = request.config.top_p {
            options.insert("top_p", json!(top_p));
        }

        let tools = if request.is_tool_bound() {
            Some(request.config.tools.iter().map(OllamaToolDef::from).collect())
        } else {
            None
        };

        OllamaRequest {
            model: self.config.model.clone(),
            messages,
            stream: false,
            tools,
            options: if options.is_empty() { None } else { Some(options) },
        }
    }

    fn convert_response(&self, response: OllamaChatResponse) -> ChatResponse {
        let tool_calls: Vec<ToolCall> = response
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                ToolCall::new(
                    Uuid::new_v4().to_string(),
                    call.function.name,
                    call.function.arguments,
                )
            })
            .collect();

        let mut message = Message::assistant(response.message.content);
        if !tool_calls.is_empty() {
            message = message.with_tool_calls(tool_calls);
        }

        let usage = match (response.prompt_eval_count, response.eval_count) {
            (Some(input), Some(output)) => Some(UsageMetadata::new(input as u32, output as u32)),
            _ => None,
        };

        let mut chat_response = ChatResponse::new(message);
        chat_response.usage = usage;
        chat_response
            .metadata
            .insert("model".to_string(), json!(response.model));
        if let Some(duration) = response.total_duration {
            chat_response
                .metadata
                .insert("total_duration_ns".to_string(), json!(duration));
        }
        chat_response
    }

    async fn chat_inner(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/api/chat", self.config.base_url);
        let messages = self.build_messages(&request.messages).await?;
        let body = self.build_request(request, messages);

        debug!(
            model = %self.config.model,
            tool_bound = request.is_tool_bound(),
            message_count = body.messages.len(),
            "sending chat request"
        );

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::ProviderError(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let ollama_response: OllamaChatResponse = response.json().await.map_err(|e| {
            LlmError::InvalidResponse(format!("Failed to parse Ollama response: {}", e))
        })?;

        debug!(
            prompt_tokens = ?ollama_response.prompt_eval_count,
            completion_tokens = ?ollama_response.eval_count,
            "received chat response"
        );

        Ok(self.convert_response(ollama_response))
    }
}

#[async_trait]
impl ChatModel for OllamaChatModel {
    async fn chat(&self, request: ChatRequest) -> manta_core::Result<ChatResponse> {
        Ok(self.chat_inner(&request).await?)
    }

    async fn is_available(&self) -> manta_core::Result<bool> {
        Ok(self.check_health().await)
    }

    fn clone_box(&self) -> Box<dyn ChatModel> {
        Box::new(self.clone())
    }
}

// ============================================================================
// Embedding Model
// ============================================================================

/// Embedding model backed by an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaEmbeddings {
    config: OllamaConfig,
    client: Client,
}

impl OllamaEmbeddings {
    pub fn new(config: OllamaConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { config, client }
    }

    async fn embed_inner(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.config.base_url);
        let body = OllamaEmbeddingRequest {
            model: self.config.model.clone(),
            prompt: text.to_string(),
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::ProviderError(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: OllamaEmbeddingResponse = response.json().await.map_err(|e| {
            LlmError::InvalidResponse(format!("Failed to parse embedding response: {}", e))
        })?;

        if parsed.embedding.is_empty() {
            return Err(LlmError::InvalidResponse(
                "Empty embedding returned".to_string(),
            ));
        }
        Ok(parsed.embedding)
    }
}

#[async_trait]
impl EmbeddingModel for OllamaEmbeddings {
    async fn embed(&self, text: &str) -> manta_core::Result<Vec<f32>> {
        Ok(self.embed_inner(text).await?)
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn test_client() -> OllamaChatModel {
        OllamaChatModel::new(OllamaConfig::new("test-model"))
    }

    // ========================================================================
    // Message Conversion Tests
    // ========================================================================

    #[tokio::test]
    async fn test_convert_text_roles() {
        let client = test_client();
        let cases = [
            (Message::system("be brief"), "system"),
            (Message::user("hi"), "user"),
            (Message::assistant("hello"), "assistant"),
            (Message::tool("CONTEXT: ..."), "user"),
        ];
        for (message, expected_role) in cases {
            let wire = client.convert_message(&message).await.unwrap();
            assert_eq!(wire.role, expected_role);
            assert!(wire.images.is_none());
        }
    }

    #[tokio::test]
    async fn test_convert_multimodal_message() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("page-1.png");
        let mut file = std::fs::File::create(&image_path).unwrap();
        file.write_all(b"\x89PNG\r\n\x1a\nfakedata").unwrap();

        let message = Message::user_with_images(
            "What does the chart show?",
            [image_path.to_string_lossy().to_string()],
        );
        let wire = test_client().convert_message(&message).await.unwrap();

        assert_eq!(wire.role, "user");
        assert_eq!(wire.content, "What does the chart show?");
        let images = wire.images.unwrap();
        assert_eq!(images.len(), 1);
        let decoded = BASE64.decode(&images[0]).unwrap();
        assert_eq!(decoded, b"\x89PNG\r\n\x1a\nfakedata");
    }

    #[tokio::test]
    async fn test_convert_missing_image_fails() {
        let message =
            Message::user_with_images("look", ["/nonexistent/page-1.png".to_string()]);
        let err = test_client().convert_message(&message).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidRequest(_)));
    }

    // ========================================================================
    // Request Serialization Tests
    // ========================================================================

    #[tokio::test]
    async fn test_tools_serialized_only_when_bound() {
        let client = test_client();

        let plain = ChatRequest::new(vec![Message::user("hi")]).with_temperature(0.7);
        let messages = client.build_messages(&plain.messages).await.unwrap();
        let body = serde_json::to_value(client.build_request(&plain, messages)).unwrap();
        assert!(body.get("tools").is_none());
        assert_eq!(body["options"]["temperature"], json!(0.7));
        assert_eq!(body["stream"], json!(false));

        let bound = ChatRequest::new(vec![Message::user("hi")])
            .with_tools(vec![ToolDefinition::new("rag_search", "Search the docs")]);
        let messages = client.build_messages(&bound.messages).await.unwrap();
        let body = serde_json::to_value(client.build_request(&bound, messages)).unwrap();
        let tools = body["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["type"], json!("function"));
        assert_eq!(tools[0]["function"]["name"], json!("rag_search"));
        assert!(tools[0]["function"]["parameters"].is_object());
    }

    #[tokio::test]
    async fn test_no_options_key_when_unset() {
        let client = test_client();
        let request = ChatRequest::new(vec![Message::user("hi")]);
        let messages = client.build_messages(&request.messages).await.unwrap();
        let body = serde_json::to_value(client.build_request(&request, messages)).unwrap();
        assert!(body.get("options").is_none());
    }

    // ========================================================================
    // Response Conversion Tests
    // ========================================================================

    #[test]
    fn test_convert_plain_response() {
        let raw = json!({
            "model": "gemma3:4b-it-qat",
            "message": {"role": "assistant", "content": "Hello there"},
            "done": true,
            "total_duration": 123456789u64,
            "prompt_eval_count": 10,
            "eval_count": 5
        });
        let parsed: OllamaChatResponse = serde_json::from_value(raw).unwrap();
        let response = test_client().convert_response(parsed);

        assert_eq!(response.message.text(), Some("Hello there"));
        assert!(!response.message.has_tool_calls());
        let usage = response.usage.unwrap();
        assert_eq!(usage.input_tokens, 10);
        assert_eq!(usage.output_tokens, 5);
        assert_eq!(usage.total_tokens, 15);
        assert_eq!(response.metadata["model"], json!("gemma3:4b-it-qat"));
    }

    #[test]
    fn test_convert_tool_call_response() {
        let raw = json!({
            "model": "test-model",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "rag_search", "arguments": {"query": "return policy"}}}
                ]
            },
            "done": true
        });
        let parsed: OllamaChatResponse = serde_json::from_value(raw).unwrap();
        let response = test_client().convert_response(parsed);

        assert!(response.message.has_tool_calls());
        let calls = response.message.tool_calls.as_ref().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "rag_search");
        assert_eq!(calls[0].args["query"], json!("return policy"));
        assert!(!calls[0].id.is_empty());
        assert!(response.usage.is_none());
    }

    #[test]
    fn test_string_arguments_pass_through_raw() {
        // Some models string-encode the arguments object; the raw value
        // must survive conversion for downstream normalization.
        let raw = json!({
            "model": "test-model",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "rag_search", "arguments": "{\"query\": \"hours\"}"}}
                ]
            },
            "done": true
        });
        let parsed: OllamaChatResponse = serde_json::from_value(raw).unwrap();
        let response = test_client().convert_response(parsed);

        let calls = response.message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].args, json!("{\"query\": \"hours\"}"));
    }

    #[test]
    fn test_missing_arguments_default_to_null() {
        let raw = json!({
            "model": "test-model",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [{"function": {"name": "rag_search"}}]
            },
            "done": true
        });
        let parsed: OllamaChatResponse = serde_json::from_value(raw).unwrap();
        let response = test_client().convert_response(parsed);
        assert_eq!(response.message.tool_calls.as_ref().unwrap()[0].args, Value::Null);
    }

    // ========================================================================
    // Health Check Tests
    // ========================================================================

    #[tokio::test]
    async fn test_check_health_unreachable() {
        let config = OllamaConfig::new("test-model").with_base_url("http://127.0.0.1:9");
        let client = OllamaChatModel::new(config);
        assert!(!client.check_health().await);
        assert!(!client.is_available().await.unwrap());
    }

    // ========================================================================
    // Live Server Tests
    // ========================================================================
    // NOTE: These tests require a running Ollama server at localhost:11434
    // with the named models pulled. Run with: cargo test -- --ignored

    #[tokio::test]
    #[ignore]
    async fn test_live_chat() {
        let client = OllamaChatModel::new(OllamaConfig::new("gemma3:4b-it-qat"));
        let request = ChatRequest::new(vec![Message::user("Say hello in one word")])
            .with_temperature(0.0);
        let response = client.chat(request).await.unwrap();
        assert!(response.message.text().is_some());
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_list_models() {
        let client = test_client();
        let models = client.list_models().await.unwrap();
        assert!(!models.is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_embeddings() {
        let embeddings = OllamaEmbeddings::new(OllamaConfig::new("nomic-embed-text"));
        let vector = embeddings.embed("store opening hours").await.unwrap();
        assert!(!vector.is_empty());
    }
}
