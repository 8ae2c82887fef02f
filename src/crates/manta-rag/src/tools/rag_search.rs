//! Document retrieval tool.
//!
//! Exposes the vector index through the normalized tool contract: a
//! `query` in, a `CONTEXT` text block out. Expected failure modes
//! (missing store, empty index, embedding backend down) all surface as
//! the no-context sentinel rather than errors, so the caller's
//! escalation logic stays a plain substring check.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use manta_core::{EmbeddingModel, Tool, ToolError};

use crate::config::RagConfig;
use crate::retriever::{RetrieverCache, Snippet};

/// Registered name of the document retrieval tool.
pub const DOCUMENT_SEARCH_TOOL: &str = "rag_search";

/// Marker detectable by substring match when retrieval finds nothing.
pub const NO_CONTEXT_MARKER: &str = "(No relevant context found.)";

/// Full sentinel body returned when retrieval finds nothing.
pub const NO_CONTEXT_SENTINEL: &str = "CONTEXT:\n(No relevant context found.)";

const SNIPPET_MAX_CHARS: usize = 500;

/// Searches the persisted document index.
pub struct DocumentSearchTool {
    store_dir: PathBuf,
    default_k: usize,
    embedder: Arc<dyn EmbeddingModel>,
    cache: RetrieverCache,
}

impl DocumentSearchTool {
    pub fn new(config: &RagConfig, embedder: Arc<dyn EmbeddingModel>, cache: RetrieverCache) -> Self {
        Self {
            store_dir: config.store_dir.clone(),
            default_k: config.top_k,
            embedder,
            cache,
        }
    }
}

fn snippet_line(snippet: &Snippet) -> String {
    let basename = snippet
        .source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| snippet.source.display().to_string());
    let page = snippet
        .page
        .map(|p| format!(" p.{}", p))
        .unwrap_or_default();
    let text: String = snippet
        .text
        .replace('\n', " ")
        .chars()
        .take(SNIPPET_MAX_CHARS)
        .collect();
    format!("- [{}{}] {}...", basename, page, text)
}

fn format_snippets(snippets: &[Snippet]) -> String {
    let lines: Vec<String> = snippets.iter().map(snippet_line).collect();
    format!("CONTEXT:\n{}", lines.join("\n"))
}

#[async_trait]
impl Tool for DocumentSearchTool {
    fn name(&self) -> &str {
        DOCUMENT_SEARCH_TOOL
    }

    fn description(&self) -> &str {
        "Search the indexed documents and return the most relevant passages for a query."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The question to search the documents for"
                },
                "k": {
                    "type": "integer",
                    "description": "How many passages to return"
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, args: &Value) -> Result<String, ToolError> {
        let query = args.get("query").and_then(Value::as_str).unwrap_or("");
        let k = args
            .get("k")
            .and_then(Value::as_u64)
            .map(|k| k as usize)
            .filter(|k| *k > 0)
            .unwrap_or(self.default_k);

        let retriever = self
            .cache
            .get_or_open(&self.store_dir, k, &self.embedder)
            .await;
        let snippets = retriever.retrieve(query).await;
        debug!(query, k, hits = snippets.len(), "document search");

        if snippets.is_empty() {
            return Ok(NO_CONTEXT_SENTINEL.to_string());
        }
        Ok(format_snippets(&snippets))
    }
}
