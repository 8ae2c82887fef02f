//! Tool contract and registry
//!
//! Every retrieval/inspection capability exposes the same contract: a
//! name, a JSON argument object (at minimum a `query` string), and a
//! text output carrying its own provenance tag (`CONTEXT:` for the
//! document store, `CONTEXT (vision …):` for page images).
//!
//! Expected failure modes (missing index, empty corpus, no PDFs) are
//! not errors: tools report them through sentinel text that downstream
//! routing detects by substring. [`ToolError`] is reserved for genuine
//! faults such as an unreachable backend, which the routing layer
//! catches and degrades at the call site.
//!
//! # Example
//!
//! ```rust,ignore
//! use manta_core::tool::{Tool, ToolRegistry};
//! use std::sync::Arc;
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(Arc::new(MySearchTool::new(...)));
//!
//! let tool = registry.get("rag_search").unwrap();
//! let out = tool.invoke(&serde_json::json!({"query": "refund"})).await?;
//! assert!(out.starts_with("CONTEXT"));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::llm::ToolDefinition;

/// Errors that can occur during tool invocation
#[derive(Error, Debug, Clone)]
pub enum ToolError {
    /// The requested tool is not registered
    #[error("Tool '{name}' not found")]
    NotFound {
        /// Name that was requested
        name: String,
    },

    /// Arguments did not match what the tool expects
    #[error("Invalid arguments for tool '{tool}': {error}")]
    InvalidArguments {
        /// Tool name
        tool: String,
        /// What was wrong
        error: String,
    },

    /// The tool ran and failed in a way it could not absorb
    #[error("Tool '{tool}' execution failed: {error}")]
    ExecutionFailed {
        /// Tool name
        tool: String,
        /// Underlying failure
        error: String,
    },
}

impl ToolError {
    /// Create a not-found error
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create an invalid-arguments error
    pub fn invalid_arguments(tool: impl Into<String>, error: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            error: error.into(),
        }
    }

    /// Create an execution-failed error
    pub fn execution_failed(tool: impl Into<String>, error: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            tool: tool.into(),
            error: error.into(),
        }
    }
}

/// A structured tool-call request as emitted by a model
///
/// `args` is kept exactly as the provider delivered it: a JSON object,
/// or a string-encoded object for providers that double-encode. The
/// classifier owns normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned or generated call id
    pub id: String,
    /// Requested tool name
    pub name: String,
    /// Raw argument payload
    pub args: Value,
}

impl ToolCall {
    /// Create a tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
        }
    }
}

/// A normalized `(name, args)` pair ready for execution
///
/// Whatever surface form a request arrived in (native tool-call field,
/// JSON in a fence, pseudo-code in a fence), routing reduces it to
/// this. Transient: it lives for one turn's routing decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// Tool to run
    pub name: String,
    /// String-keyed argument mapping
    pub args: Map<String, Value>,
}

impl ToolInvocation {
    /// Create an invocation
    pub fn new(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Create an invocation with a single `query` argument
    pub fn with_query(name: impl Into<String>, query: impl Into<String>) -> Self {
        let mut args = Map::new();
        args.insert("query".to_string(), Value::String(query.into()));
        Self::new(name, args)
    }

    /// The `query` argument, if present and a string
    pub fn query(&self) -> Option<&str> {
        self.args.get("query").and_then(Value::as_str)
    }

    /// The arguments as a JSON object value
    pub fn args_value(&self) -> Value {
        Value::Object(self.args.clone())
    }
}

/// Contract implemented by every retrieval/inspection capability
///
/// Implementations must not mutate conversation state; they read a
/// persisted index or render external files and return text.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name used for registration and routing
    fn name(&self) -> &str;

    /// One-line description surfaced to the model in tool bindings
    fn description(&self) -> &str;

    /// JSON schema for the argument object
    ///
    /// The default schema declares the single required `query` string
    /// every tool accepts.
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look for"
                }
            },
            "required": ["query"]
        })
    }

    /// Run the tool
    ///
    /// `args` is a JSON object (`{"query": …, "k": …}`). Expected
    /// "no result" conditions return sentinel text, not `Err`.
    async fn invoke(&self, args: &Value) -> Result<String, ToolError>;
}

/// Registry of available tools, preserving registration order
///
/// Registration order matters: the classifier builds its pattern table
/// from `tool_names()` and evaluates patterns in that fixed order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    ///
    /// Re-registering a name replaces the tool but keeps its original
    /// position in the order.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        tracing::debug!(tool = %name, "registered tool");
        self.tools.insert(name, tool);
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check whether a tool is registered
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names in registration order
    pub fn tool_names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True when no tools are registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool-binding declarations for a tool-bound model call
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| {
                ToolDefinition::new(tool.name(), tool.description())
                    .with_parameters(tool.parameters())
            })
            .collect()
    }

    /// Invoke a registered tool by name
    ///
    /// Missing tools are an `Err`; the routing layer turns that into
    /// user-visible text rather than propagating it.
    pub async fn invoke(&self, name: &str, args: &Value) -> Result<String, ToolError> {
        match self.tools.get(name) {
            Some(tool) => tool.invoke(args).await,
            None => Err(ToolError::not_found(name)),
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
