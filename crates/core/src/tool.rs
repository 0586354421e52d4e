//! Tool descriptors, the catalog, and the local executor port.
//!
//! A `Tool` is a descriptor, not behavior: its `ToolKind` is resolved once
//! when the catalog is assembled and is authoritative for classification
//! and dispatch. Behavior lives behind the `ToolExecutor` port (local
//! tools) or the MCP bridge (integration-backed tools).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ToolError;
use crate::inference::ToolDefinition;

/// How a tool's invocations are fulfilled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolKind {
    /// Executed server-side by the local `ToolExecutor`
    Local,
    /// Rendered by the frontend; the backend only acknowledges the call
    Displayable,
    /// Executed by a remote MCP integration
    McpBacked { integration_id: String },
}

/// Derived capability flags. Exactly one of the two is true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCapabilities {
    pub displayable: bool,
    pub executable: bool,
}

/// A tool descriptor as the catalog and the orchestrator see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// The unique tool name (e.g., "web_search", "render_chart")
    pub name: String,

    /// Description of what the tool does (sent to the LLM)
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,

    /// How invocations of this tool are fulfilled
    #[serde(flatten)]
    pub kind: ToolKind,
}

impl Tool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
        kind: ToolKind,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            kind,
        }
    }

    /// The MCP integration backing this tool, if any.
    pub fn integration_id(&self) -> Option<&str> {
        match &self.kind {
            ToolKind::McpBacked { integration_id } => Some(integration_id),
            _ => None,
        }
    }

    /// Convert this tool into a `ToolDefinition` for sending to the LLM.
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

/// The outcome of a tool execution. Always a value, never a panic or a
/// propagated error: the run loop depends on this invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecutionResult {
    pub is_error: bool,

    /// Successful payload; serialized into tool-result text downstream
    pub content: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ToolExecutionResult {
    pub fn success(content: serde_json::Value) -> Self {
        Self {
            is_error: false,
            content,
            error_message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            content: serde_json::Value::Null,
            error_message: Some(message.into()),
        }
    }
}

/// A registry of the tools a run may invoke.
///
/// The run loop uses this to:
/// 1. Get tool definitions to send to the LLM
/// 2. Resolve tool names the model emits back into descriptors
pub struct ToolCatalog {
    tools: HashMap<String, Tool>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Get all tool definitions (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// The port for executing local (non-MCP) tools.
///
/// Implementations may fail; the run loop isolates every call and converts
/// failures into tool-result content.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(
        &self,
        tool: &Tool,
        params: &serde_json::Value,
        org_id: &str,
    ) -> std::result::Result<String, ToolError>;
}
