//! McpCapabilities port — the contract the MCP bridge consumes.
//!
//! The wire protocol (connect/list/call/read over HTTP) is implemented
//! outside this workspace. Each request is bound by the collaborator's own
//! internal timeout (~30s), independent of the run's lifetime.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::McpError;
use crate::tool::ToolExecutionResult;

/// A tool hosted by an MCP integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// A resource hosted by an MCP integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpResourceDescriptor {
    pub uri: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// A prompt template hosted by an MCP integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpPromptDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Everything one integration exposes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpCapabilitySet {
    #[serde(default)]
    pub tools: Vec<McpToolDescriptor>,
    #[serde(default)]
    pub resources: Vec<McpResourceDescriptor>,
    #[serde(default)]
    pub prompts: Vec<McpPromptDescriptor>,
}

impl McpCapabilitySet {
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty() && self.resources.is_empty() && self.prompts.is_empty()
    }

    /// Append another set, preserving this set's ordering first.
    pub fn extend(&mut self, other: McpCapabilitySet) {
        self.tools.extend(other.tools);
        self.resources.extend(other.resources);
        self.prompts.extend(other.prompts);
    }
}

/// One rendered message of an MCP prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpPromptMessage {
    pub role: String,
    pub content: String,
}

/// The result of fetching an MCP prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpPromptResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub messages: Vec<McpPromptMessage>,
}

/// The port to a remote MCP integration host.
#[async_trait]
pub trait McpCapabilities: Send + Sync {
    /// List the tools, resources, and prompts one integration exposes.
    async fn discover(
        &self,
        integration_id: &str,
    ) -> std::result::Result<McpCapabilitySet, McpError>;

    /// Execute a tool on an integration.
    ///
    /// Tool-level failures come back as `ToolExecutionResult::is_error`;
    /// the `Err` arm is reserved for transport and protocol faults.
    async fn execute_tool(
        &self,
        integration_id: &str,
        tool_name: &str,
        params: &serde_json::Value,
    ) -> std::result::Result<ToolExecutionResult, McpError>;

    /// Fetch a rendered prompt.
    async fn get_prompt(
        &self,
        integration_id: &str,
        name: &str,
        arguments: &serde_json::Value,
    ) -> std::result::Result<McpPromptResult, McpError>;

    /// Read a resource by URI. `None` when the resource has no content.
    async fn retrieve_resource(
        &self,
        integration_id: &str,
        uri: &str,
        params: &serde_json::Value,
    ) -> std::result::Result<Option<serde_json::Value>, McpError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with_tool(name: &str) -> McpCapabilitySet {
        McpCapabilitySet {
            tools: vec![McpToolDescriptor {
                name: name.into(),
                description: "a tool".into(),
                input_schema: serde_json::json!({"type": "object"}),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn extend_preserves_order() {
        let mut aggregate = set_with_tool("first");
        aggregate.extend(set_with_tool("second"));
        let names: Vec<_> = aggregate.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn empty_set_reports_empty() {
        assert!(McpCapabilitySet::default().is_empty());
        assert!(!set_with_tool("t").is_empty());
    }
}
