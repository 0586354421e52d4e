//! The MCP tool bridge.
//!
//! Adapts MCP-backed tool calls onto the tool-result contract the run loop
//! expects. Every failure mode becomes a `ToolExecutionResult` value:
//! missing configuration, provider-reported tool errors, and transport
//! faults each get distinct wording so callers can tell "the tool said no"
//! apart from "we couldn't reach the tool".

use std::sync::Arc;

use colloquy_core::error::McpError;
use colloquy_core::mcp::{McpCapabilities, McpCapabilitySet, McpPromptResult};
use colloquy_core::tool::{Tool, ToolExecutionResult};
use futures::future;
use tracing::warn;

/// Bridges MCP-backed tools to the run loop.
pub struct McpToolBridge {
    client: Arc<dyn McpCapabilities>,
}

impl McpToolBridge {
    pub fn new(client: Arc<dyn McpCapabilities>) -> Self {
        Self { client }
    }

    /// Execute an MCP-backed tool call.
    ///
    /// Never returns an error: a tool without an integration id is a
    /// configuration failure result, a provider-level error keeps its own
    /// message, and a transport fault gets the "failed unexpectedly"
    /// wording.
    pub async fn execute_tool(
        &self,
        tool: &Tool,
        params: &serde_json::Value,
    ) -> ToolExecutionResult {
        let Some(integration_id) = tool.integration_id() else {
            return ToolExecutionResult::failure(format!(
                "tool '{}' has no MCP integration configured",
                tool.name
            ));
        };

        match self
            .client
            .execute_tool(integration_id, &tool.name, params)
            .await
        {
            Ok(outcome) if outcome.is_error => {
                let message = outcome
                    .error_message
                    .unwrap_or_else(|| "MCP tool reported an unspecified error".into());
                ToolExecutionResult::failure(message)
            }
            Ok(outcome) => outcome,
            Err(e) => ToolExecutionResult::failure(format!(
                "MCP tool execution failed unexpectedly: {e}"
            )),
        }
    }

    /// Render an execution result into tool-result text.
    ///
    /// String content passes through untouched; any other successful
    /// content is JSON-serialized.
    pub fn render_result(result: &ToolExecutionResult) -> String {
        if result.is_error {
            return result
                .error_message
                .clone()
                .unwrap_or_else(|| "MCP tool reported an unspecified error".into());
        }
        match &result.content {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Discover the capabilities of every given integration in parallel.
    ///
    /// A failing integration contributes empty sets and a warning; the
    /// aggregate is never aborted. Results concatenate in input order so
    /// the outcome is deterministic regardless of completion order.
    pub async fn discover_capabilities(&self, integration_ids: &[String]) -> McpCapabilitySet {
        let calls: Vec<_> = integration_ids
            .iter()
            .map(|id| self.client.discover(id))
            .collect();
        let results = future::join_all(calls).await;

        let mut aggregate = McpCapabilitySet::default();
        for (integration_id, result) in integration_ids.iter().zip(results) {
            match result {
                Ok(set) => aggregate.extend(set),
                Err(e) => {
                    warn!(
                        integration_id = %integration_id,
                        error = %e,
                        "MCP discovery failed, contributing empty capabilities"
                    );
                }
            }
        }
        aggregate
    }

    /// Fetch a rendered prompt from an integration.
    pub async fn get_prompt(
        &self,
        integration_id: &str,
        name: &str,
        arguments: &serde_json::Value,
    ) -> Result<McpPromptResult, McpError> {
        self.client.get_prompt(integration_id, name, arguments).await
    }

    /// Read a resource from an integration.
    pub async fn retrieve_resource(
        &self,
        integration_id: &str,
        uri: &str,
        params: &serde_json::Value,
    ) -> Result<Option<serde_json::Value>, McpError> {
        self.client.retrieve_resource(integration_id, uri, params).await
    }
}
