//! Run input types.
//!
//! A run is one invocation of the orchestrator for a thread: either a new
//! user turn, or the frontend answering a displayable tool call from the
//! previous turn.

use serde::{Deserialize, Serialize};

use crate::error::RunError;

/// The input that starts a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunInput {
    /// A new user turn
    Text { text: String },

    /// The frontend's response to a displayable tool call
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        result: String,
    },
}

impl RunInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self::ToolResult {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            result: result.into(),
        }
    }

    /// Reject malformed inputs before any work starts.
    pub fn validate(&self) -> std::result::Result<(), RunError> {
        match self {
            Self::Text { text } if text.trim().is_empty() => Err(RunError::InvalidInput(
                "text input must not be empty".into(),
            )),
            Self::ToolResult { tool_call_id, .. } if tool_call_id.trim().is_empty() => Err(
                RunError::InvalidInput("tool result must reference a tool call id".into()),
            ),
            Self::ToolResult { tool_name, .. } if tool_name.trim().is_empty() => Err(
                RunError::InvalidInput("tool result must name its tool".into()),
            ),
            _ => Ok(()),
        }
    }

    /// If this input answers the given tool call id, its result text.
    pub fn result_for(&self, call_id: &str) -> Option<&str> {
        match self {
            Self::ToolResult {
                tool_call_id,
                result,
                ..
            } if tool_call_id == call_id => Some(result),
            _ => None,
        }
    }
}
