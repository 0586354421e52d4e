//! Message domain types.
//!
//! Messages are the core value objects that flow through the entire
//! system: a run input becomes a user message, inference produces an
//! assistant message, tool dispatch produces a tool message. A message is
//! an ordered list of content blocks; block order is significant and
//! preserved end to end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::thread::ThreadId;

/// The role of a message sender in a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// Tool execution results
    Tool,
}

/// A single content block within a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Visible text
    Text { text: String },

    /// Model reasoning trace
    Thinking {
        thinking: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },

    /// The model asks for a tool invocation
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// The answer to a tool invocation
    ToolResult {
        tool_use_id: String,
        name: String,
        result: String,
    },

    /// An image reference; bytes are resolved externally
    Image { index: u32, content_type: String },
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn thinking(thinking: impl Into<String>) -> Self {
        Self::Thinking {
            thinking: thinking.into(),
            id: None,
            signature: None,
        }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        Self::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn tool_result(
        tool_use_id: impl Into<String>,
        name: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            name: name.into(),
            result: result.into(),
        }
    }

    /// The text this block contributes when costing a message against a
    /// token budget. Images have a fixed out-of-band cost and contribute
    /// nothing here.
    pub fn budget_text(&self) -> Option<String> {
        match self {
            Self::Text { text } => Some(text.clone()),
            Self::Thinking { thinking, .. } => Some(thinking.clone()),
            Self::ToolUse { input, .. } => Some(input.to_string()),
            Self::ToolResult { result, .. } => Some(result.clone()),
            Self::Image { .. } => None,
        }
    }
}

/// A borrowed view of a `ToolUse` block.
#[derive(Debug, Clone, Copy)]
pub struct ToolCallView<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub input: &'a serde_json::Value,
}

/// A single message in a thread.
///
/// Immutable once persisted, except the in-flight assistant message during
/// streaming, which keeps one stable `id` across all partial snapshots and
/// is persisted exactly once at completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// The thread this message belongs to
    pub thread_id: ThreadId,

    /// Who sent this message
    pub role: Role,

    /// Ordered content blocks
    pub content: Vec<MessageContent>,

    /// Timestamp
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message with a fresh ID.
    pub fn new(thread_id: ThreadId, role: Role, content: Vec<MessageContent>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            thread_id,
            role,
            content,
            created_at: Utc::now(),
        }
    }

    /// Create a new user message with a single text block.
    pub fn user(thread_id: ThreadId, text: impl Into<String>) -> Self {
        Self::new(thread_id, Role::User, vec![MessageContent::text(text)])
    }

    /// Create a new system message.
    pub fn system(thread_id: ThreadId, text: impl Into<String>) -> Self {
        Self::new(thread_id, Role::System, vec![MessageContent::text(text)])
    }

    /// Create a new assistant message from inference output.
    pub fn assistant(thread_id: ThreadId, content: Vec<MessageContent>) -> Self {
        Self::new(thread_id, Role::Assistant, content)
    }

    /// Create a tool message bundling one iteration's tool results.
    pub fn tool_results(thread_id: ThreadId, results: Vec<MessageContent>) -> Self {
        Self::new(thread_id, Role::Tool, results)
    }

    /// All `ToolUse` blocks in this message, in content order.
    pub fn tool_calls(&self) -> Vec<ToolCallView<'_>> {
        self.content
            .iter()
            .filter_map(|block| match block {
                MessageContent::ToolUse { id, name, input } => {
                    Some(ToolCallView { id, name, input })
                }
                _ => None,
            })
            .collect()
    }

    /// Whether this message requests any tool invocation.
    pub fn has_tool_calls(&self) -> bool {
        self.content
            .iter()
            .any(|block| matches!(block, MessageContent::ToolUse { .. }))
    }

    /// Concatenated visible text of this message.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                MessageContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}
