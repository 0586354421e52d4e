//! InferenceProvider trait — the abstraction over LLM backends.
//!
//! A provider knows how to send a trimmed message window to an LLM and get
//! assistant content back, either as a complete block list or as a stream
//! of delta chunks. Implementations (HTTP clients for specific vendors)
//! live outside this workspace; the run loop calls `infer()` or
//! `stream_infer()` without knowing which backend answers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::InferenceError;
use crate::message::{Message, MessageContent};

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// One inference call's worth of input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// The model to use (e.g., "anthropic/claude-sonnet-4", "gpt-4o")
    pub model: String,

    /// The trimmed message window
    pub messages: Vec<Message>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// System instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// A partial tool call inside a streaming chunk.
///
/// Deltas for one call share an `index`; `id` and `name` arrive once,
/// argument JSON arrives in fragments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    pub index: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments_delta: Option<String>,
}

/// A single chunk in a streaming response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceChunk {
    /// Partial reasoning trace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_delta: Option<String>,

    /// Partial visible text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_delta: Option<String>,

    /// Partial tool call deltas
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_call_deltas: Vec<ToolCallDelta>,
}

/// The core inference port.
///
/// `stream_infer` hands back the receiving end of a bounded channel: the
/// producer pushes chunks as they arrive, the run loop pulls them in
/// order. Chunks are never dropped or reordered.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get the complete assistant content.
    async fn infer(
        &self,
        request: InferenceRequest,
    ) -> std::result::Result<Vec<MessageContent>, InferenceError>;

    /// Send a request and get a stream of response chunks.
    ///
    /// Default implementation calls `infer()` and replays the result as
    /// one chunk per content block, so non-streaming backends behave
    /// identically on both paths. The channel is sized to hold the whole
    /// replay, so the sends below never block.
    async fn stream_infer(
        &self,
        request: InferenceRequest,
    ) -> std::result::Result<
        mpsc::Receiver<std::result::Result<InferenceChunk, InferenceError>>,
        InferenceError,
    > {
        let content = self.infer(request).await?;
        let (tx, rx) = mpsc::channel(content.len().max(1));
        let mut call_index = 0usize;
        for block in content {
            let chunk = match block {
                MessageContent::Text { text } => InferenceChunk {
                    text_delta: Some(text),
                    ..Default::default()
                },
                MessageContent::Thinking { thinking, .. } => InferenceChunk {
                    thinking_delta: Some(thinking),
                    ..Default::default()
                },
                MessageContent::ToolUse { id, name, input } => {
                    let delta = ToolCallDelta {
                        index: call_index,
                        id: Some(id),
                        name: Some(name),
                        arguments_delta: Some(input.to_string()),
                    };
                    call_index += 1;
                    InferenceChunk {
                        tool_call_deltas: vec![delta],
                        ..Default::default()
                    }
                }
                // Providers do not emit result or image blocks
                _ => continue,
            };
            if tx.send(Ok(chunk)).await.is_err() {
                break;
            }
        }
        Ok(rx)
    }
}
