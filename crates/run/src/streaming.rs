//! Streaming accumulation: delta chunks into growing message snapshots.
//!
//! The accumulator consumes an ordered sequence of provider chunks and
//! produces assistant message snapshots that all share one stable id.
//! Content is assembled in fixed order: thinking, then text, then tool
//! calls. A tool call appears in a snapshot only once its id, name, and
//! accumulated argument string parse as valid JSON; partial JSON is "not
//! yet ready", never an error, and is never forwarded downstream as a
//! completed call.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use colloquy_core::error::RunError;
use colloquy_core::inference::InferenceChunk;
use colloquy_core::message::{Message, MessageContent, Role};
use colloquy_core::thread::ThreadId;
use tracing::warn;
use uuid::Uuid;

/// Per-index accumulator for one tool call's deltas.
#[derive(Debug, Clone, Default)]
struct ToolCallAccumulator {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

impl ToolCallAccumulator {
    /// The call as a content block, once complete. Incomplete argument
    /// JSON means "still streaming".
    fn completed(&self) -> Option<MessageContent> {
        let id = self.id.as_ref()?;
        let name = self.name.as_ref()?;
        let input: serde_json::Value = serde_json::from_str(&self.arguments).ok()?;
        Some(MessageContent::tool_use(id, name, input))
    }

    /// Best-effort assembly after the source completed. An empty argument
    /// string becomes `{}` (providers omit deltas for nullary tools); an
    /// unparseable one drops the call with a warning.
    fn finalized(&self) -> Option<MessageContent> {
        let id = self.id.as_ref()?;
        let name = self.name.as_ref()?;
        let input = if self.arguments.trim().is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            match serde_json::from_str(&self.arguments) {
                Ok(value) => value,
                Err(e) => {
                    warn!(
                        call_id = %id,
                        tool = %name,
                        error = %e,
                        "dropping tool call with unparseable arguments"
                    );
                    return None;
                }
            }
        };
        Some(MessageContent::tool_use(id, name, input))
    }
}

/// Accumulates streaming inference chunks into assistant snapshots.
///
/// Every snapshot and the finalized message share one stable message
/// identity; the caller persists the finalized message exactly once.
pub struct StreamingAccumulator {
    message_id: String,
    thread_id: ThreadId,
    created_at: DateTime<Utc>,
    thinking: String,
    text: String,
    tool_calls: BTreeMap<usize, ToolCallAccumulator>,
}

impl StreamingAccumulator {
    pub fn new(thread_id: ThreadId) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            thread_id,
            created_at: Utc::now(),
            thinking: String::new(),
            text: String::new(),
            tool_calls: BTreeMap::new(),
        }
    }

    /// The stable identity shared by all snapshots of this stream.
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Apply one chunk. Returns true when any accumulator changed, i.e.
    /// when a new snapshot is worth emitting.
    pub fn apply(&mut self, chunk: &InferenceChunk) -> bool {
        let mut changed = false;

        if let Some(delta) = &chunk.thinking_delta {
            if !delta.is_empty() {
                self.thinking.push_str(delta);
                changed = true;
            }
        }

        if let Some(delta) = &chunk.text_delta {
            if !delta.is_empty() {
                self.text.push_str(delta);
                changed = true;
            }
        }

        for delta in &chunk.tool_call_deltas {
            let acc = self.tool_calls.entry(delta.index).or_default();
            if let Some(id) = &delta.id {
                acc.id = Some(id.clone());
                changed = true;
            }
            if let Some(name) = &delta.name {
                acc.name = Some(name.clone());
                changed = true;
            }
            if let Some(arguments) = &delta.arguments_delta {
                if !arguments.is_empty() {
                    acc.arguments.push_str(arguments);
                    changed = true;
                }
            }
        }

        changed
    }

    fn message_with(&self, content: Vec<MessageContent>) -> Message {
        Message {
            id: self.message_id.clone(),
            thread_id: self.thread_id.clone(),
            role: Role::Assistant,
            content,
            created_at: self.created_at,
        }
    }

    /// The current snapshot. Tool calls whose arguments are still partial
    /// are withheld.
    pub fn snapshot(&self) -> Message {
        let mut content = Vec::new();
        if !self.thinking.is_empty() {
            content.push(MessageContent::thinking(self.thinking.clone()));
        }
        if !self.text.is_empty() {
            content.push(MessageContent::text(self.text.clone()));
        }
        for acc in self.tool_calls.values() {
            if let Some(block) = acc.completed() {
                content.push(block);
            }
        }
        self.message_with(content)
    }

    /// Final assembly, run once after the source sequence completes.
    ///
    /// A stream that produced zero content is a fatal error; a tool call
    /// with unparseable arguments is dropped, not fatal.
    pub fn finalize(&self) -> Result<Message, RunError> {
        let mut content = Vec::new();
        if !self.thinking.is_empty() {
            content.push(MessageContent::thinking(self.thinking.clone()));
        }
        if !self.text.is_empty() {
            content.push(MessageContent::text(self.text.clone()));
        }
        for acc in self.tool_calls.values() {
            if let Some(block) = acc.finalized() {
                content.push(block);
            }
        }

        if content.is_empty() {
            return Err(RunError::NoFinalMessage);
        }
        Ok(self.message_with(content))
    }
}
