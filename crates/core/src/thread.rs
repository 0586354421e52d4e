//! Thread and agent-profile domain types.
//!
//! A thread is a persisted conversation owning an ordered message history.
//! Threads may be bound to an agent profile; the profile's model takes
//! precedence over the thread's own model when a run starts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An agent profile attached to a thread.
///
/// Profiles carry their own model and instructions; when present, the
/// profile's model wins over the thread's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Unique profile ID
    pub id: String,

    /// Display name
    pub name: String,

    /// Model override for this agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// System instructions sent with every inference call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// A persisted conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    /// Unique thread ID
    pub id: ThreadId,

    /// Optional title (auto-generated or user-set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// The thread's own model, used when no agent profile overrides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Optional agent profile bound to this thread
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentProfile>,

    /// When this thread was created
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,
}

impl Thread {
    /// Create a new thread with an optional model.
    pub fn new(model: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ThreadId::new(),
            title: None,
            model,
            agent: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach an agent profile.
    pub fn with_agent(mut self, agent: AgentProfile) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Resolve the model a run on this thread must use.
    ///
    /// The agent profile's model wins; the thread's own model is the
    /// fallback. `None` means the run cannot start.
    pub fn resolve_model(&self) -> Option<&str> {
        self.agent
            .as_ref()
            .and_then(|a| a.model.as_deref())
            .or(self.model.as_deref())
    }

    /// System instructions for inference calls, if the agent defines any.
    pub fn instructions(&self) -> Option<&str> {
        self.agent.as_ref().and_then(|a| a.instructions.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(model: Option<&str>) -> AgentProfile {
        AgentProfile {
            id: "agent_1".into(),
            name: "Researcher".into(),
            model: model.map(String::from),
            instructions: Some("Be thorough.".into()),
        }
    }

    #[test]
    fn agent_model_wins_over_thread_model() {
        let thread = Thread::new(Some("gpt-4o".into())).with_agent(profile(Some("claude-sonnet-4")));
        assert_eq!(thread.resolve_model(), Some("claude-sonnet-4"));
    }

    #[test]
    fn thread_model_is_the_fallback() {
        let thread = Thread::new(Some("gpt-4o".into())).with_agent(profile(None));
        assert_eq!(thread.resolve_model(), Some("gpt-4o"));
    }

    #[test]
    fn no_model_resolves_to_none() {
        let thread = Thread::new(None);
        assert_eq!(thread.resolve_model(), None);
    }

    #[test]
    fn instructions_come_from_the_agent() {
        let thread = Thread::new(None).with_agent(profile(None));
        assert_eq!(thread.instructions(), Some("Be thorough."));
        assert_eq!(Thread::new(None).instructions(), None);
    }
}
