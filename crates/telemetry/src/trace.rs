//! Data model for per-run execution traces.
//!
//! A `RunTrace` is the explicit correlation object for one orchestrator
//! run: it travels through the call chain instead of ambient logger state,
//! collecting one span per unit of work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Span ──────────────────────────────────────────────────────────────────

/// The kind of work a span represents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    /// An inference call (streaming or not).
    Inference,
    /// A tool dispatch (local or MCP).
    ToolDispatch,
    /// An MCP capability discovery fan-out.
    McpDiscovery,
    /// One loop iteration.
    Iteration,
}

impl std::fmt::Display for SpanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inference => write!(f, "inference"),
            Self::ToolDispatch => write!(f, "tool_dispatch"),
            Self::McpDiscovery => write!(f, "mcp_discovery"),
            Self::Iteration => write!(f, "iteration"),
        }
    }
}

/// A single traced execution unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    /// Unique identifier.
    pub id: String,
    /// What kind of work this represents.
    pub kind: SpanKind,
    /// Human-readable label (tool name, model name, integration id).
    pub label: String,
    /// When the span started.
    pub started_at: DateTime<Utc>,
    /// When the span ended (None if still running).
    pub ended_at: Option<DateTime<Utc>>,
    /// Duration in milliseconds (computed on end).
    pub duration_ms: Option<u64>,
    /// Whether the operation succeeded.
    pub success: Option<bool>,
}

impl Span {
    /// Create a new span with the given kind and label.
    pub fn new(kind: SpanKind, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            label: label.into(),
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
            success: None,
        }
    }

    /// Mark the span as ended with the given success status.
    pub fn end(&mut self, success: bool) {
        let now = Utc::now();
        self.ended_at = Some(now);
        self.duration_ms = Some(
            now.signed_duration_since(self.started_at)
                .num_milliseconds()
                .max(0) as u64,
        );
        self.success = Some(success);
    }
}

// ── RunTrace ──────────────────────────────────────────────────────────────

/// The spans and counters of one orchestrator run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTrace {
    /// Unique run id.
    pub run_id: String,
    /// Thread the run operated on.
    pub thread_id: String,
    /// All spans, in completion order.
    pub spans: Vec<Span>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run ended.
    pub ended_at: Option<DateTime<Utc>>,
    /// Whether the run completed without a structural error.
    pub success: Option<bool>,
}

impl RunTrace {
    /// Create a new trace for a run on the given thread.
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            thread_id: thread_id.into(),
            spans: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
            success: None,
        }
    }

    /// Add a completed span.
    pub fn add_span(&mut self, span: Span) {
        self.spans.push(span);
    }

    /// Record a completed unit of work in one step.
    pub fn record(&mut self, kind: SpanKind, label: impl Into<String>, success: bool) {
        let mut span = Span::new(kind, label);
        span.end(success);
        self.spans.push(span);
    }

    /// Mark the run as complete.
    pub fn end(&mut self, success: bool) {
        self.ended_at = Some(Utc::now());
        self.success = Some(success);
    }

    /// Number of inference calls in this run.
    pub fn inference_count(&self) -> usize {
        self.spans
            .iter()
            .filter(|s| s.kind == SpanKind::Inference)
            .count()
    }

    /// Number of tool dispatches in this run.
    pub fn tool_dispatch_count(&self) -> usize {
        self.spans
            .iter()
            .filter(|s| s.kind == SpanKind::ToolDispatch)
            .count()
    }

    /// Number of loop iterations in this run.
    pub fn iteration_count(&self) -> usize {
        self.spans
            .iter()
            .filter(|s| s.kind == SpanKind::Iteration)
            .count()
    }
}
