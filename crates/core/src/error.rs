//! Error types for the Colloquy domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; `RunError` is the stable
//! surface callers of the run orchestrator see.

use crate::thread::ThreadId;
use thiserror::Error;

/// The top-level error type for all Colloquy operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Run orchestration errors ---
    #[error("Run error: {0}")]
    Run(#[from] RunError),

    // --- Inference errors ---
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- MCP errors ---
    #[error("MCP error: {0}")]
    Mcp(#[from] McpError),

    // --- Store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Structural failures that abort a run.
///
/// Tool-level failures never appear here: they are converted into
/// tool-result content and fed back to the model, which may retry or
/// explain. Anything that is not already one of these variants is wrapped
/// exactly once into `ExecutionFailed` at the outermost boundary.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid run input: {0}")]
    InvalidInput(String),

    #[error("no model found for thread {0}")]
    NoModelFound(ThreadId),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool execution failed: {tool_name}: {source}")]
    ToolExecutionFailed {
        tool_name: String,
        #[source]
        source: ToolError,
    },

    #[error("run exceeded the maximum of {max} iterations")]
    MaxIterationsReached { max: u32 },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("streaming produced no final message")]
    NoFinalMessage,

    #[error("run execution failed: {0}")]
    ExecutionFailed(String),
}

impl RunError {
    /// Collapse an arbitrary error into the stable run-error surface.
    /// Already-typed run errors pass through unmodified.
    pub fn wrap(err: Error) -> RunError {
        match err {
            Error::Run(run) => run,
            other => RunError::ExecutionFailed(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("internal tool error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Whether this failure's message may be fed back to the model as
    /// tool-result content. Internal faults are substituted with a generic
    /// notice instead.
    pub fn model_visible(&self) -> bool {
        !matches!(self, ToolError::Internal(_))
    }
}

#[derive(Debug, Error)]
pub enum McpError {
    #[error("integration not found: {0}")]
    IntegrationNotFound(String),

    #[error("{0}")]
    Transport(String),

    #[error("MCP request timed out after {0}s")]
    Timeout(u64),

    #[error("protocol error: {0}")]
    Protocol(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("not found: {0}")]
    NotFound(String),
}
