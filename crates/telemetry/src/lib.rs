//! Per-run execution tracing for Colloquy.
//!
//! Provides span-based tracing of every run action (inference calls, tool
//! dispatches, MCP discovery) collected on an explicit `RunTrace` object
//! that travels with the run, and sinks that receive completed traces on a
//! strictly best-effort basis.

pub mod sink;
pub mod trace;

pub use sink::{InMemorySink, TelemetrySink, flush_best_effort};
pub use trace::{RunTrace, Span, SpanKind};

/// Errors from the telemetry subsystem.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
