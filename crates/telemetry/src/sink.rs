//! Telemetry sinks and the best-effort flush boundary.
//!
//! Sinks may fail (full buffers, remote collectors, closed files). The
//! invariant is that a telemetry failure never fails the run that produced
//! the trace: `flush_best_effort` is the single place where sink errors
//! are logged and swallowed.

use std::sync::RwLock;

use crate::TelemetryError;
use crate::trace::RunTrace;

/// A destination for completed run traces.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, trace: &RunTrace) -> Result<(), TelemetryError>;
}

/// Flush a trace to a sink, logging failures instead of propagating them.
pub fn flush_best_effort(sink: &dyn TelemetrySink, trace: &RunTrace) {
    if let Err(e) = sink.record(trace) {
        tracing::warn!(run_id = %trace.run_id, error = %e, "telemetry flush failed");
    }
}

/// An in-process sink that keeps traces in memory.
///
/// Thread-safe via `RwLock`. Auto-prunes the oldest traces once the buffer
/// grows past its capacity.
pub struct InMemorySink {
    traces: RwLock<Vec<RunTrace>>,
    capacity: usize,
}

impl InMemorySink {
    pub fn new(capacity: usize) -> Self {
        Self {
            traces: RwLock::new(Vec::new()),
            capacity,
        }
    }

    /// Number of traces currently held.
    pub fn trace_count(&self) -> usize {
        self.traces.read().unwrap().len()
    }

    /// Most recent traces first.
    pub fn recent_traces(&self, limit: usize) -> Vec<RunTrace> {
        let traces = self.traces.read().unwrap();
        traces.iter().rev().take(limit).cloned().collect()
    }

    /// Traces recorded for a specific thread.
    pub fn traces_for_thread(&self, thread_id: &str) -> Vec<RunTrace> {
        let traces = self.traces.read().unwrap();
        traces
            .iter()
            .filter(|t| t.thread_id == thread_id)
            .cloned()
            .collect()
    }
}

impl Default for InMemorySink {
    fn default() -> Self {
        Self::new(5_000)
    }
}

impl TelemetrySink for InMemorySink {
    fn record(&self, trace: &RunTrace) -> Result<(), TelemetryError> {
        let mut traces = self.traces.write().unwrap();
        if traces.len() >= self.capacity {
            let drain_count = (self.capacity / 10).max(1);
            traces.drain(..drain_count);
        }
        traces.push(trace.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::SpanKind;

    #[test]
    fn record_and_query() {
        let sink = InMemorySink::default();
        let mut trace = RunTrace::new("thread-a");
        trace.record(SpanKind::Inference, "model", true);
        trace.end(true);

        sink.record(&trace).unwrap();
        sink.record(&RunTrace::new("thread-b")).unwrap();

        assert_eq!(sink.trace_count(), 2);
        assert_eq!(sink.traces_for_thread("thread-a").len(), 1);
        assert_eq!(sink.recent_traces(1)[0].thread_id, "thread-b");
    }

    #[test]
    fn capacity_prunes_oldest() {
        let sink = InMemorySink::new(10);
        for i in 0..12 {
            sink.record(&RunTrace::new(format!("thread-{i}"))).unwrap();
        }
        assert!(sink.trace_count() <= 11);
        // The oldest trace is gone
        assert!(sink.traces_for_thread("thread-0").is_empty());
    }

    #[test]
    fn flush_swallows_sink_failures() {
        struct FailingSink;
        impl TelemetrySink for FailingSink {
            fn record(&self, _trace: &RunTrace) -> Result<(), TelemetryError> {
                Err(TelemetryError::SinkUnavailable("collector down".into()))
            }
        }

        // Must not panic or propagate
        flush_best_effort(&FailingSink, &RunTrace::new("thread-x"));
    }
}
