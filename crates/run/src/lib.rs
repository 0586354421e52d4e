//! The run orchestrator — the heart of Colloquy.
//!
//! A run turns one input into a bounded sequence of iterations:
//!
//! 1. **Collect tools** — answer every tool call from the previous turn
//!    (frontend result, acknowledgment, or server-side execution)
//! 2. **Append user input** — persist the new user turn, first iteration only
//! 3. **Infer** — trim the history to the token budget and call the model,
//!    streaming snapshots or taking one complete response
//! 4. **Decide** — stop on pure text or a displayable tool call, loop on
//!    executable calls
//!
//! The loop continues until the model hands control back to the user or
//! the iteration cap aborts the run.

pub mod classify;
pub mod context;
pub mod orchestrator;
pub mod streaming;

pub use classify::classify;
pub use context::{CounterKind, count_tokens, message_cost, trim};
pub use orchestrator::{RunOrchestrator, RunSettings};
pub use streaming::StreamingAccumulator;
