//! Context window management.
//!
//! Before each inference call the run loop trims the thread history to a
//! token budget. Two pieces cooperate:
//!
//! - `token` — pure token counting under a selectable algorithm
//! - `trimmer` — suffix selection with the leading-user-message guarantee

pub mod token;
pub mod trimmer;

pub use token::{CounterKind, count_tokens};
pub use trimmer::{message_cost, trim};
