//! # Colloquy Core
//!
//! Domain types, ports, and error definitions for the Colloquy
//! conversational backend. This crate has **zero framework dependencies**
//! beyond serde and async plumbing — it defines the domain model that all
//! other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (message persistence, inference, local tool
//! execution, MCP) is a trait here. Implementations live in their
//! respective crates or outside the workspace entirely. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod inference;
pub mod mcp;
pub mod message;
pub mod run;
pub mod store;
pub mod thread;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, InferenceError, McpError, Result, RunError, StoreError, ToolError};
pub use inference::{InferenceChunk, InferenceProvider, InferenceRequest, ToolCallDelta, ToolDefinition};
pub use mcp::{McpCapabilities, McpCapabilitySet, McpPromptResult};
pub use message::{Message, MessageContent, Role, ToolCallView};
pub use run::RunInput;
pub use store::{MessageStore, ThreadStore};
pub use thread::{AgentProfile, Thread, ThreadId};
pub use tool::{Tool, ToolCapabilities, ToolCatalog, ToolExecutionResult, ToolExecutor, ToolKind};
