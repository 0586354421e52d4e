//! MCP integration layer for Colloquy.
//!
//! The wire protocol lives behind the `McpCapabilities` port in core; this
//! crate adapts it to the contracts the run loop consumes: tool execution
//! that always yields a result value, and capability discovery that
//! degrades per integration instead of failing as a whole.

pub mod bridge;

pub use bridge::McpToolBridge;
