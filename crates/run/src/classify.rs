//! Tool classification.
//!
//! Classification is a pure derivation from the tool's kind, resolved
//! once at catalog assembly. It is authoritative in two places: per-call
//! dispatch (execute server-side vs. acknowledge for the frontend) and
//! the loop-exit decision (a displayable call hands control to the UI).

use colloquy_core::tool::{Tool, ToolCapabilities, ToolKind};

/// Classify a tool descriptor into its capability pair.
///
/// The two flags are mutually exclusive: a tool is either rendered by the
/// frontend or executed by the backend, never both.
pub fn classify(tool: &Tool) -> ToolCapabilities {
    match tool.kind {
        ToolKind::Displayable => ToolCapabilities {
            displayable: true,
            executable: false,
        },
        ToolKind::Local | ToolKind::McpBacked { .. } => ToolCapabilities {
            displayable: false,
            executable: true,
        },
    }
}
