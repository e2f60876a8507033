//! # Types Module
//!
//! Core data types passed between the caller, the router and the tool dispatcher.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Chat message with id, role, text and optional tool calls |
//! | [`MessageRole`] | Closed role set: user, assistant, system, tool |
//! | [`ToolCall`] | A request to invoke a named tool with JSON-encoded arguments |
//! | [`ToolResult`] | Dispatcher output keyed by the originating call id |
//! | [`ToolOutcome`] | Tagged success / failure payload inside a [`ToolResult`] |
//!
//! ## Example
//!
//! ```rust
//! use llm_auth_router::types::{Message, ToolCall};
//!
//! let call = ToolCall::new("call_1", "check_auth_status", "{}");
//! let turn = Message::assistant_with_tool_calls("Let me check.", vec![call]);
//! assert!(turn.has_tool_calls());
//! ```

pub mod message;
pub mod tool;

pub use message::{Message, MessageRole};
pub use tool::{FunctionCall, ToolCall, ToolCallType, ToolOutcome, ToolResult};
