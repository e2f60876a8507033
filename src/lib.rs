//! # llm-auth-router
//!
//! Tool-calling chat backend that lets an LLM drive a user's sign-in.
//!
//! A conversation is sent to one of several providers through a uniform
//! router. The model may answer with text or with requests to call tools;
//! the crate ships four authentication tools (`check_auth_status`, `login`,
//! `get_user_info`, `logout`) backed by a pluggable [`session::SessionStore`].
//! Tool calls are executed concurrently and their results are appended to the
//! conversation as `tool` messages.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use llm_auth_router::{
//!     chat::{ChatRequest, ChatService},
//!     config::RouterConfig,
//!     session::InMemorySessionStore,
//!     tools::{auth::auth_registry, ToolContext},
//!     LlmRouter, Message,
//! };
//!
//! #[tokio::main]
//! async fn main() -> llm_auth_router::Result<()> {
//!     let config = RouterConfig::from_env()?;
//!     let router = LlmRouter::from_config(&config, Arc::new(auth_registry()?))?;
//!     let service = ChatService::new(Arc::new(router));
//!     let ctx = ToolContext::new(Arc::new(InMemorySessionStore::demo()));
//!
//!     let request = ChatRequest {
//!         messages: vec![Message::user("Please log me in")],
//!         provider: "anthropic".into(),
//!         model: "claude-3-haiku-20240307".into(),
//!     };
//!     let reply = service.handle(&request, &ctx).await?;
//!     for m in reply.messages {
//!         println!("{}: {}", m.role.as_str(), m.content);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`router`] | Provider lookup table and the single upstream call |
//! | [`drivers`] | Per-provider wire formats (OpenAI, Anthropic, no-op) |
//! | [`transport`] | HTTP seam used by the router |
//! | [`tools`] | Tool definitions, registry, dispatcher and the auth tools |
//! | [`session`] | Session store seam and the in-memory demo backend |
//! | [`chat`] | One chat turn end to end |
//! | [`types`] | Messages, tool calls and tool results |
//! | [`config`] | Provider catalog and HTTP settings |

pub mod chat;
pub mod config;
pub mod drivers;
pub mod logging;
pub mod router;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;

pub use router::{LlmRouter, LlmRouterBuilder, ProviderInfo, RouterResponse};
pub use types::{
    message::{Message, MessageRole},
    tool::{ToolCall, ToolResult},
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
