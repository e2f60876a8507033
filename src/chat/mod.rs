//! One chat turn end to end.
//!
//! [`ChatService`] is what an HTTP entry point wraps: it sends the history to
//! the [`LlmRouter`], turns the reply into an assistant message, runs every
//! requested tool concurrently through a [`ToolDispatcher`] and returns the
//! new messages (assistant first, then one `tool` message per call, in call
//! order). It keeps no state between turns; the caller owns the history.

pub mod prompt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::router::{LlmRouter, RouterResponse};
use crate::tools::{ToolContext, ToolDispatcher};
use crate::types::{Message, MessageRole};
use crate::{Error, Result};

pub use prompt::{welcome_message, SYSTEM_PROMPT};

pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error processing your request.";

/// Request body of the chat entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub provider: String,
    pub model: String,
}

/// Successful reply: only the messages produced by this turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub messages: Vec<Message>,
}

/// Failure reply body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

impl ErrorBody {
    pub fn from_error(err: &Error) -> Self {
        let error = match err {
            Error::UnsupportedProvider { .. } => "Unsupported LLM provider",
            _ => "Failed to process request",
        };
        Self {
            error: error.to_string(),
            details: err.to_string(),
        }
    }
}

/// The router envelope could not be read as JSON.
#[derive(Debug, thiserror::Error)]
#[error("Failed to parse LLM response: {0}")]
pub struct ResponseParseError(#[from] serde_json::Error);

/// Parse a serialized [`RouterResponse`].
pub fn parse_envelope(raw: &str) -> std::result::Result<RouterResponse, ResponseParseError> {
    Ok(serde_json::from_str(raw)?)
}

#[derive(Debug, Clone)]
pub struct ChatService {
    router: Arc<LlmRouter>,
}

impl ChatService {
    pub fn new(router: Arc<LlmRouter>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &LlmRouter {
        &self.router
    }

    fn dispatcher(&self, ctx: &ToolContext) -> ToolDispatcher {
        ToolDispatcher::new(self.router.registry().clone(), ctx.clone())
    }

    /// Run one turn. Router failures propagate; tool failures never do.
    pub async fn handle(&self, request: &ChatRequest, ctx: &ToolContext) -> Result<ChatResponse> {
        info!(
            provider = %request.provider,
            model = %request.model,
            message_count = request.messages.len(),
            "chat request"
        );
        let reply = self
            .router
            .route(&request.messages, &request.provider, &request.model)
            .await?;
        let messages = self.complete_turn(reply, ctx).await;
        info!(produced = messages.len(), "chat request completed");
        Ok(ChatResponse { messages })
    }

    /// [`handle`](Self::handle) rendered for the HTTP edge: status and JSON body.
    pub async fn respond(&self, request: &ChatRequest, ctx: &ToolContext) -> (u16, Value) {
        let rendered = self
            .handle(request, ctx)
            .await
            .and_then(|resp| serde_json::to_value(&resp).map_err(Error::from));
        match rendered {
            Ok(body) => (200, body),
            Err(err) => error_reply(&err),
        }
    }

    /// Process a serialized envelope. Unreadable text is kept as a plain
    /// assistant message instead of failing the turn.
    pub async fn ingest_envelope(&self, raw: &str, ctx: &ToolContext) -> ChatResponse {
        let messages = match parse_envelope(raw) {
            Ok(reply) => self.complete_turn(reply, ctx).await,
            Err(err) => {
                warn!(error = %err, "falling back to raw reply text");
                let text = if raw.trim().is_empty() {
                    FALLBACK_REPLY
                } else {
                    raw
                };
                vec![Message::assistant(text)]
            }
        };
        ChatResponse { messages }
    }

    /// Assistant message plus one tool message per requested call.
    pub async fn complete_turn(&self, reply: RouterResponse, ctx: &ToolContext) -> Vec<Message> {
        let calls = reply.tool_calls;
        let assistant = Message::assistant_with_tool_calls(reply.content, calls.clone());
        if calls.is_empty() {
            return vec![assistant];
        }

        info!(count = calls.len(), "executing tool calls");
        let results = self.dispatcher(ctx).execute_all(&calls).await;

        let mut messages = Vec::with_capacity(results.len() + 1);
        messages.push(assistant);
        messages.extend(results.iter().map(Message::from_tool_result));
        messages
    }

    /// Keep re-submitting until the model stops calling tools or `max_rounds`
    /// router calls have been made. Returns everything appended to `history`.
    ///
    /// A failed follow-up call ends the exchange with an assistant message:
    /// the generic failure text, preceded by a description of each tool
    /// failure from the last round.
    pub async fn converse(
        &self,
        history: &mut Vec<Message>,
        provider: &str,
        model: &str,
        ctx: &ToolContext,
        max_rounds: usize,
    ) -> Result<Vec<Message>> {
        let start = history.len();
        for round in 0..max_rounds.max(1) {
            let request = ChatRequest {
                messages: history.clone(),
                provider: provider.to_string(),
                model: model.to_string(),
            };
            let response = match self.handle(&request, ctx).await {
                Ok(r) => r,
                Err(err) if round == 0 => return Err(err),
                Err(err) => {
                    warn!(error = %err, round, "follow-up completion failed");
                    let appended = &history[start..];
                    let last_turn = appended
                        .iter()
                        .rposition(Message::has_tool_calls)
                        .unwrap_or(0);
                    let failures = failure_notices(&appended[last_turn..]);
                    history.extend(failures);
                    history.push(Message::assistant(FALLBACK_REPLY));
                    break;
                }
            };
            let called_tools = response.messages.iter().any(Message::has_tool_calls);
            history.extend(response.messages);
            if !called_tools {
                break;
            }
        }
        Ok(history[start..].to_vec())
    }
}

/// Status and JSON body for a failed request.
fn error_reply(err: &Error) -> (u16, Value) {
    warn!(error = %err, "chat request failed");
    let body = ErrorBody::from_error(err);
    (
        err.http_status(),
        json!({ "error": body.error, "details": body.details }),
    )
}

/// Conversational notices for the failed tool results among `messages`.
fn failure_notices(messages: &[Message]) -> Vec<Message> {
    let calls: Vec<_> = messages.iter().flat_map(|m| m.tool_calls()).collect();
    messages
        .iter()
        .filter(|m| m.role == MessageRole::Tool)
        .filter_map(|m| {
            let payload: Value = serde_json::from_str(&m.content).ok()?;
            let error = payload.get("error")?.as_str()?.to_string();
            let tool = calls
                .iter()
                .find(|c| c.id == m.id)
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| "requested".to_string());
            let details = payload
                .get("details")
                .and_then(|d| d.as_str())
                .map(|d| format!(" ({})", d))
                .unwrap_or_default();
            Some(Message::assistant(format!(
                "I tried to use the {} tool, but it failed: {}{}",
                tool, error, details
            )))
        })
        .collect()
}
