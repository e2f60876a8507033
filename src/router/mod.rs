//! LLM router: provider selection, one upstream call, normalized envelope.
//!
//! The router holds a lookup table of [`ProviderDriver`]s keyed by provider
//! id, the shared [`ToolRegistry`] whose full catalog is offered to the model,
//! and the [`LlmTransport`] used for the single remote call. It performs no
//! retries and imposes no timeout of its own.

pub mod builder;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::RouterConfig;
use crate::drivers::{DriverResponse, ProviderDriver, UsageInfo};
use crate::tools::ToolRegistry;
use crate::transport::{LlmTransport, TransportError};
use crate::types::{Message, MessageRole, ToolCall};
use crate::{Error, Result};

pub use builder::LlmRouterBuilder;

/// Selector entry: what a UI needs to offer a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub models: Vec<String>,
    pub supports_tools: bool,
}

/// Normalized router output.
///
/// Serializes as `{content, role: "assistant", tool_calls}`, the envelope
/// callers store or forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterResponse {
    #[serde(default)]
    pub content: String,
    #[serde(default = "assistant_role")]
    pub role: MessageRole,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(skip)]
    pub usage: Option<UsageInfo>,
}

fn assistant_role() -> MessageRole {
    MessageRole::Assistant
}

impl RouterResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: MessageRole::Assistant,
            tool_calls: Vec::new(),
            usage: None,
        }
    }
}

impl From<DriverResponse> for RouterResponse {
    fn from(r: DriverResponse) -> Self {
        Self {
            content: r.content,
            role: MessageRole::Assistant,
            tool_calls: r.tool_calls,
            usage: r.usage,
        }
    }
}

#[derive(Debug)]
pub struct LlmRouter {
    drivers: HashMap<String, Arc<dyn ProviderDriver>>,
    providers: Vec<ProviderInfo>,
    registry: Arc<ToolRegistry>,
    transport: Arc<dyn LlmTransport>,
}

impl LlmRouter {
    pub fn builder() -> LlmRouterBuilder {
        LlmRouterBuilder::new()
    }

    /// Router for every provider in `config`, talking HTTP.
    pub fn from_config(config: &RouterConfig, registry: Arc<ToolRegistry>) -> Result<Self> {
        LlmRouterBuilder::from_config(config)?
            .registry(registry)
            .build()
    }

    /// Selectable providers in registration order.
    pub fn providers(&self) -> &[ProviderInfo] {
        &self.providers
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Format `messages` for `provider_id`, call it once and normalize the reply.
    ///
    /// Fails with [`Error::UnsupportedProvider`] before any network activity
    /// when no driver matches (exact, case-sensitive id), and with
    /// [`Error::ProviderCall`] when the upstream call or its payload is bad.
    pub async fn route(
        &self,
        messages: &[Message],
        provider_id: &str,
        model: &str,
    ) -> Result<RouterResponse> {
        let driver = self
            .drivers
            .get(provider_id)
            .ok_or_else(|| Error::UnsupportedProvider {
                provider: provider_id.to_string(),
            })?;

        if let Some(reply) = driver.offline_reply() {
            info!(provider = %provider_id, model = %model, "provider has no tool support; answering locally");
            return Ok(reply.into());
        }

        let tools = self.registry.list_tools();
        let request = driver.build_request(messages, model, tools)?;
        info!(
            provider = %provider_id,
            model = %model,
            message_count = messages.len(),
            tools = ?self.registry.names(),
            "sending request to provider"
        );

        let body = self.transport.send(&request).await.map_err(|e| {
            error!(provider = %provider_id, error = %e, "provider call failed");
            provider_error(provider_id, e)
        })?;

        let reply = driver.parse_response(&body)?;
        info!(
            provider = %provider_id,
            content_len = reply.content.len(),
            tool_calls = reply.tool_calls.len(),
            finish_reason = ?reply.finish_reason,
            "provider responded"
        );
        Ok(reply.into())
    }
}

fn provider_error(provider_id: &str, err: TransportError) -> Error {
    let status = err.status();
    let message = match err {
        TransportError::Status { message, .. } => message,
        other => other.to_string(),
    };
    Error::provider_call(provider_id, status, message)
}
