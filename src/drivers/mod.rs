//! Provider driver abstraction layer.
//!
//! Each provider wire protocol is one [`ProviderDriver`] implementation
//! covering three operations: format the outbound message list, format the
//! outbound tool catalog, and parse the inbound reply into a [`DriverResponse`]
//! (text plus tool calls). The router keeps drivers in a lookup table keyed by
//! provider id, so adding a provider means adding one implementation.

pub mod anthropic;
pub mod noop;

use serde_json::{json, Value};
use std::collections::HashMap;

use crate::config::{ApiStyle, ProviderConfig};
use crate::tools::Tool;
use crate::types::{Message, MessageRole, ToolCall};
use crate::{Error, Result};

pub use anthropic::AnthropicDriver;
pub use noop::NoopDriver;

/// One completion request, always sent as a JSON `POST`.
#[derive(Debug, Clone)]
pub struct DriverRequest {
    /// Full endpoint URL.
    pub url: String,
    pub headers: HashMap<String, String>,
    /// Serialized JSON request body.
    pub body: Value,
}

/// Normalized reply: the envelope every driver produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverResponse {
    /// Assistant text; empty when the model only called tools.
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    /// Finish reason normalized to OpenAI vocabulary (`stop`, `length`, `tool_calls`).
    pub finish_reason: Option<String>,
    pub usage: Option<UsageInfo>,
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageInfo {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Message list in a provider's shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormattedMessages {
    /// Top-level system prompt, for providers that take it out of band.
    pub system: Option<String>,
    pub messages: Vec<Value>,
}

/// Core trait for provider-specific API adaptation.
pub trait ProviderDriver: Send + Sync + std::fmt::Debug {
    /// Unique provider identifier (the router's lookup key).
    fn provider_id(&self) -> &str;

    fn api_style(&self) -> ApiStyle;

    fn format_messages(&self, messages: &[Message]) -> Result<FormattedMessages>;

    fn format_tools(&self, tools: &[Tool]) -> Vec<Value>;

    /// Build the complete HTTP request for one completion.
    fn build_request(&self, messages: &[Message], model: &str, tools: &[Tool])
        -> Result<DriverRequest>;

    /// Parse a reply. An empty but well-formed reply yields an empty envelope.
    fn parse_response(&self, body: &Value) -> Result<DriverResponse>;

    /// Fixed reply for providers that never go over the network.
    fn offline_reply(&self) -> Option<DriverResponse> {
        None
    }
}

const OPENAI_CHAT_PATH: &str = "/v1/chat/completions";

/// OpenAI chat completions driver.
#[derive(Debug)]
pub struct OpenAiDriver {
    provider_id: String,
    base_url: String,
    api_key: Option<String>,
    max_tokens: Option<u32>,
}

impl OpenAiDriver {
    pub fn new(provider_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            base_url: base_url.into(),
            api_key: None,
            max_tokens: None,
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn format_message(message: &Message) -> Result<Value> {
        Ok(match message.role {
            MessageRole::Tool => json!({
                "role": "tool",
                "tool_call_id": message.id,
                "content": message.content,
            }),
            role if message.has_tool_calls() => json!({
                "role": role.as_str(),
                "content": message.content,
                "tool_calls": serde_json::to_value(message.tool_calls())?,
            }),
            role => json!({
                "role": role.as_str(),
                "content": message.content,
            }),
        })
    }
}

impl ProviderDriver for OpenAiDriver {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn api_style(&self) -> ApiStyle {
        ApiStyle::OpenAi
    }

    fn format_messages(&self, messages: &[Message]) -> Result<FormattedMessages> {
        Ok(FormattedMessages {
            system: None,
            messages: messages
                .iter()
                .map(Self::format_message)
                .collect::<Result<Vec<_>>>()?,
        })
    }

    fn format_tools(&self, tools: &[Tool]) -> Vec<Value> {
        tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters.to_value(),
                    },
                })
            })
            .collect()
    }

    fn build_request(
        &self,
        messages: &[Message],
        model: &str,
        tools: &[Tool],
    ) -> Result<DriverRequest> {
        let formatted = self.format_messages(messages)?;
        let mut body = json!({
            "model": model,
            "messages": formatted.messages,
        });

        let tools = self.format_tools(tools);
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools);
            body["tool_choice"] = json!("auto");
        }
        if let Some(mt) = self.max_tokens {
            body["max_tokens"] = json!(mt);
        }

        let mut headers = HashMap::new();
        if let Some(key) = &self.api_key {
            headers.insert("authorization".into(), format!("Bearer {}", key));
        }

        Ok(DriverRequest {
            url: format!("{}{}", self.base_url.trim_end_matches('/'), OPENAI_CHAT_PATH),
            headers,
            body,
        })
    }

    fn parse_response(&self, body: &Value) -> Result<DriverResponse> {
        let content = body
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let finish_reason = body
            .pointer("/choices/0/finish_reason")
            .and_then(|v| v.as_str())
            .map(String::from);
        let usage = body.get("usage").map(|u| UsageInfo {
            prompt_tokens: u["prompt_tokens"].as_u64().unwrap_or(0),
            completion_tokens: u["completion_tokens"].as_u64().unwrap_or(0),
            total_tokens: u["total_tokens"].as_u64().unwrap_or(0),
        });
        let tool_calls = match body.pointer("/choices/0/message/tool_calls") {
            Some(Value::Array(calls)) => calls
                .iter()
                .map(|c| {
                    serde_json::from_value::<ToolCall>(c.clone()).map_err(|e| {
                        Error::provider_call(
                            self.provider_id.as_str(),
                            None,
                            format!("malformed tool call in response: {}", e),
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        Ok(DriverResponse {
            content,
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

/// Factory: build the driver a provider entry asks for.
pub fn create_driver(
    provider_id: &str,
    config: &ProviderConfig,
    api_key: Option<String>,
) -> Result<Box<dyn ProviderDriver>> {
    let base_url = || {
        config.base_url.clone().ok_or_else(|| {
            Error::configuration_with_context(
                "missing base_url",
                crate::ErrorContext::new()
                    .with_field_path(format!("providers.{}.base_url", provider_id))
                    .with_source("driver_factory"),
            )
        })
    };

    Ok(match config.style {
        ApiStyle::OpenAi => Box::new(
            OpenAiDriver::new(provider_id, base_url()?)
                .with_api_key(api_key)
                .with_max_tokens(config.max_tokens),
        ),
        ApiStyle::Anthropic => Box::new(
            AnthropicDriver::new(provider_id, base_url()?)
                .with_api_key(api_key)
                .with_max_tokens(config.max_tokens),
        ),
        ApiStyle::Unsupported => Box::new(NoopDriver::new(
            provider_id,
            config.notice.clone().unwrap_or_else(|| {
                format!(
                    "{} does not support tool calling in this application.",
                    config.name
                )
            }),
        )),
    })
}
