//! Anthropic Messages API driver. Differences from OpenAI:
//! - System messages are a top-level `system` parameter, not part of `messages`.
//! - Content uses typed blocks: `[{"type": "text", "text": "..."}]`.
//! - Tool calls are `tool_use` blocks inside the assistant turn; tool results
//!   go back as `tool_result` blocks inside a `user` turn.
//! - `max_tokens` is required, not optional.

use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

use crate::config::ApiStyle;
use crate::tools::Tool;
use crate::types::{Message, MessageRole, ToolCall};
use crate::{Error, Result};

use super::{DriverRequest, DriverResponse, FormattedMessages, ProviderDriver, UsageInfo};

const DEFAULT_MAX_TOKENS: u32 = 1024;
const API_VERSION: &str = "2023-06-01";
const MESSAGES_PATH: &str = "/v1/messages";

/// Anthropic Messages API driver.
#[derive(Debug)]
pub struct AnthropicDriver {
    provider_id: String,
    base_url: String,
    api_key: Option<String>,
    max_tokens: Option<u32>,
}

impl AnthropicDriver {
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

    fn assistant_blocks(message: &Message) -> Result<Vec<Value>> {
        let mut blocks = Vec::new();
        if !message.content.is_empty() {
            blocks.push(json!({ "type": "text", "text": message.content }));
        }
        for call in message.tool_calls() {
            blocks.push(json!({
                "type": "tool_use",
                "id": call.id,
                "name": call.name(),
                "input": call.parsed_arguments()?,
            }));
        }
        Ok(blocks)
    }

    /// Whether `msg` is a user turn made only of tool results.
    fn is_tool_result_turn(msg: &Value) -> bool {
        msg["role"] == "user"
            && msg["content"].as_array().map_or(false, |blocks| {
                blocks.iter().all(|b| b["type"] == "tool_result")
            })
    }
}

impl ProviderDriver for AnthropicDriver {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn api_style(&self) -> ApiStyle {
        ApiStyle::Anthropic
    }

    fn format_messages(&self, messages: &[Message]) -> Result<FormattedMessages> {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut out: Vec<Value> = Vec::new();

        for m in messages {
            match m.role {
                MessageRole::System => system_parts.push(&m.content),
                MessageRole::User => out.push(json!({
                    "role": "user",
                    "content": [{ "type": "text", "text": m.content }],
                })),
                MessageRole::Assistant => {
                    let blocks = Self::assistant_blocks(m)?;
                    if blocks.is_empty() {
                        debug!(id = %m.id, "skipping empty assistant message");
                        continue;
                    }
                    out.push(json!({ "role": "assistant", "content": blocks }));
                }
                MessageRole::Tool => {
                    let block = json!({
                        "type": "tool_result",
                        "tool_use_id": m.id,
                        "content": m.content,
                    });
                    // Results for one assistant turn share a single user turn.
                    let merge = out.last().map_or(false, Self::is_tool_result_turn);
                    if merge {
                        if let Some(blocks) =
                            out.last_mut().and_then(|prev| prev["content"].as_array_mut())
                        {
                            blocks.push(block);
                        }
                    } else {
                        out.push(json!({ "role": "user", "content": [block] }));
                    }
                }
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };

        Ok(FormattedMessages {
            system,
            messages: out,
        })
    }

    fn format_tools(&self, tools: &[Tool]) -> Vec<Value> {
        tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "input_schema": {
                        "type": "object",
                        "properties": tool.parameters.properties,
                        "required": tool.parameters.required,
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
            "max_tokens": self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "messages": formatted.messages,
        });
        if let Some(sys) = formatted.system {
            body["system"] = Value::String(sys);
        }
        let tools = self.format_tools(tools);
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools);
        }

        let mut headers = HashMap::new();
        headers.insert("anthropic-version".into(), API_VERSION.into());
        if let Some(key) = &self.api_key {
            headers.insert("x-api-key".into(), key.clone());
        }

        Ok(DriverRequest {
            url: format!("{}{}", self.base_url.trim_end_matches('/'), MESSAGES_PATH),
            headers,
            body,
        })
    }

    fn parse_response(&self, body: &Value) -> Result<DriverResponse> {
        // { content: [{type: "text", text}, {type: "tool_use", id, name, input}], stop_reason, usage }
        let blocks = body
            .get("content")
            .and_then(|c| c.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for block in blocks {
            match block.get("type").and_then(|t| t.as_str()) {
                Some("text") => {
                    if let Some(text) = block.get("text").and_then(|t| t.as_str()) {
                        content.push_str(text);
                    }
                }
                Some("tool_use") => {
                    let field = |key: &str| {
                        block
                            .get(key)
                            .and_then(|v| v.as_str())
                            .filter(|s| !s.is_empty())
                            .ok_or_else(|| {
                                Error::provider_call(
                                    self.provider_id.as_str(),
                                    None,
                                    format!("malformed tool_use block in response: missing `{}`", key),
                                )
                            })
                    };
                    let id = field("id")?;
                    let name = field("name")?;
                    let input = block
                        .get("input")
                        .cloned()
                        .unwrap_or_else(|| json!({}));
                    tool_calls.push(ToolCall::new(id, name, input.to_string()));
                }
                _ => {}
            }
        }

        let finish_reason = body
            .get("stop_reason")
            .and_then(|v| v.as_str())
            .map(|r| match r {
                "end_turn" => "stop".to_string(),
                "max_tokens" => "length".to_string(),
                "tool_use" => "tool_calls".to_string(),
                other => other.to_string(),
            });

        let usage = body.get("usage").map(|u| UsageInfo {
            prompt_tokens: u["input_tokens"].as_u64().unwrap_or(0),
            completion_tokens: u["output_tokens"].as_u64().unwrap_or(0),
            total_tokens: u["input_tokens"].as_u64().unwrap_or(0)
                + u["output_tokens"].as_u64().unwrap_or(0),
        });

        Ok(DriverResponse {
            content,
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::auth::auth_tools;

    fn driver() -> AnthropicDriver {
        AnthropicDriver::new("anthropic", "https://api.anthropic.com")
            .with_api_key(Some("sk-ant-test".into()))
    }

    #[test]
    fn test_system_message_extraction() {
        let msgs = vec![Message::system("You are helpful."), Message::user("Hi")];
        let formatted = driver().format_messages(&msgs).unwrap();
        assert_eq!(formatted.system.as_deref(), Some("You are helpful."));
        assert_eq!(formatted.messages.len(), 1);
        assert_eq!(formatted.messages[0]["role"], "user");
    }

    #[test]
    fn test_anthropic_build_request() {
        let req = driver()
            .build_request(
                &[Message::user("Hello")],
                "claude-3-haiku-20240307",
                &auth_tools(),
            )
            .unwrap();
        assert_eq!(req.url, "https://api.anthropic.com/v1/messages");
        assert_eq!(req.body["max_tokens"], 1024);
        assert_eq!(req.headers["anthropic-version"], "2023-06-01");
        assert_eq!(req.headers["x-api-key"], "sk-ant-test");
        assert!(req.body.get("system").is_none());
        assert_eq!(req.body["tools"][1]["name"], "login");
        assert_eq!(req.body["tools"][1]["input_schema"]["type"], "object");
        assert_eq!(
            req.body["tools"][0]["input_schema"]["properties"],
            json!({})
        );
    }

    #[test]
    fn test_tool_round_trip_formatting() {
        let history = vec![
            Message::user("log me in"),
            Message::assistant_with_tool_calls(
                "Checking.",
                vec![
                    ToolCall::new("toolu_1", "check_auth_status", ""),
                    ToolCall::new("toolu_2", "login", r#"{"email":"a@b.co","password":"x"}"#),
                ],
            ),
            Message::tool("toolu_1", r#"{"authenticated":false}"#),
            Message::tool("toolu_2", r#"{"success":false}"#),
        ];
        let formatted = driver().format_messages(&history).unwrap();
        assert_eq!(formatted.messages.len(), 3);

        let assistant = &formatted.messages[1];
        assert_eq!(assistant["content"][0]["type"], "text");
        assert_eq!(assistant["content"][1]["type"], "tool_use");
        assert_eq!(assistant["content"][1]["input"], json!({}));
        assert_eq!(assistant["content"][2]["input"]["email"], "a@b.co");

        let results = &formatted.messages[2];
        assert_eq!(results["role"], "user");
        assert_eq!(results["content"][0]["tool_use_id"], "toolu_1");
        assert_eq!(results["content"][1]["tool_use_id"], "toolu_2");
    }

    #[test]
    fn test_anthropic_parse_response() {
        let body = json!({
            "content": [
                {"type": "text", "text": "Let me "},
                {"type": "text", "text": "log you in."},
                {"type": "tool_use", "id": "toolu_9", "name": "login",
                 "input": {"email": "user@example.com", "password": "password123"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        });
        let resp = driver().parse_response(&body).unwrap();
        assert_eq!(resp.content, "Let me log you in.");
        assert_eq!(resp.finish_reason.as_deref(), Some("tool_calls"));
        assert_eq!(resp.usage.unwrap().total_tokens, 15);
        assert_eq!(resp.tool_calls.len(), 1);
        let args = resp.tool_calls[0].parsed_arguments().unwrap();
        assert_eq!(args["email"], "user@example.com");
    }

    #[test]
    fn test_tool_use_without_id_or_name_is_rejected() {
        for block in [
            json!({"type": "tool_use", "input": {}}),
            json!({"type": "tool_use", "id": "toolu_1", "input": {}}),
            json!({"type": "tool_use", "id": 7, "name": "login", "input": {}}),
        ] {
            let err = driver()
                .parse_response(&json!({ "content": [block] }))
                .unwrap_err();
            match err {
                Error::ProviderCall { provider, message, .. } => {
                    assert_eq!(provider, "anthropic");
                    assert!(message.contains("malformed tool_use block"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_empty_content_is_empty_envelope() {
        let resp = driver()
            .parse_response(&json!({ "content": [], "stop_reason": "end_turn" }))
            .unwrap();
        assert_eq!(resp.content, "");
        assert!(resp.tool_calls.is_empty());
        assert_eq!(resp.finish_reason.as_deref(), Some("stop"));
    }
}
