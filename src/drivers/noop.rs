//! Driver for providers that are selectable but cannot call tools.
//!
//! Never produces a network request: the router answers with
//! [`ProviderDriver::offline_reply`] instead.

use serde_json::Value;

use crate::config::ApiStyle;
use crate::tools::Tool;
use crate::types::Message;
use crate::{Error, Result};

use super::{DriverRequest, DriverResponse, FormattedMessages, ProviderDriver};

#[derive(Debug)]
pub struct NoopDriver {
    provider_id: String,
    notice: String,
}

impl NoopDriver {
    pub fn new(provider_id: impl Into<String>, notice: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            notice: notice.into(),
        }
    }
}

impl ProviderDriver for NoopDriver {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn api_style(&self) -> ApiStyle {
        ApiStyle::Unsupported
    }

    fn format_messages(&self, _messages: &[Message]) -> Result<FormattedMessages> {
        Ok(FormattedMessages::default())
    }

    fn format_tools(&self, _tools: &[Tool]) -> Vec<Value> {
        Vec::new()
    }

    fn build_request(
        &self,
        _messages: &[Message],
        _model: &str,
        _tools: &[Tool],
    ) -> Result<DriverRequest> {
        Err(Error::provider_call(
            self.provider_id.as_str(),
            None,
            "provider has no remote endpoint",
        ))
    }

    fn parse_response(&self, _body: &Value) -> Result<DriverResponse> {
        Ok(DriverResponse::default())
    }

    fn offline_reply(&self) -> Option<DriverResponse> {
        Some(DriverResponse {
            content: self.notice.clone(),
            ..DriverResponse::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_reply_is_static() {
        let driver = NoopDriver::new("ollama", "Not available here.");
        let reply = driver.offline_reply().unwrap();
        assert_eq!(reply.content, "Not available here.");
        assert!(reply.tool_calls.is_empty());
        assert!(driver
            .build_request(&[Message::user("hi")], "llama3", &[])
            .is_err());
    }
}
