use async_trait::async_trait;
use reqwest::Proxy;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{LlmTransport, TransportError};
use crate::config::HttpConfig;
use crate::drivers::DriverRequest;

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        // No default timeout: only an explicitly configured one applies.
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                TransportError::Other(format!("invalid proxy url '{}': {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl LlmTransport for HttpTransport {
    async fn send(&self, request: &DriverRequest) -> Result<Value, TransportError> {
        let mut req = self.client.post(&request.url).json(&request.body);
        for (k, v) in &request.headers {
            req = req.header(k, v);
        }

        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(url = %request.url, status = status.as_u16(), bytes = text.len(), "provider replied");

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: error_message_from_body(&text)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
            });
        }

        serde_json::from_str(&text).map_err(|e| TransportError::InvalidBody(e.to_string()))
    }
}

/// Both supported providers wrap failures as `{"error": {"message": ...}}`.
fn error_message_from_body(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.pointer("/error/message")
        .or_else(|| json.get("error"))
        .and_then(|v| v.as_str())
        .map(String::from)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
}
