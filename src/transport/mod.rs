//! Network seam between the router and the remote providers.
//!
//! The router only ever performs one call per request through
//! [`LlmTransport::send`]; [`HttpTransport`] is the reqwest-backed
//! implementation, tests substitute in-process fakes.

pub mod http;

use async_trait::async_trait;
use serde_json::Value;

use crate::drivers::DriverRequest;

pub use http::HttpTransport;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response body: {0}")]
    InvalidBody(String),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[async_trait]
pub trait LlmTransport: Send + Sync + std::fmt::Debug {
    /// Issue one request and return the decoded JSON body of a 2xx reply.
    async fn send(&self, request: &DriverRequest) -> Result<Value, TransportError>;
}
