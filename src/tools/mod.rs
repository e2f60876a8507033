//! Tool catalog and dispatch.
//!
//! A [`Tool`] pairs a name, a description and a JSON-schema-like
//! [`ParameterSchema`] (forwarded to the model as guidance, never enforced)
//! with an asynchronous [`ToolHandler`]. Tools are collected once into an
//! immutable [`ToolRegistry`]; a [`ToolDispatcher`] resolves model-issued
//! calls against it and always answers with a [`crate::types::ToolResult`].

pub mod auth;
pub mod dispatcher;
pub mod handler;
pub mod registry;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;

pub use dispatcher::ToolDispatcher;
pub use handler::{handler_fn, ToolContext, ToolHandler};
pub use registry::{ToolRegistry, ToolRegistryBuilder};

/// Failure while resolving or running a tool.
///
/// Never escapes the dispatcher: it becomes the error payload of a result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolError {
    #[error("Tool '{name}' not found")]
    NotFound { name: String, available: Vec<String> },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Handler(String),

    #[error("Tool handler panicked")]
    Panicked,
}

impl ToolError {
    pub fn handler(msg: impl Into<String>) -> Self {
        ToolError::Handler(msg.into())
    }

    /// JSON payload sent back to the model so it can self-correct.
    pub fn to_payload(&self) -> Value {
        match self {
            ToolError::NotFound { available, .. } => json!({
                "error": self.to_string(),
                "available_tools": available,
            }),
            _ => json!({
                "error": "Tool execution failed",
                "details": self.to_string(),
            }),
        }
    }
}

/// Parameter description in the `{type, properties, required}` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl ParameterSchema {
    pub fn object() -> Self {
        Self {
            schema_type: "object".into(),
            properties: Map::new(),
            required: Vec::new(),
        }
    }

    pub fn property(
        mut self,
        name: impl Into<String>,
        kind: &str,
        description: impl Into<String>,
    ) -> Self {
        self.properties.insert(
            name.into(),
            json!({ "type": kind, "description": description.into() }),
        );
        self
    }

    pub fn required_property(
        self,
        name: impl Into<String>,
        kind: &str,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let mut schema = self.property(name.clone(), kind, description);
        schema.required.push(name);
        schema
    }

    pub fn to_value(&self) -> Value {
        json!({
            "type": self.schema_type,
            "properties": self.properties,
            "required": self.required,
        })
    }
}

impl Default for ParameterSchema {
    fn default() -> Self {
        Self::object()
    }
}

/// Registry entry.
#[derive(Clone)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
    /// Hidden from unauthenticated callers by [`ToolRegistry::tools_for_context`].
    pub requires_auth: bool,
    handler: Arc<dyn ToolHandler>,
}

impl Tool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            requires_auth: false,
            handler,
        }
    }

    pub fn requires_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub fn handler(&self) -> &Arc<dyn ToolHandler> {
        &self.handler
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("requires_auth", &self.requires_auth)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_builder_shape() {
        let schema = ParameterSchema::object()
            .required_property("email", "string", "The user's email address")
            .property("remember", "boolean", "Keep the session");
        let v = schema.to_value();
        assert_eq!(v["type"], "object");
        assert_eq!(v["properties"]["email"]["type"], "string");
        assert_eq!(v["required"], json!(["email"]));
    }

    #[test]
    fn test_not_found_payload_lists_tools() {
        let err = ToolError::NotFound {
            name: "fly".into(),
            available: vec!["login".into(), "logout".into()],
        };
        let payload = err.to_payload();
        assert_eq!(payload["error"], "Tool 'fly' not found");
        assert_eq!(payload["available_tools"], json!(["login", "logout"]));
    }

    #[test]
    fn test_handler_payload_carries_details() {
        let payload = ToolError::handler("database offline").to_payload();
        assert_eq!(payload["error"], "Tool execution failed");
        assert_eq!(payload["details"], "database offline");
    }
}
