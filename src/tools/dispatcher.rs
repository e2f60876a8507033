//! Tool call dispatch.
//!
//! Dispatch never fails at the envelope level: lookup misses, undecodable
//! arguments, handler errors and handler panics all come back as a
//! [`ToolResult`] carrying an error payload, so one bad call cannot abort
//! its siblings in a batch.

use futures::future::join_all;
use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{ToolContext, ToolError, ToolRegistry};
use crate::types::{ToolCall, ToolResult};

#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    context: ToolContext,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>, context: ToolContext) -> Self {
        Self { registry, context }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute one call. Always returns a result keyed by `call.id`.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        info!(tool = %call.name(), call_id = %call.id, "executing tool");
        match self.run(call).await {
            Ok(payload) => {
                debug!(tool = %call.name(), call_id = %call.id, "tool succeeded");
                ToolResult::success(call.id.clone(), payload)
            }
            Err(err) => {
                warn!(tool = %call.name(), call_id = %call.id, error = %err, "tool failed");
                ToolResult::failure(call.id.clone(), err.to_payload())
            }
        }
    }

    /// Execute every call concurrently and wait for all of them.
    ///
    /// Results come back in input order regardless of completion order.
    pub async fn execute_all(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        join_all(calls.iter().map(|call| self.execute(call))).await
    }

    async fn run(&self, call: &ToolCall) -> Result<Value, ToolError> {
        let tool = self
            .registry
            .find_tool(call.name())
            .ok_or_else(|| ToolError::NotFound {
                name: call.name().to_string(),
                available: self.registry.names(),
            })?;

        let args = call
            .parsed_arguments()
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        AssertUnwindSafe(tool.handler().call(args, &self.context))
            .catch_unwind()
            .await
            .unwrap_or(Err(ToolError::Panicked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InMemorySessionStore;
    use crate::tools::{handler_fn, ParameterSchema, Tool};
    use serde_json::json;
    use std::time::Duration;

    fn dispatcher(registry: ToolRegistry) -> ToolDispatcher {
        ToolDispatcher::new(
            Arc::new(registry),
            ToolContext::new(Arc::new(InMemorySessionStore::demo())),
        )
    }

    fn echo() -> Tool {
        Tool::new(
            "echo",
            "Echo arguments back",
            ParameterSchema::object(),
            handler_fn(|args, _| async move { Ok(json!({ "echo": args })) }),
        )
    }

    #[tokio::test]
    async fn test_unknown_tool_lists_available() {
        let d = dispatcher(ToolRegistry::builder().register(echo()).build().unwrap());
        let result = d.execute(&ToolCall::new("c1", "missing", "{}")).await;
        assert!(result.is_error());
        assert_eq!(result.tool_call_id, "c1");
        let decoded: Value = serde_json::from_str(&result.result_json()).unwrap();
        assert_eq!(decoded["error"], "Tool 'missing' not found");
        assert_eq!(decoded["available_tools"], json!(["echo"]));
    }

    #[tokio::test]
    async fn test_bad_json_arguments_become_failure() {
        let d = dispatcher(ToolRegistry::builder().register(echo()).build().unwrap());
        let result = d.execute(&ToolCall::new("c2", "echo", "{not json")).await;
        assert!(result.is_error());
        assert_eq!(result.payload()["error"], "Tool execution failed");
        assert!(result.payload()["details"]
            .as_str()
            .unwrap()
            .starts_with("Invalid tool arguments"));
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        let boom = Tool::new(
            "boom",
            "Always panics",
            ParameterSchema::object(),
            handler_fn(|_, _| async move {
                if true {
                    panic!("handler exploded");
                }
                Ok(json!({}))
            }),
        );
        let d = dispatcher(
            ToolRegistry::builder()
                .register(boom)
                .register(echo())
                .build()
                .unwrap(),
        );
        let results = d
            .execute_all(&[
                ToolCall::new("a", "boom", "{}"),
                ToolCall::new("b", "echo", r#"{"x":1}"#),
            ])
            .await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].payload()["details"], "Tool handler panicked");
        assert_eq!(results[1].payload(), &json!({ "echo": { "x": 1 } }));
    }

    #[tokio::test]
    async fn test_batch_keeps_input_order() {
        let slow = Tool::new(
            "slow",
            "Finishes last",
            ParameterSchema::object(),
            handler_fn(|_, _| async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok(json!({ "done": "slow" }))
            }),
        );
        let d = dispatcher(
            ToolRegistry::builder()
                .register(slow)
                .register(echo())
                .build()
                .unwrap(),
        );
        let results = d
            .execute_all(&[
                ToolCall::new("first", "slow", ""),
                ToolCall::new("second", "echo", "{}"),
            ])
            .await;
        let ids: Vec<_> = results.iter().map(|r| r.tool_call_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }
}
