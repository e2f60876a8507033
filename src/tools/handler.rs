//! Handler seam between the dispatcher and a tool's implementation.

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use super::ToolError;
use crate::session::SessionStore;

/// Per-request capabilities handed to every handler invocation.
///
/// The registry itself is shared and static; whatever differs between
/// requests (today only the session) travels here.
#[derive(Debug, Clone)]
pub struct ToolContext {
    session: Arc<dyn SessionStore>,
}

impl ToolContext {
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &dyn SessionStore {
        self.session.as_ref()
    }
}

/// Asynchronous tool implementation.
///
/// Handlers may run concurrently with any other handler of the same batch.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError>;
}

struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Value, ToolContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ToolError>> + Send,
{
    async fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        (self.f)(args, ctx.clone()).await
    }
}

/// Wrap an async closure as a handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Value, ToolContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}
