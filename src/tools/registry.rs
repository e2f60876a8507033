//! Immutable tool catalog.

use std::collections::HashSet;

use super::Tool;
use crate::{Error, ErrorContext, Result};

/// Fixed, ordered set of tools built once at startup.
///
/// There is no mutation API; share it behind an `Arc` between the router
/// (which forwards the catalog to the model) and every dispatcher.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// All tools in registration order.
    pub fn list_tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Case-sensitive lookup.
    pub fn find_tool(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }

    /// The subset a caller may use in its current authentication state.
    pub fn tools_for_context(&self, is_authenticated: bool) -> Vec<&Tool> {
        self.tools
            .iter()
            .filter(|t| is_authenticated || !t.requires_auth)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<Tool>,
}

impl ToolRegistryBuilder {
    pub fn register(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn register_all(mut self, tools: impl IntoIterator<Item = Tool>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Fails if two tools share a name.
    pub fn build(self) -> Result<ToolRegistry> {
        let mut seen = HashSet::new();
        for tool in &self.tools {
            if !seen.insert(tool.name.as_str()) {
                return Err(Error::configuration_with_context(
                    format!("duplicate tool name '{}'", tool.name),
                    ErrorContext::new()
                        .with_field_path("tools")
                        .with_source("tool_registry"),
                ));
            }
        }
        tracing::debug!(tools = ?seen, "tool registry built");
        Ok(ToolRegistry { tools: self.tools })
    }
}
