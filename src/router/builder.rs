use std::collections::HashMap;
use std::sync::Arc;

use super::{LlmRouter, ProviderInfo};
use crate::config::{resolve_api_key, ApiStyle, RouterConfig};
use crate::drivers::{create_driver, ProviderDriver};
use crate::tools::ToolRegistry;
use crate::transport::{HttpTransport, LlmTransport};
use crate::{Error, ErrorContext, Result};

/// Builder for [`LlmRouter`].
///
/// Defaults: empty tool registry, HTTP transport without timeout.
#[derive(Debug, Default)]
pub struct LlmRouterBuilder {
    providers: Vec<(ProviderInfo, Arc<dyn ProviderDriver>)>,
    registry: Option<Arc<ToolRegistry>>,
    transport: Option<Arc<dyn LlmTransport>>,
}

impl LlmRouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drivers for every configured provider plus an HTTP transport built
    /// from `config.http`.
    pub fn from_config(config: &RouterConfig) -> Result<Self> {
        let mut builder = Self::new().transport(Arc::new(HttpTransport::new(&config.http)?));
        for (id, provider) in &config.providers {
            let api_key = match provider.style {
                ApiStyle::Unsupported => None,
                _ => resolve_api_key(id, provider),
            };
            if api_key.is_none() && provider.style != ApiStyle::Unsupported {
                tracing::warn!(provider = %id, "no API key found; calls will be rejected upstream");
            }
            let driver: Arc<dyn ProviderDriver> = create_driver(id, provider, api_key)?.into();
            builder = builder.provider(
                ProviderInfo {
                    id: id.clone(),
                    name: provider.name.clone(),
                    models: provider.models.clone(),
                    supports_tools: provider.style != ApiStyle::Unsupported,
                },
                driver,
            );
        }
        Ok(builder)
    }

    pub fn provider(mut self, info: ProviderInfo, driver: Arc<dyn ProviderDriver>) -> Self {
        self.providers.push((info, driver));
        self
    }

    /// Register a driver under its own id, with no model list.
    pub fn driver(self, driver: Arc<dyn ProviderDriver>) -> Self {
        let info = ProviderInfo {
            id: driver.provider_id().to_string(),
            name: driver.provider_id().to_string(),
            models: Vec::new(),
            supports_tools: driver.offline_reply().is_none(),
        };
        self.provider(info, driver)
    }

    pub fn registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn LlmTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<LlmRouter> {
        let mut drivers = HashMap::new();
        let mut providers = Vec::new();
        for (info, driver) in self.providers {
            if info.id != driver.provider_id() {
                return Err(Error::configuration_with_context(
                    format!(
                        "provider '{}' registered with driver for '{}'",
                        info.id,
                        driver.provider_id()
                    ),
                    ErrorContext::new().with_source("router_builder"),
                ));
            }
            if drivers.insert(info.id.clone(), driver).is_some() {
                return Err(Error::configuration_with_context(
                    format!("provider '{}' registered twice", info.id),
                    ErrorContext::new().with_source("router_builder"),
                ));
            }
            providers.push(info);
        }

        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(&Default::default())?),
        };

        Ok(LlmRouter {
            drivers,
            providers,
            registry: self.registry.unwrap_or_default(),
            transport,
        })
    }
}
