//! Router configuration: provider table, defaults and HTTP transport knobs.
//!
//! Configuration comes from a YAML file (path in `LLM_AUTH_CONFIG`) or from
//! the built-in defaults, then environment overrides are applied on top.
//! API keys are never stored in the file; see [`resolve_api_key`].

use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use crate::{Error, ErrorContext, Result};

pub const CONFIG_PATH_ENV: &str = "LLM_AUTH_CONFIG";
pub const PROXY_URL_ENV: &str = "LLM_AUTH_PROXY_URL";
pub const HTTP_TIMEOUT_ENV: &str = "LLM_AUTH_HTTP_TIMEOUT_SECS";
const KEYRING_SERVICE: &str = "llm-auth-router";

/// Wire protocol a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStyle {
    /// Anthropic Messages API.
    Anthropic,
    /// OpenAI chat completions API.
    OpenAi,
    /// Selectable in the UI but without tool-calling support.
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Display name for provider selectors.
    pub name: String,
    pub style: ApiStyle,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the API key; defaults to `<ID>_API_KEY`.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub models: Vec<String>,
    /// Reply used by providers without tool support.
    #[serde(default)]
    pub notice: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Transport-level timeout. The router itself never times out.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub proxy_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    pub providers: BTreeMap<String, ProviderConfig>,
    pub default_provider: String,
    pub default_model: String,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        let mut providers = BTreeMap::new();
        providers.insert(
            "anthropic".to_string(),
            ProviderConfig {
                name: "Claude (Anthropic)".into(),
                style: ApiStyle::Anthropic,
                base_url: Some("https://api.anthropic.com".into()),
                api_key_env: None,
                max_tokens: Some(1024),
                models: vec![
                    "claude-3-haiku-20240307".into(),
                    "claude-3-5-sonnet-latest".into(),
                    "claude-3-opus-20240229".into(),
                ],
                notice: None,
            },
        );
        providers.insert(
            "openai".to_string(),
            ProviderConfig {
                name: "GPT (OpenAI)".into(),
                style: ApiStyle::OpenAi,
                base_url: Some("https://api.openai.com".into()),
                api_key_env: None,
                max_tokens: None,
                models: vec!["gpt-3.5-turbo".into(), "gpt-4o".into()],
                notice: None,
            },
        );
        providers.insert(
            "ollama".to_string(),
            ProviderConfig {
                name: "Ollama (Local)".into(),
                style: ApiStyle::Unsupported,
                base_url: None,
                api_key_env: None,
                max_tokens: None,
                models: vec!["llama3".into(), "mistral".into()],
                notice: Some(
                    "Ollama integration is not implemented in this demo. Please select Claude or GPT to use the authentication tools."
                        .into(),
                ),
            },
        );

        Self {
            providers,
            default_provider: "anthropic".into(),
            default_model: "claude-3-haiku-20240307".into(),
            http: HttpConfig::default(),
        }
    }
}

impl RouterConfig {
    /// Load a YAML config file and validate it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text).map_err(|e| match e {
            Error::Configuration { message, context } => Error::Configuration {
                message,
                context: context.with_details(path.display().to_string()),
            },
            other => other,
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid config: {}", e),
                ErrorContext::new().with_source("config_loader"),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// File from `LLM_AUTH_CONFIG` if set, defaults otherwise, then env overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// `<ID>_BASE_URL`, `LLM_AUTH_PROXY_URL` and `LLM_AUTH_HTTP_TIMEOUT_SECS`.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Same overrides, read through `lookup` instead of the process environment.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        for (id, provider) in self.providers.iter_mut() {
            if let Some(url) = lookup(&format!("{}_BASE_URL", env_prefix(id))) {
                provider.base_url = Some(url);
            }
        }
        if let Some(url) = lookup(PROXY_URL_ENV) {
            self.http.proxy_url = Some(url);
        }
        if let Some(raw) = lookup(HTTP_TIMEOUT_ENV) {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid {} '{}': {}", HTTP_TIMEOUT_ENV, raw, e),
                    ErrorContext::new()
                        .with_field_path("http.timeout_secs")
                        .with_source("config_loader"),
                )
            })?;
            self.http.timeout_secs = Some(secs);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.providers.contains_key(&self.default_provider) {
            return Err(Error::configuration_with_context(
                format!("default provider '{}' is not configured", self.default_provider),
                ErrorContext::new()
                    .with_field_path("default_provider")
                    .with_source("config_loader"),
            ));
        }
        for (id, provider) in &self.providers {
            if provider.style != ApiStyle::Unsupported && provider.base_url.is_none() {
                return Err(Error::configuration_with_context(
                    "missing base_url",
                    ErrorContext::new()
                        .with_field_path(format!("providers.{}.base_url", id))
                        .with_source("config_loader"),
                ));
            }
        }
        Ok(())
    }

    pub fn provider(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers.get(id)
    }
}

fn env_prefix(provider_id: &str) -> String {
    provider_id.to_uppercase().replace('-', "_")
}

/// Resolve an API key: OS keyring first, then the provider's env variable.
///
/// A missing key is not a configuration error; the provider rejects the call.
pub fn resolve_api_key(provider_id: &str, provider: &ProviderConfig) -> Option<String> {
    if let Ok(entry) = Entry::new(KEYRING_SERVICE, provider_id) {
        if let Ok(key) = entry.get_password() {
            return Some(key);
        }
    }

    let var = provider
        .api_key_env
        .clone()
        .unwrap_or_else(|| format!("{}_API_KEY", env_prefix(provider_id)));
    env::var(var).ok().filter(|k| !k.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RouterConfig::default();
        config.validate().unwrap();
        assert_eq!(
            config.providers.keys().collect::<Vec<_>>(),
            vec!["anthropic", "ollama", "openai"]
        );
        assert_eq!(
            config.provider("ollama").unwrap().style,
            ApiStyle::Unsupported
        );
    }

    #[test]
    fn test_yaml_round_trip_shape() {
        let yaml = r#"
default_provider: openai
default_model: gpt-4o
http:
  timeout_secs: 20
providers:
  openai:
    name: GPT
    style: openai
    base_url: http://localhost:9999
    api_key_env: MY_OPENAI_KEY
    models: [gpt-4o]
"#;
        let config = RouterConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.http.timeout_secs, Some(20));
        let openai = config.provider("openai").unwrap();
        assert_eq!(openai.style, ApiStyle::OpenAi);
        assert_eq!(openai.api_key_env.as_deref(), Some("MY_OPENAI_KEY"));
    }

    #[test]
    fn test_unknown_default_provider_rejected() {
        let yaml = r#"
default_provider: mystery
default_model: x
providers: {}
"#;
        let err = RouterConfig::from_yaml_str(yaml).unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("default_provider")
        );
    }

    #[test]
    fn test_tool_capable_provider_needs_base_url() {
        let yaml = r#"
default_provider: anthropic
default_model: claude
providers:
  anthropic:
    name: Claude
    style: anthropic
"#;
        let err = RouterConfig::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("providers.anthropic.base_url"));
    }

    #[test]
    fn test_api_key_env_override() {
        let provider = ProviderConfig {
            name: "Test".into(),
            style: ApiStyle::OpenAi,
            base_url: Some("http://localhost".into()),
            api_key_env: Some("LLM_AUTH_ROUTER_TEST_KEY".into()),
            max_tokens: None,
            models: Vec::new(),
            notice: None,
        };
        env::set_var("LLM_AUTH_ROUTER_TEST_KEY", "sk-test");
        assert_eq!(
            resolve_api_key("llm-auth-router-test-provider", &provider).as_deref(),
            Some("sk-test")
        );
        env::remove_var("LLM_AUTH_ROUTER_TEST_KEY");
    }

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_base_url_and_http_overrides() {
        let mut config = RouterConfig::default();
        config
            .apply_overrides(overrides(&[
                ("OPENAI_BASE_URL", "http://127.0.0.1:4010"),
                (PROXY_URL_ENV, "http://proxy.internal:3128"),
                (HTTP_TIMEOUT_ENV, " 45 "),
            ]))
            .unwrap();
        assert_eq!(
            config.provider("openai").unwrap().base_url.as_deref(),
            Some("http://127.0.0.1:4010")
        );
        assert_eq!(
            config.provider("anthropic").unwrap().base_url.as_deref(),
            Some("https://api.anthropic.com")
        );
        assert_eq!(
            config.http.proxy_url.as_deref(),
            Some("http://proxy.internal:3128")
        );
        assert_eq!(config.http.timeout_secs, Some(45));
    }

    #[test]
    fn test_non_numeric_timeout_is_a_configuration_error() {
        let mut config = RouterConfig::default();
        let err = config
            .apply_overrides(overrides(&[(HTTP_TIMEOUT_ENV, "thirty")]))
            .unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("http.timeout_secs")
        );
        assert_eq!(config.http.timeout_secs, None);
    }

    #[test]
    fn test_provider_base_url_from_process_env() {
        let mut config = RouterConfig::default();
        config.providers.insert(
            "env-override-test".into(),
            ProviderConfig {
                name: "Env".into(),
                style: ApiStyle::OpenAi,
                base_url: Some("http://unset".into()),
                api_key_env: None,
                max_tokens: None,
                models: Vec::new(),
                notice: None,
            },
        );
        env::set_var("ENV_OVERRIDE_TEST_BASE_URL", "http://from-env:8080");
        let result = config.apply_env_overrides();
        env::remove_var("ENV_OVERRIDE_TEST_BASE_URL");

        result.unwrap();
        assert_eq!(
            config.provider("env-override-test").unwrap().base_url.as_deref(),
            Some("http://from-env:8080")
        );
    }
}
