//! Client configuration.

use http::Method;
use restline_cache::MemoryCache;
use restline_tasks::{RateLimitRule, TaskOptions};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheMode, CacheOptions};
use crate::error::{ClientError, Result};
use crate::retry::{BackoffStrategy, RetryCondition, RetryPolicy};
use crate::settings::Settings;

/// Client configuration: the authority plus client-level defaults.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Base URL that relative request paths are joined to.
    pub authority: Option<String>,
    /// Defaults that requests may override.
    pub defaults: Settings,
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Parse a TOML configuration.
    ///
    /// ```
    /// use restline_client::ClientConfig;
    ///
    /// let config = ClientConfig::from_toml_str(r#"
    ///     authority = "https://api.example.com"
    ///     user_agent = "inventory-sync/1.0"
    ///     headers = [["Accept", "application/json"]]
    ///
    ///     [retry]
    ///     retry_count = 2
    ///     conditions = ["timeout", "status:503"]
    /// "#).unwrap();
    ///
    /// assert_eq!(config.authority.as_deref(), Some("https://api.example.com"));
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(content)
            .map_err(|e| ClientError::Config(format!("TOML parse error: {e}")))?;
        file.into_config()
    }

    /// Load a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Builder for client configuration.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the base URL for relative request paths.
    pub fn authority(mut self, url: impl Into<String>) -> Self {
        self.config.authority = Some(url.into());
        self
    }

    settings_setters!(config.defaults);

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    authority: Option<String>,
    method: Option<String>,
    user_agent: Option<String>,
    proxy: Option<String>,
    timeout_ms: Option<u64>,
    #[serde(default)]
    headers: Vec<(String, String)>,
    #[serde(default)]
    parameters: Vec<(String, String)>,
    retry: Option<FileRetry>,
    cache: Option<FileCache>,
    task: Option<FileTask>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileRetry {
    retry_count: u32,
    #[serde(default)]
    conditions: Vec<String>,
    backoff_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileCache {
    mode: String,
    #[serde(default)]
    duration_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileTask {
    #[serde(default)]
    due_time_ms: u64,
    repeat_interval_ms: u64,
    #[serde(default)]
    repeat_times: u32,
    #[serde(default)]
    continue_on_error: bool,
    rate_limit_percent: Option<f64>,
}

impl FileConfig {
    fn into_config(self) -> Result<ClientConfig> {
        let mut defaults = Settings {
            user_agent: self.user_agent,
            proxy: self.proxy,
            timeout: self.timeout_ms.map(Duration::from_millis),
            headers: self.headers,
            parameters: self.parameters.into_iter().collect(),
            ..Settings::default()
        };

        if let Some(method) = self.method {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .map_err(|e| ClientError::Config(format!("invalid method '{method}': {e}")))?;
            defaults.method = Some(method);
        }
        if let Some(retry) = self.retry {
            defaults.retry_policy = Some(retry.into_policy()?);
        }
        if let Some(cache) = self.cache {
            let mode: CacheMode = cache.mode.parse()?;
            defaults.cache_options = Some(CacheOptions {
                mode,
                duration: Duration::from_secs(cache.duration_secs),
            });
            defaults.cache = Some(Arc::new(MemoryCache::new()));
        }
        if let Some(task) = self.task {
            defaults.task_options = Some(task.into_options()?);
        }

        Ok(ClientConfig {
            authority: self.authority,
            defaults,
        })
    }
}

impl FileRetry {
    fn into_policy(self) -> Result<RetryPolicy> {
        let mut policy = RetryPolicy::new(self.retry_count);
        for name in &self.conditions {
            policy = policy.retry_if(parse_condition(name)?);
        }
        if let Some(ms) = self.backoff_ms {
            policy = policy.with_backoff(BackoffStrategy::Constant(Duration::from_millis(ms)));
        }
        Ok(policy)
    }
}

fn parse_condition(name: &str) -> Result<RetryCondition> {
    match name.trim() {
        "timeout" => Ok(RetryCondition::on_timeout()),
        "connection" => Ok(RetryCondition::on_connection_failure()),
        "any" => Ok(RetryCondition::on_any_error()),
        "retryable" => Ok(RetryCondition::on_retryable()),
        other => other
            .strip_prefix("status:")
            .and_then(|code| code.trim().parse::<u16>().ok())
            .map(|code| RetryCondition::on_status([code]))
            .ok_or_else(|| {
                ClientError::UnsupportedConfiguration(format!("unknown retry condition '{other}'"))
            }),
    }
}

impl FileTask {
    fn into_options(self) -> Result<TaskOptions> {
        let mut options = TaskOptions::every(Duration::from_millis(self.repeat_interval_ms))
            .due_time(Duration::from_millis(self.due_time_ms))
            .repeat_times(self.repeat_times)
            .continue_on_error(self.continue_on_error);

        if let Some(percent) = self.rate_limit_percent {
            let rule = RateLimitRule::by_percent(percent);
            rule.validate()
                .map_err(|e| ClientError::UnsupportedConfiguration(e.to_string()))?;
            options = options.rate_limit(rule);
        }
        Ok(options)
    }
}
