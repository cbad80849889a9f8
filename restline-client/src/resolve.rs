//! Merges client defaults with request overrides.

use http::Method;
use restline_cache::Cache;
use restline_tasks::TaskOptions;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheKeyFn, CacheOptions};
use crate::credentials::Credentials;
use crate::query::{Parameters, PostParameter, QueryInfo};
use crate::retry::RetryPolicy;
use crate::serialization::{Deserializer, Serializer};
use crate::settings::Settings;

/// Effective settings of one call.
///
/// Each field takes the request value when present and non-blank, and the
/// client value otherwise. Collections merge instead:
///
/// - parameters: client entries, with request entries replacing same-named ones
/// - headers: client headers followed by request headers
/// - post parameters: request parts followed by client parts
#[derive(Clone)]
pub struct ResolvedConfig {
    /// HTTP method, `GET` when neither side sets one.
    pub method: Method,
    /// Merged headers.
    pub headers: Vec<(String, String)>,
    /// Merged parameters.
    pub parameters: Parameters,
    /// Merged multipart parts.
    pub post_parameters: Vec<PostParameter>,
    /// Request entity serializer.
    pub serializer: Option<Arc<dyn Serializer>>,
    /// Response entity deserializer.
    pub deserializer: Option<Arc<dyn Deserializer>>,
    /// Response cache.
    pub cache: Option<Arc<dyn Cache>>,
    /// Cache expiry policy.
    pub cache_options: Option<CacheOptions>,
    /// Cache key producer.
    pub cache_key: Option<CacheKeyFn>,
    /// Retry policy.
    pub retry_policy: Option<RetryPolicy>,
    /// Recurring task options.
    pub task_options: Option<TaskOptions>,
    /// Proxy URL.
    pub proxy: Option<String>,
    /// Per-attempt timeout.
    pub timeout: Option<Duration>,
    /// User agent.
    pub user_agent: Option<String>,
    /// Credentials collaborator.
    pub credentials: Option<Arc<dyn Credentials>>,
    /// Query metadata.
    pub info: Option<QueryInfo>,
}

impl ResolvedConfig {
    /// Resolve the effective settings of a call.
    pub fn resolve(client: &Settings, request: &Settings) -> Self {
        let mut parameters = client.parameters.clone();
        parameters.merge(&request.parameters);

        let headers = client
            .headers
            .iter()
            .chain(&request.headers)
            .cloned()
            .collect();

        let post_parameters = request
            .post_parameters
            .iter()
            .chain(&client.post_parameters)
            .cloned()
            .collect();

        Self {
            method: pick(&request.method, &client.method).unwrap_or(Method::GET),
            headers,
            parameters,
            post_parameters,
            serializer: pick(&request.serializer, &client.serializer),
            deserializer: pick(&request.deserializer, &client.deserializer),
            cache: pick(&request.cache, &client.cache),
            cache_options: pick(&request.cache_options, &client.cache_options),
            cache_key: pick(&request.cache_key, &client.cache_key),
            retry_policy: pick(&request.retry_policy, &client.retry_policy),
            task_options: pick(&request.task_options, &client.task_options),
            proxy: non_blank(&request.proxy).or_else(|| non_blank(&client.proxy)),
            timeout: request.timeout.or(client.timeout),
            user_agent: non_blank(&request.user_agent).or_else(|| client.user_agent.clone()),
            credentials: pick(&request.credentials, &client.credentials),
            info: pick(&request.info, &client.info),
        }
    }
}

fn pick<T: Clone>(request: &Option<T>, client: &Option<T>) -> Option<T> {
    request.as_ref().or(client.as_ref()).cloned()
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("parameters", &self.parameters)
            .field("post_parameters", &self.post_parameters.len())
            .field("cache", &self.cache.is_some())
            .field("cache_options", &self.cache_options)
            .field("retry_policy", &self.retry_policy)
            .field("task_options", &self.task_options)
            .field("proxy", &self.proxy)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}
