//! Override-able settings shared by clients and requests.

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

/// Settings a client carries as defaults and a request may override.
#[derive(Clone, Default)]
pub struct Settings {
    /// HTTP method.
    pub method: Option<Method>,
    /// Headers.
    pub headers: Vec<(String, String)>,
    /// Query or form parameters.
    pub parameters: Parameters,
    /// Multipart form parts.
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

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("parameters", &self.parameters)
            .field("post_parameters", &self.post_parameters.len())
            .field("serializer", &self.serializer.is_some())
            .field("deserializer", &self.deserializer.is_some())
            .field("cache", &self.cache.is_some())
            .field("cache_options", &self.cache_options)
            .field("cache_key", &self.cache_key.is_some())
            .field("retry_policy", &self.retry_policy)
            .field("task_options", &self.task_options)
            .field("proxy", &self.proxy)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("credentials", &self.credentials.is_some())
            .field("info", &self.info)
            .finish()
    }
}

/// Fluent setters for every [`Settings`] field, expanded inside an `impl`
/// block of a type that reaches its settings through `$path`.
macro_rules! settings_setters {
    ($($path:ident).+) => {
        /// Set the HTTP method.
        pub fn method(mut self, method: http::Method) -> Self {
            self.$($path).+.method = Some(method);
            self
        }

        /// Add a header.
        pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
            self.$($path).+.headers.push((name.into(), value.into()));
            self
        }

        /// Set a parameter, replacing an earlier one with the same name.
        pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
            self.$($path).+.parameters.set(name, value);
            self
        }

        /// Add a multipart form part.
        pub fn post_parameter(mut self, parameter: $crate::PostParameter) -> Self {
            self.$($path).+.post_parameters.push(parameter);
            self
        }

        /// Set the request entity serializer.
        pub fn serializer(mut self, serializer: std::sync::Arc<dyn $crate::Serializer>) -> Self {
            self.$($path).+.serializer = Some(serializer);
            self
        }

        /// Set the response entity deserializer.
        pub fn deserializer(
            mut self,
            deserializer: std::sync::Arc<dyn $crate::Deserializer>,
        ) -> Self {
            self.$($path).+.deserializer = Some(deserializer);
            self
        }

        /// Set the response cache.
        pub fn cache(mut self, cache: std::sync::Arc<dyn restline_cache::Cache>) -> Self {
            self.$($path).+.cache = Some(cache);
            self
        }

        /// Set the cache expiry policy.
        pub fn cache_options(mut self, options: $crate::CacheOptions) -> Self {
            self.$($path).+.cache_options = Some(options);
            self
        }

        /// Set the cache key producer, evaluated once per attempt.
        pub fn cache_key<F>(mut self, key: F) -> Self
        where
            F: Fn() -> String + Send + Sync + 'static,
        {
            self.$($path).+.cache_key = Some(std::sync::Arc::new(key));
            self
        }

        /// Set the retry policy.
        pub fn retry_policy(mut self, policy: $crate::RetryPolicy) -> Self {
            self.$($path).+.retry_policy = Some(policy);
            self
        }

        /// Set the recurring task options.
        pub fn task_options(mut self, options: restline_tasks::TaskOptions) -> Self {
            self.$($path).+.task_options = Some(options);
            self
        }

        /// Set the proxy URL.
        pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
            self.$($path).+.proxy = Some(proxy.into());
            self
        }

        /// Set the per-attempt timeout.
        pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
            self.$($path).+.timeout = Some(timeout);
            self
        }

        /// Set the user agent.
        pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
            self.$($path).+.user_agent = Some(user_agent.into());
            self
        }

        /// Set the credentials collaborator.
        pub fn credentials(
            mut self,
            credentials: std::sync::Arc<dyn $crate::Credentials>,
        ) -> Self {
            self.$($path).+.credentials = Some(credentials);
            self
        }

        /// Set the query metadata.
        pub fn info(mut self, info: $crate::QueryInfo) -> Self {
            self.$($path).+.info = Some(info);
            self
        }
    };
}
