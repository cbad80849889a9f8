//! Transport collaborators performing physical attempts.

mod http;
mod mock;

pub use self::http::{HttpTransport, HttpTransportOptions};
pub use self::mock::MockTransport;

use async_trait::async_trait;
use parking_lot::RwLock;
use restline_cache::{Cache, CacheExpiry, CacheExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use url::Url;

use crate::query::{PostParameter, Query};
use crate::result::QueryResult;

/// Performs physical attempts.
///
/// Transports never fail with an error value: every failure is captured on
/// the returned [`QueryResult`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Plain attempt.
    async fn request(&self, url: &Url, query: &Query) -> QueryResult;

    /// Multipart attempt with `parameters` as form parts.
    async fn request_multipart(
        &self,
        url: &Url,
        query: &Query,
        parameters: &[PostParameter],
    ) -> QueryResult;

    /// Attempt served from `cache` when an entry exists for `key` + `url`.
    ///
    /// On a miss the plain attempt runs and a successful result is stored
    /// with `expiry`. Cache failures are logged and treated as misses.
    async fn request_cached(
        &self,
        url: &Url,
        query: &Query,
        key: &str,
        cache: &dyn Cache,
        expiry: CacheExpiry,
    ) -> QueryResult {
        let cache_key = format!("{key}{url}");

        match cache.fetch_json::<CachedResponse>(&cache_key).await {
            Ok(Some(cached)) => {
                debug!(key = %cache_key, "Serving response from cache");
                return cached.into_result();
            }
            Ok(None) => trace!(key = %cache_key, "Cache miss"),
            Err(e) => warn!(key = %cache_key, error = %e, "Cache lookup failed"),
        }

        let result = self.request(url, query).await;
        if result.error.is_none()
            && let Err(e) = cache
                .store_json(&cache_key, &CachedResponse::from(&result), expiry)
                .await
        {
            warn!(key = %cache_key, error = %e, "Failed to store response in cache");
        }
        result
    }
}

/// Cached form of a successful result.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedResponse {
    status_code: u16,
    status_description: String,
    content: String,
    content_type: Option<String>,
    content_length: u64,
    response_uri: Option<String>,
    headers: Vec<(String, String)>,
}

impl From<&QueryResult> for CachedResponse {
    fn from(result: &QueryResult) -> Self {
        Self {
            status_code: result.status_code,
            status_description: result.status_description.clone(),
            content: result.content.clone(),
            content_type: result.content_type.clone(),
            content_length: result.content_length,
            response_uri: result.response_uri.as_ref().map(Url::to_string),
            headers: result.headers.clone(),
        }
    }
}

impl CachedResponse {
    fn into_result(self) -> QueryResult {
        QueryResult {
            status_code: self.status_code,
            status_description: self.status_description,
            content: self.content,
            content_type: self.content_type,
            content_length: self.content_length,
            response_uri: self.response_uri.and_then(|u| Url::parse(&u).ok()),
            headers: self.headers,
            error: None,
            previous: None,
        }
    }
}

/// Per-client mapping from URL scheme to transport.
pub struct TransportRegistry {
    default: Arc<dyn Transport>,
    schemes: RwLock<HashMap<String, Arc<dyn Transport>>>,
}

impl TransportRegistry {
    /// Registry sending every scheme to `default`.
    pub fn new(default: Arc<dyn Transport>) -> Self {
        Self {
            default,
            schemes: RwLock::new(HashMap::new()),
        }
    }

    /// Register `transport` for `scheme`, replacing any earlier one.
    pub fn register(&self, scheme: &str, transport: Arc<dyn Transport>) {
        self.schemes
            .write()
            .insert(scheme.to_ascii_lowercase(), transport);
    }

    /// Register a transport for `scheme` unless one exists.
    ///
    /// Returns `true` if `make` was called.
    pub fn register_if_absent<F>(&self, scheme: &str, make: F) -> bool
    where
        F: FnOnce() -> Arc<dyn Transport>,
    {
        let scheme = scheme.to_ascii_lowercase();
        if self.schemes.read().contains_key(&scheme) {
            return false;
        }

        let mut schemes = self.schemes.write();
        if schemes.contains_key(&scheme) {
            return false;
        }
        debug!(scheme = %scheme, "Registering transport");
        schemes.insert(scheme, make());
        true
    }

    /// Check if a transport is registered for `scheme`.
    pub fn is_registered(&self, scheme: &str) -> bool {
        self.schemes
            .read()
            .contains_key(&scheme.to_ascii_lowercase())
    }

    /// Transport serving `url`.
    pub fn for_url(&self, url: &Url) -> Arc<dyn Transport> {
        self.schemes
            .read()
            .get(url.scheme())
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

impl fmt::Debug for TransportRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let schemes: Vec<String> = self.schemes.read().keys().cloned().collect();
        f.debug_struct("TransportRegistry")
            .field("schemes", &schemes)
            .finish_non_exhaustive()
    }
}
