//! Execution path selection.

use http::Method;
use restline_cache::{Cache, CacheExpiry};
use url::Url;

use crate::query::{PostParameter, Query};
use crate::resolve::ResolvedConfig;
use crate::result::QueryResult;
use crate::transport::Transport;

/// How one attempt is issued.
///
/// Selected per attempt, in order of precedence: cached when both a cache
/// and cache options are configured, multipart when post parameters exist,
/// plain otherwise.
pub(crate) enum ExecutionPath<'a> {
    Cached {
        cache: &'a dyn Cache,
        key: String,
        expiry: CacheExpiry,
    },
    Multipart(&'a [PostParameter]),
    Plain,
}

impl<'a> ExecutionPath<'a> {
    /// Select the path for the next attempt, adjusting the method of
    /// multipart queries.
    pub(crate) fn select(
        config: &'a ResolvedConfig,
        client_method: Option<&Method>,
        query: &mut Query,
    ) -> Self {
        if let (Some(cache), Some(options)) = (&config.cache, &config.cache_options) {
            let key = config.cache_key.as_ref().map(|key| key()).unwrap_or_default();
            return Self::Cached {
                cache: cache.as_ref(),
                key,
                expiry: options.expiry(),
            };
        }

        if !config.post_parameters.is_empty() {
            query.method = multipart_method(&query.method, client_method);
            return Self::Multipart(&config.post_parameters);
        }

        Self::Plain
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Cached { .. } => "cached",
            Self::Multipart(_) => "multipart",
            Self::Plain => "plain",
        }
    }

    pub(crate) async fn execute(
        &self,
        transport: &dyn Transport,
        url: &Url,
        query: &Query,
    ) -> QueryResult {
        match self {
            Self::Cached { cache, key, expiry } => {
                transport
                    .request_cached(url, query, key, *cache, *expiry)
                    .await
            }
            Self::Multipart(parameters) => transport.request_multipart(url, query, parameters).await,
            Self::Plain => transport.request(url, query).await,
        }
    }
}

/// Method of a multipart query.
///
/// Anything but `POST` is forced to `POST` unless the client default method
/// is `PUT`.
pub(crate) fn multipart_method(resolved: &Method, client_default: Option<&Method>) -> Method {
    if *resolved != Method::POST && client_default != Some(&Method::PUT) {
        Method::POST
    } else {
        resolved.clone()
    }
}
