//! Network transport built on reqwest.

use async_trait::async_trait;
use http::Method;
use http::header::{AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE, USER_AGENT};
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

use super::Transport;
use crate::error::{ClientError, Result, TransportError};
use crate::query::{PostParameter, Query};
use crate::result::QueryResult;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Connection settings of the network transport.
#[derive(Debug, Clone)]
pub struct HttpTransportOptions {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// How long idle connections are kept.
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// User agent sent when a query has none.
    pub user_agent: String,
    /// Enable gzip compression.
    pub gzip: bool,
    /// Enable brotli compression.
    pub brotli: bool,
    /// Follow redirects.
    pub follow_redirects: bool,
    /// Maximum redirects to follow.
    pub max_redirects: usize,
}

impl Default for HttpTransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 32,
            user_agent: format!("restline/{}", env!("CARGO_PKG_VERSION")),
            gzip: true,
            brotli: true,
            follow_redirects: true,
            max_redirects: 10,
        }
    }
}

/// Transport sending attempts over the network.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: reqwest::Client,
    options: HttpTransportOptions,
}

impl HttpTransport {
    /// Create a transport with default options.
    pub fn new() -> Result<Self> {
        Self::with_options(HttpTransportOptions::default())
    }

    /// Create a transport with the given options.
    pub fn with_options(options: HttpTransportOptions) -> Result<Self> {
        let inner = client_builder(&options)
            .build()
            .map_err(|e| ClientError::TransportSetup(e.to_string()))?;
        Ok(Self { inner, options })
    }

    /// Transport options.
    pub fn options(&self) -> &HttpTransportOptions {
        &self.options
    }

    fn client_for(&self, query: &Query) -> std::result::Result<reqwest::Client, TransportError> {
        let Some(proxy) = query.proxy.as_deref() else {
            return Ok(self.inner.clone());
        };

        trace!(proxy = %proxy, "Building proxied client");
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| TransportError::Request(e.to_string()))?;
        client_builder(&self.options)
            .proxy(proxy)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))
    }

    fn prepare(
        &self,
        url: &Url,
        query: &Query,
        multipart: bool,
    ) -> std::result::Result<reqwest::RequestBuilder, TransportError> {
        let client = self.client_for(query)?;

        let form_body = !multipart && query.entity.is_none() && !sends_parameters_in_url(&query.method);
        let mut url = url.clone();
        if !form_body && !query.parameters.is_empty() {
            url.query_pairs_mut().extend_pairs(query.parameters.pairs());
        }

        let mut builder = client.request(query.method.clone(), url);
        for (name, value) in &query.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(user_agent) = &query.user_agent {
            builder = builder.header(USER_AGENT, user_agent.as_str());
        }
        if let Some(authorization) = &query.authorization {
            builder = builder.header(AUTHORIZATION, authorization.as_str());
        }
        if let Some(timeout) = query.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(entity) = &query.entity {
            builder = builder
                .header(CONTENT_TYPE, entity.content_type.as_str())
                .body(entity.content.clone());
            if let Some(encoding) = &entity.content_encoding {
                builder = builder.header(CONTENT_ENCODING, encoding.as_str());
            }
        } else if form_body && !query.parameters.is_empty() {
            let pairs: Vec<(&str, &str)> = query.parameters.pairs().collect();
            let body = serde_urlencoded::to_string(pairs)
                .map_err(|e| TransportError::Request(e.to_string()))?;
            builder = builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(body);
        }

        Ok(builder)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, url: &Url, query: &Query) -> QueryResult {
        match self.prepare(url, query, false) {
            Ok(builder) => send(builder).await,
            Err(e) => QueryResult::failed(e),
        }
    }

    async fn request_multipart(
        &self,
        url: &Url,
        query: &Query,
        parameters: &[PostParameter],
    ) -> QueryResult {
        let form = match multipart_form(parameters) {
            Ok(form) => form,
            Err(e) => return QueryResult::failed(e),
        };
        match self.prepare(url, query, true) {
            Ok(builder) => send(builder.multipart(form)).await,
            Err(e) => QueryResult::failed(e),
        }
    }
}

fn client_builder(options: &HttpTransportOptions) -> reqwest::ClientBuilder {
    let builder = reqwest::Client::builder()
        .connect_timeout(options.connect_timeout)
        .pool_idle_timeout(options.pool_idle_timeout)
        .pool_max_idle_per_host(options.pool_max_idle_per_host)
        .user_agent(&options.user_agent)
        .gzip(options.gzip)
        .brotli(options.brotli);

    if options.follow_redirects {
        builder.redirect(reqwest::redirect::Policy::limited(options.max_redirects))
    } else {
        builder.redirect(reqwest::redirect::Policy::none())
    }
}

fn sends_parameters_in_url(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::DELETE | Method::OPTIONS | Method::TRACE
    )
}

fn multipart_form(parameters: &[PostParameter]) -> std::result::Result<Form, TransportError> {
    let mut form = Form::new();
    for parameter in parameters {
        form = match parameter {
            PostParameter::Field { name, value } => form.text(name.clone(), value.clone()),
            PostParameter::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                let part = Part::bytes(data.to_vec())
                    .file_name(file_name.clone())
                    .mime_str(content_type)
                    .map_err(|e| TransportError::Request(e.to_string()))?;
                form.part(name.clone(), part)
            }
        };
    }
    Ok(form)
}

async fn send(builder: reqwest::RequestBuilder) -> QueryResult {
    let response = match builder.send().await {
        Ok(response) => response,
        Err(e) => {
            debug!(error = %e, "Request failed");
            return QueryResult::failed(e.into());
        }
    };

    let status = response.status();
    let description = status.canonical_reason().unwrap_or_default().to_string();
    let response_uri = response.url().clone();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let headers = response
        .headers()
        .iter()
        .filter_map(|(n, v)| Some((n.to_string(), v.to_str().ok()?.to_string())))
        .collect();

    let mut result = QueryResult {
        status_code: status.as_u16(),
        status_description: description,
        content_type,
        response_uri: Some(response_uri),
        headers,
        ..QueryResult::default()
    };

    match response.text().await {
        Ok(content) => {
            result.content_length = content.len() as u64;
            result.content = content;
        }
        Err(e) => {
            result.error = Some(e.into());
            return result;
        }
    }

    if status.is_client_error() || status.is_server_error() {
        result.error = Some(TransportError::Status {
            status: result.status_code,
            description: result.status_description.clone(),
        });
    }

    trace!(status = result.status_code, length = result.content_length, "Response received");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::WebEntity;

    fn url() -> Url {
        Url::parse("https://api.example.com/search").unwrap()
    }

    fn query(method: Method) -> Query {
        let mut query = Query::basic(None);
        query.method = method;
        query.parameters.add("q", "rust lang");
        query
    }

    #[test]
    fn test_get_parameters_go_in_url() {
        let transport = HttpTransport::new().unwrap();
        let request = transport
            .prepare(&url(), &query(Method::GET), false)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.url().query(), Some("q=rust+lang"));
        assert!(request.body().is_none());
    }

    #[test]
    fn test_post_parameters_go_in_form_body() {
        let transport = HttpTransport::new().unwrap();
        let request = transport
            .prepare(&url(), &query(Method::POST), false)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.url().query(), None);
        assert_eq!(
            request.headers().get(CONTENT_TYPE).unwrap(),
            FORM_CONTENT_TYPE
        );
        assert_eq!(
            request.body().and_then(|b| b.as_bytes()),
            Some(&b"q=rust+lang"[..])
        );
    }

    #[test]
    fn test_entity_wins_over_form_body() {
        let transport = HttpTransport::new().unwrap();
        let mut query = query(Method::POST);
        query.entity = Some(WebEntity::new(r#"{"a":1}"#, "application/json"));
        query.user_agent = Some("agent/1".into());
        query.authorization = Some("Bearer t".into());

        let request = transport.prepare(&url(), &query, false).unwrap().build().unwrap();

        assert_eq!(request.url().query(), Some("q=rust+lang"));
        assert_eq!(request.headers().get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(request.headers().get(USER_AGENT).unwrap(), "agent/1");
        assert_eq!(request.headers().get(AUTHORIZATION).unwrap(), "Bearer t");
    }
}
