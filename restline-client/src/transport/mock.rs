//! In-process transport answering redirected requests.

use async_trait::async_trait;
use http::StatusCode;
use tracing::trace;
use url::Url;

use super::Transport;
use crate::error::TransportError;
use crate::mock::{MOCK_SCHEME, params};
use crate::query::{PostParameter, Query};
use crate::result::QueryResult;

/// Answers attempts from the expectation parameters added by the mock
/// redirector, without touching the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockTransport;

impl MockTransport {
    /// Create a mock transport.
    pub fn new() -> Self {
        Self
    }

    fn respond(&self, url: &Url, query: &Query) -> QueryResult {
        let parameters = &query.parameters;

        let status_code = match parameters.get(params::STATUS_CODE) {
            Some(code) => match code.parse::<u16>() {
                Ok(code) => code,
                Err(_) => {
                    return QueryResult::failed(TransportError::Request(format!(
                        "invalid mock status code '{code}'"
                    )));
                }
            },
            None => StatusCode::OK.as_u16(),
        };
        let status_description = parameters
            .get(params::STATUS_DESCRIPTION)
            .map(str::to_string)
            .or_else(|| {
                StatusCode::from_u16(status_code)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .map(str::to_string)
            })
            .unwrap_or_default();

        let content = parameters.get(params::CONTENT).unwrap_or_default().to_string();
        let headers = match (
            parameters.get(params::HEADER_NAMES),
            parameters.get(params::HEADER_VALUES),
        ) {
            (Some(names), Some(values)) => names
                .split(',')
                .zip(values.split(','))
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            _ => Vec::new(),
        };

        let error = (status_code >= 400).then(|| TransportError::Status {
            status: status_code,
            description: status_description.clone(),
        });

        trace!(status = status_code, "Answering mock request");
        QueryResult {
            status_code,
            status_description,
            content_length: content.len() as u64,
            content,
            content_type: parameters.get(params::CONTENT_TYPE).map(str::to_string),
            response_uri: Some(restore_scheme(url, parameters.get(params::SCHEME))),
            headers,
            error,
            previous: None,
        }
    }
}

fn restore_scheme(url: &Url, scheme: Option<&str>) -> Url {
    scheme
        .and_then(|scheme| {
            let rest = url.as_str().strip_prefix(MOCK_SCHEME)?;
            Url::parse(&format!("{scheme}{rest}")).ok()
        })
        .unwrap_or_else(|| url.clone())
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, url: &Url, query: &Query) -> QueryResult {
        self.respond(url, query)
    }

    async fn request_multipart(&self, url: &Url, query: &Query, _: &[PostParameter]) -> QueryResult {
        self.respond(url, query)
    }
}
