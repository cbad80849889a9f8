//! Redirects requests carrying expectations to the mock transport.
//!
//! The expectations travel to the [`MockTransport`](crate::MockTransport) as
//! query parameters, and the endpoint scheme is swapped for [`MOCK_SCHEME`] so
//! the transport registry routes the attempt away from the network.

use http::StatusCode;
use tracing::debug;
use url::Url;

use crate::error::Result;
use crate::query::Query;
use crate::request::{Request, is_blank};
use crate::serialization::{Serializer, serialize_entity};

/// URL scheme served by the mock transport.
pub const MOCK_SCHEME: &str = "mock";

/// Content type used when expected content has none.
pub const DEFAULT_MOCK_CONTENT_TYPE: &str = "text/html";

/// Parameter names carrying expectations to the mock transport.
pub mod params {
    /// Scheme the endpoint had before redirection.
    pub const SCHEME: &str = "mockScheme";
    /// Expected status code.
    pub const STATUS_CODE: &str = "mockStatusCode";
    /// Expected status description.
    pub const STATUS_DESCRIPTION: &str = "mockStatusDescription";
    /// Expected content.
    pub const CONTENT: &str = "mockContent";
    /// Expected content type.
    pub const CONTENT_TYPE: &str = "mockContentType";
    /// Comma-joined expected header names.
    pub const HEADER_NAMES: &str = "mockHeaderNames";
    /// Comma-joined expected header values.
    pub const HEADER_VALUES: &str = "mockHeaderValues";
}

/// Check if `request` should be answered by the mock transport.
pub fn expects_mock(request: &Request) -> bool {
    !request.expectations().is_empty()
}

/// Encode the expectations of `request` into `query` and rewrite `url`.
pub(crate) fn redirect(
    request: &Request,
    serializer: Option<&dyn Serializer>,
    query: &mut Query,
    url: &Url,
) -> Result<Url> {
    let expect = request.expectations();
    let raw = url.as_str();

    let rewritten = match ["https", "http"]
        .into_iter()
        .find_map(|scheme| raw.strip_prefix(scheme).map(|rest| (scheme, rest)))
    {
        Some((scheme, rest)) => {
            query.parameters.add(params::SCHEME, scheme);
            Url::parse(&format!("{MOCK_SCHEME}{rest}"))?
        }
        None => url.clone(),
    };

    if let Some(status) = expect.status_code {
        query.parameters.add(params::STATUS_CODE, status.as_u16().to_string());
    }
    if let Some(description) = status_description(expect.status_code, expect.status_description.as_deref()) {
        query.parameters.add(params::STATUS_DESCRIPTION, description);
    }

    let serialized = match (&expect.entity, serializer) {
        (Some(entity), Some(serializer)) => {
            serialize_entity(serializer, entity, request.request_entity_type.as_ref())?
        }
        _ => None,
    };

    if let Some(entity) = serialized {
        query.parameters.add(params::CONTENT, entity.content);
        query.parameters.add(params::CONTENT_TYPE, entity.content_type);
    } else if !is_blank(expect.content.as_deref()) {
        let content_type = expect
            .content_type
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_MOCK_CONTENT_TYPE);
        query
            .parameters
            .add(params::CONTENT, expect.content.clone().unwrap_or_default());
        query.parameters.add(params::CONTENT_TYPE, content_type);
    } else if let Some(content_type) = expect.content_type.as_deref().filter(|t| !t.trim().is_empty()) {
        query.parameters.add(params::CONTENT_TYPE, content_type);
    }

    if !expect.headers.is_empty() {
        let names: Vec<&str> = expect.headers.iter().map(|(n, _)| n.as_str()).collect();
        let values: Vec<&str> = expect.headers.iter().map(|(_, v)| v.as_str()).collect();
        query.parameters.add(params::HEADER_NAMES, names.join(","));
        query.parameters.add(params::HEADER_VALUES, values.join(","));
    }

    debug!(from = %url, to = %rewritten, "Redirecting request to mock transport");
    Ok(rewritten)
}

fn status_description(status: Option<StatusCode>, description: Option<&str>) -> Option<String> {
    match description.filter(|d| !d.trim().is_empty()) {
        Some(description) => Some(description.to_string()),
        None => status.map(|s| {
            s.canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| s.as_u16().to_string())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::JsonSerializer;
    use serde_json::json;

    fn endpoint() -> Url {
        Url::parse("https://api.example.com/users/1").unwrap()
    }

    fn redirected(request: &Request, serializer: Option<&dyn Serializer>) -> (Url, Query) {
        let mut query = Query::basic(None);
        let url = redirect(request, serializer, &mut query, &endpoint()).unwrap();
        (url, query)
    }

    #[test]
    fn test_status_expectation() {
        let request = Request::get("users/1").expect_status(StatusCode::NOT_FOUND);
        let (url, query) = redirected(&request, None);

        assert_eq!(url.as_str(), "mock://api.example.com/users/1");
        let pairs: Vec<_> = query.parameters.pairs().collect();
        assert_eq!(
            pairs,
            vec![
                (params::SCHEME, "https"),
                (params::STATUS_CODE, "404"),
                (params::STATUS_DESCRIPTION, "Not Found"),
            ]
        );
    }

    #[test]
    fn test_explicit_description_wins() {
        let request = Request::get("x")
            .expect_status(StatusCode::OK)
            .expect_status_description("All Good");
        let (_, query) = redirected(&request, None);
        assert_eq!(query.parameters.get(params::STATUS_DESCRIPTION), Some("All Good"));
    }

    #[test]
    fn test_content_defaults_to_html() {
        let request = Request::get("x").expect_content("<p>hi</p>");
        let (_, query) = redirected(&request, None);

        assert_eq!(query.parameters.get(params::CONTENT), Some("<p>hi</p>"));
        assert_eq!(query.parameters.get(params::CONTENT_TYPE), Some("text/html"));
        assert!(!query.parameters.contains(params::STATUS_CODE));
    }

    #[test]
    fn test_entity_uses_serializer() {
        let request = Request::get("x")
            .expect_entity(&json!({"id": 1}))
            .unwrap()
            .expect_content("ignored");
        let (_, query) = redirected(&request, Some(&JsonSerializer));

        assert_eq!(query.parameters.get(params::CONTENT), Some(r#"{"id":1}"#));
        assert_eq!(
            query.parameters.get(params::CONTENT_TYPE),
            Some("application/json")
        );
    }

    #[test]
    fn test_headers_are_comma_joined() {
        let request = Request::get("x")
            .expect_header("X-A", "1")
            .expect_header("X-B", "2");
        let (_, query) = redirected(&request, None);

        assert_eq!(query.parameters.get(params::HEADER_NAMES), Some("X-A,X-B"));
        assert_eq!(query.parameters.get(params::HEADER_VALUES), Some("1,2"));
    }

    #[test]
    fn test_plain_http_scheme() {
        let request = Request::get("x").expect_status(StatusCode::OK);
        let mut query = Query::basic(None);
        let url = redirect(
            &request,
            None,
            &mut query,
            &Url::parse("http://localhost:8080/a?b=c").unwrap(),
        )
        .unwrap();

        assert_eq!(url.as_str(), "mock://localhost:8080/a?b=c");
        assert_eq!(query.parameters.get(params::SCHEME), Some("http"));
    }

    #[test]
    fn test_expects_mock() {
        assert!(!expects_mock(&Request::get("x")));
        assert!(expects_mock(&Request::get("x").expect_content_type("application/json")));
    }
}
