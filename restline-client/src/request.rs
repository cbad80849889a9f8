//! Request description.

use http::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::serialization::{EntityType, WebEntity};
use crate::settings::Settings;

/// Mock expectations for a request.
///
/// When any expectation is set the request never reaches the network; it is
/// redirected to the mock transport, which answers with these values.
#[derive(Debug, Clone, Default)]
pub struct Expectations {
    /// Expected status code.
    pub status_code: Option<StatusCode>,
    /// Expected status description.
    pub status_description: Option<String>,
    /// Expected raw content.
    pub content: Option<String>,
    /// Expected content type.
    pub content_type: Option<String>,
    /// Expected entity, serialized with the request serializer.
    pub entity: Option<Value>,
    /// Expected response headers.
    pub headers: Vec<(String, String)>,
}

impl Expectations {
    /// Check if no expectation is set.
    pub fn is_empty(&self) -> bool {
        self.status_code.is_none()
            && is_blank(self.status_description.as_deref())
            && is_blank(self.content.as_deref())
            && is_blank(self.content_type.as_deref())
            && self.entity.is_none()
            && self.headers.is_empty()
    }
}

pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// A request to run through a [`RestClient`](crate::RestClient).
///
/// # Examples
///
/// ```
/// use restline_client::*;
/// use std::time::Duration;
///
/// let request = Request::get("users/42")
///     .parameter("fields", "name,email")
///     .timeout(Duration::from_secs(5))
///     .retry_policy(RetryPolicy::new(2).retry_if(RetryCondition::on_timeout()));
///
/// assert_eq!(request.path(), "users/42");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Request {
    path: String,
    pub(crate) settings: Settings,
    pub(crate) entity: Option<Value>,
    pub(crate) body: Option<WebEntity>,
    pub(crate) request_entity_type: Option<EntityType>,
    pub(crate) response_entity_type: Option<EntityType>,
    pub(crate) expect: Expectations,
}

impl Request {
    /// Create a request for `path`, relative to the client authority or absolute.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Create a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(path).method(Method::GET)
    }

    /// Create a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(path).method(Method::POST)
    }

    /// Create a PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(path).method(Method::PUT)
    }

    /// Create a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(path).method(Method::DELETE)
    }

    settings_setters!(settings);

    /// Attach an entity to send as the body, encoded by the serializer.
    pub fn entity<T: Serialize>(mut self, entity: &T) -> Result<Self> {
        let value =
            serde_json::to_value(entity).map_err(|e| ClientError::Serialization(e.to_string()))?;
        self.entity = Some(value);
        self.request_entity_type = Some(EntityType::of::<T>());
        Ok(self)
    }

    /// Send a pre-encoded body.
    pub fn body(mut self, content: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.body = Some(WebEntity::new(content, content_type));
        self
    }

    /// Declare the response entity type for untyped calls.
    pub fn response_entity<T: ?Sized>(self) -> Self {
        self.response_entity_type(EntityType::of::<T>())
    }

    /// Declare the response entity type for untyped calls.
    pub fn response_entity_type(mut self, entity_type: EntityType) -> Self {
        self.response_entity_type = Some(entity_type);
        self
    }

    /// Expect a status code.
    pub fn expect_status(mut self, status: StatusCode) -> Self {
        self.expect.status_code = Some(status);
        self
    }

    /// Expect a status description.
    pub fn expect_status_description(mut self, description: impl Into<String>) -> Self {
        self.expect.status_description = Some(description.into());
        self
    }

    /// Expect raw content.
    pub fn expect_content(mut self, content: impl Into<String>) -> Self {
        self.expect.content = Some(content.into());
        self
    }

    /// Expect a content type.
    pub fn expect_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.expect.content_type = Some(content_type.into());
        self
    }

    /// Expect an entity.
    pub fn expect_entity<T: Serialize>(mut self, entity: &T) -> Result<Self> {
        let value =
            serde_json::to_value(entity).map_err(|e| ClientError::Serialization(e.to_string()))?;
        self.expect.entity = Some(value);
        Ok(self)
    }

    /// Expect a response header.
    pub fn expect_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.expect.headers.push((name.into(), value.into()));
        self
    }

    /// Path or absolute URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Settings overriding the client defaults.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mock expectations.
    pub fn expectations(&self) -> &Expectations {
        &self.expect
    }

    /// Declared response entity type.
    pub fn declared_response_type(&self) -> Option<&EntityType> {
        self.response_entity_type.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builders_fill_settings() {
        let request = Request::post("orders")
            .header("X-A", "1")
            .parameter("page", "1")
            .parameter("page", "2")
            .user_agent("agent");

        let settings = request.settings();
        assert_eq!(settings.method, Some(Method::POST));
        assert_eq!(settings.headers, vec![("X-A".to_string(), "1".to_string())]);
        assert_eq!(settings.parameters.get("page"), Some("2"));
        assert_eq!(settings.parameters.len(), 1);
        assert_eq!(settings.user_agent.as_deref(), Some("agent"));
    }

    #[test]
    fn test_entity_records_type() {
        let request = Request::post("orders").entity(&json!({"id": 1})).unwrap();
        assert_eq!(request.entity, Some(json!({"id": 1})));
        assert!(request.request_entity_type.is_some());
    }

    #[test]
    fn test_expectations_blank_values_do_not_count() {
        assert!(Request::get("x").expect_content("  ").expectations().is_empty());
        assert!(
            !Request::get("x")
                .expect_status(StatusCode::NOT_FOUND)
                .expectations()
                .is_empty()
        );
        assert!(
            !Request::get("x")
                .expect_header("X-Rate", "5")
                .expectations()
                .is_empty()
        );
    }
}
