//! Caller-facing responses.

use http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;
use url::Url;

use crate::error::{Result, TransportError};
use crate::result::QueryResult;
use crate::serialization::{Deserializer, EntityType, deserialize_as};

/// Response of a logical call, built from its terminal attempt.
#[derive(Debug, Clone)]
pub struct Response<T = Value> {
    content_entity: Option<T>,
    result: QueryResult,
}

impl<T> Response<T> {
    /// HTTP status, if the code is valid.
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.result.status_code).ok()
    }

    /// Raw status code, `0` if no response was received.
    pub fn status_code(&self) -> u16 {
        self.result.status_code
    }

    /// Status description.
    pub fn status_description(&self) -> &str {
        &self.result.status_description
    }

    /// Check if the status is 2xx and no error was captured.
    pub fn is_success(&self) -> bool {
        self.result.error.is_none() && self.status().is_some_and(|s| s.is_success())
    }

    /// Raw body.
    pub fn content(&self) -> &str {
        &self.result.content
    }

    /// Content type.
    pub fn content_type(&self) -> Option<&str> {
        self.result.content_type.as_deref()
    }

    /// Body length in bytes.
    pub fn content_length(&self) -> u64 {
        self.result.content_length
    }

    /// Final URI.
    pub fn response_uri(&self) -> Option<&Url> {
        self.result.response_uri.as_ref()
    }

    /// Response headers.
    pub fn headers(&self) -> &[(String, String)] {
        &self.result.headers
    }

    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.result
            .headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decoded entity.
    pub fn content_entity(&self) -> Option<&T> {
        self.content_entity.as_ref()
    }

    /// Take the decoded entity.
    pub fn into_entity(self) -> Option<T> {
        self.content_entity
    }

    /// Error captured by the terminal attempt.
    pub fn error(&self) -> Option<&TransportError> {
        self.result.error()
    }

    /// Terminal attempt, with earlier attempts reachable through it.
    pub fn result(&self) -> &QueryResult {
        &self.result
    }

    /// Number of attempts the call made.
    pub fn attempts(&self) -> usize {
        self.result.attempts()
    }

    fn without_entity(result: QueryResult) -> Self {
        Self {
            content_entity: None,
            result,
        }
    }
}

impl Response<Value> {
    /// Build an untyped response, decoding the body as `entity_type`.
    ///
    /// Nothing is decoded when the body is blank. A non-blank body requires
    /// both a deserializer and a declared entity type.
    pub(crate) fn from_result(
        result: QueryResult,
        deserializer: Option<&dyn Deserializer>,
        entity_type: Option<&EntityType>,
    ) -> Result<Self> {
        if result.content.trim().is_empty() {
            trace!("Blank response body, skipping deserialization");
            return Ok(Self::without_entity(result));
        }
        let (Some(deserializer), Some(entity_type)) = (deserializer, entity_type) else {
            return Ok(Self::without_entity(result));
        };

        let entity = deserializer.deserialize(&result.content, entity_type)?;
        Ok(Self {
            content_entity: Some(entity),
            result,
        })
    }
}

impl<T: DeserializeOwned> Response<T> {
    /// Build a typed response, decoding the body as `T`.
    pub(crate) fn from_result_typed(
        result: QueryResult,
        deserializer: Option<&dyn Deserializer>,
    ) -> Result<Self> {
        if result.content.trim().is_empty() {
            trace!("Blank response body, skipping deserialization");
            return Ok(Self::without_entity(result));
        }
        let Some(deserializer) = deserializer else {
            return Ok(Self::without_entity(result));
        };

        let entity = deserialize_as::<T>(deserializer, &result.content)?;
        Ok(Self {
            content_entity: Some(entity),
            result,
        })
    }
}
