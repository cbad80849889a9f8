//! Per-attempt query model handed to transports.

use bytes::Bytes;
use http::Method;
use std::time::Duration;

use crate::serialization::WebEntity;

/// A single name/value parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter value.
    pub value: String,
}

/// Ordered parameter list.
///
/// [`set`](Parameters::set) replaces a same-named entry in place, so a
/// request value overriding a client value keeps the client's position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters(Vec<Parameter>);

impl Parameters {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, keeping any existing entry with the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(Parameter {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Replace the first entry with the same name, or append.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.0.push(Parameter { name, value }),
        }
    }

    /// Apply every entry of `overrides` with [`set`](Parameters::set).
    pub fn merge(&mut self, overrides: &Parameters) {
        for p in overrides.iter() {
            self.set(p.name.clone(), p.value.clone());
        }
    }

    /// Value of the first entry named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Check if an entry named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.0.iter()
    }

    /// Iterate as `(name, value)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|p| (p.name.as_str(), p.value.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Parameters
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut parameters = Self::new();
        for (name, value) in iter {
            parameters.add(name, value);
        }
        parameters
    }
}

/// A multipart form part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostParameter {
    /// Plain text field.
    Field {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// File upload.
    File {
        /// Field name.
        name: String,
        /// File name sent with the part.
        file_name: String,
        /// MIME type of the part.
        content_type: String,
        /// File contents.
        data: Bytes,
    },
}

impl PostParameter {
    /// Create a text field.
    pub fn field(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Field {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create a file part.
    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Field name of this part.
    pub fn name(&self) -> &str {
        match self {
            Self::Field { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Free-form metadata attached to every query.
///
/// Values are sent as headers on the base query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryInfo {
    values: Vec<(String, String)>,
}

impl QueryInfo {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metadata value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.push((name.into(), value.into()));
        self
    }

    /// Look up a value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over all values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// Everything a transport needs to perform one attempt.
#[derive(Debug, Clone)]
pub struct Query {
    /// HTTP method.
    pub method: Method,
    /// Headers in send order.
    pub headers: Vec<(String, String)>,
    /// Query or form parameters.
    pub parameters: Parameters,
    /// Request body.
    pub entity: Option<WebEntity>,
    /// User agent.
    pub user_agent: Option<String>,
    /// Proxy URL.
    pub proxy: Option<String>,
    /// Per-attempt timeout.
    pub timeout: Option<Duration>,
    /// `Authorization` header value.
    pub authorization: Option<String>,
    /// Metadata the query was built with.
    pub info: Option<QueryInfo>,
}

impl Query {
    /// Base query used when no credentials are configured.
    pub fn basic(info: Option<QueryInfo>) -> Self {
        let headers = info
            .iter()
            .flat_map(|info| info.iter())
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();

        Self {
            method: Method::GET,
            headers,
            parameters: Parameters::new(),
            entity: None,
            user_agent: None,
            proxy: None,
            timeout: None,
            authorization: None,
            info,
        }
    }

    /// Set the `Authorization` header value.
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
