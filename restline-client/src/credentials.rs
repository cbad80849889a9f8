//! Credentials collaborators that build the base query of a call.

use base64::{Engine, engine::general_purpose::STANDARD};
use http::Method;
use std::fmt;
use url::Url;

use crate::query::{Query, QueryInfo};
use crate::request::Request;

/// Produces the base query for a call.
pub trait Credentials: Send + Sync {
    /// Build the base query for `request` sent to `uri`.
    fn query_for(
        &self,
        uri: &Url,
        request: &Request,
        info: Option<&QueryInfo>,
        method: &Method,
    ) -> Query;
}

/// HTTP basic authentication.
#[derive(Clone)]
pub struct BasicAuthCredentials {
    username: String,
    password: Option<String>,
}

impl BasicAuthCredentials {
    /// Create basic credentials.
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    fn header_value(&self) -> String {
        let pair = format!(
            "{}:{}",
            self.username,
            self.password.as_deref().unwrap_or_default()
        );
        format!("Basic {}", STANDARD.encode(pair))
    }
}

impl fmt::Debug for BasicAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthCredentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Credentials for BasicAuthCredentials {
    fn query_for(&self, _: &Url, _: &Request, info: Option<&QueryInfo>, _: &Method) -> Query {
        Query::basic(info.cloned()).with_authorization(self.header_value())
    }
}

/// Bearer token authentication.
#[derive(Clone)]
pub struct BearerTokenCredentials {
    token: String,
}

impl BearerTokenCredentials {
    /// Create bearer credentials.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for BearerTokenCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerTokenCredentials")
            .field("token", &"***")
            .finish()
    }
}

impl Credentials for BearerTokenCredentials {
    fn query_for(&self, _: &Url, _: &Request, info: Option<&QueryInfo>, _: &Method) -> Query {
        Query::basic(info.cloned()).with_authorization(format!("Bearer {}", self.token))
    }
}
