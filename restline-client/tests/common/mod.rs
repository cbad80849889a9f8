//! Shared test helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use http::Method;
use parking_lot::Mutex;
use restline_client::{PostParameter, Query, QueryResult, Transport, TransportError};
use std::collections::VecDeque;
use std::sync::Arc;
use url::Url;

/// What a scripted transport saw for one attempt.
#[derive(Debug, Clone)]
pub struct Seen {
    pub url: Url,
    pub query: Query,
    pub multipart: bool,
}

/// Transport answering from a script, then with a fallback result.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<QueryResult>>,
    fallback: QueryResult,
    seen: Mutex<Vec<Seen>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<QueryResult>, fallback: QueryResult) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Every attempt is refused.
    pub fn failing() -> Arc<Self> {
        Self::new(Vec::new(), refused())
    }

    /// Every attempt succeeds with `body`.
    pub fn ok(body: &str) -> Arc<Self> {
        Self::new(Vec::new(), ok(body))
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().clone()
    }

    pub fn methods(&self) -> Vec<Method> {
        self.seen.lock().iter().map(|s| s.query.method.clone()).collect()
    }

    fn answer(&self, url: &Url, query: &Query, multipart: bool) -> QueryResult {
        self.seen.lock().push(Seen {
            url: url.clone(),
            query: query.clone(),
            multipart,
        });
        let mut result = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        result.response_uri = Some(url.clone());
        result
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(&self, url: &Url, query: &Query) -> QueryResult {
        self.answer(url, query, false)
    }

    async fn request_multipart(
        &self,
        url: &Url,
        query: &Query,
        _parameters: &[PostParameter],
    ) -> QueryResult {
        self.answer(url, query, true)
    }
}

pub fn ok(body: &str) -> QueryResult {
    QueryResult::new(200, "OK").with_content(body, Some("application/json"))
}

pub fn refused() -> QueryResult {
    QueryResult::failed(TransportError::Connection("connection refused".to_string()))
}

pub fn status(code: u16, description: &str) -> QueryResult {
    QueryResult::new(code, description).with_error(TransportError::Status {
        status: code,
        description: description.to_string(),
    })
}
