//! Raw attempt results.

use url::Url;

use crate::error::TransportError;

/// Outcome of one physical attempt.
///
/// Results of a retried call are chained newest-first through
/// [`previous`](QueryResult::previous).
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// HTTP status code, `0` if no response was received.
    pub status_code: u16,
    /// Status description.
    pub status_description: String,
    /// Raw response body.
    pub content: String,
    /// Response content type.
    pub content_type: Option<String>,
    /// Length of the body in bytes.
    pub content_length: u64,
    /// Final URI after redirects.
    pub response_uri: Option<Url>,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Error captured during the attempt.
    pub error: Option<TransportError>,
    pub(crate) previous: Option<Box<QueryResult>>,
}

impl QueryResult {
    /// A result for a received response.
    pub fn new(status_code: u16, status_description: impl Into<String>) -> Self {
        Self {
            status_code,
            status_description: status_description.into(),
            ..Self::default()
        }
    }

    /// Attach a response body.
    pub fn with_content(mut self, content: impl Into<String>, content_type: Option<&str>) -> Self {
        self.content = content.into();
        self.content_length = self.content.len() as u64;
        self.content_type = content_type.map(str::to_string);
        self
    }

    /// Attach the error captured during the attempt.
    pub fn with_error(mut self, error: TransportError) -> Self {
        self.error = Some(error);
        self
    }

    /// A result carrying only an error.
    pub fn failed(error: TransportError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Error captured during the attempt.
    pub fn error(&self) -> Option<&TransportError> {
        self.error.as_ref()
    }

    /// The attempt before this one.
    pub fn previous(&self) -> Option<&QueryResult> {
        self.previous.as_deref()
    }

    /// This result followed by every earlier attempt, newest first.
    pub fn history(&self) -> History<'_> {
        History { next: Some(self) }
    }

    /// Number of attempts in the chain.
    pub fn attempts(&self) -> usize {
        self.history().count()
    }

    pub(crate) fn link(mut self, previous: Option<QueryResult>) -> Self {
        self.previous = previous.map(Box::new);
        self
    }
}

/// Iterator over a result chain.
#[derive(Debug)]
pub struct History<'a> {
    next: Option<&'a QueryResult>,
}

impl<'a> Iterator for History<'a> {
    type Item = &'a QueryResult;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.previous();
        Some(current)
    }
}
