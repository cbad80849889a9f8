//! A call prepared once and attempted as often as its retry budget allows.

use http::Method;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::path::ExecutionPath;
use crate::query::Query;
use crate::resolve::ResolvedConfig;
use crate::result::QueryResult;
use crate::serialization::EntityType;
use crate::transport::Transport;

/// Endpoint, base query and transport of one logical call.
///
/// Attempts reuse these as-is: the endpoint is never rebuilt and mock
/// redirection never reapplied once the call is prepared.
pub(crate) struct PreparedCall {
    pub(crate) config: ResolvedConfig,
    pub(crate) url: Url,
    pub(crate) query: Query,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) client_method: Option<Method>,
    pub(crate) response_entity_type: Option<EntityType>,
}

impl PreparedCall {
    /// Issue one physical attempt.
    pub(crate) async fn attempt(&self, query: &mut Query, continuation: bool) -> QueryResult {
        let path = ExecutionPath::select(&self.config, self.client_method.as_ref(), query);
        debug!(
            method = %query.method,
            url = %self.url,
            path = path.kind(),
            continuation,
            "Issuing attempt"
        );
        path.execute(self.transport.as_ref(), &self.url, query).await
    }
}
