//! The request execution engine.

use restline_tasks::{Scheduler, TokioScheduler};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, instrument};
use url::Url;

use crate::call::PreparedCall;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::mock::{self, MOCK_SCHEME};
use crate::orchestrator::{AsyncCall, AsyncHandle, Callback, ResponseFactory};
use crate::query::Query;
use crate::recurring;
use crate::request::Request;
use crate::resolve::ResolvedConfig;
use crate::response::Response;
use crate::result::QueryResult;
use crate::retry::{RetryController, Step};
use crate::serialization::{WebEntity, serialize_entity};
use crate::transport::{HttpTransport, MockTransport, Transport, TransportRegistry};

/// Executes requests against an authority with client-level defaults.
///
/// Cloning is cheap; clones share configuration, transports and scheduler.
///
/// # Examples
///
/// ```no_run
/// use restline_client::*;
///
/// # async fn example() -> Result<()> {
/// let client = RestClient::new(
///     ClientConfig::builder()
///         .authority("https://api.example.com")
///         .deserializer(std::sync::Arc::new(JsonSerializer))
///         .build(),
/// )?;
///
/// let response = client.request_as::<serde_json::Value>(&Request::get("users/1")).await?;
/// println!("{:?}", response.content_entity());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RestClient {
    config: Arc<ClientConfig>,
    transports: Arc<TransportRegistry>,
    scheduler: Arc<dyn Scheduler>,
}

impl RestClient {
    /// Create a client sending requests over the network.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::with_transport(config, Arc::new(HttpTransport::new()?)))
    }

    /// Create a client sending requests through `transport`.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transports: Arc::new(TransportRegistry::new(transport)),
            scheduler: Arc::new(TokioScheduler::new()),
        }
    }

    /// Use `scheduler` for recurring calls.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Answer mock-redirected requests with `transport`.
    pub fn with_mock_transport(self, transport: Arc<dyn Transport>) -> Self {
        self.transports.register(MOCK_SCHEME, transport);
        self
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Transports by scheme.
    pub fn transports(&self) -> &TransportRegistry {
        &self.transports
    }

    /// Run `request` to completion, decoding the body only when the request
    /// declares a response entity type.
    pub async fn request(&self, request: &Request) -> Result<Response> {
        let call = self.prepare(request)?;
        let terminal = self.execute(&call).await;
        Response::from_result(
            terminal,
            call.config.deserializer.as_deref(),
            call.response_entity_type.as_ref(),
        )
    }

    /// Run `request` to completion, decoding the body as `T`.
    pub async fn request_as<T: DeserializeOwned>(&self, request: &Request) -> Result<Response<T>> {
        let call = self.prepare(request)?;
        let terminal = self.execute(&call).await;
        Response::from_result_typed(terminal, call.config.deserializer.as_deref())
    }

    /// Start `request` in the background; `callback` fires once with the
    /// outcome, or once per cycle for recurring requests.
    ///
    /// Returns [`ClientError::Runtime`] outside a tokio runtime.
    pub fn begin_request<F>(&self, request: Request, callback: F) -> Result<AsyncHandle>
    where
        F: Fn(&Request, Result<Response>) + Send + Sync + 'static,
    {
        let build: ResponseFactory<Value> = Arc::new(|call: &PreparedCall, result: QueryResult| {
            Response::from_result(
                result,
                call.config.deserializer.as_deref(),
                call.response_entity_type.as_ref(),
            )
        });
        self.begin(request, build, Arc::new(callback))
    }

    /// Typed variant of [`begin_request`](Self::begin_request).
    pub fn begin_request_as<T, F>(&self, request: Request, callback: F) -> Result<AsyncHandle>
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(&Request, Result<Response<T>>) + Send + Sync + 'static,
    {
        let build: ResponseFactory<T> = Arc::new(|call: &PreparedCall, result: QueryResult| {
            Response::from_result_typed(result, call.config.deserializer.as_deref())
        });
        self.begin(request, build, Arc::new(callback))
    }

    /// Not supported: results are delivered to the callback.
    pub fn end_request(&self, _handle: &AsyncHandle) -> Result<Response> {
        Err(ClientError::UnsupportedOperation(
            "results of begin_request are delivered to its callback",
        ))
    }

    /// Not supported: results are delivered to the callback.
    pub fn end_request_as<T>(&self, _handle: &AsyncHandle) -> Result<Response<T>> {
        Err(ClientError::UnsupportedOperation(
            "results of begin_request_as are delivered to its callback",
        ))
    }

    /// Absolute endpoint of `request`.
    ///
    /// Paths with a `scheme://` prefix are used as-is; anything else, such
    /// as `items:batch`, is joined to the authority with exactly one `/`
    /// between them.
    pub fn build_endpoint(&self, request: &Request) -> Result<Url> {
        let path = request.path();
        if path.contains("://") {
            return Url::parse(path).map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")));
        }

        let authority = self
            .config
            .authority
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| {
                ClientError::InvalidUrl(format!("relative path '{path}' requires an authority"))
            })?;

        let endpoint = if path.is_empty() {
            authority.to_string()
        } else {
            format!(
                "{}/{}",
                authority.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        };
        Url::parse(&endpoint).map_err(|e| ClientError::InvalidUrl(format!("{endpoint}: {e}")))
    }

    fn begin<T: Send + 'static>(
        &self,
        request: Request,
        build: ResponseFactory<T>,
        callback: Callback<T>,
    ) -> Result<AsyncHandle> {
        Handle::try_current().map_err(|e| ClientError::Runtime(e.to_string()))?;
        let call = Arc::new(self.prepare(&request)?);
        let task_options = recurring::recurring_options(&call.config);
        let call = AsyncCall::new(Arc::new(request), call, build, callback);

        match task_options {
            Some(options) => recurring::begin(self.scheduler.as_ref(), call, options),
            None => Ok(call.begin()),
        }
    }

    #[instrument(skip_all, fields(path = %request.path()))]
    fn prepare(&self, request: &Request) -> Result<PreparedCall> {
        let config = ResolvedConfig::resolve(&self.config.defaults, &request.settings);
        let mut url = self.build_endpoint(request)?;
        let mut query = self.query_for(request, &config, &url)?;

        if mock::expects_mock(request) {
            self.transports
                .register_if_absent(MOCK_SCHEME, || Arc::new(MockTransport::new()));
            url = mock::redirect(request, config.serializer.as_deref(), &mut query, &url)?;
        }

        let transport = self.transports.for_url(&url);
        debug!(method = %query.method, url = %url, "Prepared call");

        Ok(PreparedCall {
            url,
            query,
            transport,
            client_method: self.config.defaults.method.clone(),
            response_entity_type: request.response_entity_type,
            config,
        })
    }

    fn query_for(&self, request: &Request, config: &ResolvedConfig, url: &Url) -> Result<Query> {
        let mut query = match &config.credentials {
            Some(credentials) => {
                credentials.query_for(url, request, config.info.as_ref(), &config.method)
            }
            None => Query::basic(config.info.clone()),
        };

        query.method = config.method.clone();
        query.headers.extend(config.headers.iter().cloned());
        query.parameters.merge(&config.parameters);
        query.user_agent = config.user_agent.clone();
        query.proxy = config.proxy.clone();
        query.timeout = config.timeout;
        query.entity = entity_for(request, config)?;
        Ok(query)
    }

    async fn execute(&self, call: &PreparedCall) -> QueryResult {
        let policy = call.config.retry_policy.as_ref();
        let mut controller = RetryController::sequential(policy);
        let mut query = call.query.clone();

        loop {
            let result = call.attempt(&mut query, controller.attempts() > 0).await;
            match controller.on_attempt(policy, result) {
                Step::Retry { delay } => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Step::Stop(terminal) => return terminal,
            }
        }
    }
}

fn entity_for(request: &Request, config: &ResolvedConfig) -> Result<Option<WebEntity>> {
    if let Some(body) = &request.body {
        return Ok(Some(body.clone()));
    }
    match (&request.entity, config.serializer.as_deref()) {
        (Some(entity), Some(serializer)) => {
            serialize_entity(serializer, entity, request.request_entity_type.as_ref())
        }
        _ => Ok(None),
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("config", &self.config)
            .field("transports", &self.transports)
            .finish_non_exhaustive()
    }
}
