//! # Restline Client
//!
//! A request execution engine that merges client defaults with per-request
//! overrides and runs each call through retries, caching, multipart uploads,
//! recurring schedules and mock redirection.
//!
//! ## Features
//!
//! - **Configuration Resolution**: Request values override client defaults field by field
//! - **Retries**: OR-combined retry conditions with a per-call budget and optional backoff
//! - **Caching**: Responses served from a [`restline_cache::Cache`] keyed per attempt
//! - **Multipart**: Form parts with the multipart method rule applied
//! - **Callbacks**: Background calls whose callback fires exactly once
//! - **Recurring Requests**: Calls repeated on a timer, optionally rate limited
//! - **Mocking**: Requests with expectations are answered in-process
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use restline_client::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let client = RestClient::new(
//!         ClientConfig::builder()
//!             .authority("https://api.example.com")
//!             .deserializer(Arc::new(JsonSerializer))
//!             .build(),
//!     )?;
//!
//!     let response = client
//!         .request_as::<serde_json::Value>(&Request::get("users/1"))
//!         .await?;
//!
//!     println!("Status: {}", response.status_code());
//!     Ok(())
//! }
//! ```
//!
//! ## Callbacks and Retries
//!
//! ```rust,no_run
//! use restline_client::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let client = RestClient::new(
//!         ClientConfig::builder()
//!             .authority("https://api.example.com")
//!             .retry_policy(
//!                 RetryPolicy::new(3)
//!                     .retry_if(RetryCondition::on_timeout())
//!                     .retry_if(RetryCondition::on_status([502, 503]))
//!                     .with_backoff(BackoffStrategy::Constant(Duration::from_millis(200))),
//!             )
//!             .build(),
//!     )?;
//!
//!     let handle = client.begin_request(Request::get("health"), |request, outcome| {
//!         match outcome {
//!             Ok(response) => println!("{} -> {}", request.path(), response.status_code()),
//!             Err(e) => eprintln!("{} failed: {e}", request.path()),
//!         }
//!     })?;
//!
//!     handle.wait().await;
//!     Ok(())
//! }
//! ```

#[macro_use]
mod settings;

mod cache;
mod call;
mod client;
mod config;
mod credentials;
mod error;
pub mod mock;
mod orchestrator;
mod path;
mod query;
mod recurring;
mod request;
mod resolve;
mod response;
mod result;
mod retry;
mod serialization;
mod transport;

pub use cache::{CacheKeyFn, CacheMode, CacheOptions};
pub use client::RestClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use credentials::{BasicAuthCredentials, BearerTokenCredentials, Credentials};
pub use error::{ClientError, Result, TransportError};
pub use orchestrator::{AsyncHandle, Callback};
pub use query::{Parameter, Parameters, PostParameter, Query, QueryInfo};
pub use request::{Expectations, Request};
pub use resolve::ResolvedConfig;
pub use response::Response;
pub use result::{History, QueryResult};
pub use retry::{BackoffStrategy, RetryCondition, RetryPolicy};
pub use serialization::{
    Deserializer, EntityType, JsonSerializer, Serializer, WebEntity, deserialize_as,
};
pub use settings::Settings;
pub use transport::{
    HttpTransport, HttpTransportOptions, MockTransport, Transport, TransportRegistry,
};

pub use http::{Method, StatusCode};
pub use restline_cache::{Cache, CacheExpiry, MemoryCache};
pub use restline_tasks::{
    RateLimitCheck, RateLimitRule, RateLimitType, Scheduler, TaskHandle, TaskOptions,
    TokioScheduler,
};
