// Restline - a request execution engine
//
// Merges client defaults with per-request overrides and runs every call
// through retries, caching, multipart uploads, recurring schedules and
// mock redirection.

// Re-export the engine
pub use restline_client::*;

// Re-export collaborator crates
pub use restline_cache as cache;
pub use restline_tasks as tasks;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        AsyncHandle,
        BackoffStrategy,
        CacheOptions,
        ClientConfig,
        ClientError,
        JsonSerializer,
        MemoryCache,
        PostParameter,
        RateLimitRule,
        Request,
        Response,
        RestClient,
        RetryCondition,
        RetryPolicy,
        TaskOptions,
        TransportError,
    };
}
