//! Response cache collaborator for restline.
//!
//! The client's cached execution path talks to a [`Cache`] through two
//! operations, `fetch` and `store`, with one of three expiry policies:
//!
//! - [`CacheExpiry::Never`] - stored values never expire
//! - [`CacheExpiry::AbsoluteAt`] - values expire at a fixed instant
//! - [`CacheExpiry::Sliding`] - values expire after a period without reads
//!
//! # Examples
//!
//! ```
//! use restline_cache::*;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), CacheError> {
//! let cache = MemoryCache::new();
//! cache
//!     .store("users", "[]".to_string(), CacheExpiry::Sliding(Duration::from_secs(30)))
//!     .await?;
//!
//! assert_eq!(cache.fetch("users").await?.as_deref(), Some("[]"));
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
mod traits;

pub use error::{CacheError, CacheResult};
pub use memory::MemoryCache;
pub use traits::{Cache, CacheExpiry, CacheExt};
