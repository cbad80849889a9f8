//! Cache collaborator trait definition.

use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Expiry policy attached to a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheExpiry {
    /// The value never expires.
    Never,
    /// The value expires at a fixed instant.
    AbsoluteAt(DateTime<Utc>),
    /// The value expires once it has not been read for the given duration.
    Sliding(Duration),
}

impl CacheExpiry {
    /// Absolute expiry `duration` from now.
    pub fn from_now(duration: Duration) -> Self {
        Self::AbsoluteAt(deadline(duration))
    }
}

/// The instant `duration` from now, saturating at the latest representable time.
pub(crate) fn deadline(duration: Duration) -> DateTime<Utc> {
    let delta = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX);
    Utc::now()
        .checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Cache collaborator consulted by the cached execution path.
///
/// Implementations are shared by every call issued from a client and must be
/// safe for concurrent use; callers perform no locking around them.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Fetch a value.
    ///
    /// Returns `Ok(None)` when the key is absent or has expired.
    async fn fetch(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store a value under the given expiry policy, replacing any previous value.
    async fn store(&self, key: &str, value: String, expiry: CacheExpiry) -> CacheResult<()>;

    /// Remove a value.
    async fn remove(&self, key: &str) -> CacheResult<()>;
}

/// Typed helpers available on every [`Cache`], including trait objects.
#[async_trait]
pub trait CacheExt: Cache {
    /// Fetch and decode a JSON value.
    async fn fetch_json<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.fetch(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| CacheError::Deserialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Encode and store a JSON value.
    async fn store_json<T>(&self, key: &str, value: &T, expiry: CacheExpiry) -> CacheResult<()>
    where
        T: Serialize + Sync,
    {
        let raw = serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.store(key, raw, expiry).await
    }
}

impl<C: Cache + ?Sized> CacheExt for C {}
