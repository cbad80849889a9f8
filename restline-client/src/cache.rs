//! Cache policy attached to a call.

use restline_cache::CacheExpiry;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ClientError;

/// Produces the cache key for an attempt.
pub type CacheKeyFn = Arc<dyn Fn() -> String + Send + Sync>;

/// How cached responses expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Never expire.
    #[default]
    NoExpiration,
    /// Expire a fixed duration after being stored.
    AbsoluteExpiration,
    /// Expire after a duration without reads.
    SlidingExpiration,
}

impl FromStr for CacheMode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "no_expiration" => Ok(Self::NoExpiration),
            "absolute" | "absolute_expiration" => Ok(Self::AbsoluteExpiration),
            "sliding" | "sliding_expiration" => Ok(Self::SlidingExpiration),
            other => Err(ClientError::UnsupportedConfiguration(format!(
                "unknown cache mode '{other}'"
            ))),
        }
    }
}

/// Cache mode plus its duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Expiry mode.
    pub mode: CacheMode,
    /// Duration used by the absolute and sliding modes.
    pub duration: Duration,
}

impl CacheOptions {
    /// Entries never expire.
    pub fn no_expiration() -> Self {
        Self {
            mode: CacheMode::NoExpiration,
            duration: Duration::ZERO,
        }
    }

    /// Entries expire `duration` after being stored.
    pub fn absolute(duration: Duration) -> Self {
        Self {
            mode: CacheMode::AbsoluteExpiration,
            duration,
        }
    }

    /// Entries expire after `duration` without reads.
    pub fn sliding(duration: Duration) -> Self {
        Self {
            mode: CacheMode::SlidingExpiration,
            duration,
        }
    }

    /// Expiry for an entry stored now.
    pub fn expiry(&self) -> CacheExpiry {
        match self.mode {
            CacheMode::NoExpiration => CacheExpiry::Never,
            CacheMode::AbsoluteExpiration => CacheExpiry::from_now(self.duration),
            CacheMode::SlidingExpiration => CacheExpiry::Sliding(self.duration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modes() {
        assert_eq!("none".parse::<CacheMode>().unwrap(), CacheMode::NoExpiration);
        assert_eq!(
            "Absolute".parse::<CacheMode>().unwrap(),
            CacheMode::AbsoluteExpiration
        );
        assert_eq!(
            "sliding".parse::<CacheMode>().unwrap(),
            CacheMode::SlidingExpiration
        );
    }

    #[test]
    fn test_unknown_mode_is_unsupported() {
        let err = "forever".parse::<CacheMode>().unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedConfiguration(_)));
    }

    #[test]
    fn test_expiry_mapping() {
        assert_eq!(CacheOptions::no_expiration().expiry(), CacheExpiry::Never);
        assert!(matches!(
            CacheOptions::absolute(Duration::from_secs(60)).expiry(),
            CacheExpiry::AbsoluteAt(_)
        ));
        assert_eq!(
            CacheOptions::sliding(Duration::from_secs(5)).expiry(),
            CacheExpiry::Sliding(Duration::from_secs(5))
        );
    }
}
