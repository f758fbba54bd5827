//! Cache configuration.

use std::time::Duration;

/// Configuration for a cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_capacity: u64,

    /// Time-to-live for cache entries.
    pub ttl: Option<Duration>,

    /// Time-to-idle for cache entries.
    pub tti: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Some(Duration::from_secs(300)), // 5 minutes
            tti: None,
        }
    }
}

impl CacheConfig {
    /// Aggregates that are expensive to compute but fine to serve slightly stale
    /// (leaderboard, ad rotation).
    pub fn snapshot() -> Self {
        Self {
            max_capacity: 16,
            ttl: Some(Duration::from_secs(60)),
            tti: None,
        }
    }

    /// Per-user conversation state, e.g. "waiting for a withdraw amount".
    pub fn conversation() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Some(Duration::from_secs(600)), // 10 minutes to answer
            tti: None,
        }
    }

    /// Telegram profile fingerprints used to skip redundant profile writes.
    pub fn profiles() -> Self {
        Self {
            max_capacity: 20_000,
            ttl: Some(Duration::from_secs(3600)),
            tti: Some(Duration::from_secs(1800)),
        }
    }
}
