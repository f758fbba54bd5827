//! Cache module - small in-memory caches built on Moka.
//!
//! Each repository or handler owns the caches it needs:
//! - leaderboard snapshot (short TTL)
//! - active ads list (short TTL, invalidated on admin edits)
//! - pending withdraw prompts (conversation state, TTL-bound)

mod config;
mod typed;

pub use config::CacheConfig;
pub use typed::TypedCache;
